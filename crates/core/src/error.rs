//! Error types for lyric slide generation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning lyrics into a presentation.
///
/// Every variant is scoped to the item being processed; a batch run reports
/// the failure and moves on to the next item.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Boilerplate removal produced blocks that could not be reassembled.
    #[error("Error in block division: {0}")]
    BlockSplit(String),

    /// Fetching an image failed.
    #[error("Failed to fetch image from {source_name}: {reason}")]
    Fetch { source_name: String, reason: String },

    /// The output file name is invalid or could not be written.
    #[error("Cannot write presentation '{name}': {reason}")]
    Persistence { name: String, reason: String },

    /// The lyrics source has no match for the requested song.
    #[error("No lyrics found for '{title}' by '{artist}'")]
    NotFound { title: String, artist: String },

    /// The user declined a title/artist mismatch.
    #[error("Found '{found_title}' by '{found_artist}', which was not accepted")]
    MismatchRejected {
        found_title: String,
        found_artist: String,
    },

    /// The "create your own" sentinel was passed where a real style is needed.
    #[error("No style selected")]
    NoStyleSelected,

    /// A style preset file could not be parsed or violates the schema.
    #[error("Invalid style preset '{name}': {reason}")]
    StyleParse { name: String, reason: String },

    /// Failed to encode the presentation.
    #[error("Presentation encoding error: {0}")]
    Encode(String),

    /// Failed to read content back out of an existing presentation.
    #[error("Presentation extraction error: {0}")]
    Extraction(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// Image data is unsupported or could not be processed.
    #[error("Image error: {0}")]
    Image(String),
}
