//! Domain types shared by the pipeline, the layout engine and the encoders.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Error, Result};

/// A song to look up and turn into a presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRequest {
    /// Song title as typed by the user.
    pub title: String,

    /// Performer name as typed by the user. May be empty.
    pub singer: String,
}

impl SongRequest {
    /// Create a new request.
    pub fn new(title: impl Into<String>, singer: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            singer: singer.into(),
        }
    }
}

/// How the lyrics for a presentation were obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Single song looked up through the lyrics source.
    #[default]
    Search,
    /// Many songs looked up one after another.
    Batch,
    /// Lyrics typed or pasted by the user.
    Manual,
}

/// Image container formats the encoder can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageFormat {
    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }
        if bytes.starts_with(b"BM") && bytes.len() > 14 {
            return Some(Self::Bmp);
        }
        None
    }

    /// Detect format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Canonical file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    /// MIME content type.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }
}

/// Raw bytes of an image together with their detected format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl ImageData {
    /// Wrap image bytes, detecting the format from the magic number.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let format = ImageFormat::from_magic(&bytes)
            .ok_or_else(|| Error::Image("unrecognized image format".to_string()))?;
        Ok(Self { format, bytes })
    }
}

/// Content recovered from a previously generated presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPresentation {
    /// First paragraph of the title placeholder.
    pub title: String,

    /// Full text of the subtitle placeholder.
    pub subtitle: String,

    /// One element per slide; element 0 is the empty title placeholder.
    pub stanzas: Vec<String>,

    /// Title art found next to the title text.
    pub foreground: Option<ImageData>,

    /// Full-canvas picture behind the title slide.
    pub background: Option<ImageData>,
}

/// Outcome of one successfully generated presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPresentation {
    /// Sanitized file name, e.g. `Amazing Grace (john newton).pptx`.
    pub file_name: String,

    /// Full path of the written file.
    pub path: PathBuf,

    /// `"{title} {singer}"` followed by the stanzas separated by blank lines.
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_format_from_magic() {
        assert_eq!(
            ImageFormat::from_magic(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0]),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_magic(b"GIF89a...."), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::from_magic(b"not an image"), None);
    }

    #[test]
    fn test_image_format_from_extension() {
        assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("webp"), None);
    }

    #[test]
    fn test_image_data_rejects_unknown_bytes() {
        assert!(ImageData::from_bytes(b"plain text".to_vec()).is_err());
    }
}
