//! Core domain types, lyric normalization, slide styles and layout
//! for turning song lyrics into slide presentations.
//!
//! File formats live in separate crates that implement
//! [`PresentationEncoder`] and [`PresentationReader`].

pub mod batch;
pub mod config;
pub mod error;
pub mod filename;
pub mod images;
pub mod layout;
pub mod matching;
pub mod normalize;
pub mod pipeline;
pub mod source;
pub mod style;
pub mod types;

pub use batch::{run_batch, BatchEvent, BatchSummary, BatchWorker, CancelToken};
pub use config::GenerationConfig;
pub use error::{Error, Result};
pub use filename::{presentation_filename, sanitize_filename};
pub use images::{apply_opacity, FetchPolicy, ImageFetcher, ImageSource, OfflineFetcher};
pub use layout::{build_slides, Canvas, Deck, LayoutEngine, Rect, SlideDescription, SlideImages};
pub use normalize::{parse_batch_list, stanzas_from_manual_text, LyricNormalizer};
pub use pipeline::{Pipeline, PresentationEncoder, PresentationReader};
pub use source::{LyricsLibrary, LyricsSource, MismatchResolver, MismatchWarning, SearchHit};
pub use style::{Alignment, Rgb, SlideStyle, StyleLibrary, StyleSelection};
pub use types::{
    ExtractedPresentation, GeneratedPresentation, ImageData, ImageFormat, InputMode, SongRequest,
};
