//! PPTX (Office Open XML) backend for lyric presentations.
//!
//! Writes laid-out decks as .pptx files, which are ZIP archives containing
//! XML documents, and reads generated files back for restyling.

pub mod extract;
pub mod parser;
pub mod template;
pub mod writer;

pub use extract::PptxReader;
pub use parser::PackageReader;
pub use writer::PptxWriter;
