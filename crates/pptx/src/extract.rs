//! Recovers title, subtitle, stanzas and images from a generated `.pptx`.
//!
//! Text comes back upper-cased, since that is how it was written.

use slides_core::{
    Canvas, Error, ExtractedPresentation, ImageData, ImageFormat, PresentationReader, Rect, Result,
};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use crate::parser::{PackageReader, ParsedSlide, ShapeKind, ShapeRecord};

/// Shape positions on the title slide searched for title art.
const FOREGROUND_SEARCH: std::ops::RangeInclusive<usize> = 1..=3;

/// Reader for presentations written by [`crate::PptxWriter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PptxReader;

impl PptxReader {
    pub fn new() -> Self {
        Self
    }

    /// Extract from any seekable source.
    pub fn extract_from_reader<R: Read + Seek>(&self, reader: R) -> Result<ExtractedPresentation> {
        let mut package = PackageReader::new(reader)?;

        let canvas = match package.slide_size()? {
            Some((width, height)) => Canvas { width, height },
            None => Canvas::WIDESCREEN,
        };

        let order = package.slide_order()?;
        let Some((first, rest)) = order.split_first() else {
            return Err(Error::Extraction("presentation has no slides".to_string()));
        };

        let title_slide = package.slide(first)?;
        let title = title_slide
            .shapes
            .iter()
            .find(|s| s.placeholder.as_ref().is_some_and(|p| p.is_title()))
            .and_then(|s| s.paragraphs.first().cloned())
            .ok_or_else(|| Error::Extraction("title slide has no title placeholder".to_string()))?;

        let subtitle = title_slide
            .shapes
            .iter()
            .find(|s| s.placeholder.as_ref().is_some_and(|p| p.is_subtitle()))
            .map(ShapeRecord::text)
            .unwrap_or_default();

        let background_index = title_slide
            .shapes
            .iter()
            .position(|s| s.kind == ShapeKind::Picture && s.frame.is_some_and(|f| covers(f, canvas)));

        let foreground_index = FOREGROUND_SEARCH
            .filter(|i| Some(*i) != background_index)
            .find(|i| {
                title_slide
                    .shapes
                    .get(*i)
                    .is_some_and(|s| s.kind == ShapeKind::Picture)
            });

        let background = background_index.and_then(|i| load_picture(&mut package, &title_slide, i));
        let foreground = foreground_index.and_then(|i| load_picture(&mut package, &title_slide, i));

        let mut stanzas = vec![String::new()];
        for path in rest {
            let slide = package.slide(path)?;
            let text = slide
                .shapes
                .iter()
                .filter(|s| s.kind == ShapeKind::Text && s.has_text())
                .map(|s| s.text().trim_matches('\n').to_string())
                .collect::<Vec<_>>()
                .join("\n");
            if !text.is_empty() {
                stanzas.push(text);
            }
        }

        log::debug!(
            "Extracted '{}' with {} stanzas, foreground: {}, background: {}",
            title,
            stanzas.len() - 1,
            foreground.is_some(),
            background.is_some()
        );

        Ok(ExtractedPresentation {
            title,
            subtitle,
            stanzas,
            foreground,
            background,
        })
    }
}

impl PresentationReader for PptxReader {
    fn extract(&self, path: &Path) -> Result<ExtractedPresentation> {
        let file = File::open(path)?;
        self.extract_from_reader(BufReader::new(file))
    }
}

/// The frame spans the whole slide.
fn covers(frame: Rect, canvas: Canvas) -> bool {
    frame.x <= 0 && frame.y <= 0 && frame.width >= canvas.width && frame.height >= canvas.height
}

/// Load the picture of shape `index`; unreadable media is logged and skipped.
fn load_picture<R: Read + Seek>(
    package: &mut PackageReader<R>,
    slide: &ParsedSlide,
    index: usize,
) -> Option<ImageData> {
    let shape = slide.shapes.get(index)?;
    let target = shape.embed.as_ref().and_then(|id| slide.targets.get(id))?;

    let bytes = match package.read_bytes(target) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Skipping picture '{}' on {}: {}", shape.name, slide.path, e);
            return None;
        }
    };

    let format = ImageFormat::from_magic(&bytes).or_else(|| {
        target
            .rsplit_once('.')
            .and_then(|(_, ext)| ImageFormat::from_extension(ext))
    });
    match format {
        Some(format) => Some(ImageData { format, bytes }),
        None => {
            log::warn!("Skipping picture '{}' with unknown format: {}", shape.name, target);
            None
        }
    }
}
