//! Slide layout: turns a title, a stanza list and a style into slide descriptions.
//!
//! All geometry is in EMU (English Metric Units, 914400 per inch), the unit
//! presentation encoders work in.

use crate::style::{Alignment, Rgb, SlideStyle};
use crate::types::{ImageData, InputMode};

/// EMU per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Horizontal offset of a left-anchored title box.
const TITLE_LEFT_INSET: i64 = 2;

/// Convert inches to EMU.
pub const fn inches(value: i64) -> i64 {
    value * EMU_PER_INCH
}

/// Size of every slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: i64,
    pub height: i64,
}

impl Canvas {
    /// 16:9 canvas, 16 by 9 inches.
    pub const WIDESCREEN: Canvas = Canvas {
        width: inches(16),
        height: inches(9),
    };

    /// A rectangle covering the whole canvas.
    pub fn full(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::WIDESCREEN
    }
}

/// Position and size of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub const fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bottom edge of the rectangle.
    pub fn bottom(&self) -> i64 {
        self.y + self.height
    }
}

/// Where the foreground art goes on the title slide.
pub const FOREGROUND_FRAME: Rect = Rect::new(inches(9), inches(2), inches(6), inches(4));

/// Font applied to a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSpec {
    pub name: String,
    pub size_pt: u32,
    pub bold: bool,
    pub color: Rgb,
}

/// Paragraph-level formatting. `None` leaves the encoder's default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphFormat {
    pub font: FontSpec,
    pub alignment: Option<Alignment>,
    /// Effective line spacing in points, already scaled.
    pub line_spacing_pt: Option<u32>,
    pub space_before_pt: Option<u32>,
    pub space_after_pt: Option<u32>,
}

impl ParagraphFormat {
    fn with_font(font: FontSpec) -> Self {
        Self {
            font,
            alignment: None,
            line_spacing_pt: None,
            space_before_pt: None,
            space_after_pt: None,
        }
    }
}

/// Which part of a slide a text box is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Title,
    Subtitle,
    Body,
}

/// A text box holding exactly one paragraph.
///
/// Line breaks inside `text` stay inside the paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBox {
    pub role: TextRole,
    pub frame: Rect,
    pub text: String,
    pub format: ParagraphFormat,
}

/// An image with its frame. The image is stretched to the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedImage {
    pub image: ImageData,
    pub frame: Rect,
}

/// First slide: song title, performer and optional artwork.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleSlide {
    pub title: TextBox,
    pub subtitle: TextBox,
    pub foreground: Option<PlacedImage>,
    /// Drawn behind every other shape.
    pub background: Option<PlacedImage>,
}

/// A slide carrying one stanza.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSlide {
    pub body: TextBox,
    /// Drawn behind every other shape.
    pub background: Option<PlacedImage>,
}

/// One slide handed to the presentation encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideDescription {
    Title(TitleSlide),
    Text(TextSlide),
}

impl SlideDescription {
    /// Background picture of the slide, if any.
    pub fn background(&self) -> Option<&PlacedImage> {
        match self {
            Self::Title(slide) => slide.background.as_ref(),
            Self::Text(slide) => slide.background.as_ref(),
        }
    }
}

/// A complete presentation layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    pub canvas: Canvas,
    /// Solid fill under every slide.
    pub background_color: Rgb,
    pub slides: Vec<SlideDescription>,
}

impl Deck {
    /// Number of stanza slides.
    pub fn text_slide_count(&self) -> usize {
        self.slides
            .iter()
            .filter(|s| matches!(s, SlideDescription::Text(_)))
            .count()
    }
}

/// Horizontal placement of the title and subtitle boxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TitlePlacement {
    #[default]
    Centered,
    /// Anchored near the left edge, leaving the rest of the slide to the background.
    LeftInset,
}

impl From<InputMode> for TitlePlacement {
    fn from(mode: InputMode) -> Self {
        match mode {
            InputMode::Manual => Self::LeftInset,
            InputMode::Search | InputMode::Batch => Self::Centered,
        }
    }
}

/// Images to place on the slides, already fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideImages {
    /// Title art, placed right of the title text.
    pub foreground: Option<ImageData>,
    /// Stretched across the canvas of every slide.
    pub background: Option<ImageData>,
}

/// Computes slide descriptions from song content and a style.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    canvas: Canvas,
    placement: TitlePlacement,
}

impl LayoutEngine {
    /// Create an engine for the 16:9 canvas with a centered title.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the horizontal placement of the title block.
    pub fn with_placement(mut self, placement: TitlePlacement) -> Self {
        self.placement = placement;
        self
    }

    /// The canvas every slide is laid out on.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Lay out the title slide and one text slide per stanza.
    ///
    /// Index 0 of `stanzas` is the title placeholder and never becomes a
    /// text slide; blank stanzas are skipped as well.
    pub fn build_slides(
        &self,
        title: &str,
        subtitle: &str,
        stanzas: &[String],
        style: &SlideStyle,
        images: &SlideImages,
    ) -> Deck {
        let background = images.background.as_ref().map(|image| PlacedImage {
            image: image.clone(),
            frame: self.canvas.full(),
        });

        let mut slides = Vec::with_capacity(stanzas.len().max(1));
        slides.push(SlideDescription::Title(self.title_slide(
            title,
            subtitle,
            style,
            images.foreground.as_ref(),
            background.clone(),
        )));

        for stanza in stanzas.iter().skip(1) {
            if stanza.trim().is_empty() {
                continue;
            }
            slides.push(SlideDescription::Text(TextSlide {
                body: self.text_box(stanza, style),
                background: background.clone(),
            }));
        }

        log::debug!(
            "Laid out '{}' as {} slides on a {}x{} canvas",
            title,
            slides.len(),
            self.canvas.width,
            self.canvas.height
        );

        Deck {
            canvas: self.canvas,
            background_color: style.background_color,
            slides,
        }
    }

    fn title_slide(
        &self,
        title: &str,
        subtitle: &str,
        style: &SlideStyle,
        foreground: Option<&ImageData>,
        background: Option<PlacedImage>,
    ) -> TitleSlide {
        let width = self.canvas.width / 2;
        let height = self.canvas.height / 5;
        let left = match self.placement {
            TitlePlacement::Centered => (self.canvas.width - width) / 2,
            TitlePlacement::LeftInset => TITLE_LEFT_INSET,
        };
        let top = (self.canvas.height - height) / 4;

        let title_frame = Rect::new(left, top, width, height);
        let subtitle_frame = Rect::new(left, title_frame.bottom(), width, height);

        TitleSlide {
            title: TextBox {
                role: TextRole::Title,
                frame: title_frame,
                text: title.to_uppercase(),
                format: ParagraphFormat::with_font(FontSpec {
                    name: style.title_font_name.clone(),
                    size_pt: style.title_font_size_pt,
                    bold: style.title_font_bold,
                    color: style.title_font_color,
                }),
            },
            subtitle: TextBox {
                role: TextRole::Subtitle,
                frame: subtitle_frame,
                text: subtitle.to_uppercase(),
                format: ParagraphFormat::with_font(FontSpec {
                    name: style.subtitle_font_name.clone(),
                    size_pt: style.subtitle_font_size_pt,
                    bold: style.subtitle_font_bold,
                    color: style.subtitle_font_color,
                }),
            },
            foreground: foreground.map(|image| PlacedImage {
                image: image.clone(),
                frame: FOREGROUND_FRAME,
            }),
            background,
        }
    }

    fn text_box(&self, stanza: &str, style: &SlideStyle) -> TextBox {
        TextBox {
            role: TextRole::Body,
            frame: self.canvas.full(),
            text: stanza.to_uppercase(),
            format: ParagraphFormat {
                font: FontSpec {
                    name: style.text_font_name.clone(),
                    size_pt: style.text_font_size_pt,
                    bold: style.text_font_bold,
                    color: style.text_font_color,
                },
                alignment: Some(style.text_alignment),
                // Presets store half the effective spacing
                line_spacing_pt: Some(style.text_line_spacing_pt.saturating_mul(2)),
                space_before_pt: Some(style.text_space_before_pt),
                space_after_pt: Some(style.text_space_after_pt),
            },
        }
    }
}

/// Lay out slides with the default engine.
pub fn build_slides(
    title: &str,
    subtitle: &str,
    stanzas: &[String],
    style: &SlideStyle,
    images: &SlideImages,
) -> Deck {
    LayoutEngine::new().build_slides(title, subtitle, stanzas, style, images)
}
