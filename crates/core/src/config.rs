//! Per-invocation configuration for presentation generation.

use std::path::PathBuf;

use crate::images::{FetchPolicy, ImageSource};
use crate::layout::LayoutEngine;
use crate::normalize::LyricNormalizer;
use crate::style::SlideStyle;
use crate::types::InputMode;

/// Folder presentations are written to when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "./files";

/// Everything one pipeline run needs to know, passed in explicitly.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Folder the presentation files are written to.
    pub output_dir: PathBuf,

    /// How the lyrics were obtained; decides the title placement.
    pub mode: InputMode,

    /// Style applied to every slide.
    pub style: SlideStyle,

    /// User-selected picture stretched behind every slide.
    pub background: Option<ImageSource>,

    /// What to do when `background` cannot be loaded.
    pub background_policy: FetchPolicy,

    /// Opacity applied to `background`, 0.0 to 1.0.
    pub background_opacity: Option<f32>,

    /// Keep letter case when excising lyric boilerplate.
    pub preserve_case: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            mode: InputMode::default(),
            style: SlideStyle::default(),
            background: None,
            background_policy: FetchPolicy::default(),
            background_opacity: None,
            preserve_case: false,
        }
    }
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_mode(mut self, mode: InputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_style(mut self, style: SlideStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_background(mut self, background: ImageSource) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_background_policy(mut self, policy: FetchPolicy) -> Self {
        self.background_policy = policy;
        self
    }

    pub fn with_background_opacity(mut self, opacity: f32) -> Self {
        self.background_opacity = Some(opacity.clamp(0.0, 1.0));
        self
    }

    pub fn with_preserve_case(mut self, preserve: bool) -> Self {
        self.preserve_case = preserve;
        self
    }

    /// Layout engine matching the input mode.
    pub fn layout_engine(&self) -> LayoutEngine {
        LayoutEngine::new().with_placement(self.mode.into())
    }

    /// Lyric normalizer matching the case setting.
    pub fn normalizer(&self) -> LyricNormalizer {
        LyricNormalizer::new().with_preserve_case(self.preserve_case)
    }
}
