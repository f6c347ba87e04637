//! Slide styles and named style presets.
//!
//! A [`SlideStyle`] is stored as one JSON file per preset. The keys keep the
//! names used by existing preset files (`title_font_size_PT`, ...), unknown
//! keys are rejected and missing keys take the defaults below.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::filename::style_filename;
use crate::{Error, Result};

/// Largest font size the encoder can express, in points.
const MAX_FONT_SIZE_PT: u32 = 4000;

/// Largest paragraph spacing the encoder can express, in points.
const MAX_SPACING_PT: u32 = 1584;

/// Localized preset names that stand in for each other when one is missing.
const ALTERNATE_SUFFIXES: &[(&str, &str)] = &[
    ("white background", "fundo branco"),
    ("black background", "fundo preto"),
];

/// Labels that mean "no style selected, open the style editor".
const CREATE_YOUR_OWN_LABELS: &[&str] = &["create your own", "create your own style", "crie seu estilo"];

/// An RGB color, stored in JSON as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Upper-case hex notation without `#`, e.g. `FF8800`.
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Horizontal alignment of lyric text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
    Justify,
    JustifyLow,
}

impl Alignment {
    /// Map a legacy numeric alignment code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Left),
            2 => Some(Self::Center),
            3 => Some(Self::Right),
            4 => Some(Self::Justify),
            7 => Some(Self::JustifyLow),
            _ => None,
        }
    }
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "left" => Ok(Self::Left),
            "center" | "centre" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            "justify" => Ok(Self::Justify),
            "justify_low" => Ok(Self::JustifyLow),
            other => Err(format!("unknown alignment '{}'", other)),
        }
    }
}

impl<'de> Deserialize<'de> for Alignment {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Code(i64),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Code(code) => Alignment::from_code(code)
                .ok_or_else(|| D::Error::custom(format!("unknown alignment code {}", code))),
            Repr::Name(name) => name.parse().map_err(D::Error::custom),
        }
    }
}

/// Fonts, colors and spacing applied to every slide of a presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlideStyle {
    #[serde(rename = "background_color_RGB")]
    pub background_color: Rgb,

    #[serde(rename = "title_font_size_PT")]
    pub title_font_size_pt: u32,
    #[serde(rename = "title_font_color_RGB")]
    pub title_font_color: Rgb,
    #[serde(rename = "title_font_isbold")]
    pub title_font_bold: bool,
    pub title_font_name: String,

    #[serde(rename = "subtitle_font_size_PT")]
    pub subtitle_font_size_pt: u32,
    #[serde(rename = "subtitle_font_color_RGB")]
    pub subtitle_font_color: Rgb,
    #[serde(rename = "subtitle_font_isbold")]
    pub subtitle_font_bold: bool,
    pub subtitle_font_name: String,

    #[serde(rename = "text_font_size_PT")]
    pub text_font_size_pt: u32,
    #[serde(rename = "text_font_color_RGB")]
    pub text_font_color: Rgb,
    #[serde(rename = "text_font_isbold")]
    pub text_font_bold: bool,
    #[serde(rename = "text_font_alignment")]
    pub text_alignment: Alignment,
    /// Nominal line spacing; the layout engine doubles it.
    #[serde(rename = "text_font_line_spacing_PT")]
    pub text_line_spacing_pt: u32,
    #[serde(rename = "text_font_space_before_PT")]
    pub text_space_before_pt: u32,
    #[serde(rename = "text_font_space_after_PT")]
    pub text_space_after_pt: u32,
    pub text_font_name: String,
}

impl Default for SlideStyle {
    fn default() -> Self {
        Self {
            background_color: Rgb::WHITE,
            title_font_size_pt: 56,
            title_font_color: Rgb::BLACK,
            title_font_bold: false,
            title_font_name: "Tw Cen MT".to_string(),
            subtitle_font_size_pt: 44,
            subtitle_font_color: Rgb::BLACK,
            subtitle_font_bold: false,
            subtitle_font_name: "Tw Cen MT".to_string(),
            text_font_size_pt: 38,
            text_font_color: Rgb::BLACK,
            text_font_bold: false,
            text_alignment: Alignment::Center,
            text_line_spacing_pt: 38,
            text_space_before_pt: 0,
            text_space_after_pt: 0,
            text_font_name: "Arial".to_string(),
        }
    }
}

impl SlideStyle {
    /// White text on a black background.
    pub fn dark() -> Self {
        Self {
            background_color: Rgb::BLACK,
            title_font_color: Rgb::WHITE,
            subtitle_font_color: Rgb::WHITE,
            text_font_color: Rgb::WHITE,
            ..Self::default()
        }
    }

    /// Check the values against what a presentation can express.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let sizes = [
            ("title_font_size_PT", self.title_font_size_pt),
            ("subtitle_font_size_PT", self.subtitle_font_size_pt),
            ("text_font_size_PT", self.text_font_size_pt),
        ];
        for (key, size) in sizes {
            if size == 0 || size > MAX_FONT_SIZE_PT {
                return Err(format!("{} must be between 1 and {}", key, MAX_FONT_SIZE_PT));
            }
        }

        let spacings = [
            ("text_font_line_spacing_PT", self.text_line_spacing_pt.saturating_mul(2)),
            ("text_font_space_before_PT", self.text_space_before_pt),
            ("text_font_space_after_PT", self.text_space_after_pt),
        ];
        for (key, spacing) in spacings {
            if spacing > MAX_SPACING_PT {
                return Err(format!("{} is too large", key));
            }
        }

        let fonts = [
            ("title_font_name", &self.title_font_name),
            ("subtitle_font_name", &self.subtitle_font_name),
            ("text_font_name", &self.text_font_name),
        ];
        for (key, name) in fonts {
            if name.trim().is_empty() {
                return Err(format!("{} must not be empty", key));
            }
        }

        Ok(())
    }

    /// Parse a preset from JSON, rejecting unknown keys and invalid values.
    pub fn from_json(name: &str, json: &str) -> Result<Self> {
        let style: SlideStyle = serde_json::from_str(json).map_err(|e| Error::StyleParse {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        style.validate().map_err(|reason| Error::StyleParse {
            name: name.to_string(),
            reason,
        })?;
        Ok(style)
    }
}

/// What the user picked in a style selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleSelection {
    /// The "create your own" entry; no preset to load.
    CreateYourOwn,
    /// A named preset.
    Preset(String),
}

impl StyleSelection {
    pub fn parse(name: &str) -> Self {
        let label = name.trim().to_lowercase();
        if CREATE_YOUR_OWN_LABELS.contains(&label.as_str()) {
            Self::CreateYourOwn
        } else {
            Self::Preset(name.trim().to_string())
        }
    }
}

/// Style presets stored as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct StyleLibrary {
    dir: PathBuf,
}

impl StyleLibrary {
    /// Create a library backed by `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the preset files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Preset names (file stems), sorted.
    pub fn list_available(&self) -> Result<Vec<String>> {
        Ok(self
            .preset_files()?
            .iter()
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()))
            .map(str::to_string)
            .collect())
    }

    /// Load a preset by name, falling back when its file is missing.
    ///
    /// A missing localized preset is replaced by its alternate (e.g.
    /// "white background" by "fundo branco"); anything else falls back to the
    /// first preset in name order. An empty library yields the default style.
    pub fn load(&self, name: &str) -> Result<SlideStyle> {
        let name = match StyleSelection::parse(name) {
            StyleSelection::CreateYourOwn => return Err(Error::NoStyleSelected),
            StyleSelection::Preset(name) => name,
        };

        match self.resolve(&name)? {
            Some(path) => {
                log::debug!("Loading style '{}' from {}", name, path.display());
                let json = fs::read_to_string(&path)?;
                SlideStyle::from_json(&name, &json)
            }
            None => {
                log::warn!(
                    "No style presets in {}, using the default style",
                    self.dir.display()
                );
                Ok(SlideStyle::default())
            }
        }
    }

    /// Find the file that backs `name`, applying the fallback rules.
    pub fn resolve(&self, name: &str) -> Result<Option<PathBuf>> {
        let available = self.preset_files()?;

        if let Ok(file_name) = style_filename(name) {
            let exact = self.dir.join(&file_name);
            if available.contains(&exact) {
                return Ok(Some(exact));
            }
        }

        for &(a, b) in ALTERNATE_SUFFIXES {
            for (suffix, replacement) in [(a, b), (b, a)] {
                if let Some(prefix) = name.strip_suffix(suffix) {
                    let alternate = self.dir.join(format!("{}{}.json", prefix, replacement));
                    if available.contains(&alternate) {
                        log::warn!(
                            "Style '{}' not found, using {}",
                            name,
                            alternate.display()
                        );
                        return Ok(Some(alternate));
                    }
                }
            }
        }

        let first = available.into_iter().next();
        if let Some(path) = &first {
            log::warn!("Style '{}' not found, using {}", name, path.display());
        }
        Ok(first)
    }

    /// Save a preset, overwriting any preset with the same file name.
    pub fn save(&self, name: &str, style: &SlideStyle) -> Result<PathBuf> {
        style.validate().map_err(|reason| Error::StyleParse {
            name: name.to_string(),
            reason,
        })?;

        let file_name = style_filename(name)?;
        fs::create_dir_all(&self.dir)?;

        let path = self.dir.join(file_name);
        let json = serde_json::to_string_pretty(style).map_err(|e| Error::StyleParse {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        fs::write(&path, json)?;

        log::debug!("Saved style '{}' to {}", name, path.display());
        Ok(path)
    }

    /// Write the built-in presets that are not already present.
    pub fn install_builtin(&self) -> Result<Vec<PathBuf>> {
        let presets = [
            ("white background", SlideStyle::default()),
            ("black background", SlideStyle::dark()),
        ];

        let mut written = Vec::new();
        for (name, style) in presets {
            if !self.dir.join(style_filename(name)?).exists() {
                written.push(self.save(name, &style)?);
            }
        }
        Ok(written)
    }

    /// Preset files sorted by path; a missing directory has none.
    fn preset_files(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_style() {
        let style = SlideStyle::default();
        assert_eq!(style.title_font_size_pt, 56);
        assert_eq!(style.subtitle_font_size_pt, 44);
        assert_eq!(style.text_font_size_pt, 38);
        assert_eq!(style.text_line_spacing_pt, 38);
        assert_eq!(style.text_alignment, Alignment::Center);
        assert_eq!(style.title_font_name, "Tw Cen MT");
        assert_eq!(style.text_font_name, "Arial");
        assert!(style.validate().is_ok());
    }

    #[test]
    fn test_parse_legacy_preset() {
        let json = r#"{
            "background_color_RGB": [0, 0, 0],
            "title_font_color_RGB": [255, 255, 255],
            "title_font_isbold": true,
            "text_font_alignment": 3,
            "text_font_size_PT": 40
        }"#;
        let style = SlideStyle::from_json("legacy", json).unwrap();
        assert_eq!(style.background_color, Rgb::BLACK);
        assert_eq!(style.title_font_color, Rgb::WHITE);
        assert!(style.title_font_bold);
        assert_eq!(style.text_alignment, Alignment::Right);
        assert_eq!(style.text_font_size_pt, 40);
        // Missing keys fall back to defaults
        assert_eq!(style.subtitle_font_size_pt, 44);
    }

    #[test]
    fn test_alignment_by_name() {
        let style = SlideStyle::from_json("x", r#"{"text_font_alignment": "justify_low"}"#).unwrap();
        assert_eq!(style.text_alignment, Alignment::JustifyLow);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = SlideStyle::from_json("x", r#"{"title_font_colour": [1, 2, 3]}"#).unwrap_err();
        assert!(matches!(err, Error::StyleParse { .. }));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(SlideStyle::from_json("x", r#"{"text_font_alignment": 9}"#).is_err());
        assert!(SlideStyle::from_json("x", r#"{"text_font_size_PT": 0}"#).is_err());
        assert!(SlideStyle::from_json("x", r#"{"text_font_name": " "}"#).is_err());
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Rgb(255, 136, 0).to_hex(), "FF8800");
        assert_eq!(Rgb::BLACK.to_hex(), "000000");
    }

    #[test]
    fn test_style_selection_sentinel() {
        assert_eq!(StyleSelection::parse("Create your own style"), StyleSelection::CreateYourOwn);
        assert_eq!(StyleSelection::parse("Crie seu estilo"), StyleSelection::CreateYourOwn);
        assert_eq!(
            StyleSelection::parse("dark stage"),
            StyleSelection::Preset("dark stage".to_string())
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let library = StyleLibrary::new(dir.path().join("styles"));

        let mut style = SlideStyle::dark();
        style.text_font_bold = true;
        let path = library.save("stage", &style).unwrap();
        assert!(path.ends_with("stage.json"));

        assert_eq!(library.load("stage").unwrap(), style);
        assert_eq!(library.list_available().unwrap(), vec!["stage"]);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let library = StyleLibrary::new(dir.path());

        library.save("stage", &SlideStyle::default()).unwrap();
        library.save("stage", &SlideStyle::dark()).unwrap();

        assert_eq!(library.list_available().unwrap().len(), 1);
        assert_eq!(library.load("stage").unwrap(), SlideStyle::dark());
    }

    #[test]
    fn test_load_sentinel_is_error() {
        let dir = TempDir::new().unwrap();
        let library = StyleLibrary::new(dir.path());
        assert!(matches!(
            library.load("create your own"),
            Err(Error::NoStyleSelected)
        ));
    }

    #[test]
    fn test_load_alternate_localized_preset() {
        let dir = TempDir::new().unwrap();
        let library = StyleLibrary::new(dir.path());
        library.save("aaa", &SlideStyle::default()).unwrap();
        library.save("slides fundo preto", &SlideStyle::dark()).unwrap();

        assert_eq!(
            library.load("slides black background").unwrap(),
            SlideStyle::dark()
        );
    }

    #[test]
    fn test_load_falls_back_to_first_preset() {
        let dir = TempDir::new().unwrap();
        let library = StyleLibrary::new(dir.path());
        library.save("b", &SlideStyle::default()).unwrap();
        library.save("a", &SlideStyle::dark()).unwrap();

        assert_eq!(library.load("missing").unwrap(), SlideStyle::dark());
    }

    #[test]
    fn test_empty_library_uses_default() {
        let dir = TempDir::new().unwrap();
        let library = StyleLibrary::new(dir.path().join("nothing here"));
        assert_eq!(library.list_available().unwrap(), Vec::<String>::new());
        assert_eq!(library.load("anything").unwrap(), SlideStyle::default());
    }

    #[test]
    fn test_install_builtin_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let library = StyleLibrary::new(dir.path());

        assert_eq!(library.install_builtin().unwrap().len(), 2);
        assert!(library.install_builtin().unwrap().is_empty());
        assert_eq!(
            library.list_available().unwrap(),
            vec!["black background", "white background"]
        );
    }
}
