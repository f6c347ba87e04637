//! The normalize, layout and encode pipeline for one presentation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::GenerationConfig;
use crate::filename::presentation_filename;
use crate::images::{apply_opacity, load_image, resolve_images, FetchPolicy, ImageFetcher, ImageSource, OfflineFetcher};
use crate::layout::{Deck, SlideImages};
use crate::normalize::stanzas_from_manual_text;
use crate::source::{LyricsSource, MismatchResolver, MismatchWarning, SearchHit};
use crate::types::{ExtractedPresentation, GeneratedPresentation, InputMode, SongRequest};
use crate::{Error, Result};

/// Turns slide descriptions into presentation file bytes.
pub trait PresentationEncoder {
    fn encode(&self, deck: &Deck) -> Result<Vec<u8>>;
}

/// Reads title, subtitle, stanzas and images back out of a presentation file.
pub trait PresentationReader {
    fn extract(&self, path: &Path) -> Result<ExtractedPresentation>;
}

/// Lyrics source used when none is configured; finds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLyricsSource;

impl LyricsSource for NoLyricsSource {
    fn search(&self, _title: &str, _artist: &str) -> Result<Option<SearchHit>> {
        Ok(None)
    }
}

/// Write presentation bytes, replacing any file with the same name.
pub fn write_presentation(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let persistence = |reason: String| Error::Persistence {
        name: file_name.to_string(),
        reason,
    };

    fs::create_dir_all(dir)
        .map_err(|e| persistence(format!("cannot create {}: {}", dir.display(), e)))?;

    let path = dir.join(file_name);
    if path.exists() {
        log::debug!("Replacing existing {}", path.display());
        fs::remove_file(&path).map_err(|e| persistence(e.to_string()))?;
    }
    fs::write(&path, bytes).map_err(|e| persistence(e.to_string()))?;

    Ok(path)
}

/// Generates presentations from lyrics with one explicit configuration.
pub struct Pipeline {
    config: GenerationConfig,
    source: Box<dyn LyricsSource + Send>,
    fetcher: Box<dyn ImageFetcher + Send>,
    encoder: Box<dyn PresentationEncoder + Send>,
}

impl Pipeline {
    /// Create a pipeline with no lyrics source and no network access.
    pub fn new(config: GenerationConfig, encoder: impl PresentationEncoder + Send + 'static) -> Self {
        Self {
            config,
            source: Box::new(NoLyricsSource),
            fetcher: Box::new(OfflineFetcher),
            encoder: Box::new(encoder),
        }
    }

    pub fn with_source(mut self, source: impl LyricsSource + Send + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn with_fetcher(mut self, fetcher: impl ImageFetcher + Send + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Look up a song, clean its lyrics and write the presentation.
    pub fn generate(
        &self,
        request: &SongRequest,
        resolver: &mut dyn MismatchResolver,
    ) -> Result<GeneratedPresentation> {
        let hit = self
            .source
            .search(&request.title, &request.singer)?
            .ok_or_else(|| Error::NotFound {
                title: request.title.clone(),
                artist: request.singer.clone(),
            })?;

        if let Some(warning) = MismatchWarning::check(request, &hit) {
            log::info!(
                "Requested '{}' by '{}', found '{}' by '{}'",
                request.title,
                request.singer,
                warning.found_title,
                warning.found_artist
            );
            if !resolver.confirm(&warning) {
                return Err(Error::MismatchRejected {
                    found_title: warning.found_title,
                    found_artist: warning.found_artist,
                });
            }
        }

        let stanzas = self.config.normalizer().normalize(&hit.lyrics)?;
        let art = match self.config.mode {
            InputMode::Manual => None,
            InputMode::Search | InputMode::Batch => hit.art.as_ref(),
        };

        self.render(&hit.title, &hit.artist, &stanzas, art)
    }

    /// Write a presentation from lyrics typed by the user.
    pub fn generate_manual(&self, title: &str, singer: &str, text: &str) -> Result<GeneratedPresentation> {
        let stanzas = stanzas_from_manual_text(text);
        self.render(title, singer, &stanzas, None)
    }

    /// Lay out and write a presentation from an already cleaned stanza list.
    pub fn render(
        &self,
        title: &str,
        subtitle: &str,
        stanzas: &[String],
        foreground: Option<&ImageSource>,
    ) -> Result<GeneratedPresentation> {
        let images = resolve_images(
            foreground,
            self.config.background.as_ref(),
            self.fetcher.as_ref(),
            self.config.background_policy,
            self.config.background_opacity,
        )?;
        self.write(title, subtitle, stanzas, &images)
    }

    /// Regenerate an existing presentation with the configured style.
    ///
    /// The extracted title and subtitle are upper-case, since that is how
    /// they were written.
    pub fn restyle(&self, reader: &dyn PresentationReader, path: &Path) -> Result<GeneratedPresentation> {
        let extracted = reader.extract(path)?;
        log::debug!(
            "Extracted '{}' with {} stanzas from {}",
            extracted.title,
            extracted.stanzas.len().saturating_sub(1),
            path.display()
        );

        let background = match &self.config.background {
            Some(source) => match load_image(source, self.fetcher.as_ref()) {
                Ok(image) => Some(image),
                Err(e) if self.config.background_policy == FetchPolicy::Skip => {
                    log::warn!("Keeping the original background: {}", e);
                    extracted.background
                }
                Err(e) => return Err(e),
            },
            None => extracted.background,
        };

        let background = match (background, self.config.background_opacity) {
            (Some(image), Some(opacity)) => Some(apply_opacity(&image, opacity)?),
            (background, _) => background,
        };

        let images = SlideImages {
            foreground: extracted.foreground,
            background,
        };
        self.write(&extracted.title, &extracted.subtitle, &extracted.stanzas, &images)
    }

    fn write(
        &self,
        title: &str,
        subtitle: &str,
        stanzas: &[String],
        images: &SlideImages,
    ) -> Result<GeneratedPresentation> {
        let file_name = presentation_filename(title, subtitle)?;
        let deck = self
            .config
            .layout_engine()
            .build_slides(title, subtitle, stanzas, &self.config.style, images);

        let bytes = self.encoder.encode(&deck)?;
        let path = write_presentation(&self.config.output_dir, &file_name, &bytes)?;
        log::info!("Wrote {} ({} slides)", path.display(), deck.slides.len());

        Ok(GeneratedPresentation {
            file_name,
            path,
            summary: format!("{} {}\n{}", title, subtitle, stanzas.join("\n\n")),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::layout::SlideDescription;
    use crate::source::{AcceptMismatches, RejectMismatches};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Encoder that records the decks it was given and writes their slide count.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingEncoder {
        pub decks: Arc<Mutex<Vec<Deck>>>,
    }

    impl PresentationEncoder for RecordingEncoder {
        fn encode(&self, deck: &Deck) -> Result<Vec<u8>> {
            self.decks.lock().unwrap().push(deck.clone());
            Ok(format!("{} slides", deck.slides.len()).into_bytes())
        }
    }

    pub(crate) struct FixedSource(pub SearchHit);

    impl LyricsSource for FixedSource {
        fn search(&self, _title: &str, _artist: &str) -> Result<Option<SearchHit>> {
            Ok(Some(self.0.clone()))
        }
    }

    pub(crate) fn amazing_grace() -> SearchHit {
        SearchHit {
            title: "Amazing Grace".to_string(),
            artist: "John Newton".to_string(),
            lyrics: "2 Contributors\nAmazing grace\n\n[Verse 2]\nI once was lost\n\n[Outro]".to_string(),
            art: Some(ImageSource::Url("http://art.example/grace.png".to_string())),
        }
    }

    fn pipeline(dir: &TempDir, encoder: RecordingEncoder) -> Pipeline {
        Pipeline::new(GenerationConfig::new().with_output_dir(dir.path()), encoder)
            .with_source(FixedSource(amazing_grace()))
    }

    #[test]
    fn test_generate_writes_named_file() {
        let dir = TempDir::new().unwrap();
        let encoder = RecordingEncoder::default();
        let pipeline = pipeline(&dir, encoder.clone());

        let generated = pipeline
            .generate(&SongRequest::new("Amazing Grace", "John Newton"), &mut RejectMismatches)
            .unwrap();

        assert_eq!(generated.file_name, "Amazing Grace (john newton).pptx");
        assert_eq!(fs::read_to_string(&generated.path).unwrap(), "3 slides");
        assert_eq!(
            generated.summary,
            "Amazing Grace John Newton\n\n\nAmazing grace\n\nI once was lost"
        );

        let decks = encoder.decks.lock().unwrap();
        let SlideDescription::Text(slide) = &decks[0].slides[2] else {
            panic!("expected text slide");
        };
        assert_eq!(slide.body.text, "I ONCE WAS LOST");
    }

    #[test]
    fn test_generate_not_found() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            GenerationConfig::new().with_output_dir(dir.path()),
            RecordingEncoder::default(),
        );
        let err = pipeline
            .generate(&SongRequest::new("Unknown", "Nobody"), &mut AcceptMismatches)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_generate_mismatch_needs_confirmation() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, RecordingEncoder::default());
        let request = SongRequest::new("amazing grace", "newton");

        let err = pipeline.generate(&request, &mut RejectMismatches).unwrap_err();
        assert!(matches!(err, Error::MismatchRejected { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

        let generated = pipeline.generate(&request, &mut AcceptMismatches).unwrap();
        assert_eq!(generated.file_name, "Amazing Grace (john newton).pptx");
    }

    #[test]
    fn test_unreachable_title_art_does_not_fail() {
        let dir = TempDir::new().unwrap();
        let encoder = RecordingEncoder::default();
        let pipeline = pipeline(&dir, encoder.clone());

        pipeline
            .generate(&SongRequest::new("Amazing Grace", "John Newton"), &mut AcceptMismatches)
            .unwrap();

        let decks = encoder.decks.lock().unwrap();
        let SlideDescription::Title(slide) = &decks[0].slides[0] else {
            panic!("expected title slide");
        };
        assert!(slide.foreground.is_none());
    }

    #[test]
    fn test_missing_background_aborts_by_default() {
        let dir = TempDir::new().unwrap();
        let config = GenerationConfig::new()
            .with_output_dir(dir.path())
            .with_background(ImageSource::File(dir.path().join("missing.png")));
        let pipeline = Pipeline::new(config, RecordingEncoder::default());

        let err = pipeline.generate_manual("Song", "Singer", "Verse").unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[test]
    fn test_generate_manual_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            GenerationConfig::new()
                .with_output_dir(dir.path())
                .with_mode(InputMode::Manual),
            RecordingEncoder::default(),
        );

        let target = dir.path().join("Song (singer).pptx");
        fs::write(&target, "old content").unwrap();

        let generated = pipeline
            .generate_manual("Song", "Singer", "Verse one\n\nVerse two")
            .unwrap();

        assert_eq!(generated.path, target);
        assert_eq!(fs::read_to_string(&target).unwrap(), "3 slides");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_invalid_title_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            GenerationConfig::new().with_output_dir(dir.path()),
            RecordingEncoder::default(),
        );
        let err = pipeline.generate_manual("???", "x", "Verse").unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));
    }

    struct FixedReader(ExtractedPresentation);

    impl PresentationReader for FixedReader {
        fn extract(&self, _path: &Path) -> Result<ExtractedPresentation> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_restyle_uses_configured_style() {
        let dir = TempDir::new().unwrap();
        let encoder = RecordingEncoder::default();
        let pipeline = Pipeline::new(
            GenerationConfig::new()
                .with_output_dir(dir.path())
                .with_style(crate::SlideStyle::dark()),
            encoder.clone(),
        );
        let reader = FixedReader(ExtractedPresentation {
            title: "AMAZING GRACE".to_string(),
            subtitle: "JOHN NEWTON".to_string(),
            stanzas: vec![String::new(), "AMAZING GRACE".to_string()],
            foreground: None,
            background: None,
        });

        let generated = pipeline.restyle(&reader, Path::new("old.pptx")).unwrap();
        assert_eq!(generated.file_name, "AMAZING GRACE (john newton).pptx");

        let decks = encoder.decks.lock().unwrap();
        assert_eq!(decks[0].background_color, crate::Rgb::BLACK);
        assert_eq!(decks[0].slides.len(), 2);
    }

    fn alpha_of(image: &crate::ImageData) -> u8 {
        image::load_from_memory(&image.bytes).unwrap().to_rgba8().get_pixel(0, 0)[3]
    }

    fn opaque_png() -> crate::ImageData {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([10, 20, 30]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        crate::ImageData::from_bytes(out.into_inner()).unwrap()
    }

    fn extracted_grace(background: Option<crate::ImageData>) -> FixedReader {
        FixedReader(ExtractedPresentation {
            title: "AMAZING GRACE".to_string(),
            subtitle: "JOHN NEWTON".to_string(),
            stanzas: vec![String::new(), "AMAZING GRACE".to_string()],
            foreground: None,
            background,
        })
    }

    #[test]
    fn test_restyle_applies_background_opacity() {
        let dir = TempDir::new().unwrap();
        let encoder = RecordingEncoder::default();
        let pipeline = Pipeline::new(
            GenerationConfig::new()
                .with_output_dir(dir.path())
                .with_background(ImageSource::Bytes(opaque_png()))
                .with_background_opacity(0.5),
            encoder.clone(),
        );

        pipeline
            .restyle(&extracted_grace(None), Path::new("old.pptx"))
            .unwrap();

        let decks = encoder.decks.lock().unwrap();
        let background = decks[0].slides[0].background().unwrap();
        assert_eq!(alpha_of(&background.image), 127);
    }

    #[test]
    fn test_restyle_opacity_applies_to_kept_background() {
        let dir = TempDir::new().unwrap();
        let encoder = RecordingEncoder::default();
        let pipeline = Pipeline::new(
            GenerationConfig::new()
                .with_output_dir(dir.path())
                .with_background_opacity(0.2),
            encoder.clone(),
        );

        pipeline
            .restyle(&extracted_grace(Some(opaque_png())), Path::new("old.pptx"))
            .unwrap();

        let decks = encoder.decks.lock().unwrap();
        let background = decks[0].slides[1].background().unwrap();
        assert_eq!(alpha_of(&background.image), 51);
    }
}
