//! Loading title art and background pictures.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use crate::layout::SlideImages;
use crate::types::{ImageData, ImageFormat};
use crate::{Error, Result};

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Remote image, loaded through an [`ImageFetcher`].
    Url(String),
    /// Image file on disk.
    File(PathBuf),
    /// Image already in memory.
    Bytes(ImageData),
}

impl ImageSource {
    /// Human-readable origin for error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::File(path) => path.display().to_string(),
            Self::Bytes(_) => "in-memory image".to_string(),
        }
    }
}

/// Downloads remote images.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<ImageData>;
}

/// Fetcher for offline runs; every request fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

impl ImageFetcher for OfflineFetcher {
    fn fetch(&self, url: &str) -> Result<ImageData> {
        Err(Error::Fetch {
            source_name: url.to_string(),
            reason: "network access is disabled".to_string(),
        })
    }
}

/// What to do when the user-selected background image cannot be loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Fail the current item.
    #[default]
    Abort,
    /// Log a warning and generate without a background.
    Skip,
}

/// Load an image from any source.
pub fn load_image(source: &ImageSource, fetcher: &dyn ImageFetcher) -> Result<ImageData> {
    match source {
        ImageSource::Url(url) => fetcher.fetch(url),
        ImageSource::File(path) => {
            let bytes = fs::read(path).map_err(|e| Error::Fetch {
                source_name: path.display().to_string(),
                reason: e.to_string(),
            })?;
            ImageData::from_bytes(bytes)
        }
        ImageSource::Bytes(data) => Ok(data.clone()),
    }
}

/// Load the images for one presentation.
///
/// Title art is optional context: a failure is logged and the art is left
/// out. A failing background follows `background_policy`. When `opacity` is
/// set the background is made translucent.
pub fn resolve_images(
    foreground: Option<&ImageSource>,
    background: Option<&ImageSource>,
    fetcher: &dyn ImageFetcher,
    background_policy: FetchPolicy,
    opacity: Option<f32>,
) -> Result<SlideImages> {
    let foreground = match foreground {
        Some(source) => match load_image(source, fetcher) {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("Skipping title art from {}: {}", source.describe(), e);
                None
            }
        },
        None => None,
    };

    let background = match background {
        Some(source) => match load_image(source, fetcher) {
            Ok(image) => Some(image),
            Err(e) if background_policy == FetchPolicy::Skip => {
                log::warn!("Skipping background from {}: {}", source.describe(), e);
                None
            }
            Err(e) => return Err(e),
        },
        None => None,
    };

    let background = match (background, opacity) {
        (Some(image), Some(opacity)) => Some(apply_opacity(&image, opacity)?),
        (background, _) => background,
    };

    Ok(SlideImages {
        foreground,
        background,
    })
}

/// Set every pixel's alpha to `opacity` (0.0 to 1.0) and re-encode as PNG.
pub fn apply_opacity(image: &ImageData, opacity: f32) -> Result<ImageData> {
    let decoded =
        image::load_from_memory(&image.bytes).map_err(|e| Error::Image(e.to_string()))?;

    let mut rgba = decoded.to_rgba8();
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0) as u8;
    for pixel in rgba.pixels_mut() {
        pixel[3] = alpha;
    }

    if rgba.width() + rgba.height() > 2000 {
        log::debug!("Changing opacity of a large image ({}x{})", rgba.width(), rgba.height());
    }

    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(rgba)
        .write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| Error::Image(e.to_string()))?;

    Ok(ImageData {
        format: ImageFormat::Png,
        bytes: out.into_inner(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn sample_png() -> ImageData {
        let img = RgbImage::from_pixel(2, 2, Rgb([200, 10, 10]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        ImageData::from_bytes(out.into_inner()).unwrap()
    }

    struct FixedFetcher(ImageData);

    impl ImageFetcher for FixedFetcher {
        fn fetch(&self, _url: &str) -> Result<ImageData> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_apply_opacity() {
        let result = apply_opacity(&sample_png(), 0.5).unwrap();
        assert_eq!(result.format, ImageFormat::Png);

        let decoded = image::load_from_memory(&result.bytes).unwrap().to_rgba8();
        assert!(decoded.pixels().all(|p| p[3] == 127 && p[0] == 200));
    }

    #[test]
    fn test_apply_opacity_rejects_garbage() {
        let data = ImageData {
            format: ImageFormat::Png,
            bytes: vec![0x89, b'P', b'N', b'G'],
        };
        assert!(matches!(apply_opacity(&data, 0.5), Err(Error::Image(_))));
    }

    #[test]
    fn test_failed_title_art_is_skipped() {
        let images = resolve_images(
            Some(&ImageSource::Url("http://example.invalid/a.png".to_string())),
            None,
            &OfflineFetcher,
            FetchPolicy::Abort,
            None,
        )
        .unwrap();
        assert_eq!(images, SlideImages::default());
    }

    #[test]
    fn test_failed_background_follows_policy() {
        let source = ImageSource::File(PathBuf::from("/definitely/missing.png"));

        let err = resolve_images(None, Some(&source), &OfflineFetcher, FetchPolicy::Abort, None)
            .unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));

        let images =
            resolve_images(None, Some(&source), &OfflineFetcher, FetchPolicy::Skip, None).unwrap();
        assert!(images.background.is_none());
    }

    #[test]
    fn test_fetched_images_are_used() {
        let png = sample_png();
        let images = resolve_images(
            Some(&ImageSource::Url("http://art".to_string())),
            Some(&ImageSource::Bytes(png.clone())),
            &FixedFetcher(png.clone()),
            FetchPolicy::Abort,
            None,
        )
        .unwrap();
        assert_eq!(images.foreground, Some(png.clone()));
        assert_eq!(images.background, Some(png));
    }
}
