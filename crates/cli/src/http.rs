//! Blocking HTTP download of title art and backgrounds.

use reqwest::blocking::Client;
use slides_core::{Error, ImageData, ImageFetcher};
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> slides_core::Result<ImageData> {
        let fetch_error = |reason: String| Error::Fetch {
            source_name: url.to_string(),
            reason,
        };

        log::debug!("Downloading {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_error(e.to_string()))?;
        let bytes = response.bytes().map_err(|e| fetch_error(e.to_string()))?;

        ImageData::from_bytes(bytes.to_vec())
    }
}
