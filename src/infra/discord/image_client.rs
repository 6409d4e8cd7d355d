use reqwest::Client;

use crate::core::snapshot::guild_source::SourceError;

/// Minimal HTTP client for downloading image bytes. It deliberately
/// exposes only the single call the snapshot path needs.
pub struct ImageClient {
    client: Client,
}

impl ImageClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Download the raw bytes behind an image URL.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SourceError::Http(format!(
                "{} returned {}",
                url,
                resp.status()
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}

impl Default for ImageClient {
    fn default() -> Self {
        Self::new()
    }
}
