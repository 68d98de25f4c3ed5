//! Whole-payload acquisition. Memory cost scales with payload size, bounded
//! solely by the byte cap; prefer the streamed strategy under memory pressure.

use async_trait::async_trait;
use reqwest::Client;

use super::{begin_fetch, map_transport_error, FetchError, ImageFetcher};
use crate::staged::StagedInput;

pub struct BufferedFetcher {
    client: Client,
    max_bytes: u64,
}

impl BufferedFetcher {
    pub fn new(client: Client, max_bytes: u64) -> Self {
        Self { client, max_bytes }
    }
}

#[async_trait]
impl ImageFetcher for BufferedFetcher {
    async fn fetch(&self, url: &str) -> Result<StagedInput, FetchError> {
        let (response, kind) = begin_fetch(&self.client, url, self.max_bytes).await?;

        let body = response.bytes().await.map_err(map_transport_error)?;

        // The declared length was already checked; this catches a misreported
        // or absent one.
        if body.len() as u64 > self.max_bytes {
            return Err(FetchError::TooLarge {
                received: body.len() as u64,
                limit: self.max_bytes,
            });
        }

        let staged = StagedInput::from_bytes(&body, kind).await?;

        tracing::debug!(
            url = %url,
            path = %staged.path.display(),
            size_bytes = staged.len,
            "Buffered fetch staged"
        );

        Ok(staged)
    }
}
