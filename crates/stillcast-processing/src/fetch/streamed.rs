//! Chunk-by-chunk acquisition with a running byte count. The transfer is
//! aborted the instant the cap is exceeded and the partial file discarded.

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use tokio::io::AsyncWriteExt;

use super::{begin_fetch, map_transport_error, FetchError, ImageFetcher};
use crate::staged::StagedInput;

pub struct StreamingFetcher {
    client: Client,
    max_bytes: u64,
}

impl StreamingFetcher {
    pub fn new(client: Client, max_bytes: u64) -> Self {
        Self { client, max_bytes }
    }

    async fn stream_to_file(&self, response: Response, path: &Path) -> Result<u64, FetchError> {
        let mut file = tokio::fs::File::create(path).await?;
        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_transport_error)?;
            received += chunk.len() as u64;

            if received > self.max_bytes {
                // Returning drops the stream, which aborts the transfer.
                return Err(FetchError::TooLarge {
                    received,
                    limit: self.max_bytes,
                });
            }

            file.write_all(&chunk).await?;
        }

        file.sync_all().await?;
        Ok(received)
    }
}

#[async_trait]
impl ImageFetcher for StreamingFetcher {
    async fn fetch(&self, url: &str) -> Result<StagedInput, FetchError> {
        let (response, kind) = begin_fetch(&self.client, url, self.max_bytes).await?;

        let path = StagedInput::allocate_path(kind);
        match self.stream_to_file(response, &path).await {
            Ok(len) => {
                tracing::debug!(
                    url = %url,
                    path = %path.display(),
                    size_bytes = len,
                    "Streamed fetch staged"
                );
                Ok(StagedInput { path, kind, len })
            }
            Err(e) => {
                if let Err(cleanup_err) = tokio::fs::remove_file(&path).await {
                    if cleanup_err.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(
                            path = %path.display(),
                            error = %cleanup_err,
                            "Failed to remove partial download"
                        );
                    }
                }
                Err(e)
            }
        }
    }
}
