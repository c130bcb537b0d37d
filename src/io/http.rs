use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::BlobFetcher;
use anyhow::{Result, bail};

/// Whole-body HTTP fetcher for remote fire bundles
pub struct HttpFetcher {
    client: Client,
    transferred_bytes: AtomicU64,
    max_retry: u32,
}

impl HttpFetcher {
    /// Create a fetcher with a per-request timeout and a retry budget for
    /// connect/timeout failures
    pub fn new(timeout: Duration, max_retry: u32) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, max_retry))
    }

    pub fn with_client(client: Client, max_retry: u32) -> Self {
        Self {
            client,
            transferred_bytes: AtomicU64::new(0),
            max_retry: max_retry.max(1),
        }
    }

    /// The underlying client, shared with other HTTP collaborators
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl BlobFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut retry_count = 0;

        loop {
            match self.client.get(url).send().await {
                Ok(resp) => {
                    if !resp.status().is_success() {
                        bail!("HTTP request failed with status: {}", resp.status());
                    }

                    let bytes = resp.bytes().await?;
                    self.transferred_bytes
                        .fetch_add(bytes.len() as u64, Ordering::Relaxed);
                    debug!(url, bytes = bytes.len(), "Fetched");
                    return Ok(bytes.to_vec());
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count >= self.max_retry {
                        bail!("Max retries exceeded for {}: {}", url, e);
                    }
                    warn!(
                        url,
                        retry = retry_count,
                        max_retry = self.max_retry,
                        error = %e,
                        "Connection error, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(500 * retry_count as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
