//! Where the finished collection goes.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

use crate::collection::FeatureCollection;
use crate::io::BlobWriter;

#[async_trait]
pub trait CollectionSink: Send + Sync {
    async fn emit(&self, collection: &FeatureCollection) -> Result<()>;
}

/// Pretty-printed JSON to a file, or to stdout when no path is set
pub struct JsonSink<W: BlobWriter> {
    writer: W,
    path: Option<PathBuf>,
}

impl<W: BlobWriter> JsonSink<W> {
    pub fn new(writer: W, path: Option<PathBuf>) -> Self {
        Self { writer, path }
    }
}

#[async_trait]
impl<W: BlobWriter> CollectionSink for JsonSink<W> {
    async fn emit(&self, collection: &FeatureCollection) -> Result<()> {
        let mut document = serde_json::to_vec_pretty(collection)?;
        document.push(b'\n');

        match &self.path {
            Some(path) => self.writer.write(path, &document).await,
            None => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(&document).await?;
                stdout.flush().await?;
                Ok(())
            }
        }
    }
}
