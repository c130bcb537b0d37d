use super::BlobWriter;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem writer for exported archive members
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWriter;

#[async_trait]
impl BlobWriter for FsWriter {
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = fs::File::create(path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        Ok(())
    }
}
