//! Byte-level I/O collaborators.
//!
//! - [`ReadAt`]: random access over an archive's bytes (see [`MemoryReader`])
//! - [`BlobFetcher`]: retrieve the raw bytes behind a URL (see [`HttpFetcher`])
//! - [`BlobWriter`]: durably store bytes at a path (see [`FsWriter`])

mod http;
mod local;
mod memory;

pub use http::HttpFetcher;
pub use local::FsWriter;
pub use memory::MemoryReader;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;
}

/// Retrieves the complete body behind a URL.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Persists a byte buffer at a destination path.
///
/// Implementations create any missing parent directories.
#[async_trait]
pub trait BlobWriter: Send + Sync {
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;
}
