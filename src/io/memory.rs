use anyhow::{Result, bail};
use async_trait::async_trait;

use super::ReadAt;

/// Random access over a fully downloaded archive held in memory
pub struct MemoryReader {
    data: Vec<u8>,
}

impl MemoryReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let size = self.size();
        if offset > size {
            bail!("Read offset {} past end of data ({} bytes)", offset, size);
        }

        let start = offset as usize;
        let end = (start + buf.len()).min(self.data.len());
        let n = end - start;
        if n < buf.len() {
            bail!(
                "Short read: wanted {} bytes at offset {}, only {} available",
                buf.len(),
                offset,
                n
            );
        }

        buf.copy_from_slice(&self.data[start..end]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_exact_window() {
        let reader = MemoryReader::new(b"0123456789".to_vec());
        let mut buf = [0u8; 4];
        let n = reader.read_at(3, &mut buf).await.unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf, b"3456");
        assert_eq!(reader.size(), 10);
    }

    #[tokio::test]
    async fn short_read_is_an_error() {
        let reader = MemoryReader::new(b"abc".to_vec());
        let mut buf = [0u8; 4];
        assert!(reader.read_at(1, &mut buf).await.is_err());
        assert!(reader.read_at(9, &mut buf).await.is_err());
    }
}
