use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::Read;
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// An opened archive: the member listing plus on-demand member access
pub struct ZipArchive<R: ReadAt> {
    parser: ZipParser<R>,
    entries: Vec<ZipFileEntry>,
}

impl<R: ReadAt> ZipArchive<R> {
    /// Open the archive and read its Central Directory
    pub async fn open(reader: Arc<R>) -> Result<Self> {
        let parser = ZipParser::new(reader);
        let entries = parser.list_files().await?;
        Ok(Self { parser, entries })
    }

    /// All members, in Central Directory order
    pub fn members(&self) -> &[ZipFileEntry] {
        &self.entries
    }

    /// Decompressed bytes of one member, checked against its CRC-32
    pub async fn member_bytes(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let data_offset = self.parser.get_data_offset(entry).await?;
        let archive_size = self.parser.reader().size();
        if data_offset.saturating_add(entry.compressed_size) > archive_size {
            bail!("{}: member data extends past end of archive", entry.file_name);
        }

        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser.reader().read_at(data_offset, &mut raw).await?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                // The declared size is untrusted: stop one byte past it so an
                // oversized stream fails the length check below
                let mut out = Vec::new();
                DeflateDecoder::new(raw.as_slice())
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut out)?;
                out
            }
            CompressionMethod::Unknown(method) => {
                bail!(
                    "{}: unsupported compression method {} (only STORED and DEFLATE are supported)",
                    entry.file_name,
                    method
                );
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "{}: expected {} bytes, decompressed {}",
                entry.file_name,
                entry.uncompressed_size,
                data.len()
            );
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!(
                "{}: CRC-32 mismatch (expected {:08x}, got {:08x})",
                entry.file_name,
                entry.crc32,
                crc.sum()
            );
        }

        Ok(data)
    }
}
