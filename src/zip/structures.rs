use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use anyhow::{Result, bail};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid End of Central Directory");
        }

        // Skip signature and the two disk numbers; multi-disk archives are not supported
        let mut cursor = Cursor::new(&data[8..]);

        Ok(Self {
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64EOCDLocator {
    pub eocd64_offset: u64,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 locator");
        }

        let mut cursor = Cursor::new(&data[8..]);
        Ok(Self {
            eocd64_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EOCD {
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("Invalid ZIP64 End of Central Directory");
        }

        // Entry counts start after size (8), versions (4) and disk numbers (8)
        let mut cursor = Cursor::new(&data[32..]);
        let total_entries = cursor.read_u64::<LittleEndian>()?;
        let cd_size = cursor.read_u64::<LittleEndian>()?;
        let cd_offset = cursor.read_u64::<LittleEndian>()?;

        Ok(Self {
            total_entries,
            cd_size,
            cd_offset,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// One member of an archive, as listed in the central directory
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub is_directory: bool,
}

impl ZipFileEntry {
    /// Final path component of the member name
    pub fn base_name(&self) -> &str {
        self.file_name
            .rsplit('/')
            .next()
            .unwrap_or(&self.file_name)
    }

    /// Lower-cased extension of the member name, if any
    pub fn extension(&self) -> Option<String> {
        let base = self.base_name();
        base.rfind('.')
            .filter(|&dot| dot > 0)
            .map(|dot| base[dot + 1..].to_ascii_lowercase())
    }

    /// Label between the last `_` and the extension.
    ///
    /// `or4217012345620170715_desc.dbf` yields `desc`. Names without `_`
    /// yield the whole stem.
    pub fn class_tag(&self) -> &str {
        let base = self.base_name();
        let stem = match base.rfind('.') {
            Some(dot) if dot > 0 => &base[..dot],
            _ => base,
        };
        match stem.rfind('_') {
            Some(underscore) => &stem[underscore + 1..],
            None => stem,
        }
    }

    /// The member name as a relative path, or `None` when it is absolute
    /// or climbs out of its root with `..`
    pub fn relative_path(&self) -> Option<PathBuf> {
        let path = Path::new(&self.file_name);
        let safe = path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if safe && !self.file_name.is_empty() {
            Some(path.to_path_buf())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> ZipFileEntry {
        ZipFileEntry {
            file_name: name.to_string(),
            compression_method: CompressionMethod::Stored,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset: 0,
            is_directory: name.ends_with('/'),
        }
    }

    #[test]
    fn class_tag_is_text_between_last_underscore_and_extension() {
        assert_eq!(entry("or4217012345620170715_desc.dbf").class_tag(), "desc");
        assert_eq!(entry("bundle/or42_2017_rep.dbf").class_tag(), "rep");
        assert_eq!(entry("metadata.pdf").class_tag(), "metadata");
        assert_eq!(entry("dir_x/plain").class_tag(), "plain");
    }

    #[test]
    fn extension_is_lower_cased() {
        assert_eq!(entry("fire_map.KMZ").extension().as_deref(), Some("kmz"));
        assert_eq!(entry("README").extension(), None);
        assert_eq!(entry(".hidden").extension(), None);
    }

    #[test]
    fn relative_path_rejects_escapes() {
        assert!(entry("sub/fire.kmz").relative_path().is_some());
        assert!(entry("../fire.kmz").relative_path().is_none());
        assert!(entry("/etc/passwd").relative_path().is_none());
        assert!(entry("a/../../b").relative_path().is_none());
    }

    #[test]
    fn compression_method_round_trips_known_codes() {
        assert_eq!(CompressionMethod::from_u16(8), CompressionMethod::Deflate);
        assert_eq!(CompressionMethod::from_u16(12).as_u16(), 12);
    }
}
