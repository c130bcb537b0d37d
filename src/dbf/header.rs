use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use super::DbfError;

const HEADER_SIZE: usize = 32;
const DESCRIPTOR_SIZE: usize = 32;
const HEADER_TERMINATOR: u8 = 0x0D;

/// Column storage type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Character,
    Numeric,
    Float,
    Date,
    Logical,
    Other(u8),
}

impl FieldType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            b'C' => FieldType::Character,
            b'N' => FieldType::Numeric,
            b'F' => FieldType::Float,
            b'D' => FieldType::Date,
            b'L' => FieldType::Logical,
            other => FieldType::Other(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Upper-cased column name
    pub name: String,
    pub field_type: FieldType,
    pub length: usize,
    pub decimals: u8,
}

#[derive(Debug, Clone)]
pub struct DbfHeader {
    pub version: u8,
    pub record_count: u32,
    pub header_len: usize,
    pub record_len: usize,
    pub fields: Vec<FieldDescriptor>,
}

impl DbfHeader {
    pub fn parse(data: &[u8]) -> Result<Self, DbfError> {
        if data.len() < HEADER_SIZE {
            return Err(DbfError::Truncated(format!(
                "{} bytes is shorter than the {}-byte header",
                data.len(),
                HEADER_SIZE
            )));
        }

        let version = data[0];
        let mut cursor = Cursor::new(&data[4..12]);
        let record_count = cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| DbfError::Truncated(e.to_string()))?;
        let header_len = cursor
            .read_u16::<LittleEndian>()
            .map_err(|e| DbfError::Truncated(e.to_string()))? as usize;
        let record_len = cursor
            .read_u16::<LittleEndian>()
            .map_err(|e| DbfError::Truncated(e.to_string()))? as usize;

        if header_len < HEADER_SIZE + 1 {
            return Err(DbfError::InvalidHeader(format!(
                "header length {header_len} is too small"
            )));
        }
        if data.len() < header_len {
            return Err(DbfError::Truncated(format!(
                "header declares {} bytes, table has {}",
                header_len,
                data.len()
            )));
        }

        let mut fields = Vec::new();
        let mut offset = HEADER_SIZE;
        while offset < header_len && data[offset] != HEADER_TERMINATOR {
            if offset + DESCRIPTOR_SIZE > header_len {
                return Err(DbfError::InvalidHeader(
                    "field descriptor runs past header".to_string(),
                ));
            }
            fields.push(FieldDescriptor::parse(
                &data[offset..offset + DESCRIPTOR_SIZE],
            ));
            offset += DESCRIPTOR_SIZE;
        }

        let data_width: usize = fields.iter().map(|f| f.length).sum();
        if data_width + 1 > record_len {
            return Err(DbfError::InvalidHeader(format!(
                "fields need {} bytes per record, header declares {}",
                data_width + 1,
                record_len
            )));
        }

        Ok(Self {
            version,
            record_count,
            header_len,
            record_len,
            fields,
        })
    }
}

impl FieldDescriptor {
    fn parse(raw: &[u8]) -> Self {
        let name_end = raw[..11].iter().position(|&b| b == 0).unwrap_or(11);
        let name = String::from_utf8_lossy(&raw[..name_end])
            .trim()
            .to_ascii_uppercase();

        Self {
            name,
            field_type: FieldType::from_u8(raw[11]),
            length: raw[16] as usize,
            decimals: raw[17],
        }
    }
}
