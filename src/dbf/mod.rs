//! dBASE table decoding.
//!
//! Fire bundles carry their attribute tables as `.dbf` files. A table is a
//! 32-byte header, one 32-byte descriptor per field terminated by `0x0D`,
//! then fixed-width records, each prefixed with a deletion flag.
//!
//! [`DbfReader`] is a plain single-pass [`Iterator`] over the live records
//! of one table.

mod header;
mod reader;
mod value;

pub use header::{DbfHeader, FieldDescriptor, FieldType};
pub use reader::DbfReader;
pub use value::{FieldValue, Row};

use thiserror::Error;

/// Structural problems with a table's bytes
#[derive(Error, Debug)]
pub enum DbfError {
    #[error("table truncated: {0}")]
    Truncated(String),

    #[error("invalid table header: {0}")]
    InvalidHeader(String),
}
