//! ZIP archive reading.
//!
//! - [`structures`]: fixed records of the format (EOCD, ZIP64, file headers)
//! - [`parser`]: Central Directory parsing over any [`ReadAt`](crate::io::ReadAt)
//! - [`archive`]: [`ZipArchive`], the member listing and member byte access
//!
//! Only single-disk archives without encryption are read. STORED and
//! DEFLATE members are supported, which covers the fire bundles.

mod archive;
mod parser;
mod structures;

pub use archive::ZipArchive;
pub use parser::ZipParser;
pub use structures::*;
