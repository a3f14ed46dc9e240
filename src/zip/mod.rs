//! ZIP archive parsing and extraction.
//!
//! Packages are ordinary ZIP archives, read here without any archive
//! library: only the byte layout is interpreted.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`extractor`]: Lookup by name and decompression
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! The EOCD is read first (from the end of the file), then the Central
//! Directory, so entries can be listed without reading any payload.
//!
//! ## Supported Features
//!
//! - ZIP64 extensions for files > 4GB
//! - STORED (no compression) method
//! - DEFLATE compression method
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No BZIP2, LZMA, or other compression methods
//! - CRC-32 values are read but only checked on request

mod extractor;
mod parser;
mod structures;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;

use crate::error::Result;

/// Names of every entry in an in-memory archive, in central directory order.
pub fn list_entries(bytes: &[u8]) -> Result<Vec<String>> {
    Ok(ZipExtractor::new(bytes)
        .list_files()?
        .into_iter()
        .map(|e| e.file_name)
        .collect())
}

/// Contents of the entry called `name`, inflated if it was deflated.
pub fn extract_entry(bytes: &[u8], name: &str) -> Result<Vec<u8>> {
    ZipExtractor::new(bytes).extract(name)
}
