use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::Read;

use crate::error::{ImportError, Result};
use crate::io::ReadAt;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
    verify_checksums: bool,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            parser: ZipParser::new(reader),
            verify_checksums: false,
        }
    }

    /// Compare the CRC-32 of every extracted entry with its central
    /// directory value. Off by default.
    pub fn verify_checksums(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    /// List all files in the archive
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files()
    }

    /// Look up a single entry by its exact archive path.
    pub fn find(&self, name: &str) -> Result<ZipFileEntry> {
        self.list_files()?
            .into_iter()
            .find(|e| e.file_name == name)
            .ok_or_else(|| ImportError::EntryNotFound(name.to_string()))
    }

    /// Extract file data to memory
    pub fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let data = match entry.compression_method {
            CompressionMethod::Stored => self.parser.read_payload(entry)?,
            CompressionMethod::Deflate => inflate(entry, &self.parser.read_payload(entry)?)?,
            CompressionMethod::Unknown(method) => {
                return Err(ImportError::UnsupportedCompression {
                    name: entry.file_name.clone(),
                    method,
                });
            }
        };

        if self.verify_checksums {
            let mut crc = Crc::new();
            crc.update(&data);
            if crc.sum() != entry.crc32 {
                return Err(ImportError::ChecksumMismatch {
                    name: entry.file_name.clone(),
                    expected: entry.crc32,
                    actual: crc.sum(),
                });
            }
        }

        tracing::debug!(
            entry = %entry.file_name,
            method = entry.compression_method.as_u16(),
            bytes = data.len(),
            "extracted entry"
        );
        Ok(data)
    }

    /// Find an entry by name and extract it.
    pub fn extract(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self.find(name)?;
        self.extract_to_memory(&entry)
    }
}

fn inflate(entry: &ZipFileEntry, payload: &[u8]) -> Result<Vec<u8>> {
    // The declared size is only a hint; cap it so a lying header can't
    // force a huge allocation up front.
    let hint = (entry.uncompressed_size as usize).min(payload.len().saturating_mul(16));
    let mut data = Vec::with_capacity(hint);
    DeflateDecoder::new(payload)
        .read_to_end(&mut data)
        .map_err(|source| ImportError::CorruptEntry {
            name: entry.file_name.clone(),
            source,
        })?;
    Ok(data)
}
