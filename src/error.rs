use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while reading a package.
///
/// Every variant is fatal to the call that raised it; nothing is retried
/// and no partially decoded [`Package`](crate::Package) is handed back.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The path does not resolve to a readable regular file.
    #[error("Package file not found or unreadable: {}", path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No End of Central Directory record, or a header with a bad signature.
    #[error("Not a valid ZIP archive: {0}")]
    InvalidArchive(String),

    /// The requested name is not in the central directory.
    #[error("Entry not found in archive: {0}")]
    EntryNotFound(String),

    /// Declared structure or payload runs past the end of the file.
    #[error("Truncated archive: {0}")]
    TruncatedArchive(String),

    #[error("Unsupported compression method {method} for entry {name}")]
    UnsupportedCompression { name: String, method: u16 },

    /// The deflate stream of an entry could not be inflated.
    #[error("Corrupt compressed data in entry {name}: {source}")]
    CorruptEntry {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Only raised when checksum verification is switched on.
    #[error("CRC-32 mismatch for entry {name}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    /// The archive holds no collection database entry.
    #[error("Package contains no collection database")]
    MissingDatabase,

    /// A metadata blob or manifest could not be decoded.
    #[error("Malformed collection ({what}): {reason}")]
    MalformedCollection { what: String, reason: String },

    /// SQLite error while opening or querying the collection.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic I/O error (e.g. writing the temporary collection file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    pub(crate) fn malformed(what: impl Into<String>, reason: impl ToString) -> Self {
        ImportError::MalformedCollection {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
