//! # apkg-import
//!
//! Reads flashcard `.apkg` packages into typed decks, note models, notes and
//! cards.
//!
//! A package is a ZIP archive holding an SQLite "collection" plus a JSON
//! media manifest. Both layers are parsed here: the archive by hand (no
//! archive library), the collection through a read-only SQLite connection.
//!
//! ## Features
//!
//! - Archive listing that reads only the central directory
//! - STORED and DEFLATE entries, ZIP64 sizes and offsets
//! - Decks, models (fields and templates), notes and cards with raw scheduling state
//! - Media manifest decoding
//! - Opt-in CRC-32 verification and an id-reference integrity report
//!
//! ## Example
//!
//! ```no_run
//! fn main() -> apkg_import::Result<()> {
//!     let entries = apkg_import::list_contents("deck.apkg")?;
//!     assert!(entries.iter().any(|e| e.starts_with("collection.anki2")));
//!
//!     let package = apkg_import::parse_package("deck.apkg")?;
//!     for note in &package.notes {
//!         println!("{}: {}", note.guid, note.fields.join(" | "));
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod collection;
pub mod error;
pub mod io;
pub mod package;
pub mod zip;

pub use cli::Cli;
pub use collection::{
    COLLECTION_ENTRY, ImportOptions, list_contents, parse_package, parse_package_bytes,
    parse_package_with,
};
pub use error::{ImportError, Result};
pub use io::{LocalFileReader, ReadAt};
pub use package::*;
pub use zip::{ZipExtractor, ZipFileEntry, extract_entry, list_entries};
