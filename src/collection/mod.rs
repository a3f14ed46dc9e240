//! Collection decoding: from a package file to a [`Package`].
//!
//! A package is a ZIP archive holding a SQLite collection (`collection.anki21`
//! or `collection.anki2`) and a `media` manifest. Decoding is one synchronous
//! call with no shared state, so concurrent calls (even on the same file)
//! don't interfere.

mod media;
mod records;
mod store;

pub use media::MEDIA_ENTRY;
pub use records::{FIELD_SEPARATOR, split_fields, split_tags};

use std::path::Path;

use rusqlite::Connection;

use crate::error::{ImportError, Result};
use crate::io::LocalFileReader;
use crate::package::{CollectionInfo, Package};
use crate::zip::{ZipExtractor, ZipFileEntry};

use records::{COL_QUERY, CARDS_QUERY, NOTES_QUERY};
use store::CollectionStore;

/// Canonical collection entry name.
pub const COLLECTION_ENTRY: &str = "collection.anki2";

/// Collection entry written by newer clients alongside a stub `collection.anki2`.
pub const COLLECTION_ENTRY_V21: &str = "collection.anki21";

/// Knobs for a single import.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Entry names to try for the collection, first match wins.
    pub collection_entries: Vec<String>,
    /// Check each extracted entry's CRC-32. The format does not require it.
    pub verify_checksums: bool,
    /// Decode the `media` manifest.
    pub include_media: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            collection_entries: vec![COLLECTION_ENTRY_V21.into(), COLLECTION_ENTRY.into()],
            verify_checksums: false,
            include_media: true,
        }
    }
}

/// Parse the package at `path` with default options.
pub fn parse_package(path: impl AsRef<Path>) -> Result<Package> {
    parse_package_with(path, &ImportOptions::default())
}

pub fn parse_package_with(path: impl AsRef<Path>, options: &ImportOptions) -> Result<Package> {
    let path = path.as_ref();
    let bytes = read_package_file(path)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "parsing package");
    parse_package_bytes(&bytes, options)
}

/// Parse a package already held in memory.
pub fn parse_package_bytes(bytes: &[u8], options: &ImportOptions) -> Result<Package> {
    let archive = ZipExtractor::new(bytes).verify_checksums(options.verify_checksums);
    let entries = archive.list_files()?;

    let collection_entry = find_collection(&entries, options)?;
    let collection = archive.extract_to_memory(collection_entry)?;

    let media = match entries.iter().find(|e| e.file_name == MEDIA_ENTRY) {
        Some(entry) if options.include_media => {
            media::parse_manifest(&archive.extract_to_memory(entry)?)?
        }
        _ => Vec::new(),
    };

    let store = CollectionStore::open(&collection)?;
    let decoded = decode_collection(store.conn(), &collection_entry.file_name);
    let closed = store.close();
    let mut package = decoded?;
    closed?;

    package.media = media;

    tracing::debug!(
        decks = package.decks.len(),
        models = package.models.len(),
        notes = package.notes.len(),
        cards = package.cards.len(),
        media = package.media.len(),
        "parsed package"
    );
    Ok(package)
}

/// Names of every entry in the package, reading only the central directory.
pub fn list_contents(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let reader = LocalFileReader::new(path.as_ref())?;
    Ok(ZipExtractor::new(reader)
        .list_files()?
        .into_iter()
        .map(|e| e.file_name)
        .collect())
}

fn read_package_file(path: &Path) -> Result<Vec<u8>> {
    let not_found = |source| ImportError::FileNotFound {
        path: path.to_path_buf(),
        source,
    };
    let metadata = std::fs::metadata(path).map_err(not_found)?;
    if !metadata.is_file() {
        return Err(not_found(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    std::fs::read(path).map_err(not_found)
}

fn find_collection<'a>(
    entries: &'a [ZipFileEntry],
    options: &ImportOptions,
) -> Result<&'a ZipFileEntry> {
    options
        .collection_entries
        .iter()
        .find_map(|name| entries.iter().find(|e| &e.file_name == name))
        .inspect(|entry| tracing::debug!(entry = %entry.file_name, "found collection"))
        .ok_or(ImportError::MissingDatabase)
}

/// Run the fixed queries; media is filled in by the caller.
fn decode_collection(conn: &Connection, source_entry: &str) -> Result<Package> {
    let col = conn
        .query_row(COL_QUERY, [], records::row_to_col)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                ImportError::malformed("col", "metadata row is missing")
            }
            other => ImportError::Database(other),
        })?;

    let decks = records::parse_decks(&col.decks)?;
    let models = records::parse_models(&col.models)?;

    let mut stmt = conn.prepare(NOTES_QUERY)?;
    let notes = stmt
        .query_map([], records::row_to_note)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(CARDS_QUERY)?;
    let cards = stmt
        .query_map([], records::row_to_card)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    tracing::debug!(notes = notes.len(), cards = cards.len(), "queried collection");

    Ok(Package {
        info: CollectionInfo {
            source_entry: source_entry.to_string(),
            created: col.created,
            modified: col.modified,
            schema_version: col.schema_version,
        },
        decks,
        models,
        notes,
        cards,
        media: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection_with_decks(decks: &str) -> Vec<u8> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.db");
        let conn = Connection::open(&path).unwrap();
        conn.query_row("PRAGMA journal_mode=WAL", [], |r| r.get::<_, String>(0))
            .unwrap();
        conn.execute_batch(
            "CREATE TABLE col (id INTEGER PRIMARY KEY, crt INTEGER, mod INTEGER, ver INTEGER, \
             decks TEXT, models TEXT);",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO col VALUES (1, 0, 0, 11, ?1, '{}')",
            [decks],
        )
        .unwrap();
        drop(conn);
        std::fs::read(&path).unwrap()
    }

    #[test]
    fn store_is_removed_when_decoding_fails() {
        let store = CollectionStore::open(&collection_with_decks("[1, 2]")).unwrap();
        let dir = store.dir().to_path_buf();

        let decoded = decode_collection(store.conn(), COLLECTION_ENTRY);
        assert!(matches!(
            decoded,
            Err(ImportError::MalformedCollection { ref what, .. }) if what == "decks"
        ));

        store.close().unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn decodes_metadata_row() {
        let store = CollectionStore::open(&collection_with_decks(
            r#"{"1": {"name": "Default"}}"#,
        ))
        .unwrap();
        let col = store
            .conn()
            .query_row(COL_QUERY, [], records::row_to_col)
            .unwrap();
        assert_eq!(col.schema_version, 11);
        store.close().unwrap();
    }
}
