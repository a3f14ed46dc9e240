//! Fixture builders shared by the integration tests.
//!
//! Archives are assembled byte by byte so tests control every header field;
//! collections are real SQLite files created with rusqlite.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::Crc;
use flate2::write::DeflateEncoder;
use rusqlite::{Connection, params};
use serde_json::json;

pub const STORED: u16 = 0;
pub const DEFLATE: u16 = 8;

pub struct Entry {
    pub name: String,
    pub method: u16,
    pub payload: Vec<u8>,
    pub uncompressed_size: u32,
    pub crc32: u32,
    /// Size written to the central directory instead of the payload length.
    pub declared_size: Option<u32>,
}

impl Entry {
    pub fn stored(name: &str, data: &[u8]) -> Self {
        Self {
            name: name.into(),
            method: STORED,
            payload: data.to_vec(),
            uncompressed_size: data.len() as u32,
            crc32: crc(data),
            declared_size: None,
        }
    }

    pub fn deflated(name: &str, data: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        Self {
            name: name.into(),
            method: DEFLATE,
            payload: encoder.finish().unwrap(),
            uncompressed_size: data.len() as u32,
            crc32: crc(data),
            declared_size: None,
        }
    }

    /// An entry whose payload is taken as-is under an arbitrary method code.
    pub fn raw(name: &str, method: u16, payload: &[u8]) -> Self {
        Self {
            name: name.into(),
            method,
            payload: payload.to_vec(),
            uncompressed_size: payload.len() as u32,
            crc32: crc(payload),
            declared_size: None,
        }
    }
}

pub fn crc(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.sum()
}

/// Assemble a single-disk archive: local headers and payloads, central
/// directory, then the end record with an optional comment.
pub fn build_archive(entries: &[Entry], comment: &[u8]) -> Vec<u8> {
    const DOS_TIME: u16 = (10 << 11) | (30 << 5);
    const DOS_DATE: u16 = ((2024 - 1980) << 9) | (6 << 5) | 1;

    let mut out = Vec::new();
    let mut central = Vec::new();

    for entry in entries {
        let offset = out.len() as u32;
        let size = entry.declared_size.unwrap_or(entry.payload.len() as u32);

        out.extend_from_slice(b"PK\x03\x04");
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&entry.method.to_le_bytes());
        out.extend_from_slice(&DOS_TIME.to_le_bytes());
        out.extend_from_slice(&DOS_DATE.to_le_bytes());
        out.extend_from_slice(&entry.crc32.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(entry.name.as_bytes());
        out.extend_from_slice(&entry.payload);

        central.extend_from_slice(b"PK\x01\x02");
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&entry.method.to_le_bytes());
        central.extend_from_slice(&DOS_TIME.to_le_bytes());
        central.extend_from_slice(&DOS_DATE.to_le_bytes());
        central.extend_from_slice(&entry.crc32.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
        central.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u32.to_le_bytes());
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(entry.name.as_bytes());
    }

    let cd_offset = out.len() as u32;
    out.extend_from_slice(&central);

    out.extend_from_slice(b"PK\x05\x06");
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&(central.len() as u32).to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&(comment.len() as u16).to_le_bytes());
    out.extend_from_slice(comment);
    out
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

pub const SCHEMA: &str = "
CREATE TABLE col (
    id integer primary key, crt integer not null, mod integer not null,
    scm integer not null, ver integer not null, dty integer not null,
    usn integer not null, ls integer not null, conf text not null,
    models text not null, decks text not null, dconf text not null,
    tags text not null
);
CREATE TABLE notes (
    id integer primary key, guid text not null, mid integer not null,
    mod integer not null, usn integer not null, tags text not null,
    flds text not null, sfld integer not null, csum integer not null,
    flags integer not null, data text not null
);
CREATE TABLE cards (
    id integer primary key, nid integer not null, did integer not null,
    ord integer not null, mod integer not null, usn integer not null,
    type integer not null, queue integer not null, due integer not null,
    ivl integer not null, factor integer not null, reps integer not null,
    lapses integer not null, left integer not null, odue integer not null,
    odid integer not null, flags integer not null, data text not null
);
";

pub const MODEL_ID: i64 = 1_600_000_000_000;
pub const VOCAB_DECK: i64 = 1_700_000_000_001;

pub fn fixture_decks() -> String {
    json!({
        "1": {"id": 1, "name": "Default", "desc": "", "dyn": 0},
        VOCAB_DECK.to_string(): {"id": VOCAB_DECK, "name": "Vocabulary", "desc": "Everyday words", "dyn": 0},
    })
    .to_string()
}

pub fn fixture_models() -> String {
    json!({
        MODEL_ID.to_string(): {
            "id": MODEL_ID,
            "name": "Basic",
            "type": 0,
            "sortf": 0,
            "did": VOCAB_DECK,
            "css": ".card { font-family: arial; }",
            "flds": [
                {"name": "Front", "ord": 0, "sticky": false},
                {"name": "Back", "ord": 1, "sticky": false}
            ],
            "tmpls": [
                {"name": "Card 1", "ord": 0, "qfmt": "{{Front}}", "afmt": "{{FrontSide}}\n\n<hr id=answer>\n\n{{Back}}"}
            ]
        }
    })
    .to_string()
}

/// Create a collection with the given metadata blobs and the three fixture
/// notes and cards, returning the database bytes.
pub fn collection_with(decks: &str, models: &str) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("collection.anki2");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(SCHEMA).unwrap();

    conn.execute(
        "INSERT INTO col VALUES (1, 1700000000, 1700000123456, 1700000000000, 11, 0, 0, 0, '{}', ?1, ?2, '{}', '{}')",
        params![models, decks],
    )
    .unwrap();

    let notes: [(i64, &str, &str, &str, rusqlite::types::Value); 3] = [
        (101, "g-hello", " vocabulary test ", "Hello\x1fWorld", "Hello".to_string().into()),
        (102, "g-bonjour", "", "Bonjour\x1fHello", "Bonjour".to_string().into()),
        (103, "g-number", "numbers", "42\x1fforty-two", 42i64.into()),
    ];
    for (id, guid, tags, flds, sfld) in notes {
        conn.execute(
            "INSERT INTO notes VALUES (?1, ?2, ?3, 1700000100, -1, ?4, ?5, ?6, 0, 0, '')",
            params![id, guid, MODEL_ID, tags, flds, sfld],
        )
        .unwrap();
    }

    let cards: [(i64, i64, i64, i64, i64, i64); 3] = [
        // id, nid, did, type, queue, ivl
        (1001, 101, VOCAB_DECK, 0, 0, 0),
        (1002, 102, VOCAB_DECK, 2, 2, 12),
        (1003, 103, 1, 3, 1, 1),
    ];
    for (id, nid, did, ty, queue, ivl) in cards {
        conn.execute(
            "INSERT INTO cards VALUES (?1, ?2, ?3, 0, 1700000100, -1, ?4, ?5, ?6, ?7, 2500, 4, 1, 1001, 0, 0, 0, '')",
            params![id, nid, did, ty, queue, id, ivl],
        )
        .unwrap();
    }

    drop(conn);
    std::fs::read(&path).unwrap()
}

pub fn fixture_collection() -> Vec<u8> {
    collection_with(&fixture_decks(), &fixture_models())
}

pub const MEDIA_MANIFEST: &[u8] = br#"{"0": "hello.mp3", "1": "world.png"}"#;

/// The standard fixture package: deflated collection, media manifest and
/// two stored media files.
pub fn fixture_package() -> Vec<u8> {
    build_archive(
        &[
            Entry::deflated("collection.anki2", &fixture_collection()),
            Entry::stored("0", b"ID3 fake audio"),
            Entry::stored("1", b"\x89PNG fake image"),
            Entry::stored("media", MEDIA_MANIFEST),
        ],
        b"",
    )
}
