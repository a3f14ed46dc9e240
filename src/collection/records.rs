//! Fixed-shape decoding of collection rows and metadata blobs.
//!
//! Each table gets one explicit column list and one row mapper; the JSON
//! blobs in the `col` row get serde shapes that are projected onto the
//! public [`package`](crate::package) types.

use rusqlite::Row;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ImportError, Result};
use crate::package::{Card, Deck, Model, ModelKind, Note, Template};

/// Separator between the values of a note's packed field string.
pub const FIELD_SEPARATOR: char = '\x1f';

pub(crate) const COL_QUERY: &str = "SELECT crt, mod, ver, decks, models FROM col LIMIT 1";

pub(crate) const NOTES_QUERY: &str = "SELECT id, guid, mid, mod, tags, flds, sfld FROM notes";

pub(crate) const CARDS_QUERY: &str = "SELECT id, nid, did, ord, type, queue, due, ivl, factor, \
     reps, lapses, \"left\", odue, odid, flags FROM cards";

/// The single metadata row, blobs still undecoded.
pub(crate) struct ColRow {
    pub created: i64,
    pub modified: i64,
    pub schema_version: i64,
    pub decks: String,
    pub models: String,
}

pub(crate) fn row_to_col(row: &Row<'_>) -> rusqlite::Result<ColRow> {
    Ok(ColRow {
        created: row.get(0)?,
        modified: row.get(1)?,
        schema_version: row.get(2)?,
        decks: row.get(3)?,
        models: row.get(4)?,
    })
}

pub(crate) fn row_to_note(row: &Row<'_>) -> rusqlite::Result<Note> {
    let tags: String = row.get(4)?;
    let flds: String = row.get(5)?;

    Ok(Note {
        id: row.get(0)?,
        guid: row.get(1)?,
        model_id: row.get(2)?,
        modified: row.get(3)?,
        fields: split_fields(&flds),
        tags: split_tags(&tags),
        sort_field: value_to_text(row.get_ref(6)?),
    })
}

pub(crate) fn row_to_card(row: &Row<'_>) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        note_id: row.get(1)?,
        deck_id: row.get(2)?,
        template_ordinal: row.get(3)?,
        card_type: row.get::<_, i64>(4)?.into(),
        queue: row.get(5)?,
        due: row.get(6)?,
        interval: row.get(7)?,
        ease_factor: row.get(8)?,
        reps: row.get(9)?,
        lapses: row.get(10)?,
        remaining_steps: row.get(11)?,
        original_due: row.get(12)?,
        original_deck_id: row.get(13)?,
        flags: row.get(14)?,
    })
}

/// Split a packed field string; `n` separators always give `n + 1` values.
pub fn split_fields(packed: &str) -> Vec<String> {
    packed.split(FIELD_SEPARATOR).map(str::to_owned).collect()
}

/// Split a tag string on whitespace, dropping empty tokens.
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split_whitespace().map(str::to_owned).collect()
}

/// `sfld` is declared with integer affinity, so numeric sort fields come
/// back as numbers.
fn value_to_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Default for Flag {
    fn default() -> Self {
        Flag::Bool(false)
    }
}

impl Flag {
    fn is_set(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Int(i) => *i != 0,
        }
    }
}

#[derive(Deserialize)]
struct DeckRecord {
    name: String,
    #[serde(default)]
    desc: String,
    #[serde(default, rename = "dyn")]
    dynamic: Flag,
}

#[derive(Deserialize)]
struct FieldRecord {
    name: String,
}

#[derive(Deserialize)]
struct TemplateRecord {
    name: String,
    #[serde(default)]
    qfmt: String,
    #[serde(default)]
    afmt: String,
}

#[derive(Deserialize)]
struct ModelRecord {
    name: String,
    #[serde(default, rename = "type")]
    kind: i64,
    #[serde(default)]
    flds: Vec<FieldRecord>,
    #[serde(default)]
    tmpls: Vec<TemplateRecord>,
    #[serde(default)]
    css: String,
    #[serde(default)]
    sortf: usize,
}

/// Parse a blob keyed by string-encoded ids, keeping the blob's own order.
fn parse_keyed<T: DeserializeOwned, U>(
    what: &str,
    blob: &str,
    project: impl Fn(i64, T) -> U,
) -> Result<Vec<U>> {
    let object: Map<String, Value> =
        serde_json::from_str(blob).map_err(|e| ImportError::malformed(what, e))?;

    object
        .into_iter()
        .map(|(key, value)| {
            let id: i64 = key
                .parse()
                .map_err(|_| ImportError::malformed(what, format!("id {key:?} is not an integer")))?;
            let record: T = serde_json::from_value(value)
                .map_err(|e| ImportError::malformed(what, format!("entry {key}: {e}")))?;
            Ok(project(id, record))
        })
        .collect()
}

pub(crate) fn parse_decks(blob: &str) -> Result<Vec<Deck>> {
    parse_keyed("decks", blob, |id, deck: DeckRecord| Deck {
        id,
        name: deck.name,
        description: deck.desc,
        filtered: deck.dynamic.is_set(),
    })
}

pub(crate) fn parse_models(blob: &str) -> Result<Vec<Model>> {
    parse_keyed("models", blob, |id, model: ModelRecord| Model {
        id,
        name: model.name,
        kind: ModelKind::from(model.kind),
        fields: model.flds.into_iter().map(|f| f.name).collect(),
        templates: model
            .tmpls
            .into_iter()
            .map(|t| Template {
                name: t.name,
                question_format: t.qfmt,
                answer_format: t.afmt,
            })
            .collect(),
        css: model.css,
        sort_field_index: model.sortf,
    })
}
