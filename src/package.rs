//! Typed, immutable view of one imported package.
//!
//! Every struct derives `Serialize` and `Deserialize` so a [`Package`] can be
//! handed to the mapping layer (or dumped as JSON) as-is. Cross references
//! between collections are plain ids, never pointers.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Everything decoded from one package file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub info: CollectionInfo,
    pub decks: Vec<Deck>,
    pub models: Vec<Model>,
    pub notes: Vec<Note>,
    pub cards: Vec<Card>,
    /// Media manifest; empty when the archive has none.
    pub media: Vec<MediaFile>,
}

/// Collection-wide values from the metadata row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Archive entry the collection was read from.
    pub source_entry: String,
    /// Creation time, seconds since the epoch.
    pub created: i64,
    /// Last modification time, milliseconds since the epoch.
    pub modified: i64,
    pub schema_version: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Filtered ("dynamic") decks only borrow cards from other decks.
    pub filtered: bool,
}

/// A note type: ordered field names plus the card templates built from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub name: String,
    pub kind: ModelKind,
    /// Position `i` names the `i`-th value of every note of this model.
    pub fields: Vec<String>,
    pub templates: Vec<Template>,
    pub css: String,
    pub sort_field_index: usize,
}

/// Question/answer format strings, copied verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub question_format: String,
    pub answer_format: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub guid: String,
    pub model_id: i64,
    /// Modification time, seconds since the epoch.
    pub modified: i64,
    pub fields: Vec<String>,
    pub tags: Vec<String>,
    pub sort_field: String,
}

/// A card's identity and raw scheduling state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub note_id: i64,
    pub deck_id: i64,
    pub template_ordinal: i64,
    pub card_type: CardType,
    pub queue: i64,
    pub due: i64,
    pub interval: i64,
    pub ease_factor: i64,
    pub reps: i64,
    pub lapses: i64,
    pub remaining_steps: i64,
    pub original_due: i64,
    pub original_deck_id: i64,
    pub flags: i64,
}

/// One media manifest line: archive entry `entry` holds file `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub entry: String,
    pub name: String,
}

/// Card type as stored; unknown codes are kept rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum CardType {
    New,
    Learning,
    Review,
    Relearning,
    Unknown(i64),
}

impl From<i64> for CardType {
    fn from(value: i64) -> Self {
        match value {
            0 => CardType::New,
            1 => CardType::Learning,
            2 => CardType::Review,
            3 => CardType::Relearning,
            other => CardType::Unknown(other),
        }
    }
}

impl From<CardType> for i64 {
    fn from(value: CardType) -> Self {
        match value {
            CardType::New => 0,
            CardType::Learning => 1,
            CardType::Review => 2,
            CardType::Relearning => 3,
            CardType::Unknown(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ModelKind {
    Standard,
    /// Cloze models generate one card per cloze number, not per template.
    Cloze,
    Unknown(i64),
}

impl From<i64> for ModelKind {
    fn from(value: i64) -> Self {
        match value {
            0 => ModelKind::Standard,
            1 => ModelKind::Cloze,
            other => ModelKind::Unknown(other),
        }
    }
}

impl From<ModelKind> for i64 {
    fn from(value: ModelKind) -> Self {
        match value {
            ModelKind::Standard => 0,
            ModelKind::Cloze => 1,
            ModelKind::Unknown(v) => v,
        }
    }
}

/// A dangling or inconsistent reference found by [`Package::integrity_issues`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IntegrityIssue {
    UnknownModel { note_id: i64, model_id: i64 },
    FieldCountMismatch {
        note_id: i64,
        model_id: i64,
        expected: usize,
        actual: usize,
    },
    UnknownNote { card_id: i64, note_id: i64 },
    UnknownDeck { card_id: i64, deck_id: i64 },
    TemplateOutOfRange {
        card_id: i64,
        model_id: i64,
        ordinal: i64,
        templates: usize,
    },
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityIssue::UnknownModel { note_id, model_id } => {
                write!(f, "note {note_id} uses missing model {model_id}")
            }
            IntegrityIssue::FieldCountMismatch {
                note_id,
                model_id,
                expected,
                actual,
            } => write!(
                f,
                "note {note_id} has {actual} fields, model {model_id} defines {expected}"
            ),
            IntegrityIssue::UnknownNote { card_id, note_id } => {
                write!(f, "card {card_id} belongs to missing note {note_id}")
            }
            IntegrityIssue::UnknownDeck { card_id, deck_id } => {
                write!(f, "card {card_id} is in missing deck {deck_id}")
            }
            IntegrityIssue::TemplateOutOfRange {
                card_id,
                model_id,
                ordinal,
                templates,
            } => write!(
                f,
                "card {card_id} uses template {ordinal} but model {model_id} has {templates}"
            ),
        }
    }
}

impl Package {
    pub fn deck(&self, id: i64) -> Option<&Deck> {
        self.decks.iter().find(|d| d.id == id)
    }

    pub fn model(&self, id: i64) -> Option<&Model> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Check the id references between collections.
    ///
    /// Parsing never runs this; it is left to the consumer whether a
    /// dangling reference is fatal.
    pub fn integrity_issues(&self) -> Vec<IntegrityIssue> {
        let models: HashMap<i64, &Model> = self.models.iter().map(|m| (m.id, m)).collect();
        let decks: HashSet<i64> = self.decks.iter().map(|d| d.id).collect();
        let notes: HashMap<i64, &Note> = self.notes.iter().map(|n| (n.id, n)).collect();

        let mut issues = Vec::new();

        for note in &self.notes {
            match models.get(&note.model_id) {
                None => issues.push(IntegrityIssue::UnknownModel {
                    note_id: note.id,
                    model_id: note.model_id,
                }),
                Some(model) if model.fields.len() != note.fields.len() => {
                    issues.push(IntegrityIssue::FieldCountMismatch {
                        note_id: note.id,
                        model_id: model.id,
                        expected: model.fields.len(),
                        actual: note.fields.len(),
                    })
                }
                Some(_) => {}
            }
        }

        for card in &self.cards {
            if !decks.contains(&card.deck_id) {
                issues.push(IntegrityIssue::UnknownDeck {
                    card_id: card.id,
                    deck_id: card.deck_id,
                });
            }

            let Some(note) = notes.get(&card.note_id) else {
                issues.push(IntegrityIssue::UnknownNote {
                    card_id: card.id,
                    note_id: card.note_id,
                });
                continue;
            };

            if let Some(model) = models.get(&note.model_id)
                && model.kind != ModelKind::Cloze
                && !(0..model.templates.len() as i64).contains(&card.template_ordinal)
            {
                issues.push(IntegrityIssue::TemplateOutOfRange {
                    card_id: card.id,
                    model_id: model.id,
                    ordinal: card.template_ordinal,
                    templates: model.templates.len(),
                });
            }
        }

        issues
    }
}
