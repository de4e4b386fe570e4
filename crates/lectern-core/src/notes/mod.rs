//! Study content produced from the lecture: notes, flashcards, keywords.
//!
//! These are append-only for the lifetime of a session. The tag fields the
//! backend sends as strings are closed enums here; an item whose tags don't
//! parse is malformed and gets skipped at the boundary rather than aborting
//! the batch.

mod sections;

pub use sections::{Section, SectionAccumulator};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// What kind of study note this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    KeyPoint,
    Definition,
    Example,
    Concept,
}

impl fmt::Display for NoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteKind::KeyPoint => write!(f, "key point"),
            NoteKind::Definition => write!(f, "definition"),
            NoteKind::Example => write!(f, "example"),
            NoteKind::Concept => write!(f, "concept"),
        }
    }
}

/// Importance ranking shared by notes and keywords.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    #[default]
    Medium,
    Low,
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Importance::High => write!(f, "high"),
            Importance::Medium => write!(f, "medium"),
            Importance::Low => write!(f, "low"),
        }
    }
}

/// Flashcard difficulty, when the generator provides one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Category of a key term.
///
/// Unrecognized categories from the backend collapse to `Term` instead of
/// invalidating the item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordKind {
    Concept,
    Definition,
    Formula,
    Acronym,
    #[default]
    #[serde(other)]
    Term,
}

impl fmt::Display for KeywordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeywordKind::Concept => write!(f, "concept"),
            KeywordKind::Definition => write!(f, "definition"),
            KeywordKind::Formula => write!(f, "formula"),
            KeywordKind::Acronym => write!(f, "acronym"),
            KeywordKind::Term => write!(f, "term"),
        }
    }
}

fn new_id() -> Uuid {
    Uuid::new_v4()
}

fn now_local() -> DateTime<Local> {
    Local::now()
}

/// One AI-generated study note.
///
/// Ids and timestamps are assigned client-side; the generator only ships
/// content and tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    #[serde(default = "new_id")]
    pub id: Uuid,
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: NoteKind,
    #[serde(default)]
    pub importance: Importance,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub concept: Option<String>,
    #[serde(default)]
    pub subconcepts: Vec<String>,
}

/// One AI-generated flashcard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    #[serde(default = "new_id")]
    pub id: Uuid,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default = "now_local")]
    pub timestamp: DateTime<Local>,
}

/// One extracted key term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub term: String,
    #[serde(rename = "type", default)]
    pub kind: KeywordKind,
    #[serde(default)]
    pub importance: Importance,
    #[serde(default)]
    pub description: String,
}

/// Append-only session store for generated study content.
///
/// Keywords are deduplicated by term (case-insensitive, first wins).
#[derive(Debug, Default)]
pub struct NotesStore {
    notes: Vec<Note>,
    flashcards: Vec<Flashcard>,
    keywords: Vec<Keyword>,
    seen_terms: HashSet<String>,
}

impl NotesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append notes, returning how many were added.
    pub fn add_notes(&mut self, notes: Vec<Note>) -> usize {
        let added = notes.len();
        self.notes.extend(notes);
        added
    }

    /// Append flashcards, returning how many were added.
    pub fn add_flashcards(&mut self, flashcards: Vec<Flashcard>) -> usize {
        let added = flashcards.len();
        self.flashcards.extend(flashcards);
        added
    }

    /// Append keywords, skipping terms already seen this session.
    pub fn add_keywords(&mut self, keywords: Vec<Keyword>) -> usize {
        let mut added = 0;
        for keyword in keywords {
            let key = keyword.term.trim().to_lowercase();
            if key.is_empty() || !self.seen_terms.insert(key) {
                continue;
            }
            self.keywords.push(keyword);
            added += 1;
        }
        added
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn flashcards(&self) -> &[Flashcard] {
        &self.flashcards
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.flashcards.is_empty() && self.keywords.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyword(term: &str) -> Keyword {
        Keyword {
            term: term.to_string(),
            kind: KeywordKind::Term,
            importance: Importance::Medium,
            description: String::new(),
        }
    }

    #[test]
    fn test_keyword_dedup_is_case_insensitive() {
        let mut store = NotesStore::new();
        let added = store.add_keywords(vec![
            keyword("Mitosis"),
            keyword("mitosis"),
            keyword("MITOSIS"),
            keyword("meiosis"),
        ]);
        assert_eq!(added, 2);
        assert_eq!(store.keywords().len(), 2);
        // First occurrence wins, original casing preserved
        assert_eq!(store.keywords()[0].term, "Mitosis");
    }

    #[test]
    fn test_blank_terms_are_skipped() {
        let mut store = NotesStore::new();
        assert_eq!(store.add_keywords(vec![keyword("  ")]), 0);
        assert!(store.keywords().is_empty());
    }

    #[test]
    fn test_note_wire_parse_with_defaults() {
        let note: Note = serde_json::from_str(
            r#"{"content": "Cells divide by mitosis", "type": "key_point"}"#,
        )
        .unwrap();
        assert_eq!(note.kind, NoteKind::KeyPoint);
        assert_eq!(note.importance, Importance::Medium);
        assert!(note.concept.is_none());
        assert!(note.subconcepts.is_empty());
    }

    #[test]
    fn test_note_missing_type_is_malformed() {
        let result: Result<Note, _> = serde_json::from_str(r#"{"content": "no tag"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_keyword_unknown_kind_falls_back_to_term() {
        let keyword: Keyword =
            serde_json::from_str(r#"{"term": "ATP", "type": "biomolecule"}"#).unwrap();
        assert_eq!(keyword.kind, KeywordKind::Term);
    }
}
