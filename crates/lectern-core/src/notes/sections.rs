//! User-delimited lecture sections.
//!
//! A section groups the notes and flashcards created while it was open.
//! Sections partition the lecture timeline: starting a new one stamps the
//! end time of its predecessor, so they never overlap, and content always
//! routes to the single currently-open section.

use chrono::{DateTime, Local};
use uuid::Uuid;

use super::{Flashcard, Note};

/// One lecture section.
#[derive(Debug, Clone)]
pub struct Section {
    pub id: Uuid,
    pub title: String,
    pub started_at: DateTime<Local>,
    pub ended_at: Option<DateTime<Local>>,
    pub notes: Vec<Note>,
    pub flashcards: Vec<Flashcard>,
}

impl Section {
    fn new(title: String, now: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            started_at: now,
            ended_at: None,
            notes: Vec::new(),
            flashcards: Vec::new(),
        }
    }

    /// Elapsed time of the section; open sections are measured up to `now`.
    pub fn elapsed(&self, now: DateTime<Local>) -> chrono::Duration {
        self.ended_at.unwrap_or(now) - self.started_at
    }
}

/// Routes generated content into the currently-open section.
#[derive(Debug, Default)]
pub struct SectionAccumulator {
    sections: Vec<Section>,
}

impl SectionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new section, closing the current one.
    pub fn start_section(&mut self, title: impl Into<String>, now: DateTime<Local>) -> &Section {
        if let Some(open) = self.open_mut() {
            open.ended_at = Some(now);
        }
        self.sections.push(Section::new(title.into(), now));
        self.sections.last().expect("section just pushed")
    }

    /// Close the open section, if any. Called when the session stops.
    pub fn close(&mut self, now: DateTime<Local>) {
        if let Some(open) = self.open_mut() {
            open.ended_at = Some(now);
        }
    }

    /// Whether a section is currently receiving content.
    pub fn is_open(&self) -> bool {
        self.sections.last().is_some_and(|s| s.ended_at.is_none())
    }

    /// Route a note to the open section. No-op when closed.
    pub fn add_note(&mut self, note: &Note) {
        if let Some(open) = self.open_mut() {
            open.notes.push(note.clone());
        }
    }

    /// Route a flashcard to the open section. No-op when closed.
    pub fn add_flashcard(&mut self, flashcard: &Flashcard) {
        if let Some(open) = self.open_mut() {
            open.flashcards.push(flashcard.clone());
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    fn open_mut(&mut self) -> Option<&mut Section> {
        self.sections.last_mut().filter(|s| s.ended_at.is_none())
    }
}
