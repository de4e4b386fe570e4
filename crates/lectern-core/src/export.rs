//! Markdown export of an accumulated session.
//!
//! Pure formatting over the session's collections: it always succeeds, and
//! sections with nothing in them are simply omitted, so an empty session
//! exports as just the header and metadata block.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::notes::{Note, NotesStore, Section};

/// Concept heading for notes that don't carry one
const DEFAULT_CONCEPT: &str = "General";

/// Everything the exporter needs, borrowed from the session.
pub struct ExportInput<'a> {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub polished_transcript: &'a str,
    pub store: &'a NotesStore,
    pub sections: &'a [Section],
}

/// Render the full Markdown document.
pub fn render_markdown(input: &ExportInput) -> String {
    let mut doc = String::new();

    doc.push_str("# Lecture Notes\n\n");
    doc.push_str(&format!(
        "- Date: {}\n",
        input.started_at.format("%Y-%m-%d %H:%M")
    ));
    doc.push_str(&format!(
        "- Duration: {}\n",
        format_duration(input.finished_at - input.started_at)
    ));
    doc.push_str(&format!(
        "- Notes: {} · Flashcards: {} · Key terms: {}\n",
        input.store.notes().len(),
        input.store.flashcards().len(),
        input.store.keywords().len()
    ));

    if !input.polished_transcript.trim().is_empty() {
        doc.push_str("\n## Live Transcript\n\n");
        doc.push_str(input.polished_transcript.trim());
        doc.push('\n');
    }

    if !input.store.notes().is_empty() {
        doc.push_str("\n## Study Notes\n");
        for (concept, notes) in group_by_concept(input.store.notes()) {
            doc.push_str(&format!("\n### {concept}\n\n"));
            for note in notes {
                let title = note
                    .title
                    .as_deref()
                    .map(|t| format!("**{t}** — "))
                    .unwrap_or_default();
                doc.push_str(&format!(
                    "- {title}{} _({}, {} importance)_\n",
                    note.content, note.kind, note.importance
                ));
            }
        }
    }

    if !input.store.flashcards().is_empty() {
        doc.push_str("\n## Flashcards\n\n");
        for card in input.store.flashcards() {
            doc.push_str(&format!("- **Q:** {}\n  **A:** {}\n", card.front, card.back));
        }
    }

    if !input.store.keywords().is_empty() {
        doc.push_str("\n## Key Terms\n\n");
        for keyword in input.store.keywords() {
            let description = if keyword.description.is_empty() {
                String::new()
            } else {
                format!(" — {}", keyword.description)
            };
            doc.push_str(&format!(
                "- **{}** ({}){}\n",
                keyword.term, keyword.kind, description
            ));
        }
    }

    if !input.sections.is_empty() {
        doc.push_str("\n## Lecture Sections\n\n");
        for section in input.sections {
            doc.push_str(&format!(
                "- **{}** ({}, {} notes, {} flashcards)\n",
                section.title,
                format_duration(section.elapsed(input.finished_at)),
                section.notes.len(),
                section.flashcards.len()
            ));
        }
    }

    doc
}

/// Write the rendered document to `dir/lecture-notes-<date>.md`.
pub fn export_notes(input: &ExportInput, dir: &Path) -> Result<PathBuf> {
    let filename = format!("lecture-notes-{}.md", input.finished_at.format("%Y-%m-%d"));
    let path = dir.join(filename);

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    std::fs::write(&path, render_markdown(input))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

/// Group notes under their concept, `General` when absent. BTreeMap keeps
/// heading order stable across exports.
fn group_by_concept(notes: &[Note]) -> BTreeMap<String, Vec<&Note>> {
    let mut groups: BTreeMap<String, Vec<&Note>> = BTreeMap::new();
    for note in notes {
        let concept = note
            .concept
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CONCEPT);
        groups.entry(concept.to_string()).or_default().push(note);
    }
    groups
}

fn format_duration(duration: chrono::Duration) -> String {
    let secs = duration.num_seconds().max(0);
    format!("{}m {:02}s", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::{Importance, NoteKind, NotesStore, SectionAccumulator};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn note(content: &str, concept: Option<&str>) -> Note {
        Note {
            id: Uuid::new_v4(),
            content: content.to_string(),
            title: None,
            kind: NoteKind::KeyPoint,
            importance: Importance::Medium,
            confidence: None,
            concept: concept.map(|c| c.to_string()),
            subconcepts: Vec::new(),
        }
    }

    fn at(min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 9, 10, min, 0).unwrap()
    }

    #[test]
    fn test_empty_session_exports_header_only() {
        let store = NotesStore::new();
        let doc = render_markdown(&ExportInput {
            started_at: at(0),
            finished_at: at(50),
            polished_transcript: "",
            store: &store,
            sections: &[],
        });

        assert!(doc.starts_with("# Lecture Notes\n"));
        assert!(doc.contains("- Duration: 50m 00s"));
        assert!(!doc.contains("## Live Transcript"));
        assert!(!doc.contains("## Study Notes"));
        assert!(!doc.contains("## Flashcards"));
        assert!(!doc.contains("## Key Terms"));
        assert!(!doc.contains("## Lecture Sections"));
    }

    #[test]
    fn test_notes_grouped_by_concept_with_general_fallback() {
        let mut store = NotesStore::new();
        store.add_notes(vec![
            note("ATP powers the cell", Some("Energy")),
            note("Mitosis has four phases", Some("Cell division")),
            note("Bring a calculator", None),
            note("Glycolysis comes first", Some("Energy")),
        ]);

        let doc = render_markdown(&ExportInput {
            started_at: at(0),
            finished_at: at(10),
            polished_transcript: "transcript text",
            store: &store,
            sections: &[],
        });

        // One ### heading per distinct concept, plus General
        assert_eq!(doc.matches("### ").count(), 3);
        assert!(doc.contains("### Cell division"));
        assert!(doc.contains("### Energy"));
        assert!(doc.contains("### General"));
        assert!(doc.contains("- Bring a calculator"));
    }

    #[test]
    fn test_section_summary_includes_elapsed_time() {
        let mut sections = SectionAccumulator::new();
        sections.start_section("Introduction", at(0));
        sections.start_section("Energy", at(12));
        sections.close(at(30));

        let store = NotesStore::new();
        let doc = render_markdown(&ExportInput {
            started_at: at(0),
            finished_at: at(30),
            polished_transcript: "",
            store: &store,
            sections: sections.sections(),
        });

        assert!(doc.contains("## Lecture Sections"));
        assert!(doc.contains("**Introduction** (12m 00s"));
        assert!(doc.contains("**Energy** (18m 00s"));
    }

    #[test]
    fn test_export_filename_carries_date() {
        let store = NotesStore::new();
        let input = ExportInput {
            started_at: at(0),
            finished_at: at(30),
            polished_transcript: "",
            store: &store,
            sections: &[],
        };

        let dir = std::env::temp_dir().join("lectern-export-test");
        let path = export_notes(&input, &dir).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "lecture-notes-2026-03-09.md"
        );
        std::fs::remove_dir_all(&dir).ok();
    }
}
