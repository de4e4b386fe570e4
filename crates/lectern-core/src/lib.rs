pub mod audio;
pub mod backend;
pub mod export;
pub mod notes;
pub mod session;
pub mod settings;
pub mod transcript;
pub mod verbose;

pub use audio::{AudioChunk, CaptureError, CaptureHandle, Chunker, SAMPLE_RATE, start_capture};
pub use backend::{HttpBackend, LectureBackend, TranscribeResponse};
pub use export::{ExportInput, export_notes, render_markdown};
pub use notes::{
    Difficulty, Flashcard, Importance, Keyword, KeywordKind, Note, NoteKind, NotesStore, Section,
    SectionAccumulator,
};
pub use session::{LectureSession, SessionCommand, SessionEvent, SessionStats, run_session};
pub use settings::{SessionTuning, Settings};
pub use transcript::{
    AdmitDecision, AdmitRoute, ConfidenceBuffer, SegmentAssembler, TopicContinuityFilter,
    TranscriptFragment,
};
pub use verbose::set_verbose;
