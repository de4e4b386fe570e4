//! Commands into and events out of a running session.

use crate::transcript::AdmitRoute;

/// Control messages from the front-end into the session loop.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Close the current section and open a new one with this title
    NewSection(String),
    /// Stop the session, draining pending buffers first
    Stop,
}

/// Progress notifications emitted by the session loop.
///
/// Purely observational; dropping the receiver never affects the pipeline.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Text was appended to both transcript views
    TranscriptAppended {
        raw: String,
        polished: String,
        /// True when the text went through the low-confidence buffer
        buffered: bool,
    },
    /// A completed segment passed the topic-continuity check
    SegmentAccepted { text: String, route: AdmitRoute },
    /// A completed segment was judged off-topic and dropped
    SegmentDiscarded { text: String, route: AdmitRoute },
    /// A new section was opened
    SectionStarted { title: String },
    /// Study content was generated from the accepted-segment window
    StudyContentAdded {
        notes: usize,
        flashcards: usize,
        keywords: usize,
    },
    /// The reconstruction breaker opened; raw text is used from here on
    ReconstructionDisabled,
    /// A backend call failed and its enrichment was skipped
    Degraded { message: String },
}
