//! The streaming transcript pipeline.
//!
//! Fragments from the speech-to-text endpoint flow through:
//! confidence buffering ([`ConfidenceBuffer`]) → correction triggering
//! ([`correction`]) → sentence assembly ([`SegmentAssembler`]) → topic
//! continuity ([`TopicContinuityFilter`]).
//!
//! Each stage is a pure state machine whose timers are exposed as plain
//! deadlines; the session driver owns the actual sleeping. That keeps every
//! buffering/flushing decision deterministic under test.

mod buffer;
pub mod correction;
mod segment;
mod topic;

pub use buffer::{ConfidenceBuffer, Flush};
pub use segment::SegmentAssembler;
pub use topic::{AdmitDecision, AdmitRoute, TopicContinuityFilter};

use std::time::Instant;

/// One partial or final speech-to-text result for a short audio chunk.
///
/// Immutable once created; `received_at` is the client-side arrival time.
#[derive(Debug, Clone)]
pub struct TranscriptFragment {
    pub text: String,
    pub is_final: bool,
    pub confidence: f32,
    pub speaker: Option<String>,
    pub received_at: Instant,
}

impl TranscriptFragment {
    /// Whether the fragment carries any transcribable content.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
