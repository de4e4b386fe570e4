//! The remote lecture backend.
//!
//! Six HTTP endpoints drive the session: speech-to-text, transcript
//! reconstruction, topic-continuity checks, and the three study-content
//! generators. Everything goes through the [`LectureBackend`] trait so the
//! pipeline can run against a mock in tests; [`HttpBackend`] is the real
//! reqwest-based implementation.

mod http;

pub use http::{DEFAULT_TIMEOUT_SECS, HttpBackend};

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::notes::{Flashcard, Keyword, Note};

/// One speech-to-text result for an audio chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscribeResponse {
    pub transcript: String,
    #[serde(rename = "isFinal", default)]
    pub is_final: bool,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub speaker: Option<String>,
}

/// Client interface to the lecture backend.
#[async_trait]
pub trait LectureBackend: Send + Sync {
    /// Transcribe one chunk of audio (WAV bytes).
    async fn transcribe(&self, audio_wav: &[u8]) -> Result<TranscribeResponse>;

    /// Repair grammar/word errors in noisy transcript text.
    async fn reconstruct(&self, text: &str, context: &str) -> Result<String>;

    /// Does `new_segment` continue the topic of the recent context?
    async fn check_topic(
        &self,
        new_segment: &str,
        context: &[String],
        last_topic: Option<&str>,
    ) -> Result<bool>;

    /// Generate study notes from a transcript window.
    async fn generate_notes(&self, text: &str, context: &str) -> Result<Vec<Note>>;

    /// Generate flashcards from a transcript window.
    async fn generate_flashcards(&self, text: &str, context: &str) -> Result<Vec<Flashcard>>;

    /// Extract key terms from a transcript window.
    async fn extract_keywords(&self, text: &str) -> Result<Vec<Keyword>>;
}

/// Parse an array of AI-generated items one by one.
///
/// A malformed element means that element produced no content; the rest of
/// the batch is kept (never fail the whole response over one bad item).
pub(crate) fn parse_items<T>(values: Vec<serde_json::Value>, what: &str) -> Vec<T>
where
    T: serde::de::DeserializeOwned,
{
    let total = values.len();
    let items: Vec<T> = values
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();

    if items.len() < total {
        crate::verbose!("Skipped {} malformed {what}", total - items.len());
    }
    items
}
