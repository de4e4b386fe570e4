//! Topic-continuity filtering for completed segments.
//!
//! The primary signal is the remote classifier, which sees the new segment
//! plus the last few accepted ones. When that call fails the filter falls
//! back to lexical overlap against the same recent context, so a flaky
//! backend degrades the decision quality but never the pipeline.

use std::collections::{HashSet, VecDeque};

use crate::backend::LectureBackend;

/// How many recent segments the remote classifier sees
const REMOTE_CONTEXT_SEGMENTS: usize = 3;

/// How a segment was admitted or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitRoute {
    /// No context yet; everything belongs
    EmptyContext,
    /// The remote classifier decided
    Remote,
    /// The remote call failed; lexical overlap decided
    LexicalFallback,
}

/// Outcome of a continuity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmitDecision {
    pub accepted: bool,
    pub route: AdmitRoute,
}

/// Rolling-context topic filter.
#[derive(Debug)]
pub struct TopicContinuityFilter {
    context: VecDeque<String>,
    last_topic: Option<String>,
    overlap_threshold: f32,
    max_context: usize,
}

impl TopicContinuityFilter {
    /// `overlap_threshold` is the minimum lexical overlap for the fallback
    /// path; `max_context` bounds the rolling window (oldest evicted).
    pub fn new(overlap_threshold: f32, max_context: usize) -> Self {
        Self {
            context: VecDeque::new(),
            last_topic: None,
            overlap_threshold,
            max_context: max_context.max(REMOTE_CONTEXT_SEGMENTS),
        }
    }

    /// Set the current topic label (the open section's title).
    pub fn set_topic(&mut self, topic: impl Into<String>) {
        self.last_topic = Some(topic.into());
    }

    /// Decide whether `segment` continues the current topic, and admit it
    /// into the rolling context if it does.
    pub async fn admit(
        &mut self,
        backend: &dyn LectureBackend,
        segment: &str,
    ) -> AdmitDecision {
        let decision = self.classify(backend, segment).await;
        if decision.accepted {
            self.push_context(segment);
        }
        decision
    }

    async fn classify(&self, backend: &dyn LectureBackend, segment: &str) -> AdmitDecision {
        if self.context.is_empty() {
            return AdmitDecision {
                accepted: true,
                route: AdmitRoute::EmptyContext,
            };
        }

        let recent = self.recent_context();
        match backend
            .check_topic(segment, &recent, self.last_topic.as_deref())
            .await
        {
            Ok(fits) => AdmitDecision {
                accepted: fits,
                route: AdmitRoute::Remote,
            },
            Err(e) => {
                crate::verbose!("Topic check failed, using lexical fallback: {e}");
                AdmitDecision {
                    accepted: self.fits_lexically(segment),
                    route: AdmitRoute::LexicalFallback,
                }
            }
        }
    }

    /// Fallback: lexical overlap between the segment and the recent context.
    pub fn fits_lexically(&self, segment: &str) -> bool {
        let recent = self.recent_context().join(" ");
        lexical_overlap(segment, &recent) >= self.overlap_threshold
    }

    /// The context slice shown to the remote classifier.
    pub fn recent_context(&self) -> Vec<String> {
        self.context
            .iter()
            .rev()
            .take(REMOTE_CONTEXT_SEGMENTS)
            .rev()
            .cloned()
            .collect()
    }

    /// Every retained context segment, oldest first.
    pub fn context(&self) -> impl Iterator<Item = &str> {
        self.context.iter().map(|s| s.as_str())
    }

    pub fn context_len(&self) -> usize {
        self.context.len()
    }

    fn push_context(&mut self, segment: &str) {
        if self.context.len() == self.max_context {
            self.context.pop_front();
        }
        self.context.push_back(segment.to_string());
    }
}

/// Shared-word overlap ratio: |words(a) ∩ words(b)| / max(|words(a)|, |words(b)|).
///
/// Word sets are case-insensitive and punctuation-stripped. Returns 0.0
/// when either side is empty.
pub fn lexical_overlap(a: &str, b: &str) -> f32 {
    let words_a = word_set(a);
    let words_b = word_set(b);

    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let shared = words_a.intersection(&words_b).count();
    shared as f32 / words_a.len().max(words_b.len()) as f32
}

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}
