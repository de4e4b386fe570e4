//! Confidence-based fragment buffering.
//!
//! Low-confidence fragments are held in a pending buffer and released as a
//! single combined batch once the input goes quiet (debounce) or a
//! high-confidence fragment arrives. High-confidence fragments bypass the
//! buffer entirely and are processed synchronously.
//!
//! The buffer never sleeps: `ingest`/`poll` take an explicit `now` and the
//! next wake-up is exposed through [`ConfidenceBuffer::deadline`].

use std::time::{Duration, Instant};

use super::TranscriptFragment;

/// A batch of transcript text released by the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Flush {
    pub text: String,
    /// Confidence of the weakest fragment in the batch
    pub confidence: f32,
    /// True when the text sat in the pending buffer (low confidence)
    pub buffered: bool,
}

/// Debouncing accumulator for low-confidence fragments.
#[derive(Debug)]
pub struct ConfidenceBuffer {
    threshold: f32,
    debounce: Duration,
    pending: Vec<String>,
    pending_confidence: f32,
    deadline: Option<Instant>,
}

impl ConfidenceBuffer {
    /// `threshold` is the confidence at which fragments bypass buffering;
    /// `debounce` is the quiet period before a pending batch flushes.
    pub fn new(threshold: f32, debounce: Duration) -> Self {
        Self {
            threshold,
            debounce,
            pending: Vec::new(),
            pending_confidence: 1.0,
            deadline: None,
        }
    }

    /// Feed one fragment, returning any batches released by it.
    ///
    /// A low-confidence fragment joins the pending buffer and restarts the
    /// debounce window. A high-confidence fragment releases the pending
    /// buffer first (one combined batch), then itself as a direct batch.
    /// Blank fragments release nothing and do not disturb the window.
    pub fn ingest(&mut self, fragment: &TranscriptFragment, now: Instant) -> Vec<Flush> {
        if fragment.is_blank() {
            return Vec::new();
        }

        if fragment.confidence < self.threshold {
            self.pending.push(fragment.text.trim().to_string());
            self.pending_confidence = self.pending_confidence.min(fragment.confidence);
            self.deadline = Some(now + self.debounce);
            return Vec::new();
        }

        let mut flushes = Vec::new();
        if let Some(buffered) = self.take_pending() {
            flushes.push(buffered);
        }
        flushes.push(Flush {
            text: fragment.text.trim().to_string(),
            confidence: fragment.confidence,
            buffered: false,
        });
        flushes
    }

    /// Release the pending batch if its debounce window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Flush> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.take_pending(),
            _ => None,
        }
    }

    /// When the driver should next call [`ConfidenceBuffer::poll`].
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Release whatever is pending, regardless of the window. Used on stop
    /// so buffered text is never lost.
    pub fn drain(&mut self) -> Option<Flush> {
        self.take_pending()
    }

    fn take_pending(&mut self) -> Option<Flush> {
        self.deadline = None;
        if self.pending.is_empty() {
            return None;
        }
        let text = self.pending.join(" ");
        let confidence = self.pending_confidence;
        self.pending.clear();
        self.pending_confidence = 1.0;
        Some(Flush {
            text,
            confidence,
            buffered: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(text: &str, confidence: f32, received_at: Instant) -> TranscriptFragment {
        TranscriptFragment {
            text: text.to_string(),
            is_final: true,
            confidence,
            speaker: None,
            received_at,
        }
    }

    fn buffer() -> ConfidenceBuffer {
        ConfidenceBuffer::new(0.7, Duration::from_millis(500))
    }

    #[test]
    fn test_high_confidence_bypasses_buffering() {
        let mut buf = buffer();
        let now = Instant::now();

        let flushes = buf.ingest(
            &fragment("the mitochondria is the powerhouse", 0.9, now),
            now,
        );
        assert_eq!(flushes.len(), 1);
        assert_eq!(flushes[0].text, "the mitochondria is the powerhouse");
        assert!(!flushes[0].buffered);
        assert!(buf.deadline().is_none());
    }

    #[test]
    fn test_low_confidence_is_held_until_quiet() {
        let mut buf = buffer();
        let now = Instant::now();

        assert!(buf.ingest(&fragment("um", 0.4, now), now).is_empty());
        assert_eq!(buf.deadline(), Some(now + Duration::from_millis(500)));

        // Not yet quiet for long enough
        assert!(buf.poll(now + Duration::from_millis(499)).is_none());

        let flush = buf.poll(now + Duration::from_millis(500)).unwrap();
        assert_eq!(flush.text, "um");
        assert!(flush.buffered);
        assert!(buf.deadline().is_none());
    }

    #[test]
    fn test_rapid_low_confidence_coalesces_into_one_flush() {
        let mut buf = buffer();
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(200);

        assert!(buf.ingest(&fragment("um", 0.4, t0), t0).is_empty());
        assert!(buf.ingest(&fragment("the cell wall", 0.5, t1), t1).is_empty());

        // The second fragment restarted the window
        assert!(buf.poll(t0 + Duration::from_millis(500)).is_none());

        let flush = buf.poll(t1 + Duration::from_millis(500)).unwrap();
        assert_eq!(flush.text, "um the cell wall");
        assert_eq!(flush.confidence, 0.4);
        assert!(buf.poll(t1 + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_high_confidence_releases_pending_first() {
        let mut buf = buffer();
        let now = Instant::now();

        buf.ingest(&fragment("so the uh", 0.5, now), now);
        let flushes = buf.ingest(&fragment("nucleus stores DNA.", 0.95, now), now);

        assert_eq!(flushes.len(), 2);
        assert_eq!(flushes[0].text, "so the uh");
        assert!(flushes[0].buffered);
        assert_eq!(flushes[1].text, "nucleus stores DNA.");
        assert!(!flushes[1].buffered);
        assert!(buf.deadline().is_none());
    }

    #[test]
    fn test_blank_fragments_release_nothing() {
        let mut buf = buffer();
        let now = Instant::now();

        assert!(buf.ingest(&fragment("   ", 0.9, now), now).is_empty());
        assert!(buf.ingest(&fragment("", 0.2, now), now).is_empty());
        assert!(buf.deadline().is_none());
    }

    #[test]
    fn test_drain_releases_pending_immediately() {
        let mut buf = buffer();
        let now = Instant::now();

        buf.ingest(&fragment("cell division is", 0.5, now), now);
        let flush = buf.drain().unwrap();
        assert_eq!(flush.text, "cell division is");
        assert!(buf.drain().is_none());
    }
}
