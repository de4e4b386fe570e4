//! Sentence assembly over the polished transcript stream.
//!
//! Reconstructed batches arrive mid-sentence; the assembler joins them and
//! emits one segment per completed sentence. An unterminated tail flushes
//! after a quiet period (the driver polls the exposed deadline) or on
//! drain when the session stops.

use std::time::{Duration, Instant};

/// Joins transcript batches into sentence-shaped segments.
#[derive(Debug)]
pub struct SegmentAssembler {
    quiet: Duration,
    pending: String,
    deadline: Option<Instant>,
}

impl SegmentAssembler {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: String::new(),
            deadline: None,
        }
    }

    /// Append a batch of text, returning any sentences it completed.
    pub fn push(&mut self, text: &str, now: Instant) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        if !self.pending.is_empty() {
            self.pending.push(' ');
        }
        self.pending.push_str(text);

        let (complete, rest) = split_sentences(&self.pending);
        self.pending = rest;

        self.deadline = if self.pending.is_empty() {
            None
        } else {
            Some(now + self.quiet)
        };

        complete
    }

    /// Flush the unterminated tail if its quiet period elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.take_pending(),
            _ => None,
        }
    }

    /// When the driver should next call [`SegmentAssembler::poll`].
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Flush the tail regardless of the quiet period. Used on stop.
    pub fn drain(&mut self) -> Option<String> {
        self.take_pending()
    }

    fn take_pending(&mut self) -> Option<String> {
        self.deadline = None;
        if self.pending.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.pending))
    }
}

/// Split `text` into completed sentences and the unterminated remainder.
///
/// A sentence completes at `.`, `!` or `?` followed by whitespace or the
/// end of the text.
fn split_sentences(text: &str) -> (Vec<String>, String) {
    let mut complete = Vec::new();
    let mut start = 0;
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    for (i, &(pos, c)) in chars.iter().enumerate() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = chars
            .get(i + 1)
            .map(|&(_, next)| next.is_whitespace())
            .unwrap_or(true);
        if at_boundary {
            let end = pos + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                complete.push(sentence.to_string());
            }
            start = end;
        }
    }

    (complete, text[start..].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembler() -> SegmentAssembler {
        SegmentAssembler::new(Duration::from_secs(4))
    }

    #[test]
    fn test_completed_sentence_is_emitted_immediately() {
        let mut asm = assembler();
        let now = Instant::now();

        let segments = asm.push("The cell divides by mitosis.", now);
        assert_eq!(segments, vec!["The cell divides by mitosis."]);
        assert!(asm.deadline().is_none());
    }

    #[test]
    fn test_partial_text_accumulates_across_pushes() {
        let mut asm = assembler();
        let now = Instant::now();

        assert!(asm.push("The cell divides", now).is_empty());
        assert_eq!(asm.deadline(), Some(now + Duration::from_secs(4)));

        let segments = asm.push("by mitosis. Then the", now);
        assert_eq!(segments, vec!["The cell divides by mitosis."]);
        // "Then the" still pending
        assert!(asm.deadline().is_some());
    }

    #[test]
    fn test_multiple_sentences_in_one_push() {
        let mut asm = assembler();
        let now = Instant::now();

        let segments = asm.push("What is a cell? It is the unit of life.", now);
        assert_eq!(
            segments,
            vec!["What is a cell?", "It is the unit of life."]
        );
    }

    #[test]
    fn test_decimal_numbers_do_not_split() {
        let mut asm = assembler();
        let now = Instant::now();

        let segments = asm.push("pi is roughly 3.14 in this class.", now);
        assert_eq!(segments, vec!["pi is roughly 3.14 in this class."]);
    }

    #[test]
    fn test_quiet_period_flushes_unterminated_tail() {
        let mut asm = assembler();
        let now = Instant::now();

        asm.push("and that concludes the", now);
        assert!(asm.poll(now + Duration::from_secs(3)).is_none());

        let tail = asm.poll(now + Duration::from_secs(4)).unwrap();
        assert_eq!(tail, "and that concludes the");
        assert!(asm.poll(now + Duration::from_secs(10)).is_none());
    }

    #[test]
    fn test_drain_flushes_tail_immediately() {
        let mut asm = assembler();
        let now = Instant::now();

        asm.push("one last thought", now);
        assert_eq!(asm.drain().unwrap(), "one last thought");
        assert!(asm.drain().is_none());
    }
}
