//! The live lecture session.
//!
//! [`LectureSession`] owns every piece of mutable session state: the two
//! transcript views, the confidence buffer, the sentence assembler, the
//! topic filter, the notes store, and the section accumulator. All network
//! calls are awaited inline from a single task, so mutation is serialized
//! and nothing can observe the session after it stopped. [`run_session`] is
//! the driver loop that wires audio chunks, commands, and the pure
//! components' deadlines into one `select!`.

mod events;

pub use events::{SessionCommand, SessionEvent};

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::audio::{AudioChunk, encode_wav};
use crate::backend::LectureBackend;
use crate::export::ExportInput;
use crate::notes::{NotesStore, SectionAccumulator};
use crate::settings::SessionTuning;
use crate::transcript::{
    ConfidenceBuffer, Flush, SegmentAssembler, TopicContinuityFilter, TranscriptFragment,
    correction,
};

/// Title of the section opened when a session starts
const INITIAL_SECTION_TITLE: &str = "Lecture";

/// How much polished-transcript tail is sent as reconstruction context
const RECONSTRUCTION_CONTEXT_CHARS: usize = 240;

/// Session counters, reported by the CLI at the end of a recording.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    pub chunks: u64,
    pub fragments: u64,
    pub corrections_triggered: u64,
    pub reconstructions_applied: u64,
    pub reconstruction_failures: u64,
    pub segments_accepted: u64,
    pub segments_discarded: u64,
}

/// One live lecture: state, pipeline, and the backend it talks to.
pub struct LectureSession {
    backend: Arc<dyn LectureBackend>,
    tuning: SessionTuning,
    started_at: DateTime<Local>,

    raw_transcript: String,
    polished_transcript: String,

    buffer: ConfidenceBuffer,
    segments: SegmentAssembler,
    topic: TopicContinuityFilter,

    store: NotesStore,
    sections: SectionAccumulator,
    notes_window: String,

    consecutive_failures: u32,
    reconstruction_disabled: bool,

    stats: SessionStats,
    event_tx: Option<UnboundedSender<SessionEvent>>,
}

impl LectureSession {
    /// Create a session and open its initial section.
    pub fn new(
        backend: Arc<dyn LectureBackend>,
        tuning: SessionTuning,
        event_tx: Option<UnboundedSender<SessionEvent>>,
    ) -> Self {
        let started_at = Local::now();
        let mut session = Self {
            backend,
            buffer: ConfidenceBuffer::new(
                tuning.buffer_threshold,
                Duration::from_millis(tuning.debounce_ms),
            ),
            segments: SegmentAssembler::new(Duration::from_millis(tuning.sentence_flush_ms)),
            topic: TopicContinuityFilter::new(tuning.overlap_threshold, tuning.context_window),
            tuning,
            started_at,
            raw_transcript: String::new(),
            polished_transcript: String::new(),
            store: NotesStore::new(),
            sections: SectionAccumulator::new(),
            notes_window: String::new(),
            consecutive_failures: 0,
            reconstruction_disabled: false,
            stats: SessionStats::default(),
            event_tx,
        };
        session.sections.start_section(INITIAL_SECTION_TITLE, started_at);
        session
    }

    /// Transcribe one audio chunk and run the result through the pipeline.
    ///
    /// Transcription failures are degradations, not session errors: the
    /// chunk's audio is lost but recording continues.
    pub async fn process_chunk(&mut self, chunk: AudioChunk) {
        self.stats.chunks += 1;

        let wav = match encode_wav(&chunk.samples) {
            Ok(wav) => wav,
            Err(e) => {
                self.degraded(format!("Chunk {} not encoded: {e}", chunk.index));
                return;
            }
        };

        let result = self.backend.transcribe(&wav).await;
        match result {
            Ok(resp) => {
                let fragment = TranscriptFragment {
                    text: resp.transcript,
                    is_final: resp.is_final,
                    confidence: resp.confidence,
                    speaker: resp.speaker,
                    received_at: Instant::now(),
                };
                self.process_fragment(fragment, Instant::now()).await;
            }
            Err(e) => {
                self.degraded(format!("Chunk {} not transcribed: {e}", chunk.index));
            }
        }
    }

    /// Run one transcript fragment through buffering and the stages below.
    pub async fn process_fragment(&mut self, fragment: TranscriptFragment, now: Instant) {
        self.stats.fragments += 1;

        let flushes = self.buffer.ingest(&fragment, now);
        for flush in flushes {
            self.process_flush(flush, now).await;
        }
    }

    /// Fire any elapsed debounce/quiet-period deadlines.
    pub async fn poll_timers(&mut self, now: Instant) {
        if let Some(flush) = self.buffer.poll(now) {
            self.process_flush(flush, now).await;
        }
        if let Some(tail) = self.segments.poll(now) {
            self.admit_segment(tail).await;
        }
    }

    /// The earliest pending deadline, for the driver's timer arm.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.buffer.deadline(), self.segments.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Close the current section and open a new one.
    pub fn start_section(&mut self, title: impl Into<String>) {
        let title = title.into();
        self.sections.start_section(title.clone(), Local::now());
        self.topic.set_topic(title.clone());
        self.emit(SessionEvent::SectionStarted { title });
    }

    /// Drain every pending buffer through the pipeline tail and close the
    /// open section. Called exactly once, when the session stops.
    pub async fn finish(&mut self) {
        let now = Instant::now();

        if let Some(flush) = self.buffer.drain() {
            self.process_flush(flush, now).await;
        }
        if let Some(tail) = self.segments.drain() {
            self.admit_segment(tail).await;
        }
        if !self.notes_window.trim().is_empty() {
            self.generate_study_content().await;
        }

        self.sections.close(Local::now());
    }

    async fn process_flush(&mut self, flush: Flush, now: Instant) {
        append_text(&mut self.raw_transcript, &flush.text);

        let polished = self.polish(&flush).await;
        append_text(&mut self.polished_transcript, &polished);

        self.emit(SessionEvent::TranscriptAppended {
            raw: flush.text,
            polished: polished.clone(),
            buffered: flush.buffered,
        });

        for segment in self.segments.push(&polished, now) {
            self.admit_segment(segment).await;
        }
    }

    /// Reconstruct a flushed batch when the rules call for it, falling back
    /// to the original text on any failure (no data loss).
    async fn polish(&mut self, flush: &Flush) -> String {
        let triggered = correction::needs_correction(
            &flush.text,
            flush.confidence,
            self.tuning.correction_threshold,
        );

        if !triggered || self.reconstruction_disabled {
            return flush.text.clone();
        }

        self.stats.corrections_triggered += 1;
        let context = tail_chars(&self.polished_transcript, RECONSTRUCTION_CONTEXT_CHARS);

        let result = self.backend.reconstruct(&flush.text, context).await;
        match result {
            Ok(reconstructed) => {
                self.consecutive_failures = 0;
                self.stats.reconstructions_applied += 1;
                reconstructed
            }
            Err(e) => {
                self.consecutive_failures += 1;
                self.stats.reconstruction_failures += 1;
                crate::verbose!(
                    "Reconstruction failed ({}/{}): {e}",
                    self.consecutive_failures,
                    self.tuning.breaker_limit
                );

                if self.consecutive_failures >= self.tuning.breaker_limit {
                    self.reconstruction_disabled = true;
                    self.emit(SessionEvent::ReconstructionDisabled);
                }
                flush.text.clone()
            }
        }
    }

    async fn admit_segment(&mut self, segment: String) {
        let decision = self.topic.admit(self.backend.as_ref(), &segment).await;

        if decision.accepted {
            self.stats.segments_accepted += 1;
            append_text(&mut self.notes_window, &segment);
            self.emit(SessionEvent::SegmentAccepted {
                text: segment,
                route: decision.route,
            });

            if self.notes_window.len() >= self.tuning.notes_window_chars {
                self.generate_study_content().await;
            }
        } else {
            self.stats.segments_discarded += 1;
            self.emit(SessionEvent::SegmentDiscarded {
                text: segment,
                route: decision.route,
            });
        }
    }

    /// Turn the accepted-segment window into notes/flashcards/keywords.
    ///
    /// Each generator degrades independently; a failed call skips that
    /// enrichment and leaves the window consumed either way.
    async fn generate_study_content(&mut self) {
        let window = std::mem::take(&mut self.notes_window);
        let context = self.topic.recent_context().join(" ");

        let mut counts = (0, 0, 0);

        let notes_result = self.backend.generate_notes(&window, &context).await;
        match notes_result {
            Ok(notes) => {
                for note in &notes {
                    self.sections.add_note(note);
                }
                counts.0 = self.store.add_notes(notes);
            }
            Err(e) => self.degraded(format!("Note generation skipped: {e}")),
        }

        let flashcards_result = self.backend.generate_flashcards(&window, &context).await;
        match flashcards_result {
            Ok(flashcards) => {
                for flashcard in &flashcards {
                    self.sections.add_flashcard(flashcard);
                }
                counts.1 = self.store.add_flashcards(flashcards);
            }
            Err(e) => self.degraded(format!("Flashcard generation skipped: {e}")),
        }

        let keywords_result = self.backend.extract_keywords(&window).await;
        match keywords_result {
            Ok(keywords) => {
                counts.2 = self.store.add_keywords(keywords);
            }
            Err(e) => self.degraded(format!("Keyword extraction skipped: {e}")),
        }

        if counts != (0, 0, 0) {
            self.emit(SessionEvent::StudyContentAdded {
                notes: counts.0,
                flashcards: counts.1,
                keywords: counts.2,
            });
        }
    }

    fn degraded(&mut self, message: String) {
        crate::verbose!("{message}");
        self.emit(SessionEvent::Degraded { message });
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    pub fn raw_transcript(&self) -> &str {
        &self.raw_transcript
    }

    pub fn polished_transcript(&self) -> &str {
        &self.polished_transcript
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn store(&self) -> &NotesStore {
        &self.store
    }

    pub fn sections(&self) -> &SectionAccumulator {
        &self.sections
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn reconstruction_disabled(&self) -> bool {
        self.reconstruction_disabled
    }

    /// Snapshot view handed to the Markdown exporter.
    pub fn export_input(&self, finished_at: DateTime<Local>) -> ExportInput<'_> {
        ExportInput {
            started_at: self.started_at,
            finished_at,
            polished_transcript: &self.polished_transcript,
            store: &self.store,
            sections: self.sections.sections(),
        }
    }
}

/// Drive a session until its command or audio stream ends.
///
/// Commands win over audio (`biased`) so a stop never waits behind a
/// backlog of chunks; unprocessed chunks are simply dropped with the
/// channel, which is what makes post-stop mutation impossible.
pub async fn run_session(
    session: &mut LectureSession,
    mut chunk_rx: UnboundedReceiver<AudioChunk>,
    mut cmd_rx: UnboundedReceiver<SessionCommand>,
) {
    loop {
        let deadline = session.next_deadline();
        let sleep_until = deadline
            .map(tokio::time::Instant::from_std)
            .unwrap_or_else(|| tokio::time::Instant::now() + Duration::from_secs(3600));

        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => match cmd {
                Some(SessionCommand::NewSection(title)) => session.start_section(title),
                Some(SessionCommand::Stop) | None => break,
            },

            chunk = chunk_rx.recv() => match chunk {
                Some(chunk) => session.process_chunk(chunk).await,
                None => break,
            },

            _ = tokio::time::sleep_until(sleep_until), if deadline.is_some() => {
                session.poll_timers(Instant::now()).await;
            }
        }
    }

    session.finish().await;
}

/// Append `text` to an append-only transcript view.
fn append_text(target: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}

fn tail_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().rev().nth(max_chars.saturating_sub(1)) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TranscribeResponse;
    use crate::notes::{Flashcard, Importance, Keyword, KeywordKind, Note, NoteKind};
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    /// Scripted backend: behavior is set per test, calls are counted.
    #[derive(Default)]
    struct MockBackend {
        reconstruct_fails: Mutex<bool>,
        reconstruct_calls: AtomicUsize,
        topic_fails: Mutex<bool>,
        topic_fits: Mutex<bool>,
        notes: Mutex<Vec<Note>>,
        flashcards: Mutex<Vec<Flashcard>>,
        keywords: Mutex<Vec<Keyword>>,
    }

    impl MockBackend {
        fn new() -> Self {
            let mock = Self::default();
            *mock.topic_fits.lock().unwrap() = true;
            mock
        }
    }

    #[async_trait]
    impl LectureBackend for MockBackend {
        async fn transcribe(&self, _audio_wav: &[u8]) -> Result<TranscribeResponse> {
            Err(anyhow!("not used in these tests"))
        }

        async fn reconstruct(&self, text: &str, _context: &str) -> Result<String> {
            self.reconstruct_calls.fetch_add(1, Ordering::SeqCst);
            if *self.reconstruct_fails.lock().unwrap() {
                Err(anyhow!("reconstruction backend down"))
            } else {
                Ok(format!("[fixed] {text}"))
            }
        }

        async fn check_topic(
            &self,
            _new_segment: &str,
            _context: &[String],
            _last_topic: Option<&str>,
        ) -> Result<bool> {
            if *self.topic_fails.lock().unwrap() {
                Err(anyhow!("topic backend down"))
            } else {
                Ok(*self.topic_fits.lock().unwrap())
            }
        }

        async fn generate_notes(&self, _text: &str, _context: &str) -> Result<Vec<Note>> {
            Ok(self.notes.lock().unwrap().clone())
        }

        async fn generate_flashcards(&self, _text: &str, _context: &str) -> Result<Vec<Flashcard>> {
            Ok(self.flashcards.lock().unwrap().clone())
        }

        async fn extract_keywords(&self, _text: &str) -> Result<Vec<Keyword>> {
            Ok(self.keywords.lock().unwrap().clone())
        }
    }

    fn fragment(text: &str, confidence: f32) -> TranscriptFragment {
        TranscriptFragment {
            text: text.to_string(),
            is_final: true,
            confidence,
            speaker: None,
            received_at: Instant::now(),
        }
    }

    fn tuning() -> SessionTuning {
        SessionTuning::default()
    }

    fn session_with(backend: Arc<MockBackend>, tuning: SessionTuning) -> LectureSession {
        LectureSession::new(backend, tuning, None)
    }

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

    #[tokio::test]
    async fn test_high_confidence_updates_both_views_synchronously() {
        let backend = Arc::new(MockBackend::new());
        let mut session = session_with(backend, tuning());

        let now = Instant::now();
        session
            .process_fragment(
                fragment("the mitochondria is the powerhouse", 0.9),
                now,
            )
            .await;

        assert_eq!(session.raw_transcript(), "the mitochondria is the powerhouse");
        assert_eq!(
            session.polished_transcript(),
            "the mitochondria is the powerhouse"
        );
        assert!(session.next_deadline().is_some()); // unterminated sentence pending
    }

    #[tokio::test]
    async fn test_low_confidence_waits_for_debounce() {
        let backend = Arc::new(MockBackend::new());
        let mut session = session_with(Arc::clone(&backend), tuning());

        let t0 = Instant::now();
        session.process_fragment(fragment("um", 0.4), t0).await;
        session
            .process_fragment(fragment("the cell wall", 0.5), t0 + Duration::from_millis(200))
            .await;

        assert_eq!(session.raw_transcript(), "");

        // Debounce elapses: a single combined flush goes through repair
        session
            .poll_timers(t0 + Duration::from_millis(800))
            .await;

        assert_eq!(session.raw_transcript(), "um the cell wall");
        assert_eq!(session.polished_transcript(), "[fixed] um the cell wall");
        assert_eq!(backend.reconstruct_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_breaker_opens_after_five_consecutive_failures() {
        let backend = Arc::new(MockBackend::new());
        *backend.reconstruct_fails.lock().unwrap() = true;
        let mut session = session_with(Arc::clone(&backend), tuning());

        let now = Instant::now();
        for i in 0..5 {
            session
                .process_fragment(fragment(&format!("um batch {i}."), 0.8), now)
                .await;
        }

        assert!(session.reconstruction_disabled());
        assert_eq!(backend.reconstruct_calls.load(Ordering::SeqCst), 5);

        // Breaker open: the service is no longer called, text kept verbatim
        session
            .process_fragment(fragment("um another one.", 0.8), now)
            .await;
        assert_eq!(backend.reconstruct_calls.load(Ordering::SeqCst), 5);
        assert!(session.polished_transcript().ends_with("um another one."));
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let backend = Arc::new(MockBackend::new());
        let mut session = session_with(Arc::clone(&backend), tuning());
        let now = Instant::now();

        *backend.reconstruct_fails.lock().unwrap() = true;
        for i in 0..4 {
            session
                .process_fragment(fragment(&format!("um fail {i}."), 0.8), now)
                .await;
        }

        *backend.reconstruct_fails.lock().unwrap() = false;
        session.process_fragment(fragment("um recovered.", 0.8), now).await;
        assert!(!session.reconstruction_disabled());

        // Four more failures don't reach the limit after the reset
        *backend.reconstruct_fails.lock().unwrap() = true;
        for i in 0..4 {
            session
                .process_fragment(fragment(&format!("um again {i}."), 0.8), now)
                .await;
        }
        assert!(!session.reconstruction_disabled());
    }

    #[tokio::test]
    async fn test_topic_network_error_uses_lexical_fallback() {
        let backend = Arc::new(MockBackend::new());
        *backend.topic_fails.lock().unwrap() = true;
        let mut session = session_with(Arc::clone(&backend), tuning());
        let now = Instant::now();

        // First segment admits via empty context and seeds it
        session
            .process_fragment(fragment("derivatives limits integration.", 0.9), now)
            .await;
        assert_eq!(session.stats().segments_accepted, 1);

        // Related segment passes the overlap fallback
        session
            .process_fragment(fragment("integration by parts.", 0.9), now)
            .await;
        assert_eq!(session.stats().segments_accepted, 2);

        // Unrelated segment fails it
        session
            .process_fragment(fragment("the french revolution began.", 0.9), now)
            .await;
        assert_eq!(session.stats().segments_discarded, 1);
    }

    #[tokio::test]
    async fn test_window_threshold_triggers_study_content() {
        let backend = Arc::new(MockBackend::new());
        *backend.notes.lock().unwrap() = vec![note("Mitosis has phases", Some("Cell division"))];
        *backend.keywords.lock().unwrap() = vec![Keyword {
            term: "Mitosis".to_string(),
            kind: KeywordKind::Concept,
            importance: Importance::High,
            description: "Cell division process".to_string(),
        }];

        let mut tuning = tuning();
        tuning.notes_window_chars = 10;
        let mut session = session_with(Arc::clone(&backend), tuning);
        let now = Instant::now();

        session
            .process_fragment(fragment("mitosis splits one cell into two.", 0.9), now)
            .await;

        assert_eq!(session.store().notes().len(), 1);
        assert_eq!(session.store().keywords().len(), 1);
        // Routed into the open initial section as well
        assert_eq!(session.sections().sections()[0].notes.len(), 1);
    }

    #[tokio::test]
    async fn test_finish_drains_buffered_text() {
        let backend = Arc::new(MockBackend::new());
        let mut session = session_with(backend, tuning());
        let now = Instant::now();

        session
            .process_fragment(fragment("one unfinished thought", 0.5), now)
            .await;
        assert_eq!(session.raw_transcript(), "");

        session.finish().await;
        assert_eq!(session.raw_transcript(), "one unfinished thought");
        assert!(!session.sections().is_open());
    }

    #[tokio::test]
    async fn test_new_section_sets_topic_and_routes_content() {
        let backend = Arc::new(MockBackend::new());
        let mut session = session_with(backend, tuning());

        session.start_section("Integration techniques");
        assert_eq!(session.sections().sections().len(), 2);
        assert_eq!(
            session.sections().sections()[1].title,
            "Integration techniques"
        );
        assert!(session.sections().sections()[0].ended_at.is_some());
    }

    #[test]
    fn test_tail_chars_respects_char_boundaries() {
        assert_eq!(tail_chars("hello", 3), "llo");
        assert_eq!(tail_chars("héllo", 4), "éllo");
        assert_eq!(tail_chars("ab", 10), "ab");
    }
}
