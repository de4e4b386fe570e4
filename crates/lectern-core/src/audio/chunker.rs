//! Fixed-duration chunking of the live sample stream.
//!
//! The capture thread delivers resampled 16kHz mono batches of arbitrary
//! size; the chunker reassembles them into fixed ~3 second chunks for the
//! transcription endpoint. Pure accumulation, no timers: a chunk is emitted
//! as soon as enough samples have arrived, and `finish()` yields whatever
//! partial tail remains when the session stops.

use crate::audio::SAMPLE_RATE;

/// One fixed-duration chunk of 16kHz mono audio.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Sequence number, starting at 0
    pub index: usize,
    /// f32 PCM samples, 16kHz mono
    pub samples: Vec<f32>,
}

impl AudioChunk {
    /// Duration of this chunk in seconds
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / SAMPLE_RATE as f32
    }
}

/// Accumulates incoming sample batches into fixed-size chunks.
#[derive(Debug)]
pub struct Chunker {
    samples_per_chunk: usize,
    pending: Vec<f32>,
    next_index: usize,
}

impl Chunker {
    /// Create a chunker producing chunks of `chunk_secs` seconds.
    pub fn new(chunk_secs: u32) -> Self {
        let chunk_secs = chunk_secs.max(1);
        Self {
            samples_per_chunk: chunk_secs as usize * SAMPLE_RATE as usize,
            pending: Vec::new(),
            next_index: 0,
        }
    }

    /// Feed a batch of samples, returning any completed chunks.
    pub fn push(&mut self, samples: &[f32]) -> Vec<AudioChunk> {
        self.pending.extend_from_slice(samples);

        let mut chunks = Vec::new();
        while self.pending.len() >= self.samples_per_chunk {
            let rest = self.pending.split_off(self.samples_per_chunk);
            let full = std::mem::replace(&mut self.pending, rest);
            chunks.push(AudioChunk {
                index: self.next_index,
                samples: full,
            });
            self.next_index += 1;
        }
        chunks
    }

    /// Flush the partial tail, if any. Called once when recording stops.
    pub fn finish(&mut self) -> Option<AudioChunk> {
        if self.pending.is_empty() {
            return None;
        }
        let samples = std::mem::take(&mut self.pending);
        let chunk = AudioChunk {
            index: self.next_index,
            samples,
        };
        self.next_index += 1;
        Some(chunk)
    }
}
