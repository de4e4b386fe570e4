//! Audio resampling to the 16kHz mono format the backend expects.

use anyhow::{Context, Result};
use rubato::{FftFixedIn, Resampler};

use crate::audio::SAMPLE_RATE;

/// Streaming resampler from the device rate down to 16kHz mono.
///
/// Wraps rubato's FFT resampler with an internal carry buffer so callers
/// can feed capture batches of arbitrary size.
pub struct StreamResampler {
    inner: Option<FftFixedIn<f32>>,
    channels: u16,
    carry: Vec<f32>,
    chunk_size: usize,
}

impl StreamResampler {
    /// Create a resampler for the given device configuration.
    ///
    /// When the device already delivers 16kHz audio the resampler is a
    /// passthrough (mono conversion only).
    pub fn new(source_rate: u32, channels: u16) -> Result<Self> {
        let inner = if source_rate == SAMPLE_RATE {
            None
        } else {
            Some(
                FftFixedIn::<f32>::new(
                    source_rate as usize,
                    SAMPLE_RATE as usize,
                    1024, // chunk size
                    2,    // sub-chunks
                    1,    // channels (mono)
                )
                .context("Failed to create resampler")?,
            )
        };

        let chunk_size = inner
            .as_ref()
            .map(|r| r.input_frames_max())
            .unwrap_or(1024);

        Ok(Self {
            inner,
            channels: channels.max(1),
            carry: Vec::new(),
            chunk_size,
        })
    }

    /// Process a batch of interleaved device samples, returning 16kHz mono.
    ///
    /// Input shorter than the resampler's chunk size is carried over to the
    /// next call, so output may lag input by up to one chunk.
    pub fn process(&mut self, samples: &[f32]) -> Result<Vec<f32>> {
        let mono = if self.channels > 1 {
            to_mono(samples, self.channels)
        } else {
            samples.to_vec()
        };

        let Some(resampler) = self.inner.as_mut() else {
            return Ok(mono);
        };

        self.carry.extend_from_slice(&mono);

        let mut output = Vec::new();
        while self.carry.len() >= self.chunk_size {
            let rest = self.carry.split_off(self.chunk_size);
            let chunk = std::mem::replace(&mut self.carry, rest);

            let result = resampler
                .process(&[chunk], None)
                .context("Resampling failed")?;
            output.extend_from_slice(&result[0]);
        }

        Ok(output)
    }

    /// Flush the carry buffer (zero-padded) when capture stops.
    pub fn finish(&mut self) -> Result<Vec<f32>> {
        let Some(resampler) = self.inner.as_mut() else {
            return Ok(Vec::new());
        };

        if self.carry.is_empty() {
            return Ok(Vec::new());
        }

        let mut padded = std::mem::take(&mut self.carry);
        padded.resize(self.chunk_size, 0.0);

        let result = resampler
            .process(&[padded], None)
            .context("Resampling failed")?;
        Ok(result[0].clone())
    }
}

/// Convert multichannel audio to mono by averaging all channels
fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_mono_averages_channels() {
        let stereo = vec![0.5, 0.3, 0.8, 0.2, 1.0, 0.0];
        let mono = to_mono(&stereo, 2);
        assert_eq!(mono.len(), 3);
        assert!((mono[0] - 0.4).abs() < 0.001);
        assert!((mono[1] - 0.5).abs() < 0.001);
        assert!((mono[2] - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_passthrough_at_16k() {
        let mut resampler = StreamResampler::new(SAMPLE_RATE, 1).unwrap();
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resampler.process(&samples).unwrap(), samples);
        assert!(resampler.finish().unwrap().is_empty());
    }

    #[test]
    fn test_downsample_halves_sample_count() {
        let mut resampler = StreamResampler::new(32000, 1).unwrap();
        let mut output = resampler.process(&vec![0.0; 32000]).unwrap();
        output.extend(resampler.finish().unwrap());
        // One second of input should come out near one second at 16kHz;
        // FFT block edges may trim a little.
        assert!((output.len() as i64 - 16000).unsigned_abs() < 2048);
    }
}
