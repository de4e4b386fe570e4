//! WAV encoding for the transcription payload.
//!
//! The `/transcribe` endpoint takes base64-encoded audio; a 16-bit PCM WAV
//! container keeps the payload self-describing without an external encoder.

use anyhow::{Context, Result};
use std::io::Cursor;

use crate::audio::SAMPLE_RATE;

/// Encode f32 PCM samples (16kHz mono) as a 16-bit PCM WAV file in memory.
pub fn encode_wav(samples: &[f32]) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .context("Failed to create WAV writer")?;
        for &sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(value).context("Failed to write sample")?;
        }
        writer.finalize().context("Failed to finalize WAV data")?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_header_and_length() {
        let wav = encode_wav(&[0.0, 0.5, -0.5, 1.0]).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        // 44-byte canonical header + 2 bytes per sample
        assert_eq!(wav.len(), 44 + 4 * 2);
    }

    #[test]
    fn test_clipping_is_clamped() {
        // Out-of-range samples must not wrap around
        let wav = encode_wav(&[2.0, -2.0]).unwrap();
        let hi = i16::from_le_bytes([wav[44], wav[45]]);
        let lo = i16::from_le_bytes([wav[46], wav[47]]);
        assert_eq!(hi, i16::MAX);
        assert_eq!(lo, -i16::MAX);
    }
}
