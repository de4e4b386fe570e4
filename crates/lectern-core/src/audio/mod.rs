//! Audio capture, resampling, chunking, and encoding.

mod chunker;
pub mod devices;
mod encoder;
mod recorder;
mod resample;

pub use chunker::{AudioChunk, Chunker};
pub use devices::{AudioDeviceInfo, list_audio_devices};
pub use encoder::encode_wav;
pub use recorder::{CaptureHandle, start_capture, stream_error_count};
pub use resample::StreamResampler;

/// Sample rate of everything downstream of the capture thread
pub const SAMPLE_RATE: u32 = 16_000;

/// Errors that prevent a capture session from starting.
///
/// These are fatal: the session is never started with a broken microphone.
/// Network failures during a running session are handled separately and
/// never abort recording.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("No default audio input device available")]
    NoDefaultDevice,

    #[error("Audio input device not found: {0}")]
    DeviceNotFound(String),

    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Audio stream error: {0}")]
    Stream(String),
}
