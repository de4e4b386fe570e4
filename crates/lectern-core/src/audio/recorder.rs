//! Microphone capture on a dedicated thread.
//!
//! cpal streams are not `Send`, so the stream lives on its own thread for
//! the duration of the session. Captured samples are resampled to 16kHz
//! mono in the audio callback and forwarded over an unbounded channel; the
//! session side chunks and transcribes them. Device failures are reported
//! synchronously from `start_capture` (fatal to session start), stream
//! glitches after that are counted and logged but never abort recording.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat, StreamConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;

use super::devices::select_input_device;
use super::resample::StreamResampler;
use super::CaptureError;

/// Stream errors seen during the current capture (reset on start)
static STREAM_ERROR_COUNT: AtomicU64 = AtomicU64::new(0);

/// Total stream errors from the last capture session
pub fn stream_error_count() -> u64 {
    STREAM_ERROR_COUNT.load(Ordering::Relaxed)
}

/// Handle to a running capture thread.
///
/// Dropping the handle without calling [`CaptureHandle::stop`] also stops
/// capture, but `stop` waits for the tail of the resampler to flush.
pub struct CaptureHandle {
    stop_tx: crossbeam_channel::Sender<()>,
    join: Option<std::thread::JoinHandle<()>>,
}

impl CaptureHandle {
    /// Stop capturing and wait for the capture thread to exit.
    pub fn stop(mut self) {
        let _ = self.stop_tx.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}

/// Start capturing from the named device (or the system default).
///
/// Resampled 16kHz mono batches are pushed into `sample_tx` until the
/// handle is stopped. Returns once the stream is live, or with a
/// [`CaptureError`] if the microphone is unavailable.
pub fn start_capture(
    device_name: Option<&str>,
    sample_tx: UnboundedSender<Vec<f32>>,
) -> Result<CaptureHandle, CaptureError> {
    STREAM_ERROR_COUNT.store(0, Ordering::Relaxed);

    let device_name = device_name.map(|s| s.to_string());
    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), CaptureError>>(1);

    let join = std::thread::spawn(move || {
        let setup = (|| -> Result<(cpal::Stream, Arc<Mutex<StreamResampler>>), CaptureError> {
            let device = select_input_device(device_name.as_deref())?;
            let config = device
                .default_input_config()
                .map_err(|e| CaptureError::Device(e.to_string()))?;

            let sample_format = config.sample_format();
            let stream_config: StreamConfig = config.clone().into();

            let resampler = StreamResampler::new(
                stream_config.sample_rate,
                stream_config.channels,
            )
            .map_err(|e| CaptureError::Device(e.to_string()))?;
            let resampler = Arc::new(Mutex::new(resampler));

            let stream = match sample_format {
                SampleFormat::F32 => {
                    build_stream::<f32>(&device, &stream_config, Arc::clone(&resampler), sample_tx)
                }
                SampleFormat::I16 => {
                    build_stream::<i16>(&device, &stream_config, Arc::clone(&resampler), sample_tx)
                }
                SampleFormat::U16 => {
                    build_stream::<u16>(&device, &stream_config, Arc::clone(&resampler), sample_tx)
                }
                other => {
                    return Err(CaptureError::Device(format!(
                        "Unsupported sample format: {other:?}"
                    )));
                }
            }?;

            stream
                .play()
                .map_err(|e| CaptureError::Stream(e.to_string()))?;

            Ok((stream, resampler))
        })();

        match setup {
            Ok((stream, resampler)) => {
                let _ = ready_tx.send(Ok(()));
                // Park until stop; the stream runs on cpal's audio thread.
                let _ = stop_rx.recv();
                drop(stream);
                if let Ok(mut r) = resampler.lock()
                    && let Ok(tail) = r.finish()
                    && !tail.is_empty()
                {
                    crate::verbose!("Capture flushed {} tail samples", tail.len());
                }
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e));
            }
        }
    });

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(CaptureHandle {
            stop_tx,
            join: Some(join),
        }),
        Ok(Err(e)) => {
            let _ = join.join();
            Err(e)
        }
        Err(_) => Err(CaptureError::Device(
            "Capture thread exited during setup".to_string(),
        )),
    }
}

/// Build the cpal input stream for a concrete sample type.
fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    resampler: Arc<Mutex<StreamResampler>>,
    sample_tx: UnboundedSender<Vec<f32>>,
) -> Result<cpal::Stream, CaptureError>
where
    T: cpal::Sample + cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    // Rate-limited handler: ALSA stream errors are common on Linux and
    // non-fatal, so only the first (and every thousandth) is reported.
    let err_fn = |err| {
        let count = STREAM_ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
        if count == 0 {
            crate::verbose!("Audio stream error (non-fatal): {err}");
        } else if count.is_multiple_of(1000) {
            crate::verbose!("Audio stream: {count} non-fatal errors so far");
        }
    };

    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let f32_samples: Vec<f32> =
                    data.iter().map(|&s| cpal::Sample::from_sample(s)).collect();

                let resampled = match resampler.lock().unwrap().process(&f32_samples) {
                    Ok(batch) => batch,
                    Err(_) => return,
                };

                if !resampled.is_empty() {
                    // Unbounded send never blocks the audio thread; a closed
                    // receiver just means the session already stopped.
                    let _ = sample_tx.send(resampled);
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| CaptureError::Stream(e.to_string()))?;

    Ok(stream)
}
