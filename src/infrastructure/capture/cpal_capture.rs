//! Live capture from the default input device using cpal
//!
//! The stream lives on its own thread because `cpal::Stream` is not `Send`.
//! Device frames are down-mixed to mono floats and re-chunked into fixed
//! blocks before they reach the recorder.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration as StdDuration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};

use crate::application::ports::{AudioCapture, CaptureError, ChunkCallback};

/// Samples per chunk handed to the recorder
pub const CHUNK_SAMPLES: usize = 2048;

/// How often the stream thread checks for `close`
const POLL_INTERVAL: StdDuration = StdDuration::from_millis(20);

/// Regroups arbitrary device buffers into chunks of a fixed size.
///
/// A partial chunk left over when capture closes is discarded.
#[derive(Debug)]
pub struct Rechunker {
    size: usize,
    pending: Vec<f32>,
}

impl Rechunker {
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            pending: Vec::with_capacity(size),
        }
    }

    /// Buffer `samples`, calling `emit` once per completed chunk
    pub fn push<F>(&mut self, mut samples: &[f32], mut emit: F)
    where
        F: FnMut(&[f32]),
    {
        while !samples.is_empty() {
            let take = (self.size - self.pending.len()).min(samples.len());
            self.pending.extend_from_slice(&samples[..take]);
            samples = &samples[take..];

            if self.pending.len() == self.size {
                emit(&self.pending);
                self.pending.clear();
            }
        }
    }

    #[cfg(test)]
    fn buffered(&self) -> usize {
        self.pending.len()
    }
}

/// Highest rate within `min..=max` that does not exceed `cap`
fn capped_rate(min: u32, max: u32, cap: u32) -> Option<u32> {
    (min <= cap).then(|| max.min(cap))
}

fn is_usable(format: SampleFormat) -> bool {
    format == SampleFormat::I16 || format == SampleFormat::F32
}

/// Average interleaved frames down to one channel
pub fn downmix<T: Copy>(data: &[T], channels: u16, to_f32: impl Fn(T) -> f32) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    data.chunks(channels)
        .map(|frame| frame.iter().map(|&s| to_f32(s)).sum::<f32>() / frame.len() as f32)
        .collect()
}

fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / 32768.0
}

/// Capture adapter for the host's default input device
#[derive(Debug, Default)]
pub struct CpalCapture {
    running: Option<Arc<AtomicBool>>,
    max_sample_rate: Option<u32>,
}

impl CpalCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture at no more than `max` Hz, for encoders with a rate limit
    pub fn with_max_sample_rate(max: u32) -> Self {
        Self {
            running: None,
            max_sample_rate: Some(max),
        }
    }

    /// Get the default input device
    fn input_device() -> Result<cpal::Device, CaptureError> {
        cpal::default_host()
            .default_input_device()
            .ok_or(CaptureError::NoAudioDevice)
    }

    /// Use the device's native configuration unless it runs faster than
    /// `cap`; then pick the fastest supported one at or below it. No
    /// resampling happens here.
    fn input_config(
        device: &cpal::Device,
        cap: Option<u32>,
    ) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::StartFailed(format!("Failed to get config: {}", e)))?;

        let sample_format = supported.sample_format();
        if !is_usable(sample_format) {
            return Err(CaptureError::UnsupportedFormat(format!("{:?}", sample_format)));
        }

        let Some(cap) = cap.filter(|&cap| supported.sample_rate().0 > cap) else {
            return Ok((supported.config(), sample_format));
        };

        tracing::debug!(
            "Default input rate {} Hz is above {} Hz, looking for a slower config",
            supported.sample_rate().0,
            cap
        );

        let slower = device
            .supported_input_configs()
            .map_err(|e| CaptureError::StartFailed(format!("Failed to list configs: {}", e)))?
            .filter(|range| is_usable(range.sample_format()))
            .filter_map(|range| {
                capped_rate(range.min_sample_rate().0, range.max_sample_rate().0, cap)
                    .map(|rate| range.with_sample_rate(SampleRate(rate)))
            })
            .max_by_key(|config| config.sample_rate().0)
            .ok_or_else(|| {
                CaptureError::StartFailed(format!("No input configuration at or below {} Hz", cap))
            })?;

        let sample_format = slower.sample_format();
        Ok((slower.config(), sample_format))
    }

    fn build_stream(
        running: Arc<AtomicBool>,
        cap: Option<u32>,
        mut on_chunk: ChunkCallback,
    ) -> Result<(cpal::Stream, u32), CaptureError> {
        let device = Self::input_device()?;
        let (config, sample_format) = Self::input_config(&device, cap)?;
        let sample_rate = config.sample_rate.0;
        let channels = config.channels;

        if let Ok(name) = device.name() {
            tracing::info!("Capturing from '{}' ({} ch, {} Hz, {:?})", name, channels, sample_rate, sample_format);
        }

        let on_error = |err: cpal::StreamError| tracing::error!("Audio stream error: {}", err);
        let mut rechunker = Rechunker::new(CHUNK_SAMPLES);

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if running.load(Ordering::SeqCst) {
                        let mono = downmix(data, channels, i16_to_f32);
                        rechunker.push(&mono, |chunk| on_chunk(chunk));
                    }
                },
                on_error,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if running.load(Ordering::SeqCst) {
                        let mono = downmix(data, channels, |s| s);
                        rechunker.push(&mono, |chunk| on_chunk(chunk));
                    }
                },
                on_error,
                None,
            ),
            other => return Err(CaptureError::UnsupportedFormat(format!("{:?}", other))),
        }
        .map_err(|e| CaptureError::StartFailed(e.to_string()))?;

        stream
            .play()
            .map_err(|e| CaptureError::StartFailed(e.to_string()))?;

        Ok((stream, sample_rate))
    }

    fn run(
        running: Arc<AtomicBool>,
        cap: Option<u32>,
        on_chunk: ChunkCallback,
        ready: mpsc::Sender<Result<u32, CaptureError>>,
    ) {
        let stream = match Self::build_stream(Arc::clone(&running), cap, on_chunk) {
            Ok((stream, rate)) => {
                let _ = ready.send(Ok(rate));
                stream
            }
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };

        while running.load(Ordering::SeqCst) {
            thread::sleep(POLL_INTERVAL);
        }

        drop(stream);
        tracing::debug!("Capture thread finished");
    }
}

impl AudioCapture for CpalCapture {
    fn host_supported() -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    fn open(&mut self, on_chunk: ChunkCallback) -> Result<u32, CaptureError> {
        self.close();

        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = mpsc::channel();
        let thread_running = Arc::clone(&running);
        let cap = self.max_sample_rate;

        thread::Builder::new()
            .name("cpal-capture".into())
            .spawn(move || Self::run(thread_running, cap, on_chunk, ready_tx))
            .map_err(|e| CaptureError::StartFailed(format!("Failed to spawn capture thread: {}", e)))?;

        let rate = ready_rx
            .recv()
            .map_err(|_| CaptureError::StartFailed("Capture thread exited during setup".into()))??;

        self.running = Some(running);
        Ok(rate)
    }

    fn close(&mut self) {
        // The thread notices within one poll interval; never join here, the
        // caller may hold a lock the stream callback is waiting on.
        if let Some(running) = self.running.take() {
            running.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        self.close();
    }
}
