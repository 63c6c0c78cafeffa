//! Encoder worker running on a dedicated thread
//!
//! The worker exclusively owns an `Encoder` and its accumulation buffer.
//! Requests arrive on one ordered channel and flush results leave on another,
//! so an append sent before a dump is always part of that dump's output.

use std::thread;

use tokio::sync::mpsc;

use super::ports::Encoder;
use crate::domain::encoding::AudioMimeType;
use crate::domain::error::EncodeError;

/// Requests accepted by the worker
#[derive(Debug, Clone, PartialEq)]
pub enum EncoderRequest {
    Append(Vec<f32>),
    Dump { sample_rate: u32 },
}

/// Messages sent back by the worker
#[derive(Debug, Clone, PartialEq)]
pub enum EncoderResponse {
    /// A dump succeeded; the bytes are a complete container
    Encoded(Vec<u8>),
    /// An append was rejected; its samples were discarded
    AppendFailed(EncodeError),
    /// A dump was rejected; the accumulated samples were discarded
    DumpFailed(EncodeError),
}

/// Handle to a running encoder worker.
///
/// Dropping the handle closes the request channel; the worker finishes the
/// requests already queued, answers them, and exits. The thread is detached,
/// so dropping never waits on it.
pub struct EncoderWorker {
    tx: mpsc::UnboundedSender<EncoderRequest>,
    mime_type: AudioMimeType,
}

impl EncoderWorker {
    /// Move `encoder` onto a new thread.
    ///
    /// # Returns
    /// The worker handle and the receiver for its responses
    pub fn spawn<E>(encoder: E) -> Result<(Self, mpsc::UnboundedReceiver<EncoderResponse>), EncodeError>
    where
        E: Encoder + 'static,
    {
        let mime_type = encoder.mime_type();
        let (tx, rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();

        thread::Builder::new()
            .name(format!("{}-encoder", mime_type.extension()))
            .spawn(move || Self::run(encoder, rx, response_tx))
            .map_err(|e| EncodeError::Backend(format!("Failed to spawn encoder thread: {}", e)))?;

        tracing::debug!("Encoder worker started ({})", mime_type);

        Ok((Self { tx, mime_type }, response_rx))
    }

    /// Queue a chunk. Never blocks.
    pub fn append(&self, samples: Vec<f32>) -> Result<(), EncodeError> {
        self.send(EncoderRequest::Append(samples))
    }

    /// Queue a flush. The container arrives later on the response channel.
    pub fn dump(&self, sample_rate: u32) -> Result<(), EncodeError> {
        self.send(EncoderRequest::Dump { sample_rate })
    }

    /// Format of the containers this worker emits
    pub fn mime_type(&self) -> AudioMimeType {
        self.mime_type
    }

    fn send(&self, request: EncoderRequest) -> Result<(), EncodeError> {
        self.tx.send(request).map_err(|_| EncodeError::WorkerGone)
    }

    fn run<E: Encoder>(
        mut encoder: E,
        mut rx: mpsc::UnboundedReceiver<EncoderRequest>,
        responses: mpsc::UnboundedSender<EncoderResponse>,
    ) {
        while let Some(request) = rx.blocking_recv() {
            let response = match request {
                EncoderRequest::Append(samples) => match encoder.append(&samples) {
                    Ok(()) => continue,
                    Err(e) => {
                        tracing::error!("Rejected chunk of {} samples: {}", samples.len(), e);
                        EncoderResponse::AppendFailed(e)
                    }
                },
                EncoderRequest::Dump { sample_rate } => {
                    let pending = encoder.pending_samples();
                    match encoder.flush(sample_rate) {
                        Ok(bytes) => {
                            tracing::debug!(
                                "Encoded {} samples into {} bytes at {} Hz",
                                pending,
                                bytes.len(),
                                sample_rate
                            );
                            EncoderResponse::Encoded(bytes)
                        }
                        Err(e) => {
                            tracing::error!("Flush of {} samples failed: {}", pending, e);
                            EncoderResponse::DumpFailed(e)
                        }
                    }
                }
            };

            if responses.send(response).is_err() {
                tracing::debug!("Response receiver dropped, stopping encoder worker");
                break;
            }
        }

        tracing::debug!("Encoder worker stopped");
    }
}
