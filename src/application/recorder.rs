//! MediaRecorder use case
//!
//! Glues the pure state machine to its side effects: the capture port, the
//! encoder worker, the timeslice ticker and the event bus.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::domain::encoding::{AudioData, AudioMimeType};
use crate::domain::error::EncodeError;
use crate::domain::recorder::{
    transition, Effect, EventKind, FlushKind, Operation, RecorderEvent, RecorderState,
};
use crate::domain::recording::Duration;

use super::encoder_worker::{EncoderResponse, EncoderWorker};
use super::events::{EventBus, ListenerId};
use super::ports::{AudioCapture, CaptureError, ChunkCallback, Encoder};

/// Errors from recorder construction and `start`
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Encoder failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("MediaRecorder must be created inside a Tokio runtime")]
    NoRuntime,
}

struct Session {
    state: RecorderState,
    capture: Box<dyn AudioCapture>,
    sample_rate: u32,
    slicer: Option<JoinHandle<()>>,
}

impl Session {
    fn cancel_slicer(&mut self) {
        if let Some(slicer) = self.slicer.take() {
            slicer.abort();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel_slicer();
        if self.state.is_active() {
            self.capture.close();
        }
    }
}

/// Entries awaiting delivery, in the order their operations ran
enum Queued {
    /// A requested flush; `outcome` is filled in when the encoder answers
    Flush {
        kind: FlushKind,
        outcome: Option<RecorderEvent>,
    },
    Event(RecorderEvent),
}

impl Queued {
    fn is_ready(&self) -> bool {
        !matches!(self, Self::Flush { outcome: None, .. })
    }
}

#[derive(Default)]
struct Outbox {
    entries: VecDeque<Queued>,
    /// Set while one thread publishes entries; others only enqueue
    draining: bool,
}

/// Delivery side, shared with the response task so queued flushes still
/// reach listeners after the recorder handle is gone.
///
/// Every event goes through `outbox` in operation order. Whichever thread
/// finds the outbox idle publishes ready entries from the front until it
/// reaches a flush the encoder has not answered yet.
struct Dispatch {
    events: EventBus,
    outbox: Mutex<Outbox>,
    mime_type: AudioMimeType,
}

impl Dispatch {
    fn outbox(&self) -> MutexGuard<'_, Outbox> {
        self.outbox.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push_event(&self, event: RecorderEvent) {
        self.outbox().entries.push_back(Queued::Event(event));
    }

    fn push_flush(&self, kind: FlushKind) {
        self.outbox()
            .entries
            .push_back(Queued::Flush { kind, outcome: None });
    }

    /// Record the outcome of the most recently requested flush
    fn fail_last_flush(&self, error: EncodeError) {
        let mut outbox = self.outbox();
        let pending = outbox
            .entries
            .iter_mut()
            .rev()
            .find(|entry| matches!(entry, Queued::Flush { outcome: None, .. }));
        match pending {
            Some(Queued::Flush { outcome, .. }) => *outcome = Some(RecorderEvent::Error(error)),
            _ => outbox.entries.push_back(Queued::Event(RecorderEvent::Error(error))),
        }
    }

    /// Record the encoder's answer to the oldest unanswered flush
    fn resolve_flush(&self, result: RecorderEvent) {
        let mut outbox = self.outbox();
        let pending = outbox
            .entries
            .iter_mut()
            .find(|entry| matches!(entry, Queued::Flush { outcome: None, .. }));
        match pending {
            Some(Queued::Flush { outcome, .. }) => *outcome = Some(result),
            _ => {
                tracing::warn!("Encoder answered a flush nobody requested");
                outbox.entries.push_back(Queued::Event(result));
            }
        }
    }

    /// Queue an error for a rejected chunk.
    ///
    /// Flushes requested before that chunk have all been answered, so the
    /// error goes right before the first unanswered one.
    fn append_failed(&self, error: EncodeError) {
        let mut outbox = self.outbox();
        let at = outbox
            .entries
            .iter()
            .position(|entry| !entry.is_ready())
            .unwrap_or(outbox.entries.len());
        outbox
            .entries
            .insert(at, Queued::Event(RecorderEvent::Error(error)));
    }

    /// Publish ready entries from the front, unless another thread already is.
    ///
    /// Listeners run without any lock held; a listener that calls back into
    /// the recorder has its events published once it returns.
    fn drain(&self) {
        {
            let mut outbox = self.outbox();
            if outbox.draining {
                return;
            }
            outbox.draining = true;
        }

        loop {
            let next = {
                let mut outbox = self.outbox();
                if outbox.entries.front().is_some_and(Queued::is_ready) {
                    outbox.entries.pop_front()
                } else {
                    outbox.draining = false;
                    None
                }
            };

            match next {
                Some(Queued::Event(event)) => {
                    self.events.publish(&event);
                }
                Some(Queued::Flush {
                    kind,
                    outcome: Some(outcome),
                }) => {
                    self.events.publish(&outcome);
                    if kind == FlushKind::Final {
                        self.events.publish(&RecorderEvent::Stop);
                    }
                }
                _ => break,
            }
        }
    }

    async fn deliver(self: Arc<Self>, mut responses: mpsc::UnboundedReceiver<EncoderResponse>) {
        while let Some(response) = responses.recv().await {
            match response {
                EncoderResponse::Encoded(bytes) => {
                    let data = AudioData::new(bytes, self.mime_type);
                    tracing::debug!("Delivering {} of {}", data.human_readable_size(), data.mime_type());
                    self.resolve_flush(RecorderEvent::DataAvailable(data));
                }
                EncoderResponse::DumpFailed(e) => self.resolve_flush(RecorderEvent::Error(e)),
                EncoderResponse::AppendFailed(e) => self.append_failed(e),
            }
            self.drain();
        }
        tracing::debug!("Event delivery finished");
    }
}

struct Shared {
    session: Mutex<Session>,
    encoder: EncoderWorker,
    dispatch: Arc<Dispatch>,
    runtime: Handle,
}

impl Shared {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `op` through the state machine and carry out its effects.
    ///
    /// Effects run under the session lock; events are published after it
    /// is released.
    fn apply(self: &Arc<Self>, op: Operation) -> Result<(), RecorderError> {
        {
            let mut session = self.session();
            let from = session.state;
            let step = transition(from, op);
            if step.is_noop() {
                tracing::debug!("Ignoring {:?} while {}", op, from);
                return Ok(());
            }

            for effect in step.effects {
                match effect {
                    Effect::OpenCapture => {
                        let rate = session.capture.open(self.chunk_callback())?;
                        tracing::info!("Capture opened at {} Hz", rate);
                        session.sample_rate = rate;
                    }
                    Effect::CloseCapture => {
                        session.capture.close();
                        tracing::info!("Capture closed");
                    }
                    Effect::Flush(kind) => self.flush(&session, kind),
                    Effect::ScheduleTimeslice(slice) => {
                        session.cancel_slicer();
                        session.slicer = Some(self.schedule(slice));
                    }
                    Effect::CancelTimeslice => session.cancel_slicer(),
                    Effect::Emit(kind) => {
                        if let Some(event) = RecorderEvent::lifecycle(kind) {
                            self.dispatch.push_event(event);
                        }
                    }
                    // Chunks never travel through `apply`
                    Effect::ForwardChunk => {}
                }
            }

            session.state = step.next;
            tracing::debug!("Recorder {} -> {} on {:?}", from, step.next, op);
        }

        self.dispatch.drain();
        Ok(())
    }

    fn flush(&self, session: &Session, kind: FlushKind) {
        // Queue the entry before the request so the delivery task can never
        // see the response first.
        self.dispatch.push_flush(kind);
        if let Err(e) = self.encoder.dump(session.sample_rate) {
            tracing::error!("Flush request lost: {}", e);
            self.dispatch.fail_last_flush(e);
        }
    }

    fn on_chunk(&self, samples: &[f32]) {
        let forwarded = {
            let session = self.session();
            let step = transition(session.state, Operation::ChunkArrived);
            if !step.effects.contains(&Effect::ForwardChunk) {
                return;
            }
            self.encoder.append(samples.to_vec())
        };

        if let Err(e) = forwarded {
            tracing::error!("Dropping chunk of {} samples: {}", samples.len(), e);
            self.dispatch.append_failed(e);
            self.dispatch.drain();
        }
    }

    fn chunk_callback(self: &Arc<Self>) -> ChunkCallback {
        let weak = Arc::downgrade(self);
        Box::new(move |samples: &[f32]| {
            if let Some(shared) = weak.upgrade() {
                shared.on_chunk(samples);
            }
        })
    }

    fn schedule(self: &Arc<Self>, slice: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tracing::debug!("Flushing every {}", slice);

        self.runtime.spawn(async move {
            let mut ticker = time::interval(slice.as_std());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                // A tick only ever flushes, which cannot fail here
                let _ = shared.apply(Operation::TimesliceElapsed);
            }
        })
    }
}

/// Records audio from an `AudioCapture` source into encoded blobs.
///
/// Control operations are synchronous and may be called from any thread.
/// Events reach listeners in the order their operations took effect.
/// `start`, `pause` and `resume` are usually published on the calling thread
/// before the operation returns; if an earlier flush is still unanswered,
/// or another thread is publishing, they follow it from that thread.
/// `dataavailable`, `error` and `stop` arrive once the encoder answers.
pub struct MediaRecorder {
    shared: Arc<Shared>,
}

impl MediaRecorder {
    /// Create an inactive recorder.
    ///
    /// Must be called inside a Tokio runtime; the recorder keeps a handle to
    /// it for the timeslice ticker and the delivery task.
    pub fn new<C, E>(capture: C, encoder: E) -> Result<Self, RecorderError>
    where
        C: AudioCapture + 'static,
        E: Encoder + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| RecorderError::NoRuntime)?;
        let (encoder, responses) = EncoderWorker::spawn(encoder)?;

        let dispatch = Arc::new(Dispatch {
            events: EventBus::new(),
            outbox: Mutex::new(Outbox::default()),
            mime_type: encoder.mime_type(),
        });
        runtime.spawn(Arc::clone(&dispatch).deliver(responses));

        let shared = Arc::new(Shared {
            session: Mutex::new(Session {
                state: RecorderState::Inactive,
                capture: Box::new(capture),
                sample_rate: 0,
                slicer: None,
            }),
            encoder,
            dispatch,
            runtime,
        });

        Ok(Self { shared })
    }

    /// Whether `mime` names a container this crate can produce
    pub fn is_type_supported(mime: &str) -> bool {
        AudioMimeType::from_mime(mime).is_some()
    }

    /// Begin recording. A `timeslice` other than zero flushes periodically.
    ///
    /// Ignored unless inactive. Fails only when the capture source cannot
    /// be opened, in which case the recorder stays inactive.
    pub fn start(&self, timeslice: Option<Duration>) -> Result<(), RecorderError> {
        self.shared.apply(Operation::Start { timeslice })
    }

    pub fn pause(&self) {
        self.control(Operation::Pause);
    }

    pub fn resume(&self) {
        self.control(Operation::Resume);
    }

    /// End the session. The final `dataavailable` precedes `stop`.
    pub fn stop(&self) {
        self.control(Operation::Stop);
    }

    /// Flush what has been recorded so far without ending the session
    pub fn request_data(&self) {
        self.control(Operation::RequestData);
    }

    /// Current lifecycle state
    pub fn state(&self) -> RecorderState {
        self.shared.session().state
    }

    /// Container format of every `dataavailable` payload
    pub fn mime_type(&self) -> AudioMimeType {
        self.shared.dispatch.mime_type
    }

    /// Register `handler` for events of `kind`
    pub fn add_event_listener<F>(&self, kind: EventKind, handler: F) -> ListenerId
    where
        F: Fn(&RecorderEvent) + Send + Sync + 'static,
    {
        self.shared.dispatch.events.subscribe(kind, handler)
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.shared.dispatch.events.unsubscribe(id)
    }

    fn control(&self, op: Operation) {
        // Only `start` opens the capture source, so nothing else can fail
        if let Err(e) = self.shared.apply(op) {
            tracing::error!("{:?} failed: {}", op, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct SilentEncoder;

    impl Encoder for SilentEncoder {
        fn append(&mut self, _samples: &[f32]) -> Result<(), EncodeError> {
            Ok(())
        }

        fn flush(&mut self, _sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
            Ok(Vec::new())
        }

        fn pending_samples(&self) -> usize {
            0
        }

        fn mime_type(&self) -> AudioMimeType {
            AudioMimeType::Wav
        }
    }

    struct FailingCapture {
        closed: Arc<AtomicBool>,
    }

    impl AudioCapture for FailingCapture {
        fn host_supported() -> bool {
            false
        }

        fn open(&mut self, _on_chunk: ChunkCallback) -> Result<u32, CaptureError> {
            Err(CaptureError::NoAudioDevice)
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn requires_runtime() {
        let capture = FailingCapture {
            closed: Arc::new(AtomicBool::new(false)),
        };
        assert!(matches!(
            MediaRecorder::new(capture, SilentEncoder),
            Err(RecorderError::NoRuntime)
        ));
    }

    #[tokio::test]
    async fn capture_failure_keeps_recorder_inactive() {
        let closed = Arc::new(AtomicBool::new(false));
        let recorder = MediaRecorder::new(
            FailingCapture {
                closed: Arc::clone(&closed),
            },
            SilentEncoder,
        )
        .unwrap();

        let started = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&started);
        recorder.add_event_listener(EventKind::Start, move |_| flag.store(true, Ordering::SeqCst));

        let result = recorder.start(None);

        assert!(matches!(
            result,
            Err(RecorderError::Capture(CaptureError::NoAudioDevice))
        ));
        assert_eq!(recorder.state(), RecorderState::Inactive);
        assert!(!started.load(Ordering::SeqCst));

        drop(recorder);
        assert!(!closed.load(Ordering::SeqCst));
    }

    fn observed_dispatch() -> (Dispatch, Arc<Mutex<Vec<RecorderEvent>>>) {
        let dispatch = Dispatch {
            events: EventBus::new(),
            outbox: Mutex::new(Outbox::default()),
            mime_type: AudioMimeType::Wav,
        };
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in EventKind::ALL {
            let seen = Arc::clone(&seen);
            dispatch
                .events
                .subscribe(kind, move |event| seen.lock().unwrap().push(event.clone()));
        }
        (dispatch, seen)
    }

    fn blob() -> AudioData {
        AudioData::new(vec![1, 2, 3], AudioMimeType::Wav)
    }

    #[test]
    fn start_precedes_a_flush_answered_before_it_was_published() {
        let (dispatch, seen) = observed_dispatch();

        // `start` queued, then a concurrent `request_data` is answered and
        // the delivery task runs before the starting thread publishes.
        dispatch.push_event(RecorderEvent::Start);
        dispatch.push_flush(FlushKind::Slice);
        dispatch.resolve_flush(RecorderEvent::DataAvailable(blob()));
        dispatch.drain();
        dispatch.drain();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![RecorderEvent::Start, RecorderEvent::DataAvailable(blob())]
        );
    }

    #[test]
    fn events_wait_behind_unanswered_flush() {
        let (dispatch, seen) = observed_dispatch();

        dispatch.push_flush(FlushKind::Slice);
        dispatch.push_event(RecorderEvent::Pause);
        dispatch.drain();
        assert!(seen.lock().unwrap().is_empty());

        dispatch.resolve_flush(RecorderEvent::DataAvailable(blob()));
        dispatch.drain();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![RecorderEvent::DataAvailable(blob()), RecorderEvent::Pause]
        );
    }

    #[test]
    fn final_flush_publishes_stop_before_next_start() {
        let (dispatch, seen) = observed_dispatch();

        dispatch.push_flush(FlushKind::Final);
        dispatch.push_event(RecorderEvent::Start);
        dispatch.resolve_flush(RecorderEvent::DataAvailable(blob()));
        dispatch.drain();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                RecorderEvent::DataAvailable(blob()),
                RecorderEvent::Stop,
                RecorderEvent::Start,
            ]
        );
    }

    #[test]
    fn rejected_chunk_error_precedes_the_flush_after_it() {
        let (dispatch, seen) = observed_dispatch();
        let error = EncodeError::NonNumericSample { index: 3 };

        dispatch.push_flush(FlushKind::Slice);
        dispatch.append_failed(error.clone());
        dispatch.resolve_flush(RecorderEvent::DataAvailable(blob()));
        dispatch.drain();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![RecorderEvent::Error(error), RecorderEvent::DataAvailable(blob())]
        );
    }

    #[test]
    fn lost_final_flush_reports_error_then_stop() {
        let (dispatch, seen) = observed_dispatch();

        dispatch.push_flush(FlushKind::Final);
        dispatch.fail_last_flush(EncodeError::WorkerGone);
        dispatch.drain();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![RecorderEvent::Error(EncodeError::WorkerGone), RecorderEvent::Stop]
        );
    }

    #[test]
    fn only_one_thread_publishes_at_a_time() {
        let (dispatch, seen) = observed_dispatch();

        dispatch.outbox().draining = true;
        dispatch.push_event(RecorderEvent::Resume);
        dispatch.drain();
        assert!(seen.lock().unwrap().is_empty());

        dispatch.outbox().draining = false;
        dispatch.drain();
        assert_eq!(*seen.lock().unwrap(), vec![RecorderEvent::Resume]);
        assert!(!dispatch.outbox().draining);
    }

    #[test]
    fn supported_types() {
        assert!(MediaRecorder::is_type_supported("audio/wav"));
        assert!(MediaRecorder::is_type_supported("audio/wave"));
        assert!(MediaRecorder::is_type_supported("audio/x-wav"));
        assert!(MediaRecorder::is_type_supported("AUDIO/WAV; codecs=1"));
        assert!(MediaRecorder::is_type_supported("audio/flac"));
        assert!(!MediaRecorder::is_type_supported("audio/ogg"));
        assert!(!MediaRecorder::is_type_supported(""));
    }
}
