//! Main app runners for recording and capability checks

use std::env;
use std::future;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use crate::application::ports::{AudioCapture, ConfigStore, Encoder};
use crate::application::MediaRecorder;
use crate::domain::config::AppConfig;
use crate::domain::recorder::{EventKind, RecorderEvent};
use crate::infrastructure::{create_encoder, CpalCapture, SliceWriter, XdgConfigStore};

use super::args::RecordOptions;
use super::controls::{spawn_stdin_reader, ControlCommand};
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment variable overriding the output directory
pub const OUTPUT_DIR_ENV: &str = "WAVE_RECORDER_OUTPUT_DIR";

/// How long to wait for outstanding slices after `stop`
const STOP_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Spinner refresh period
const STATUS_INTERVAL: StdDuration = StdDuration::from_millis(200);

/// Record from the default input device until stopped
pub async fn run_record(options: RecordOptions) -> ExitCode {
    let presenter = Arc::new(Presenter::new());

    if !CpalCapture::host_supported() {
        presenter.error("No audio input device available");
        return ExitCode::from(EXIT_ERROR);
    }

    let shutdown = ShutdownSignal::new();
    shutdown.setup();

    let encoder = create_encoder(options.format);
    let capture = match encoder.max_sample_rate() {
        Some(max) => CpalCapture::with_max_sample_rate(max),
        None => CpalCapture::new(),
    };

    let recorder = match MediaRecorder::new(capture, encoder) {
        Ok(recorder) => recorder,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let writer = Arc::new(SliceWriter::new(&options.output_dir, options.prefix.clone()));
    let failed = Arc::new(AtomicBool::new(false));
    let (stopped_tx, mut stopped_rx) = mpsc::unbounded_channel::<()>();

    register_listeners(&recorder, &presenter, &writer, &failed, stopped_tx);

    if let Err(e) = recorder.start(options.timeslice) {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    presenter.controls_hint();
    presenter.start_spinner("Recording...");

    let started = Instant::now();
    let deadline = options.duration.map(|d| started + d.as_std());
    let limit_ms = options.duration.map(|d| d.as_millis());
    let mut commands = spawn_stdin_reader();
    let mut status = time::interval(STATUS_INTERVAL);

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            _ = until(deadline) => {
                tracing::debug!("Duration limit reached");
                break;
            }
            Some(command) = commands.recv() => match command {
                Ok(ControlCommand::Pause) => recorder.pause(),
                Ok(ControlCommand::Resume) => recorder.resume(),
                Ok(ControlCommand::RequestData) => recorder.request_data(),
                Ok(ControlCommand::Stop) => break,
                Err(e) => presenter.warn(&e.to_string()),
            },
            _ = status.tick() => {
                let elapsed = started.elapsed().as_millis() as u64;
                presenter.update_spinner(&presenter.format_status(recorder.state(), elapsed, limit_ms));
            }
        }
    }

    recorder.stop();
    presenter.update_spinner("Finishing...");

    if time::timeout(STOP_TIMEOUT, stopped_rx.recv()).await.is_err() {
        presenter.spinner_fail("Timed out waiting for the last slice");
        return ExitCode::from(EXIT_ERROR);
    }

    let summary = format!(
        "Saved {} slice(s) to {}",
        writer.written(),
        writer.dir().display()
    );
    if failed.load(Ordering::SeqCst) {
        presenter.spinner_fail(&summary);
        ExitCode::from(EXIT_ERROR)
    } else {
        presenter.spinner_success(&summary);
        ExitCode::from(EXIT_SUCCESS)
    }
}

fn register_listeners(
    recorder: &MediaRecorder,
    presenter: &Arc<Presenter>,
    writer: &Arc<SliceWriter>,
    failed: &Arc<AtomicBool>,
    stopped: mpsc::UnboundedSender<()>,
) {
    {
        let presenter = Arc::clone(presenter);
        let writer = Arc::clone(writer);
        let failed = Arc::clone(failed);
        recorder.add_event_listener(EventKind::DataAvailable, move |event| {
            let Some(data) = event.data() else { return };
            match writer.write(data) {
                Ok(path) => presenter.slice_written(&path, &data.human_readable_size()),
                Err(e) => {
                    failed.store(true, Ordering::SeqCst);
                    presenter.error(&e.to_string());
                }
            }
        });
    }

    {
        let presenter = Arc::clone(presenter);
        let failed = Arc::clone(failed);
        recorder.add_event_listener(EventKind::Error, move |event| {
            if let RecorderEvent::Error(e) = event {
                failed.store(true, Ordering::SeqCst);
                presenter.error(&format!("Encoder error: {}", e));
            }
        });
    }

    for (kind, message) in [(EventKind::Pause, "Paused"), (EventKind::Resume, "Resumed")] {
        let presenter = Arc::clone(presenter);
        recorder.add_event_listener(kind, move |_| presenter.info(message));
    }

    recorder.add_event_listener(EventKind::Stop, move |_| {
        let _ = stopped.send(());
    });
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}

/// Report host readiness and whether `mime` can be recorded
pub fn run_check(mime: &str, presenter: &Presenter) -> ExitCode {
    if CpalCapture::host_supported() {
        presenter.success("Audio input device available");
    } else {
        presenter.warn("No audio input device available");
    }

    if MediaRecorder::is_type_supported(mime) {
        presenter.success(&format!("{} is supported", mime));
        ExitCode::from(EXIT_SUCCESS)
    } else {
        presenter.error(&format!("{} is not supported", mime));
        ExitCode::from(EXIT_ERROR)
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load_or_empty().await;

    let env_config = AppConfig {
        output_dir: env::var(OUTPUT_DIR_ENV).ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}
