//! Interactive commands typed on stdin while recording

use std::io::{self, BufRead};
use std::str::FromStr;
use std::thread;

use tokio::sync::mpsc;

/// Commands accepted while a session is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Resume,
    RequestData,
    Stop,
}

/// Error for an unrecognized command line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown command \"{0}\". Use p(ause), r(esume), d(ata) or s(top)")]
pub struct UnknownCommandError(pub String);

impl FromStr for ControlCommand {
    type Err = UnknownCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "p" | "pause" => Ok(Self::Pause),
            "r" | "resume" => Ok(Self::Resume),
            "d" | "data" => Ok(Self::RequestData),
            "s" | "stop" | "q" | "quit" => Ok(Self::Stop),
            other => Err(UnknownCommandError(other.to_string())),
        }
    }
}

/// Read stdin on a detached thread and forward each non-empty line.
///
/// A plain thread is used because a blocked stdin read would otherwise keep
/// the runtime from shutting down. The channel closes at end of input.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<Result<ControlCommand, UnknownCommandError>> {
    let (tx, rx) = mpsc::unbounded_channel();

    let spawned = thread::Builder::new()
        .name("stdin-controls".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                if tx.send(line.parse()).is_err() {
                    break;
                }
            }
            tracing::debug!("Stdin closed");
        });

    if let Err(e) = spawned {
        tracing::warn!("Interactive commands unavailable: {}", e);
    }

    rx
}
