//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! stdin controls, logging setup and the application runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod controls;
pub mod logging;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{run_check, run_record, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, FormatArg, RecordOptions};
pub use presenter::Presenter;
