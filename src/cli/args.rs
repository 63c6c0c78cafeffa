//! CLI argument definitions using Clap

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::encoding::AudioMimeType;
use crate::domain::recording::Duration;

/// WaveRecorder - stream the microphone into standalone WAV or FLAC slices
#[derive(Parser, Debug)]
#[command(name = "wave-recorder")]
#[command(version)]
#[command(about = "Record the default input device into standalone WAV or FLAC slices")]
#[command(long_about = None)]
pub struct Cli {
    /// Emit a slice every TIME while recording (e.g., 500ms, 1s, 1m)
    #[arg(short = 't', long, value_name = "TIME")]
    pub timeslice: Option<String>,

    /// Stop automatically after TIME (e.g., 10s, 2m30s)
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Container format for slices
    #[arg(short = 'f', long, value_name = "FORMAT")]
    pub format: Option<FormatArg>,

    /// Directory slices are written to
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// File name prefix for slices
    #[arg(long, value_name = "NAME")]
    pub prefix: Option<String>,

    /// Log recorder internals to stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report host readiness and whether a MIME type can be recorded
    Check {
        /// MIME type to test
        #[arg(default_value = "audio/wav")]
        mime: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Format argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Wav,
    Flac,
}

impl From<FormatArg> for AudioMimeType {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Wav => AudioMimeType::Wav,
            FormatArg::Flac => AudioMimeType::Flac,
        }
    }
}

/// Parsed recording options
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub timeslice: Option<Duration>,
    pub duration: Option<Duration>,
    pub format: AudioMimeType,
    pub output_dir: std::path::PathBuf,
    pub prefix: String,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &["timeslice", "duration", "format", "output_dir", "prefix"];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["wave-recorder"]);
        assert!(cli.timeslice.is_none());
        assert!(cli.duration.is_none());
        assert!(cli.format.is_none());
        assert!(cli.output_dir.is_none());
        assert!(cli.prefix.is_none());
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_parses_recording_flags() {
        let cli = Cli::parse_from([
            "wave-recorder", "-t", "1s", "-d", "2m30s", "-f", "flac", "-o", "/tmp/out", "--prefix", "take",
        ]);
        assert_eq!(cli.timeslice, Some("1s".to_string()));
        assert_eq!(cli.duration, Some("2m30s".to_string()));
        assert_eq!(cli.format, Some(FormatArg::Flac));
        assert_eq!(cli.output_dir, Some("/tmp/out".to_string()));
        assert_eq!(cli.prefix, Some("take".to_string()));
    }

    #[test]
    fn cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["wave-recorder", "-f", "ogg"]).is_err());
    }

    #[test]
    fn cli_parses_check_with_default_mime() {
        let cli = Cli::parse_from(["wave-recorder", "check"]);
        match cli.command {
            Some(Commands::Check { mime }) => assert_eq!(mime, "audio/wav"),
            other => panic!("Expected Check command, got {:?}", other),
        }
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["wave-recorder", "config", "set", "format", "flac"]);
        if let Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) = cli.command
        {
            assert_eq!(key, "format");
            assert_eq!(value, "flac");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["wave-recorder", "config", "list", "-v"]);
        assert!(cli.verbose);
    }

    #[test]
    fn format_arg_converts_to_mime_type() {
        assert_eq!(AudioMimeType::from(FormatArg::Wav), AudioMimeType::Wav);
        assert_eq!(AudioMimeType::from(FormatArg::Flac), AudioMimeType::Flac);
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("timeslice"));
        assert!(is_valid_config_key("output_dir"));
        assert!(!is_valid_config_key("api_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
