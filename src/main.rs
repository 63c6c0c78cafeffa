//! WaveRecorder CLI entry point

use std::process::ExitCode;

use clap::Parser;

use wave_recorder::cli::{
    app::{load_merged_config, run_check, run_record, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands, RecordOptions},
    config_cmd::handle_config_command,
    logging::init_logging,
    presenter::Presenter,
};
use wave_recorder::domain::config::AppConfig;
use wave_recorder::domain::encoding::AudioMimeType;
use wave_recorder::domain::error::ConfigError;
use wave_recorder::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let presenter = Presenter::new();

    // Handle subcommands
    match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Check { mime }) => return run_check(&mime, &presenter),
        None => {}
    }

    // Build CLI config from args
    let cli_config = AppConfig {
        timeslice: cli.timeslice.clone(),
        duration: cli.duration.clone(),
        format: cli.format.map(|f| AudioMimeType::from(f).extension().to_string()),
        output_dir: cli.output_dir.clone(),
        prefix: cli.prefix.clone(),
    };

    let config = load_merged_config(cli_config).await;

    let options = match record_options(&config) {
        Ok(options) => options,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    run_record(options).await
}

/// Validate the merged config into recording options
fn record_options(config: &AppConfig) -> Result<RecordOptions, ConfigError> {
    Ok(RecordOptions {
        timeslice: config.parsed_timeslice()?,
        duration: config.parsed_duration()?,
        format: config.parsed_format()?,
        output_dir: config.output_dir_or_default(),
        prefix: config.prefix_or_default().to_string(),
    })
}
