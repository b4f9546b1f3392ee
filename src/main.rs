//! Clip Recorder CLI entry point

use std::process::ExitCode;

use clap::Parser;

use clip_recorder::cli::{
    app::{init_logging, load_merged_config, log_level, run_session, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    devices_cmd::handle_devices_command,
    presenter::Presenter,
    SessionOptions,
};
use clip_recorder::domain::config::AppConfig;
use clip_recorder::domain::recording::Duration;
use clip_recorder::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();
    let store = XdgConfigStore::new();

    // Handle subcommands
    match cli.command {
        Some(Commands::Config { action }) => {
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Devices) => {
            if let Err(e) = handle_devices_command(&presenter) {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        None => {}
    }

    // Build CLI config from args
    let cli_config = AppConfig {
        device: cli.device.clone(),
        sample_rate: cli.sample_rate,
        channels: cli.channels,
        timeslice: cli.timeslice.clone(),
        output_dir: cli.output_dir.clone(),
        log_level: None,
    };

    // Merge config
    let config = load_merged_config(&store, cli_config).await;
    init_logging(log_level(cli.verbose, config.log_level_or_default()));

    if let Some(timeslice) = config.timeslice.as_ref() {
        if let Err(e) = timeslice.parse::<Duration>() {
            presenter.error(&format!("Invalid timeslice: {}", e));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    }
    if config.sample_rate == Some(0) {
        presenter.error("Invalid sample rate: must be greater than zero");
        return ExitCode::from(EXIT_USAGE_ERROR);
    }
    if config.channels == Some(0) {
        presenter.error("Invalid channel count: must be greater than zero");
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    run_session(SessionOptions::from_config(&config)).await
}
