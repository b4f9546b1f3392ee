//! Interactive session runner

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::ports::{
    CaptureProvider, ConfigStore, PreviewExporter, PreviewPlayer, RecorderOptions,
    StreamConstraints,
};
use crate::application::{RecordingController, SessionUpdate};
use crate::domain::config::AppConfig;
use crate::domain::recording::AudioMimeType;
use crate::infrastructure::{CpalCaptureProvider, FileExporter, RodioPreviewPlayer};

use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Resolved settings for one interactive session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub constraints: StreamConstraints,
    pub recorder: RecorderOptions,
    pub output_dir: PathBuf,
}

impl SessionOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            constraints: StreamConstraints {
                device: config.device.clone(),
                sample_rate: config.sample_rate,
                channels: config.channels,
            },
            recorder: RecorderOptions {
                mime_type: AudioMimeType::Wav,
                timeslice: config.timeslice_or_default(),
            },
            output_dir: config.output_dir_or_default(),
        }
    }
}

/// A line typed at the session prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    Pause,
    Resume,
    Stop,
    Discard,
    Clear,
    Save,
    Play,
    Uri,
    Status { json: bool },
    Help,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let name = words.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = words.collect();

        let command = match name.as_str() {
            "start" | "record" => Self::Start,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "stop" => Self::Stop,
            "discard" => Self::Discard,
            "clear" => Self::Clear,
            "save" | "download" => Self::Save,
            "play" => Self::Play,
            "uri" => Self::Uri,
            "status" => {
                return match args.as_slice() {
                    [] => Ok(Self::Status { json: false }),
                    ["--json"] => Ok(Self::Status { json: true }),
                    _ => Err("Usage: status [--json]".to_string()),
                }
            }
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => {
                return Err(format!(
                    "Unknown command '{}'. Type 'help' for commands",
                    other
                ))
            }
        };

        if !args.is_empty() {
            return Err(format!("'{}' takes no arguments", name));
        }
        Ok(command)
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Input lines for the session loop
pub type LineReceiver = mpsc::Receiver<std::io::Result<String>>;

/// Run the interactive session against the system microphone
pub async fn run_session(options: SessionOptions) -> ExitCode {
    let presenter = Presenter::new();

    let lines = match spawn_stdin_reader() {
        Ok(lines) => lines,
        Err(e) => {
            presenter.error(&format!("Failed to read from stdin: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let provider = Arc::new(CpalCaptureProvider::new());
    let player = RodioPreviewPlayer::new();
    let exporter = FileExporter::new(options.output_dir.clone());

    match run_session_with(provider, options, lines, &player, &exporter).await {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the session loop until `quit`, end of input, or a shutdown signal
pub async fn run_session_with<P: CaptureProvider>(
    provider: Arc<P>,
    options: SessionOptions,
    mut lines: LineReceiver,
    player: &dyn PreviewPlayer,
    exporter: &dyn PreviewExporter,
) -> std::io::Result<()> {
    let mut presenter = Presenter::new();

    let shutdown = ShutdownSignal::new();
    shutdown.setup()?;

    presenter.info("Type 'help' for commands");
    let mut controller = RecordingController::new(provider, options.constraints, options.recorder);
    presenter.start_spinner("Acquiring microphone...");

    let mut result = Ok(());
    loop {
        tokio::select! {
            line = lines.recv() => match line {
                Some(Ok(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match line.parse::<SessionCommand>() {
                        Ok(command) => {
                            let flow =
                                execute(command, &mut controller, &presenter, player, exporter).await;
                            if let Flow::Quit = flow {
                                break;
                            }
                        }
                        Err(message) => presenter.warn(&message),
                    }
                }
                Some(Err(e)) => {
                    result = Err(e);
                    break;
                }
                None => break,
            },
            update = controller.next_update() => render_update(&mut presenter, &controller, update),
            _ = shutdown.recv() => {
                presenter.info("Interrupted");
                break;
            }
        }
    }

    presenter.stop_spinner();
    controller.dispose();
    result
}

async fn execute<P: CaptureProvider>(
    command: SessionCommand,
    controller: &mut RecordingController<P>,
    presenter: &Presenter,
    player: &dyn PreviewPlayer,
    exporter: &dyn PreviewExporter,
) -> Flow {
    match command {
        SessionCommand::Start => {
            if controller.cannot_start() {
                presenter.warn(if controller.is_acquiring() {
                    "Microphone is not ready yet"
                } else {
                    "A recording is already in progress"
                });
                return Flow::Continue;
            }
            if !controller.has_device() {
                presenter.warn("No microphone available");
                return Flow::Continue;
            }
            controller.start();
            presenter.session_status(&controller.snapshot());
        }
        SessionCommand::Pause => {
            controller.pause();
            presenter.session_status(&controller.snapshot());
        }
        SessionCommand::Resume => {
            controller.resume();
            presenter.session_status(&controller.snapshot());
        }
        SessionCommand::Stop => {
            controller.stop();
            presenter.session_status(&controller.snapshot());
        }
        SessionCommand::Discard => {
            controller.discard();
            presenter.session_status(&controller.snapshot());
        }
        SessionCommand::Clear => {
            controller.clear_preview();
            presenter.session_status(&controller.snapshot());
        }
        SessionCommand::Save => match controller.preview() {
            Some(preview) => match exporter.export(preview).await {
                Ok(path) => presenter.success(&format!("Saved {}", path.display())),
                Err(e) => presenter.error(&e.to_string()),
            },
            None => presenter.warn("No preview to save"),
        },
        SessionCommand::Play => match controller.preview() {
            Some(preview) => {
                presenter.info(&format!("Playing {}", preview.file_name()));
                if let Err(e) = player.play(preview).await {
                    presenter.error(&e.to_string());
                }
            }
            None => presenter.warn("No preview to play"),
        },
        SessionCommand::Uri => match controller.preview() {
            Some(preview) => presenter.output(&preview.data_uri()),
            None => presenter.warn("No preview available"),
        },
        SessionCommand::Status { json: true } => match serde_json::to_string(&controller.snapshot()) {
            Ok(json) => presenter.output(&json),
            Err(e) => presenter.error(&format!("Failed to encode status: {}", e)),
        },
        SessionCommand::Status { json: false } => presenter.session_status(&controller.snapshot()),
        SessionCommand::Help => presenter.help(),
        SessionCommand::Quit => return Flow::Quit,
    }
    Flow::Continue
}

fn render_update<P: CaptureProvider>(
    presenter: &mut Presenter,
    controller: &RecordingController<P>,
    update: SessionUpdate,
) {
    match update {
        SessionUpdate::Acquired => presenter.spinner_success("Microphone ready"),
        SessionUpdate::AcquisitionFailed(e) => presenter.spinner_fail(&e.to_string()),
        SessionUpdate::DeviceFailed(e) => {
            presenter.error(&format!("Recording failed: {}", e));
        }
        SessionUpdate::PreviewReady => {
            if let Some(preview) = controller.preview() {
                presenter.success(&format!(
                    "Preview ready: {} ({}). Type 'play' or 'save'",
                    preview.file_name(),
                    preview.human_readable_size()
                ));
            }
        }
        SessionUpdate::TakeDiscarded => presenter.info("Recording discarded"),
        SessionUpdate::EmptyTake => presenter.warn("Nothing was recorded"),
        SessionUpdate::FragmentBuffered { .. }
        | SessionUpdate::FragmentDropped
        | SessionUpdate::StopIgnored => {}
    }
}

/// Read stdin on its own thread so a pending read never holds up shutdown
fn spawn_stdin_reader() -> std::io::Result<LineReceiver> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Load and merge configuration from file and CLI.
/// Environment overrides arrive through the CLI arguments.
pub async fn load_merged_config<S: ConfigStore>(store: &S, cli_config: AppConfig) -> AppConfig {
    let file_config = store.load_or_empty().await;

    // Merge: defaults < file < env/cli
    AppConfig::defaults().merge(file_config).merge(cli_config)
}

/// Resolve the log level from `-v` flags, falling back to the configured one
pub fn log_level(verbose: u8, configured: &str) -> tracing::Level {
    match verbose {
        0 => configured.parse().unwrap_or(tracing::Level::WARN),
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

/// Install the stderr log subscriber
pub fn init_logging(level: tracing::Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
