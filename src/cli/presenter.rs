//! CLI presenter for output formatting

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::recording::RecorderPhase;
use crate::domain::session::SessionSnapshot;

/// Interactive commands and what they do, for `help`
const COMMAND_HELP: &[(&str, &str)] = &[
    ("start", "Begin a new recording (clears the previous preview)"),
    ("pause", "Pause the current recording"),
    ("resume", "Continue a paused recording"),
    ("stop", "Finish the recording and build a preview"),
    ("discard", "Throw the current recording away"),
    ("clear", "Remove the preview"),
    ("save", "Write the preview to the output directory"),
    ("play", "Listen to the preview"),
    ("uri", "Print the preview as a data: URI"),
    ("status [--json]", "Show the session state"),
    ("help", "Show this list"),
    ("quit", "Leave"),
];

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
    is_spinner_active: Arc<AtomicBool>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self {
            spinner: None,
            is_spinner_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
        self.is_spinner_active.store(true, Ordering::SeqCst);
    }

    /// Whether a spinner is currently drawn
    pub fn is_spinner_active(&self) -> bool {
        self.is_spinner_active.load(Ordering::SeqCst)
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        } else {
            self.success(message);
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        } else {
            self.error(message);
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Print the session state line
    pub fn session_status(&self, snapshot: &SessionSnapshot) {
        println!("{}", self.format_status(snapshot));
    }

    /// One-line summary of a session snapshot
    pub fn format_status(&self, snapshot: &SessionSnapshot) -> String {
        let badge = match snapshot.phase {
            RecorderPhase::Recording => "● recording".red().bold().to_string(),
            RecorderPhase::Paused => "‖ paused".yellow().to_string(),
            RecorderPhase::Inactive if snapshot.is_acquiring => "… acquiring".dimmed().to_string(),
            RecorderPhase::Inactive => "○ inactive".to_string(),
        };

        let mut parts = vec![badge];
        if snapshot.buffered_fragments > 0 {
            parts.push(format!("{} fragments", snapshot.buffered_fragments));
        }
        if let Some(preview) = &snapshot.preview {
            parts.push(format!(
                "preview {} ({} bytes)",
                preview.file_name, preview.size_bytes
            ));
        }
        if let Some(error) = &snapshot.error {
            parts.push(format!("{} {}", "error:".red(), error.message));
        }
        if snapshot.cannot_start && snapshot.phase == RecorderPhase::Inactive {
            parts.push("start unavailable".dimmed().to_string());
        }

        parts.join(" · ")
    }

    /// Print the interactive command list
    pub fn help(&self) {
        for (command, description) in COMMAND_HELP {
            eprintln!("  {:<16} {}", command.cyan(), description);
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}
