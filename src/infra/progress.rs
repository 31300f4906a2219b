//! Loader display for in-flight submissions.
//! Progress reporting infrastructure with terminal display coordination.

use std::io::{self, Write};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::infra::error::ClientError;

/// Loader styles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStyle {
    /// Spinner glyph followed by the status message
    Spinner,
    /// Plain status line, no glyphs
    Plain,
    /// Silent mode (no visual indicator)
    Silent,
}

impl ProgressStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStyle::Spinner => "spinner",
            ProgressStyle::Plain => "plain",
            ProgressStyle::Silent => "silent",
        }
    }
}

impl FromStr for ProgressStyle {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spinner" | "auto" => Ok(ProgressStyle::Spinner),
            "plain" => Ok(ProgressStyle::Plain),
            "silent" => Ok(ProgressStyle::Silent),
            other => Err(ClientError::ConfigurationError(format!(
                "Invalid progress style: {other}"
            ))),
        }
    }
}

/// Progress reporter trait driven by the workflow controller
pub trait ProgressReporter: Send + Sync {
    /// A submission entered the in-flight state
    fn start(&self, message: &str);

    /// Mark the operation as completed
    fn finish(&self);

    /// Mark the operation as failed with error message
    fn finish_with_error(&self, error: &str);
}

/// Terminal-based loader
pub struct TerminalProgress {
    style: ProgressStyle,
    started: Mutex<Option<Instant>>,
    current_message: Mutex<String>,
}

impl TerminalProgress {
    #[must_use]
    pub fn new(style: ProgressStyle) -> Self {
        Self {
            style,
            started: Mutex::new(None),
            current_message: Mutex::new(String::new()),
        }
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map_or(0.0, |start| start.elapsed().as_secs_f64())
    }

    fn message(&self) -> String {
        self.current_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clear the current line
    fn clear_line(&self) {
        if self.style == ProgressStyle::Spinner {
            print!("\r{}\r", " ".repeat(80));
            let _ = io::stdout().flush();
        }
    }
}

impl ProgressReporter for TerminalProgress {
    fn start(&self, message: &str) {
        *self.started.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        *self
            .current_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = message.to_string();

        match self.style {
            ProgressStyle::Spinner => {
                print!("⠋ {message}...");
                let _ = io::stdout().flush();
            }
            ProgressStyle::Plain => println!("{message}..."),
            ProgressStyle::Silent => {}
        }
    }

    fn finish(&self) {
        if self.style == ProgressStyle::Silent {
            return;
        }
        self.clear_line();
        println!(
            "[+] {} - Completed in {:.1}s",
            self.message(),
            self.elapsed_secs()
        );
    }

    fn finish_with_error(&self, error: &str) {
        if self.style == ProgressStyle::Silent {
            return;
        }
        self.clear_line();
        println!(
            "[!] {} - Failed after {:.1}s: {}",
            self.message(),
            self.elapsed_secs(),
            error
        );
    }
}

/// Null progress reporter for silent operations
pub struct NullProgress;

impl ProgressReporter for NullProgress {
    fn start(&self, _message: &str) {}
    fn finish(&self) {}
    fn finish_with_error(&self, _error: &str) {}
}

/// Progress factory for creating appropriate progress indicators
pub struct ProgressFactory;

impl ProgressFactory {
    /// Create a progress reporter based on environment and preferences
    #[must_use]
    pub fn create_reporter(style: ProgressStyle) -> Arc<dyn ProgressReporter> {
        if style == ProgressStyle::Silent {
            return Arc::new(NullProgress);
        }

        if atty::is(atty::Stream::Stdout) {
            Arc::new(TerminalProgress::new(style))
        } else {
            // Not in a terminal, use silent mode
            Arc::new(NullProgress)
        }
    }
}
