//! Output formatting module

pub mod human;
pub mod json;
pub mod progress;
pub mod reporter;
pub mod styles;

use anyhow::Result;
use console::Term;
use daybook_common::Service;
use owo_colors::OwoColorize as _;

pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use reporter::TerminalReporter;
pub use styles::Styles;

use crate::application::services::PullSummary;
use crate::domain::PatternEntry;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Check if progress indicators should be shown.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an info message prefixed with `ℹ`. Suppressed when `quiet`.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}

/// Renderer selected by the output mode. Commands call these instead of
/// branching on `--json` themselves.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

impl Renderer<'_> {
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_pull(&self, summary: &PullSummary) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_pull(summary);
                Ok(())
            }
            Self::Json(r) => r.render_pull(summary),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_push(&self, service: &Service, key: &str, size: u64, sha256: &str) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_push(service, key, size, sha256);
                Ok(())
            }
            Self::Json(r) => r.render_push(service, key, size, sha256),
        }
    }

    /// Services stored under one pattern. `None` means the pattern has no entry.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_services(&self, pattern: &str, services: Option<&[String]>) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_services(pattern, services);
                Ok(())
            }
            Self::Json(r) => r.render_services(pattern, services),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_entries(&self, entries: &[PatternEntry]) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_entries(entries);
                Ok(())
            }
            Self::Json(r) => r.render_entries(entries),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_resolution(&self, host: &str, services: &[Service]) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_resolution(host, services);
                Ok(())
            }
            Self::Json(r) => r.render_resolution(host, services),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_versions(&self, name: &str, versions: &[Service]) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_versions(name, versions);
                Ok(())
            }
            Self::Json(r) => r.render_versions(name, versions),
        }
    }
}
