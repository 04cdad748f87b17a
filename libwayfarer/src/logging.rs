//! Logging setup shared by Wayfarer binaries
//!
//! All output goes to stderr so stdout stays free for state snapshots.
//! Three formats are supported:
//! - `text`: plain lines, no colors (default)
//! - `json`: one JSON object per line, for log collectors
//! - `pretty`: multi-line colored output, for development
//!
//! Both format and level can come from the environment
//! (`WAYFARER_LOG_FORMAT`, `WAYFARER_LOG_LEVEL`); `RUST_LOG`, when set,
//! overrides the level filter entirely.
//!
//! ```no_run
//! use libwayfarer::logging::{LogFormat, LoggingConfig};
//!
//! LoggingConfig::from_env()
//!     .with_format(LogFormat::Json)
//!     .init();
//! ```

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or
    /// `libwayfarer=debug`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: "warn".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Read `WAYFARER_LOG_FORMAT` and `WAYFARER_LOG_LEVEL`
    ///
    /// Unset or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let format = std::env::var("WAYFARER_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.format);
        let level = std::env::var("WAYFARER_LOG_LEVEL").unwrap_or(defaults.level);
        Self { format, level }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Raise the level to `debug` (used by `--verbose`)
    pub fn verbose(mut self) -> Self {
        self.level = "debug".to_string();
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }

    /// Install the global subscriber
    ///
    /// Returns false if a subscriber was already installed, which leaves
    /// the existing one in place.
    pub fn init(&self) -> bool {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_writer(std::io::stderr);

        let installed = match self.format {
            LogFormat::Json => builder
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_target(true)
                .try_init(),
            LogFormat::Pretty => builder
                .pretty()
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .try_init(),
            LogFormat::Text => builder.with_target(false).with_ansi(false).try_init(),
        };
        installed.is_ok()
    }
}

/// Initialize logging from the environment
pub fn init_default() -> bool {
    LoggingConfig::from_env().init()
}
