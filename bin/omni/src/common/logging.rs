//! Logging configuration for the omni CLI tool.
//!
//! Provides CLI arguments for configuring tracing/logging output with support for:
//! - Verbosity levels via `-v/-vv/-vvv` flags
//! - Custom log filters via `RUST_LOG` environment variable
//! - Log file output via `--log.file` flag
//! - Disabling colors via `--log.no-color` flag

use std::path::PathBuf;

use clap::Args;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Failures while installing the tracing subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The log file could not be created
    #[error("Failed to create log file {}: {source}", path.display())]
    CreateFile {
        /// Requested log file
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },
    /// A global subscriber is already installed
    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Logging configuration arguments.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Increase logging verbosity (-v = error, -vv = warn, -vvv = info, -vvvv = debug, -vvvvv =
    /// trace)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log file path. If specified, logs are written to this file instead of stderr.
    #[arg(long = "log.file", visible_aliases = ["log-file"], global = true)]
    pub log_file: Option<PathBuf>,

    /// Disable colorful console logging. Only applies when logging to stderr (no --log.file).
    #[arg(long = "log.no-color", visible_aliases = ["log-no-color"], global = true)]
    pub log_no_color: bool,
}

impl LogArgs {
    /// Builds the filter for this configuration.
    ///
    /// The log level is determined in the following order of precedence:
    /// 1. `RUST_LOG` environment variable (if set)
    /// 2. `-v` flags (increases from ERROR to WARN/INFO/DEBUG/TRACE)
    /// 3. Default is no logging (OFF)
    pub fn filter(&self) -> EnvFilter {
        if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if let Some(level) = self.level() {
            // `omni` prefixes both the library targets and the CLI crate
            EnvFilter::new(format!("omni={level}"))
        } else {
            EnvFilter::new("off")
        }
    }

    /// The level selected by `-v` flags, or `None` when logging is off.
    pub const fn level(&self) -> Option<Level> {
        match self.verbose {
            0 => None,
            1 => Some(Level::ERROR),
            2 => Some(Level::WARN),
            3 => Some(Level::INFO),
            4 => Some(Level::DEBUG),
            _ => Some(Level::TRACE),
        }
    }

    /// Initialize the tracing subscriber based on the logging configuration.
    ///
    /// Log target is only shown for DEBUG level and above.
    /// If `--log.file` is specified, logs are written to the file instead of stderr.
    pub fn init(&self) -> Result<(), LoggingError> {
        let filter = self.filter();
        let show_target = self.verbose >= 4;

        let result = if let Some(ref log_file) = self.log_file {
            let file = std::fs::File::create(log_file).map_err(|source| {
                LoggingError::CreateFile { path: log_file.clone(), source }
            })?;
            fmt()
                .with_env_filter(filter)
                .with_target(show_target)
                .with_writer(file)
                .with_ansi(false)
                .try_init()
        } else {
            fmt()
                .with_env_filter(filter)
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .with_ansi(!self.log_no_color)
                .try_init()
        };
        result.map_err(|e| LoggingError::Init(e.to_string()))
    }
}
