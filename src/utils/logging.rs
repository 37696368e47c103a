//! Logging Module
//!
//! Structured logging via the `tracing` crate. Events always go to stderr:
//! stdout carries exactly one JSON response line and nothing else.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::utils::error::{PlantVillageError, Result};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: LogLevel,
    /// Whether to include timestamps
    pub timestamps: bool,
    /// Whether to include target (module path)
    pub include_target: bool,
    /// Whether to use ANSI colors
    pub ansi_colors: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            timestamps: true,
            include_target: false,
            ansi_colors: false,
        }
    }
}

impl LogConfig {
    /// Create a verbose logging config for debugging
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            timestamps: true,
            include_target: true,
            ansi_colors: false,
        }
    }

    /// Override the level, keeping the rest
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }
}

/// Log level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Create from string, falling back to `Warn`
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_directive().to_uppercase())
    }
}

/// Initialize logging with the given configuration
///
/// The filter is built from the configured level only; `RUST_LOG` is not consulted.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::new(config.level.as_directive());

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .compact();

    let result = if config.timestamps {
        tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(layer.without_time())
            .with(filter)
            .try_init()
    };

    result.map_err(|e| PlantVillageError::Config(format!("Failed to initialize logging: {e}")))
}
