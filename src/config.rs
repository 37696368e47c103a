//! Configuration for a classification run.
//!
//! Every key is optional; a missing config file means all defaults.
//!
//! ```toml
//! engine = "auto"          # or "mock"
//! labels = "labels.txt"    # optional taxonomy override
//! log_level = "warn"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::taxonomy::Taxonomy;
use crate::utils::error::{Result, ResultExt};
use crate::utils::logging::LogLevel;

/// How the inference engine is chosen at startup
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// Use the TFLite interpreter when it is compiled in, otherwise the mock
    #[default]
    Auto,
    /// Always use the deterministic mock engine
    Mock,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceConfig {
    /// Engine selection policy
    pub engine: EngineMode,
    /// Labels file replacing the built-in PlantVillage taxonomy
    pub labels: Option<PathBuf>,
    /// Minimum log level written to stderr
    pub log_level: LogLevel,
}

impl InferenceConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config")
    }

    /// Load the config file if one was given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Build the label taxonomy this configuration describes
    pub fn taxonomy(&self) -> Result<Taxonomy> {
        match &self.labels {
            Some(path) => Taxonomy::from_labels_file(path),
            None => Ok(Taxonomy::plantvillage()),
        }
    }
}
