//! Error Handling Module
//!
//! Defines the error taxonomy for a single classification invocation.
//! Every variant is terminal: the reporter turns it into a failure response.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for PlantVillage inference operations
#[derive(Error, Debug)]
pub enum PlantVillageError {
    /// Fewer than two positional arguments were supplied
    #[error("Missing arguments: model_path image_path")]
    MissingArguments,

    /// Command line could not be parsed
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Image could not be opened or decoded
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Resize, conversion or tensor shaping failed
    #[error("Error preprocessing image: {0}")]
    Preprocess(String),

    /// Model artifact could not be read or parsed
    #[error("Failed to load model at '{0}': {1}")]
    ModelLoad(PathBuf, String),

    /// Forward pass failed inside the interpreter
    #[error("Inference error: {0}")]
    Inference(String),

    /// Output vector does not fit the label taxonomy
    #[error("Ranking error: {0}")]
    Ranking(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for PlantVillage inference operations
pub type Result<T> = std::result::Result<T, PlantVillageError>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error, reported as a configuration error
    fn context(self, msg: &str) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| PlantVillageError::Config(format!("{}: {}", msg, e)))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| PlantVillageError::Config(format!("{}: {}", f(), e)))
    }
}

impl<T> ResultExt<T> for Option<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| PlantVillageError::Config(msg.to_string()))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.ok_or_else(|| PlantVillageError::Config(f()))
    }
}
