//! Inference module for single-image prediction
//!
//! This module provides:
//! - The [`InferenceEngine`] capability shared by both prediction paths
//! - A real engine driving a TFLite interpreter
//! - A deterministic mock engine for builds without an interpreter
//!
//! ## Engine selection
//!
//! The engine is chosen once at startup by [`select_engine`] and injected into
//! the reporter. Nothing downstream branches on which variant is in use; the
//! response only records it through [`InferenceMode`].

pub mod engine;
pub mod interpreter;
pub mod mock;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{EngineMode, InferenceConfig};
use crate::ranking::PredictionSet;
use crate::taxonomy::Taxonomy;
use crate::utils::error::Result;

// Re-export main types for convenience
pub use engine::ModelEngine;
pub use interpreter::{runtime_available, Interpreter, InterpreterLoader};
pub use mock::MockEngine;

#[cfg(feature = "tflite")]
pub use interpreter::TfliteLoader;

/// Which prediction path produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    /// Scores from a real forward pass
    #[default]
    Model,
    /// Synthetic predictions derived from image statistics
    Mock,
}

impl std::fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceMode::Model => write!(f, "model"),
            InferenceMode::Mock => write!(f, "mock"),
        }
    }
}

/// A way of turning a model and an image into a ranked prediction set
pub trait InferenceEngine {
    fn mode(&self) -> InferenceMode;

    fn predict(
        &self,
        model_path: &Path,
        image_path: &Path,
        taxonomy: &Taxonomy,
    ) -> Result<PredictionSet>;
}

/// Pick the engine for this process
pub fn select_engine(config: &InferenceConfig) -> Box<dyn InferenceEngine> {
    match config.engine {
        EngineMode::Mock => {
            info!("Mock engine selected by configuration");
            Box::new(MockEngine::default())
        }
        EngineMode::Auto if runtime_available() => default_engine(),
        EngineMode::Auto => {
            warn!("tflite runtime not available, using mock predictions");
            Box::new(MockEngine::default())
        }
    }
}

#[cfg(feature = "tflite")]
fn default_engine() -> Box<dyn InferenceEngine> {
    Box::new(ModelEngine::new(TfliteLoader::default()))
}

#[cfg(not(feature = "tflite"))]
fn default_engine() -> Box<dyn InferenceEngine> {
    Box::new(MockEngine::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_serialization() {
        assert_eq!(serde_json::to_string(&InferenceMode::Model).unwrap(), "\"model\"");
        assert_eq!(serde_json::to_string(&InferenceMode::Mock).unwrap(), "\"mock\"");
        assert_eq!(InferenceMode::default(), InferenceMode::Model);
    }

    #[test]
    fn test_forced_mock_selection() {
        let config = InferenceConfig {
            engine: EngineMode::Mock,
            ..Default::default()
        };
        assert_eq!(select_engine(&config).mode(), InferenceMode::Mock);
    }

    #[test]
    fn test_auto_selection_follows_probe() {
        let engine = select_engine(&InferenceConfig::default());
        let expected = if runtime_available() {
            InferenceMode::Model
        } else {
            InferenceMode::Mock
        };
        assert_eq!(engine.mode(), expected);
    }
}
