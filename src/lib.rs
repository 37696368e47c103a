//! # PlantVillage Inference
//!
//! One-shot plant disease classification: a model path and an image path go in,
//! one JSON prediction report comes out.
//!
//! ## Pipeline
//!
//! - `preprocess`: decode, RGB, PIL-style bilinear resize to 160x160, scale to [0, 1]
//! - `inference`: real TFLite engine (feature `tflite`) or deterministic mock engine
//! - `ranking`: top-5 classes with percentage confidences
//! - `report`: success/failure response and exit code
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use plantvillage_infer::{select_engine, InferenceConfig, Invocation, Reporter};
//!
//! let config = InferenceConfig::default();
//! let taxonomy = config.taxonomy()?;
//! let engine = select_engine(&config);
//! let invocation = Invocation::from_args(Some("model.tflite".into()), Some("leaf.jpg".into()))?;
//! let response = Reporter::new(engine.as_ref(), &taxonomy).run(&invocation);
//! ```

pub mod config;
pub mod inference;
pub mod preprocess;
pub mod ranking;
pub mod report;
pub mod taxonomy;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::{EngineMode, InferenceConfig};
pub use inference::{select_engine, InferenceEngine, InferenceMode, MockEngine, ModelEngine};
pub use preprocess::{ImagePreprocessor, PreprocessedTensor};
pub use ranking::{top_k, Prediction, PredictionSet, TOP_K};
pub use report::{emit, Invocation, Reporter, Response};
pub use taxonomy::Taxonomy;
pub use utils::error::{PlantVillageError, Result};

/// Side length of the square model input
pub const IMAGE_SIZE: u32 = 160;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
