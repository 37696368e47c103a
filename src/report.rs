//! Result reporting
//!
//! An invocation ends in exactly one of two states:
//! - success: `{"success": true, "topPrediction": .., "allPredictions": [..], "mode": ..}`, exit 0
//! - failure: `{"success": false, "error": ".."}`, exit 1
//!
//! The response is written as a single JSON line; nothing else goes to stdout.

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{error, info};

use crate::inference::{InferenceEngine, InferenceMode};
use crate::ranking::{Prediction, PredictionSet};
use crate::taxonomy::Taxonomy;
use crate::utils::error::{PlantVillageError, Result};

/// The two positional arguments of an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub model_path: PathBuf,
    pub image_path: PathBuf,
}

impl Invocation {
    /// Validate arguments without touching the filesystem
    pub fn from_args(model_path: Option<PathBuf>, image_path: Option<PathBuf>) -> Result<Self> {
        match (model_path, image_path) {
            (Some(model_path), Some(image_path)) => Ok(Self {
                model_path,
                image_path,
            }),
            _ => Err(PlantVillageError::MissingArguments),
        }
    }
}

/// Distinguished best prediction; serialized with a `disease` key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPrediction {
    pub disease: String,
    pub confidence: f64,
    pub index: usize,
}

impl From<&Prediction> for TopPrediction {
    fn from(prediction: &Prediction) -> Self {
        Self {
            disease: prediction.class.clone(),
            confidence: prediction.confidence,
            index: prediction.index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub success: bool,
    pub top_prediction: TopPrediction,
    pub all_predictions: PredictionSet,
    /// Which engine produced the predictions
    pub mode: InferenceMode,
}

impl SuccessResponse {
    pub fn new(predictions: PredictionSet, mode: InferenceMode) -> Self {
        Self {
            success: true,
            top_prediction: TopPrediction::from(predictions.top()),
            all_predictions: predictions,
            mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
}

/// The single structured output of an invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Success(SuccessResponse),
    Failure(FailureResponse),
}

impl Response {
    pub fn from_error(err: &PlantVillageError) -> Self {
        Response::Failure(FailureResponse {
            success: false,
            error: err.to_string(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    /// Process exit status for this response
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Serialize to one line of JSON
    pub fn to_json_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| PlantVillageError::Io(e.into()))
    }
}

impl From<Result<SuccessResponse>> for Response {
    fn from(result: Result<SuccessResponse>) -> Self {
        match result {
            Ok(success) => Response::Success(success),
            Err(err) => Response::from_error(&err),
        }
    }
}

/// Drives one invocation through the injected engine
pub struct Reporter<'a> {
    engine: &'a dyn InferenceEngine,
    taxonomy: &'a Taxonomy,
}

impl<'a> Reporter<'a> {
    pub fn new(engine: &'a dyn InferenceEngine, taxonomy: &'a Taxonomy) -> Self {
        Self { engine, taxonomy }
    }

    /// Run the pipeline, propagating the first error
    pub fn classify(&self, invocation: &Invocation) -> Result<SuccessResponse> {
        let predictions = self.engine.predict(
            &invocation.model_path,
            &invocation.image_path,
            self.taxonomy,
        )?;

        let top = predictions.top();
        info!(
            "Top prediction ({} mode): {} at {:.2}% (plant: {}, healthy: {})",
            self.engine.mode(),
            top.class,
            top.confidence,
            self.taxonomy.plant_name(top.index).unwrap_or("unknown"),
            self.taxonomy.is_healthy(top.index)
        );

        Ok(SuccessResponse::new(predictions, self.engine.mode()))
    }

    /// Run the pipeline to one of the two terminal responses
    pub fn run(&self, invocation: &Invocation) -> Response {
        let result = self.classify(invocation);
        if let Err(e) = &result {
            error!("Classification failed: {}", e);
        }
        Response::from(result)
    }
}

/// Write the response as a single line and flush
pub fn emit<W: Write>(response: &Response, out: &mut W) -> Result<()> {
    let line = response.to_json_line()?;
    writeln!(out, "{}", line)?;
    out.flush()?;
    Ok(())
}
