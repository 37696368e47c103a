//! Model interpreter seam
//!
//! An [`InterpreterLoader`] turns a model artifact into a ready-to-run
//! [`Interpreter`] with its buffers allocated. The TFLite implementation
//! is backed by `tract-tflite` and only exists with the `tflite` feature.

use std::path::Path;

use crate::preprocess::PreprocessedTensor;
use crate::utils::error::Result;

/// A loaded model with a single input slot and a single output slot
pub trait Interpreter {
    /// Run one forward pass and return the output with the batch dimension dropped
    fn forward(&self, input: &PreprocessedTensor) -> Result<Vec<f32>>;
}

/// Loads model artifacts into interpreters
pub trait InterpreterLoader {
    fn load(&self, model_path: &Path) -> Result<Box<dyn Interpreter>>;
}

/// Whether a real interpreter was compiled into this build
pub fn runtime_available() -> bool {
    cfg!(feature = "tflite")
}

/// Drop a leading batch dimension of size 1
#[cfg(any(feature = "tflite", test))]
pub(crate) fn squeeze_batch(shape: &[usize], values: Vec<f32>) -> std::result::Result<Vec<f32>, String> {
    match shape.first() {
        Some(1) => Ok(values),
        Some(batch) => Err(format!("expected batch size 1, model returned {}", batch)),
        None => Err("model returned a scalar output".to_string()),
    }
}

#[cfg(feature = "tflite")]
pub use self::tflite::{TfliteInterpreter, TfliteLoader};

#[cfg(feature = "tflite")]
mod tflite {
    use std::path::Path;
    use std::time::Instant;

    use tract_tflite::prelude::*;
    use tracing::debug;

    use super::{squeeze_batch, Interpreter, InterpreterLoader};
    use crate::preprocess::PreprocessedTensor;
    use crate::utils::error::{PlantVillageError, Result};
    use crate::utils::format_millis;
    use crate::IMAGE_SIZE;

    type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

    /// TFLite loader for NHWC image classifiers
    #[derive(Debug, Clone)]
    pub struct TfliteLoader {
        /// Square input side the model expects
        pub image_size: usize,
    }

    impl Default for TfliteLoader {
        fn default() -> Self {
            Self {
                image_size: IMAGE_SIZE as usize,
            }
        }
    }

    /// Runnable TFLite plan
    pub struct TfliteInterpreter {
        plan: Plan,
        input_type: DatumType,
        input_shape: [usize; 4],
    }

    /// Only plain `f32` and `u8` input slots are fed; quantized slots are refused
    pub(super) fn check_input_type(input_type: DatumType) -> std::result::Result<(), String> {
        match input_type {
            DatumType::F32 | DatumType::U8 => Ok(()),
            dt if dt.is_quantized() => Err(format!(
                "quantized input type {dt:?} is not supported (plain F32 and U8 inputs only)"
            )),
            dt => Err(format!(
                "unsupported input type {dt:?} (only F32 and U8 are supported)"
            )),
        }
    }

    impl InterpreterLoader for TfliteLoader {
        fn load(&self, model_path: &Path) -> Result<Box<dyn Interpreter>> {
            let start = Instant::now();
            let load_err = |e: String| PlantVillageError::ModelLoad(model_path.to_path_buf(), e);

            let model = tract_tflite::tflite()
                .model_for_path(model_path)
                .map_err(|e| load_err(format!("{e}")))?;

            let inputs = model.input_outlets().map_err(|e| load_err(format!("{e}")))?;
            let outputs = model.output_outlets().map_err(|e| load_err(format!("{e}")))?;
            if inputs.len() != 1 || outputs.len() != 1 {
                return Err(load_err(format!(
                    "expected one input and one output slot, found {} and {}",
                    inputs.len(),
                    outputs.len()
                )));
            }

            let input_type = model
                .outlet_fact(inputs[0])
                .map_err(|e| load_err(format!("{e}")))?
                .datum_type;
            check_input_type(input_type).map_err(load_err)?;

            let input_shape = [1, self.image_size, self.image_size, 3];
            let fact = TypedFact::dt_shape(input_type, tvec!(1, self.image_size, self.image_size, 3));
            let plan = model
                .with_input_fact(0, fact)
                .and_then(|m| m.into_optimized())
                .and_then(|m| m.into_runnable())
                .map_err(|e| load_err(format!("{e}")))?;

            debug!(
                "Loaded {} ({:?} input) in {}",
                model_path.display(),
                input_type,
                format_millis(start.elapsed())
            );

            Ok(Box::new(TfliteInterpreter {
                plan,
                input_type,
                input_shape,
            }))
        }
    }

    impl TfliteInterpreter {
        fn input_tensor(&self, input: &PreprocessedTensor) -> Result<Tensor> {
            if input.shape() != self.input_shape {
                return Err(PlantVillageError::Inference(format!(
                    "input shape {:?} does not match model input {:?}",
                    input.shape(),
                    self.input_shape
                )));
            }
            let tensor = match self.input_type {
                DatumType::U8 => Tensor::from_shape(&self.input_shape, input.to_u8().as_slice()),
                _ => Tensor::from_shape(&self.input_shape, input.as_slice()?),
            };
            tensor.map_err(|e| PlantVillageError::Inference(format!("{e}")))
        }
    }

    impl Interpreter for TfliteInterpreter {
        fn forward(&self, input: &PreprocessedTensor) -> Result<Vec<f32>> {
            let infer_err = |e: String| PlantVillageError::Inference(e);

            let tensor = self.input_tensor(input)?;

            let start = Instant::now();
            let outputs = self
                .plan
                .run(tvec!(tensor.into()))
                .map_err(|e| infer_err(format!("Failed to run TFLite model: {e}")))?;
            debug!("Forward pass took {}", format_millis(start.elapsed()));

            let output = outputs
                .first()
                .ok_or_else(|| infer_err("model produced no outputs".to_string()))?;
            let scores = output
                .cast_to::<f32>()
                .map_err(|e| infer_err(format!("output is not numeric: {e}")))?;
            let values = scores
                .as_slice::<f32>()
                .map_err(|e| infer_err(format!("{e}")))?
                .to_vec();

            squeeze_batch(scores.shape(), values).map_err(infer_err)
        }
    }
}
