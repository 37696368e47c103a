//! Real inference engine
//!
//! Each call is cold: the model is loaded, run once, and dropped. Nothing is
//! cached between invocations.

use std::path::Path;
use std::time::Instant;

use tracing::debug;

use super::interpreter::InterpreterLoader;
use super::{InferenceEngine, InferenceMode};
use crate::preprocess::{load_image, ImagePreprocessor, PreprocessedTensor};
use crate::ranking::{top_k, PredictionSet};
use crate::taxonomy::Taxonomy;
use crate::utils::error::Result;
use crate::utils::format_millis;

/// Engine that runs the classifier through an interpreter
pub struct ModelEngine<L> {
    loader: L,
    preprocessor: ImagePreprocessor,
}

impl<L: InterpreterLoader> ModelEngine<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            preprocessor: ImagePreprocessor::default(),
        }
    }

    /// Load the model and run one forward pass over a preprocessed tensor
    pub fn infer(&self, model_path: &Path, tensor: PreprocessedTensor) -> Result<Vec<f32>> {
        let interpreter = self.loader.load(model_path)?;
        let start = Instant::now();
        let probabilities = interpreter.forward(&tensor)?;
        drop(tensor);
        debug!(
            "Inference produced {} scores in {}",
            probabilities.len(),
            format_millis(start.elapsed())
        );
        Ok(probabilities)
    }
}

impl<L: InterpreterLoader> InferenceEngine for ModelEngine<L> {
    fn mode(&self) -> InferenceMode {
        InferenceMode::Model
    }

    fn predict(
        &self,
        model_path: &Path,
        image_path: &Path,
        taxonomy: &Taxonomy,
    ) -> Result<PredictionSet> {
        // The image is checked before the model is touched
        let image = load_image(image_path)?;
        debug!(
            "Loaded image {} ({}x{})",
            image_path.display(),
            image.width(),
            image.height()
        );

        let start = Instant::now();
        let tensor = self.preprocessor.preprocess(&image)?;
        drop(image);
        debug!("Preprocessed to {:?} in {}", tensor.shape(), format_millis(start.elapsed()));

        let probabilities = self.infer(model_path, tensor)?;

        top_k(&probabilities, taxonomy)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::inference::interpreter::Interpreter;
    use crate::utils::error::PlantVillageError;
    use image::{Rgb, RgbImage};
    use std::cell::Cell;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Interpreter that always returns the same scores
    pub(crate) struct FixedInterpreter {
        pub scores: Vec<f32>,
    }

    impl Interpreter for FixedInterpreter {
        fn forward(&self, input: &PreprocessedTensor) -> Result<Vec<f32>> {
            assert_eq!(input.shape(), [1, 160, 160, 3]);
            Ok(self.scores.clone())
        }
    }

    /// Loader handing out a [`FixedInterpreter`]; counts loads
    pub(crate) struct StubLoader {
        pub scores: Vec<f32>,
        pub loads: Cell<usize>,
    }

    impl StubLoader {
        pub fn peaked(index: usize, probability: f32) -> Self {
            let mut scores = vec![0.0001; 38];
            scores[index] = probability;
            Self {
                scores,
                loads: Cell::new(0),
            }
        }
    }

    impl InterpreterLoader for StubLoader {
        fn load(&self, _model_path: &Path) -> Result<Box<dyn Interpreter>> {
            self.loads.set(self.loads.get() + 1);
            Ok(Box::new(FixedInterpreter {
                scores: self.scores.clone(),
            }))
        }
    }

    struct FailingLoader;

    impl InterpreterLoader for FailingLoader {
        fn load(&self, model_path: &Path) -> Result<Box<dyn Interpreter>> {
            Err(PlantVillageError::ModelLoad(
                model_path.to_path_buf(),
                "corrupt flatbuffer".to_string(),
            ))
        }
    }

    struct BrokenInterpreter;

    impl Interpreter for BrokenInterpreter {
        fn forward(&self, _input: &PreprocessedTensor) -> Result<Vec<f32>> {
            Err(PlantVillageError::Inference("kernel failed".to_string()))
        }
    }

    struct BrokenLoader;

    impl InterpreterLoader for BrokenLoader {
        fn load(&self, _model_path: &Path) -> Result<Box<dyn Interpreter>> {
            Ok(Box::new(BrokenInterpreter))
        }
    }

    fn green_image(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("green.png");
        RgbImage::from_pixel(200, 200, Rgb([0, 255, 0])).save(&path).unwrap();
        path
    }

    #[test]
    fn test_predict_with_stub() {
        let temp_dir = TempDir::new().unwrap();
        let image = green_image(&temp_dir);
        let engine = ModelEngine::new(StubLoader::peaked(3, 0.9));

        let set = engine
            .predict(Path::new("model.tflite"), &image, &Taxonomy::default())
            .unwrap();

        assert_eq!(set.top().index, 3);
        assert_eq!(set.top().class, "Apple___healthy");
        assert_eq!(set.top().confidence, 90.0);
        assert_eq!(engine.mode(), InferenceMode::Model);
    }

    #[test]
    fn test_each_call_loads_model() {
        let temp_dir = TempDir::new().unwrap();
        let image = green_image(&temp_dir);
        let engine = ModelEngine::new(StubLoader::peaked(0, 0.5));
        let taxonomy = Taxonomy::default();

        engine.predict(Path::new("m"), &image, &taxonomy).unwrap();
        engine.predict(Path::new("m"), &image, &taxonomy).unwrap();
        assert_eq!(engine.loader.loads.get(), 2);
    }

    #[test]
    fn test_image_checked_before_model() {
        let engine = ModelEngine::new(FailingLoader);
        let result = engine.predict(
            Path::new("model.tflite"),
            Path::new("/nonexistent/leaf.jpg"),
            &Taxonomy::default(),
        );
        assert!(matches!(result, Err(PlantVillageError::ImageLoad(_, _))));
    }

    #[test]
    fn test_model_load_error_propagates() {
        let temp_dir = TempDir::new().unwrap();
        let image = green_image(&temp_dir);
        let engine = ModelEngine::new(FailingLoader);

        let result = engine.predict(Path::new("model.tflite"), &image, &Taxonomy::default());
        assert!(matches!(result, Err(PlantVillageError::ModelLoad(_, _))));
    }

    #[test]
    fn test_inference_error_propagates() {
        let temp_dir = TempDir::new().unwrap();
        let image = green_image(&temp_dir);
        let engine = ModelEngine::new(BrokenLoader);

        let result = engine.predict(Path::new("model.tflite"), &image, &Taxonomy::default());
        assert!(matches!(result, Err(PlantVillageError::Inference(_))));
    }

    #[test]
    fn test_wrong_output_length_is_ranking_error() {
        let temp_dir = TempDir::new().unwrap();
        let image = green_image(&temp_dir);
        let engine = ModelEngine::new(StubLoader {
            scores: vec![0.1; 10],
            loads: Cell::new(0),
        });

        let result = engine.predict(Path::new("m"), &image, &Taxonomy::default());
        assert!(matches!(result, Err(PlantVillageError::Ranking(_))));
    }

    #[test]
    fn test_infer_returns_raw_scores() {
        let temp_dir = TempDir::new().unwrap();
        let image = green_image(&temp_dir);
        let engine = ModelEngine::new(StubLoader::peaked(7, 0.75));

        let tensor = ImagePreprocessor::default().preprocess_path(&image).unwrap();
        let scores = engine.infer(Path::new("m"), tensor).unwrap();
        assert_eq!(scores.len(), 38);
        assert_eq!(scores[7], 0.75);
    }
}
