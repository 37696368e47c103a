//! Mock inference engine
//!
//! Used when no interpreter is available. Predictions are derived from the
//! mean pixel intensity of the image so the same file always produces the
//! same response. Confidences are synthetic: they do not sum to 100.

use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

use super::{InferenceEngine, InferenceMode};
use crate::preprocess::load_image;
use crate::ranking::{Prediction, PredictionSet, TOP_K};
use crate::taxonomy::Taxonomy;
use crate::utils::error::Result;
use crate::IMAGE_SIZE;

/// Confidence of the first mock prediction
const BASE_CONFIDENCE: i64 = 85;
/// Drop per rank
const CONFIDENCE_STEP: i64 = 5;
/// Added per `rank % 3`
const CONFIDENCE_WOBBLE: i64 = 2;
/// Lowest confidence ever reported
const CONFIDENCE_FLOOR: i64 = 60;

/// Confidence for the mock prediction at `rank` (0-indexed)
pub fn mock_confidence(rank: usize) -> f64 {
    let rank = rank as i64;
    let confidence = BASE_CONFIDENCE - CONFIDENCE_STEP * rank + CONFIDENCE_WOBBLE * (rank % 3);
    confidence.max(CONFIDENCE_FLOOR) as f64
}

/// Mean intensity over every stored channel after a bicubic downscale.
///
/// 8-bit images are measured in their native channel layout, alpha included;
/// deeper formats are measured as 8-bit RGB.
pub fn mean_intensity(image: &DynamicImage, size: u32) -> f64 {
    let resized = image.resize_exact(size, size, FilterType::CatmullRom);
    let bytes = match resized {
        img @ (DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_)) => img.into_bytes(),
        img => img.to_rgb8().into_raw(),
    };

    if bytes.is_empty() {
        return 0.0;
    }
    let sum: u64 = bytes.iter().map(|&b| b as u64).sum();
    sum as f64 / bytes.len() as f64
}

/// Deterministic stand-in for a real forward pass
#[derive(Debug, Clone)]
pub struct MockEngine {
    /// Side length used for the intensity downscale
    pub image_size: u32,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self {
            image_size: IMAGE_SIZE,
        }
    }
}

impl MockEngine {
    /// Seed index: truncated mean intensity modulo the taxonomy size
    pub fn seed_index(&self, image: &DynamicImage, num_classes: usize) -> usize {
        let mean = mean_intensity(image, self.image_size);
        (mean.floor() as usize) % num_classes.max(1)
    }

    /// Build `TOP_K` predictions starting at the seed, wrapping around the taxonomy
    pub fn predictions_from_seed(&self, seed: usize, taxonomy: &Taxonomy) -> Result<PredictionSet> {
        let predictions = (0..TOP_K)
            .map(|rank| {
                let index = (seed + rank) % taxonomy.len();
                Prediction::new(taxonomy, index, mock_confidence(rank))
            })
            .collect::<Result<Vec<_>>>()?;

        PredictionSet::new(predictions)
    }

    /// Produce mock predictions for an image file
    pub fn mock_infer(&self, image_path: &Path, taxonomy: &Taxonomy) -> Result<PredictionSet> {
        let image = load_image(image_path)?;
        let seed = self.seed_index(&image, taxonomy.len());
        debug!("Mock seed index {} for {}", seed, image_path.display());
        self.predictions_from_seed(seed, taxonomy)
    }
}

impl InferenceEngine for MockEngine {
    fn mode(&self) -> InferenceMode {
        InferenceMode::Mock
    }

    fn predict(
        &self,
        _model_path: &Path,
        image_path: &Path,
        taxonomy: &Taxonomy,
    ) -> Result<PredictionSet> {
        self.mock_infer(image_path, taxonomy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::PlantVillageError;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_confidence_formula() {
        let confidences: Vec<f64> = (0..5).map(mock_confidence).collect();
        assert_eq!(confidences, vec![85.0, 82.0, 79.0, 70.0, 67.0]);
    }

    #[test]
    fn test_confidence_floor() {
        assert_eq!(mock_confidence(5), 64.0);
        assert_eq!(mock_confidence(6), 60.0);
        assert_eq!(mock_confidence(20), 60.0);
    }

    #[test]
    fn test_all_black_image() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("black.png");
        RgbImage::new(160, 160).save(&path).unwrap();

        let set = MockEngine::default()
            .mock_infer(&path, &Taxonomy::default())
            .unwrap();

        assert_eq!(set.indices(), vec![0, 1, 2, 3, 4]);
        assert_eq!(set.confidences(), vec![85.0, 82.0, 79.0, 70.0, 67.0]);
        assert_eq!(set.top().class, "Apple___Apple_scab");
    }

    #[test]
    fn test_seed_from_mean() {
        let engine = MockEngine::default();
        let grey = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([100])));
        assert_eq!(engine.seed_index(&grey, 38), 100 % 38);

        let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 255, 255])));
        assert_eq!(engine.seed_index(&white, 38), 255 % 38);
    }

    #[test]
    fn test_alpha_counts_toward_mean() {
        let engine = MockEngine::default();
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 200])));
        assert_eq!(mean_intensity(&img, 160), 50.0);
        assert_eq!(engine.seed_index(&img, 38), 50 % 38);
    }

    #[test]
    fn test_wraps_around_taxonomy() {
        let set = MockEngine::default()
            .predictions_from_seed(36, &Taxonomy::default())
            .unwrap();
        assert_eq!(set.indices(), vec![36, 37, 0, 1, 2]);
        for p in set.iter() {
            assert_eq!(Taxonomy::default().class_name(p.index), Some(p.class.as_str()));
        }
    }

    #[test]
    fn test_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("leaf.png");
        RgbImage::from_fn(120, 90, |x, y| Rgb([(x * 2) as u8, (y * 2) as u8, 77]))
            .save(&path)
            .unwrap();

        let engine = MockEngine::default();
        let taxonomy = Taxonomy::default();
        let first = serde_json::to_string(&engine.mock_infer(&path, &taxonomy).unwrap()).unwrap();
        let second = serde_json::to_string(&engine.mock_infer(&path, &taxonomy).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unreadable_image_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("leaf.jpg");
        fs::write(&path, b"\x00\x01garbage").unwrap();

        let result = MockEngine::default().mock_infer(&path, &Taxonomy::default());
        assert!(matches!(result, Err(PlantVillageError::ImageLoad(_, _))));
    }

    #[test]
    fn test_model_path_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("black.png");
        RgbImage::new(20, 20).save(&path).unwrap();

        let engine = MockEngine::default();
        let set = engine
            .predict(Path::new("/nonexistent/model.tflite"), &path, &Taxonomy::default())
            .unwrap();
        assert_eq!(set.top().index, 0);
        assert_eq!(engine.mode(), InferenceMode::Mock);
    }
}
