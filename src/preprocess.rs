//! Image Preprocessing Module
//!
//! Turns an image file into the `[1, H, W, 3]` float tensor the classifier was
//! trained on. The transform must match training exactly:
//!
//! 1. decode and force 3-channel RGB (alpha dropped, grayscale expanded)
//! 2. resize to a fixed square with PIL-style bilinear filtering,
//!    aspect ratio not preserved
//! 3. scale every channel value from `0..=255` to `[0, 1]`
//! 4. prepend a batch dimension of size 1 (NHWC layout)

use std::path::Path;

use image::{DynamicImage, ImageReader, Rgb, RgbImage};
use ndarray::Array4;

use crate::utils::error::{PlantVillageError, Result};
use crate::IMAGE_SIZE;

/// Open and decode an image, sniffing the format from content rather than extension
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let load_err = |e: String| PlantVillageError::ImageLoad(path.to_path_buf(), e);

    ImageReader::open(path)
        .map_err(|e| load_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| load_err(e.to_string()))?
        .decode()
        .map_err(|e| load_err(e.to_string()))
}

/// PIL-compatible bilinear resize with anti-aliasing.
///
/// Matches `Image.resize(size, BILINEAR)`: when downscaling, the triangle
/// filter's support grows with the scale factor so every source pixel
/// contributes.
pub fn pil_bilinear_resize(img: &DynamicImage, target_width: u32, target_height: u32) -> RgbImage {
    let src = img.to_rgb8();
    let src_width = src.width() as usize;
    let src_height = src.height() as usize;

    let mut dst = RgbImage::new(target_width, target_height);
    if src_width == 0 || src_height == 0 {
        return dst;
    }

    let x_scale = src_width as f32 / target_width as f32;
    let y_scale = src_height as f32 / target_height as f32;

    let support_x = x_scale.max(1.0);
    let support_y = y_scale.max(1.0);

    for dy in 0..target_height as usize {
        for dx in 0..target_width as usize {
            // Center of output pixel in source coordinates
            let src_cx = (dx as f32 + 0.5) * x_scale;
            let src_cy = (dy as f32 + 0.5) * y_scale;

            let x_min = (src_cx - support_x).floor().max(0.0) as usize;
            let x_max = (src_cx + support_x).ceil().min(src_width as f32 - 1.0) as usize;
            let y_min = (src_cy - support_y).floor().max(0.0) as usize;
            let y_max = (src_cy + support_y).ceil().min(src_height as f32 - 1.0) as usize;

            let mut total_weight = 0.0f32;
            let mut weighted_sum = [0.0f32; 3];

            for sy in y_min..=y_max {
                let dist_y = ((sy as f32 + 0.5) - src_cy).abs() / support_y;
                if dist_y >= 1.0 {
                    continue;
                }
                for sx in x_min..=x_max {
                    let dist_x = ((sx as f32 + 0.5) - src_cx).abs() / support_x;
                    if dist_x >= 1.0 {
                        continue;
                    }

                    let weight = (1.0 - dist_x) * (1.0 - dist_y);
                    let pixel = src.get_pixel(sx as u32, sy as u32);
                    for (sum, &channel) in weighted_sum.iter_mut().zip(pixel.0.iter()) {
                        *sum += channel as f32 * weight;
                    }
                    total_weight += weight;
                }
            }

            if total_weight > 0.0 {
                let px = weighted_sum.map(|sum| (sum / total_weight).round().clamp(0.0, 255.0) as u8);
                dst.put_pixel(dx as u32, dy as u32, Rgb(px));
            }
        }
    }

    dst
}

/// Single-image batch tensor in NHWC layout, values in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessedTensor {
    data: Array4<f32>,
}

impl PreprocessedTensor {
    /// Shape as `[batch, height, width, channels]`
    pub fn shape(&self) -> [usize; 4] {
        let s = self.data.shape();
        [s[0], s[1], s[2], s[3]]
    }

    /// Contiguous row-major view of all values
    pub fn as_slice(&self) -> Result<&[f32]> {
        self.data.as_slice().ok_or_else(|| {
            PlantVillageError::Preprocess("tensor is not contiguous".to_string())
        })
    }

    /// Map back to `0..=255` bytes for models with an unsigned 8-bit input slot
    pub fn to_u8(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|&v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect()
    }

    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.data.iter().copied()
    }
}

/// Image preprocessor for the classifier's input slot
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Side length of the square model input
    pub image_size: u32,
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self {
            image_size: IMAGE_SIZE,
        }
    }
}

impl ImagePreprocessor {
    pub fn new(image_size: u32) -> Self {
        Self { image_size }
    }

    /// Preprocess a decoded image
    pub fn preprocess(&self, image: &DynamicImage) -> Result<PreprocessedTensor> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PlantVillageError::Preprocess(format!(
                "image has zero area ({}x{})",
                image.width(),
                image.height()
            )));
        }
        if self.image_size == 0 {
            return Err(PlantVillageError::Preprocess(
                "target size must be positive".to_string(),
            ));
        }

        let resized = pil_bilinear_resize(image, self.image_size, self.image_size);
        let size = self.image_size as usize;

        let data = Array4::from_shape_fn((1, size, size, 3), |(_, y, x, c)| {
            resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
        });

        Ok(PreprocessedTensor { data })
    }

    /// Load and preprocess an image from a file path
    pub fn preprocess_path(&self, path: &Path) -> Result<PreprocessedTensor> {
        let image = load_image(path)?;
        self.preprocess(&image)
    }
}
