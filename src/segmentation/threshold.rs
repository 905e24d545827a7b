//! Seeded Otsu segmentation.
//!
//! A non-learned stand-in for a promptable segmentation network: the image
//! is blurred and thresholded around its Otsu level, and every candidate
//! keeps only the 8-connected region that contains the prompt point.

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma, RgbImage};
use imageproc::{
    contrast::otsu_level,
    filter::gaussian_blur_f32,
    region_labelling::{Connectivity, connected_components},
};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    error::{LesionError, Result},
    image_utils::rgb_to_gray,
    mask::Mask,
    segmentation::{PointLabel, Prediction, SegmentationModel},
};

/// Tunable parameters, loadable from a JSON checkpoint file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdParams {
    pub blur_sigma: f32,
    /// Offsets added to the Otsu level, one candidate mask each.
    pub threshold_offsets: Vec<i16>,
    pub min_region_pixels: u32,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            blur_sigma: 1.5,
            threshold_offsets: vec![-12, 0, 12],
            min_region_pixels: 16,
        }
    }
}

impl ThresholdParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.blur_sigma.is_finite() && self.blur_sigma > 0.0) {
            return Err(LesionError::InvalidParameter(format!(
                "blur_sigma must be positive, got {}",
                self.blur_sigma
            )));
        }
        if self.threshold_offsets.is_empty() {
            return Err(LesionError::InvalidParameter(
                "threshold_offsets must not be empty".into(),
            ));
        }
        if let Some(offset) = self.threshold_offsets.iter().find(|o| o.abs() > 255) {
            return Err(LesionError::InvalidParameter(format!(
                "threshold offset {offset} is outside -255..=255"
            )));
        }
        Ok(())
    }
}

/// Where the model parameters come from at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    pub checkpoint: Option<PathBuf>,
}

impl ModelConfig {
    pub fn with_checkpoint<P: AsRef<Path>>(path: P) -> Self {
        Self {
            checkpoint: Some(path.as_ref().to_path_buf()),
        }
    }

    pub fn load(&self) -> Result<ThresholdModel> {
        let params = match &self.checkpoint {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let params: ThresholdParams = serde_json::from_str(&raw)?;
                info!("Loaded model parameters from {}", path.display());
                params
            }
            None => ThresholdParams::default(),
        };
        ThresholdModel::new(params)
    }
}

pub struct ThresholdModel {
    params: ThresholdParams,
    prepared: Option<GrayImage>,
}

impl ThresholdModel {
    pub fn new(params: ThresholdParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            prepared: None,
        })
    }

    pub fn params(&self) -> &ThresholdParams {
        &self.params
    }

    fn candidate(
        &self,
        gray: &GrayImage,
        seed: (u32, u32),
        level: u8,
        dark: bool,
        offset: i16,
    ) -> (Mask, f32) {
        let (width, height) = gray.dimensions();
        let seed_value = gray.get_pixel(seed.0, seed.1)[0];
        let threshold = (level as i16 + offset).clamp(0, 255) as u8;
        // keep the seed itself on the foreground side
        let threshold = if dark {
            threshold.max(seed_value)
        } else {
            threshold.min(seed_value.saturating_sub(1))
        };

        let binary = GrayImage::from_fn(width, height, |x, y| {
            let v = gray.get_pixel(x, y)[0];
            let foreground = if dark { v <= threshold } else { v > threshold };
            Luma([if foreground { 255 } else { 0 }])
        });

        let labels = connected_components(&binary, Connectivity::Eight, Luma([0u8]));
        let seed_label = labels.get_pixel(seed.0, seed.1)[0];
        if seed_label == 0 {
            return (Mask::new(width, height), 0.0);
        }

        let mask = Mask::from_fn(width, height, |x, y| labels.get_pixel(x, y)[0] == seed_label);

        let (mut sum_in, mut n_in, mut sum_out, mut n_out) = (0.0f64, 0u64, 0.0f64, 0u64);
        for (x, y, inside) in mask.iter() {
            let v = gray.get_pixel(x, y)[0] as f64;
            if inside {
                sum_in += v;
                n_in += 1;
            } else {
                sum_out += v;
                n_out += 1;
            }
        }

        if n_in < self.params.min_region_pixels as u64 {
            return (Mask::new(width, height), 0.0);
        }

        let score = if n_out == 0 {
            0.0
        } else {
            ((sum_in / n_in as f64 - sum_out / n_out as f64).abs() / 255.0) as f32
        };

        (mask, score)
    }
}

impl SegmentationModel for ThresholdModel {
    fn set_image(&mut self, image: &RgbImage) -> Result<()> {
        if image.width() == 0 || image.height() == 0 {
            return Err(LesionError::InvalidParameter("image has no pixels".into()));
        }
        let gray = rgb_to_gray(image);
        self.prepared = Some(gaussian_blur_f32(&gray, self.params.blur_sigma));
        Ok(())
    }

    fn predict(
        &mut self,
        points: &[(u32, u32)],
        labels: &[PointLabel],
        multimask_output: bool,
    ) -> Result<Prediction> {
        let gray = self
            .prepared
            .as_ref()
            .ok_or_else(|| {
                LesionError::Segmentation("set_image must be called before predict".into())
            })?;

        if points.len() != labels.len() {
            return Err(LesionError::InvalidParameter(format!(
                "{} points but {} labels",
                points.len(),
                labels.len()
            )));
        }

        // only the first foreground prompt is used
        let seed = points
            .iter()
            .zip(labels)
            .find(|(_, label)| **label == PointLabel::Foreground)
            .map(|(p, _)| *p)
            .ok_or_else(|| LesionError::Segmentation("no foreground point given".into()))?;

        if seed.0 >= gray.width() || seed.1 >= gray.height() {
            return Err(LesionError::InvalidParameter(format!(
                "seed {:?} outside {}x{} image",
                seed,
                gray.width(),
                gray.height()
            )));
        }

        let level = otsu_level(gray);
        let dark = gray.get_pixel(seed.0, seed.1)[0] <= level;
        debug!("Otsu level {level}, lesion {}", if dark { "darker" } else { "lighter" });

        let offsets: &[i16] = if multimask_output {
            &self.params.threshold_offsets
        } else {
            &[0]
        };

        let mut prediction = Prediction::default();
        for &offset in offsets {
            let (mask, score) = self.candidate(gray, seed, level, dark, offset);
            prediction.masks.push(mask);
            prediction.scores.push(score);
        }

        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use image::Rgb;

    use super::*;

    fn dark_disc(size: u32, radius: f64) -> RgbImage {
        let c = size as f64 / 2.0;
        RgbImage::from_fn(size, size, |x, y| {
            let dx = x as f64 + 0.5 - c;
            let dy = y as f64 + 0.5 - c;
            if dx * dx + dy * dy <= radius * radius {
                Rgb([70, 40, 30])
            } else {
                Rgb([180, 180, 180])
            }
        })
    }

    #[test]
    fn test_predict_requires_image() {
        let mut model = ThresholdModel::new(ThresholdParams::default()).unwrap();
        let result = model.predict(&[(0, 0)], &[PointLabel::Foreground], true);
        assert!(matches!(result, Err(LesionError::Segmentation(_))));
    }

    #[test]
    fn test_predict_requires_foreground_point() {
        let mut model = ThresholdModel::new(ThresholdParams::default()).unwrap();
        model.set_image(&dark_disc(40, 10.0)).unwrap();
        let result = model.predict(&[(20, 20)], &[PointLabel::Background], true);
        assert!(matches!(result, Err(LesionError::Segmentation(_))));
    }

    #[test]
    fn test_dark_disc_is_found() {
        let image = dark_disc(80, 20.0);
        let mut model = ThresholdModel::new(ThresholdParams::default()).unwrap();
        model.set_image(&image).unwrap();
        let prediction = model.predict(&[(40, 40)], &[PointLabel::Foreground], true).unwrap();

        assert_eq!(prediction.masks.len(), 3);
        assert_eq!(prediction.scores.len(), 3);

        let disc_area = std::f64::consts::PI * 20.0 * 20.0;
        for (mask, score) in prediction.masks.iter().zip(&prediction.scores) {
            assert!(mask.get(40, 40));
            assert!(!mask.get(2, 2));
            let ratio = mask.area() as f64 / disc_area;
            assert!((0.85..1.15).contains(&ratio), "area ratio {ratio}");
            assert!(*score > 0.3);
        }
    }

    #[test]
    fn test_single_mask_without_multimask() {
        let mut model = ThresholdModel::new(ThresholdParams::default()).unwrap();
        model.set_image(&dark_disc(40, 10.0)).unwrap();
        let prediction = model.predict(&[(20, 20)], &[PointLabel::Foreground], false).unwrap();
        assert_eq!(prediction.masks.len(), 1);
    }

    #[test]
    fn test_only_seed_component_kept() {
        let image = RgbImage::from_fn(60, 20, |x, y| {
            let left = (5..15).contains(&x) && (5..15).contains(&y);
            let right = (40..55).contains(&x) && (5..15).contains(&y);
            if left || right { Rgb([20, 20, 20]) } else { Rgb([220, 220, 220]) }
        });
        let mut model = ThresholdModel::new(ThresholdParams::default()).unwrap();
        model.set_image(&image).unwrap();
        let prediction = model.predict(&[(10, 10)], &[PointLabel::Foreground], false).unwrap();
        let mask = &prediction.masks[0];
        assert!(mask.get(10, 10));
        assert!(!mask.get(47, 10));
    }

    #[test]
    fn test_uniform_image_does_not_fail() {
        let image = RgbImage::from_pixel(24, 24, Rgb([128, 128, 128]));
        let mut model = ThresholdModel::new(ThresholdParams::default()).unwrap();
        model.set_image(&image).unwrap();
        let prediction = model.predict(&[(12, 12)], &[PointLabel::Foreground], true).unwrap();
        assert_eq!(prediction.masks.len(), 3);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = ThresholdParams { blur_sigma: 0.0, ..Default::default() };
        assert!(ThresholdModel::new(params).is_err());

        let params = ThresholdParams { threshold_offsets: Vec::new(), ..Default::default() };
        assert!(ThresholdModel::new(params).is_err());

        let params = ThresholdParams { threshold_offsets: vec![300], ..Default::default() };
        assert!(ThresholdModel::new(params).is_err());
    }

    #[test]
    fn test_checkpoint_loading() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"blur_sigma": 2.0, "threshold_offsets": [0, 5]}}"#).unwrap();

        let model = ModelConfig::with_checkpoint(file.path()).load().unwrap();
        assert_eq!(model.params().blur_sigma, 2.0);
        assert_eq!(model.params().threshold_offsets, vec![0, 5]);
        assert_eq!(model.params().min_region_pixels, 16);
    }

    #[test]
    fn test_missing_checkpoint_is_io_error() {
        let result = ModelConfig::with_checkpoint("/nonexistent/params.json").load();
        assert!(matches!(result, Err(LesionError::Io(_))));
    }

    #[test]
    fn test_default_config_uses_default_params() {
        let model = ModelConfig::default().load().unwrap();
        assert_eq!(model.params(), &ThresholdParams::default());
    }
}
