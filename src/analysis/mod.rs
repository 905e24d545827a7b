pub mod asymmetry;
pub mod border;
mod color;

use image::RgbImage;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::{LesionError, Result},
    mask::Mask,
};

pub use asymmetry::asymmetry_score;
pub use border::border_score;
pub(crate) use color::color_score;

/// A, B and C of the ABCDE heuristic, each in `[0, 1]` and rounded to three decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureScores {
    pub asymmetry: f64,
    pub border: f64,
    pub color: f64,
}

impl FeatureScores {
    pub fn mean(&self) -> f64 {
        (self.asymmetry + self.border + self.color) / 3.0
    }
}

pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, image: &RgbImage, mask: &Mask) -> Result<FeatureScores> {
        if image.dimensions() != mask.dimensions() {
            return Err(LesionError::DimensionMismatch {
                expected: image.dimensions(),
                found: mask.dimensions(),
            });
        }

        let scores = FeatureScores {
            asymmetry: asymmetry_score(mask),
            border: border_score(mask),
            color: color_score(image, mask),
        };
        debug!(
            "Features: asymmetry={} border={} color={}",
            scores.asymmetry, scores.border, scores.color
        );

        Ok(scores)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn test_empty_mask_all_zero() {
        let image = RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 77]));
        let scores = FeatureExtractor::new().analyze(&image, &Mask::new(32, 32)).unwrap();
        assert_eq!(scores, FeatureScores::default());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let image = RgbImage::new(10, 10);
        let result = FeatureExtractor::new().analyze(&image, &Mask::new(10, 11));
        assert!(matches!(
            result,
            Err(LesionError::DimensionMismatch { expected: (10, 10), found: (10, 11) })
        ));
    }

    #[test]
    fn test_mask_larger_than_image_rejected() {
        let image = RgbImage::new(8, 8);
        let mask = Mask::from_fn(12, 12, |_, _| true);
        let result = FeatureExtractor::new().analyze(&image, &mask);
        assert!(matches!(
            result,
            Err(LesionError::DimensionMismatch { expected: (8, 8), found: (12, 12) })
        ));
    }

    #[test]
    fn test_scores_rounded_to_three_decimals() {
        let image = RgbImage::from_fn(50, 40, |x, y| Rgb([(x * 5) as u8, (y * 6) as u8, 90]));
        let mask = Mask::from_fn(50, 40, |x, y| x + y < 45 && x > 3);
        let scores = FeatureExtractor::new().analyze(&image, &mask).unwrap();

        for value in [scores.asymmetry, scores.border, scores.color] {
            assert!((0.0..=1.0).contains(&value));
            assert!(((value * 1000.0).round() - value * 1000.0).abs() < 1e-6);
        }
    }
}
