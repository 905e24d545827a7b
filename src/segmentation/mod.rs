pub mod threshold;

use image::RgbImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::{LesionError, Result},
    mask::Mask,
};

pub use threshold::{ModelConfig, ThresholdModel, ThresholdParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointLabel {
    Background,
    Foreground,
}

/// Candidate masks with a parallel list of confidence scores.
#[derive(Debug, Clone, Default)]
pub struct Prediction {
    pub masks: Vec<Mask>,
    pub scores: Vec<f32>,
}

/// Prompted segmentation model: prepare once per image, then predict
/// masks from point prompts.
pub trait SegmentationModel {
    fn set_image(&mut self, image: &RgbImage) -> Result<()>;

    fn predict(
        &mut self,
        points: &[(u32, u32)],
        labels: &[PointLabel],
        multimask_output: bool,
    ) -> Result<Prediction>;
}

impl<M: SegmentationModel + ?Sized> SegmentationModel for Box<M> {
    fn set_image(&mut self, image: &RgbImage) -> Result<()> {
        (**self).set_image(image)
    }

    fn predict(
        &mut self,
        points: &[(u32, u32)],
        labels: &[PointLabel],
        multimask_output: bool,
    ) -> Result<Prediction> {
        (**self).predict(points, labels, multimask_output)
    }
}

/// Owns a model and turns one seed point into a lesion mask.
pub struct Segmenter<M> {
    model: M,
    multimask_output: bool,
}

impl<M: SegmentationModel> Segmenter<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            multimask_output: true,
        }
    }

    pub fn with_multimask(mut self, multimask_output: bool) -> Self {
        self.multimask_output = multimask_output;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Runs the model once with a single foreground seed and returns the
    /// candidates ordered by descending confidence. Equal confidences keep
    /// the model's order.
    pub fn segment(&mut self, image: &RgbImage, seed: (u32, u32)) -> Result<Vec<(Mask, f32)>> {
        self.model.set_image(image)?;
        let prediction =
            self.model
                .predict(&[seed], &[PointLabel::Foreground], self.multimask_output)?;

        if prediction.masks.is_empty() {
            return Err(LesionError::Segmentation("model returned no masks".into()));
        }
        if prediction.masks.len() != prediction.scores.len() {
            return Err(LesionError::Segmentation(format!(
                "model returned {} masks but {} scores",
                prediction.masks.len(),
                prediction.scores.len()
            )));
        }
        if let Some(score) = prediction.scores.iter().find(|s| !s.is_finite()) {
            return Err(LesionError::Segmentation(format!(
                "model returned non-finite score {score}"
            )));
        }
        if let Some(mask) = prediction
            .masks
            .iter()
            .find(|m| m.dimensions() != image.dimensions())
        {
            return Err(LesionError::DimensionMismatch {
                expected: image.dimensions(),
                found: mask.dimensions(),
            });
        }

        let mut ranked = prediction
            .masks
            .into_iter()
            .zip(prediction.scores)
            .collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        debug!(
            "Segmented {} candidate(s) from seed {:?}, scores {:?}",
            ranked.len(),
            seed,
            ranked.iter().map(|(_, s)| *s).collect::<Vec<_>>()
        );

        Ok(ranked)
    }

    /// Seeds the model at the image center and keeps the most confident mask.
    pub fn segment_center(&mut self, image: &RgbImage) -> Result<Mask> {
        let (width, height) = image.dimensions();
        let seed = (width / 2, height / 2);

        let (mask, score) = self
            .segment(image, seed)?
            .into_iter()
            .next()
            .ok_or_else(|| LesionError::Segmentation("model returned no masks".into()))?;

        if mask.is_empty() {
            warn!("Best mask (score {score:.3}) is empty; scores will be zero");
        }

        Ok(mask)
    }
}
