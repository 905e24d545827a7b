use std::path::Path;

use image::RgbImage;
use log::info;
use parking_lot::Mutex;

use crate::{
    analysis::{FeatureExtractor, FeatureScores},
    error::{LesionError, Result},
    mask::Mask,
    report::visualization::{VisualizationConfig, Visualizer},
    risk::{ClinicalInputs, DiameterBucket, RiskResult, aggregate},
    segmentation::{ModelConfig, SegmentationModel, Segmenter, ThresholdModel},
};

pub mod analysis;
pub mod error;
pub mod image_utils;
pub mod mask;
pub mod report;
pub mod risk;
pub mod segmentation;

/// Judgment text returned when no image was supplied.
pub const UPLOAD_PROMPT: &str = "Please upload an image.";

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub multimask_output: bool,
    pub visualization: VisualizationConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            multimask_output: true,
            visualization: VisualizationConfig::default(),
        }
    }
}

/// Segment, score and render one dermoscopy image.
///
/// Owns the segmentation model; `analyze` takes `&mut self`, so calls on
/// one analyzer never overlap. Use [`SharedAnalyzer`] to hand a single
/// model to several threads.
pub struct LesionAnalyzer<M> {
    segmenter: Segmenter<M>,
    extractor: FeatureExtractor,
    visualizer: Visualizer,
}

impl LesionAnalyzer<ThresholdModel> {
    pub fn from_model_config(config: &ModelConfig) -> Result<Self> {
        Ok(Self::new(config.load()?))
    }
}

impl<M: SegmentationModel> LesionAnalyzer<M> {
    pub fn new(model: M) -> Self {
        Self {
            segmenter: Segmenter::new(model),
            extractor: FeatureExtractor::new(),
            visualizer: Visualizer::new(),
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.segmenter = self.segmenter.with_multimask(config.multimask_output);
        self.visualizer = Visualizer::with_config(config.visualization);
        self
    }

    pub fn analyze(
        &mut self,
        image: Option<&RgbImage>,
        diameter: DiameterBucket,
        evolving: bool,
    ) -> Result<AnalysisOutput> {
        let Some(image) = image else {
            return Ok(AnalysisOutput::missing_image());
        };

        let inputs = ClinicalInputs::new(diameter, evolving);
        let mask = self.segmenter.segment_center(image)?;
        let scores = self.extractor.analyze(image, &mask)?;
        let risk = aggregate(&scores, &inputs);
        let overlay = self.visualizer.render_overlay(image, &mask);

        info!(
            "{}x{} image, mask area {}, total risk {} ({:?})",
            image.width(),
            image.height(),
            mask.area(),
            risk.total,
            risk.tier
        );

        Ok(AnalysisOutput::new(overlay, mask, scores, risk))
    }

    pub fn analyze_path<P: AsRef<Path>>(
        &mut self,
        path: P,
        inputs: &ClinicalInputs,
    ) -> Result<AnalysisOutput> {
        let image = image::open(path)?.to_rgb8();
        self.analyze(Some(&image), inputs.diameter, inputs.evolving)
    }
}

/// Serializes access to one [`LesionAnalyzer`] across threads.
pub struct SharedAnalyzer<M> {
    inner: Mutex<LesionAnalyzer<M>>,
}

impl<M: SegmentationModel> SharedAnalyzer<M> {
    pub fn new(analyzer: LesionAnalyzer<M>) -> Self {
        Self {
            inner: Mutex::new(analyzer),
        }
    }

    pub fn analyze(
        &self,
        image: Option<&RgbImage>,
        diameter: DiameterBucket,
        evolving: bool,
    ) -> Result<AnalysisOutput> {
        self.inner.lock().analyze(image, diameter, evolving)
    }

    pub fn into_inner(self) -> LesionAnalyzer<M> {
        self.inner.into_inner()
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub overlay: Option<RgbImage>,
    pub asymmetry: f64,
    pub border: f64,
    pub color: f64,
    pub judgment: String,
    pub risk: Option<RiskResult>,
    pub mask: Option<Mask>,
}

impl AnalysisOutput {
    fn new(overlay: RgbImage, mask: Mask, scores: FeatureScores, risk: RiskResult) -> Self {
        Self {
            overlay: Some(overlay),
            asymmetry: scores.asymmetry,
            border: scores.border,
            color: scores.color,
            judgment: risk.judgment.clone(),
            risk: Some(risk),
            mask: Some(mask),
        }
    }

    fn missing_image() -> Self {
        Self {
            overlay: None,
            asymmetry: 0.0,
            border: 0.0,
            color: 0.0,
            judgment: UPLOAD_PROMPT.to_string(),
            risk: None,
            mask: None,
        }
    }

    pub fn scores(&self) -> FeatureScores {
        FeatureScores {
            asymmetry: self.asymmetry,
            border: self.border,
            color: self.color,
        }
    }

    pub fn save_overlay<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let overlay = self
            .overlay
            .as_ref()
            .ok_or_else(|| LesionError::InvalidParameter("No overlay to save".into()))?;
        overlay.save(path)?;
        Ok(())
    }
}
