pub mod visualization;

use serde::Serialize;

use crate::{
    AnalysisOutput,
    risk::{ClinicalInputs, RiskTier},
};

#[derive(Serialize)]
pub struct JsonReport {
    pub scores: ScoreSection,
    pub clinical: ClinicalSection,
    pub risk: Option<RiskSection>,
    pub judgment: String,
    pub segmentation: Option<SegmentationSection>,
}

#[derive(Serialize)]
pub struct ScoreSection {
    pub asymmetry: f64,
    pub border: f64,
    pub color: f64,
}

#[derive(Serialize)]
pub struct ClinicalSection {
    pub diameter: String,
    pub evolving: bool,
}

#[derive(Serialize)]
pub struct RiskSection {
    pub total: f64,
    pub tier: RiskTier,
}

#[derive(Serialize)]
pub struct SegmentationSection {
    pub image_width: u32,
    pub image_height: u32,
    pub mask_area: u64,
}

impl JsonReport {
    pub fn new(output: &AnalysisOutput, inputs: &ClinicalInputs) -> Self {
        Self {
            scores: ScoreSection {
                asymmetry: output.asymmetry,
                border: output.border,
                color: output.color,
            },
            clinical: ClinicalSection {
                diameter: inputs.diameter.to_string(),
                evolving: inputs.evolving,
            },
            risk: output.risk.as_ref().map(|r| RiskSection {
                total: r.total,
                tier: r.tier,
            }),
            judgment: output.judgment.clone(),
            segmentation: output.mask.as_ref().map(|m| SegmentationSection {
                image_width: m.width(),
                image_height: m.height(),
                mask_area: m.area(),
            }),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
