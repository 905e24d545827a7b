use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{analysis::FeatureScores, error::LesionError, image_utils::round3};

const DIAMETER_WEIGHT: f64 = 0.2;
const EVOLVING_WEIGHT: f64 = 0.3;
const URGENT_THRESHOLD: f64 = 0.7;
const OBSERVATION_THRESHOLD: f64 = 0.4;

/// Lesion diameter as reported by the clinician.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiameterBucket {
    #[default]
    UnderSixMm,
    SixMmOrMore,
}

impl DiameterBucket {
    pub fn label(&self) -> &'static str {
        match self {
            DiameterBucket::UnderSixMm => "<6mm",
            DiameterBucket::SixMmOrMore => ">=6mm",
        }
    }
}

impl fmt::Display for DiameterBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DiameterBucket {
    type Err = LesionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<6mm" | "under6" | "lt6" => Ok(DiameterBucket::UnderSixMm),
            ">=6mm" | "≥6mm" | "6-or-more" | "ge6" => Ok(DiameterBucket::SixMmOrMore),
            other => Err(LesionError::InvalidParameter(format!(
                "Unknown diameter bucket: {other}"
            ))),
        }
    }
}

/// D and E of the ABCDE heuristic; supplied by the user, not measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalInputs {
    pub diameter: DiameterBucket,
    pub evolving: bool,
}

impl ClinicalInputs {
    pub fn new(diameter: DiameterBucket, evolving: bool) -> Self {
        Self { diameter, evolving }
    }

    fn contribution(&self) -> f64 {
        let d = match self.diameter {
            DiameterBucket::SixMmOrMore => DIAMETER_WEIGHT,
            DiameterBucket::UnderSixMm => 0.0,
        };
        let e = if self.evolving { EVOLVING_WEIGHT } else { 0.0 };
        d + e
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Observation,
    Urgent,
}

impl RiskTier {
    pub fn from_total(total: f64) -> Self {
        match total {
            t if t > URGENT_THRESHOLD => RiskTier::Urgent,
            t if t > OBSERVATION_THRESHOLD => RiskTier::Observation,
            _ => RiskTier::Low,
        }
    }

    pub fn judgment(&self, total: f64) -> String {
        // `{:?}` keeps a decimal point on whole numbers: 1.0, not 1
        match self {
            RiskTier::Urgent => format!(
                "[Specialist referral required] Melanoma cannot be ruled out. (Total: {total:?})"
            ),
            RiskTier::Observation => format!(
                "[Observation recommended] Irregular features observed. Consider seeing a dermatologist. (Total: {total:?})"
            ),
            RiskTier::Low => format!(
                "[Low risk] Benign features currently predominate. (Total: {total:?})"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub total: f64,
    pub tier: RiskTier,
    pub judgment: String,
}

impl RiskResult {
    /// Builds the result for an already rounded total.
    pub fn from_total(total: f64) -> Self {
        let tier = RiskTier::from_total(total);
        Self {
            total,
            tier,
            judgment: tier.judgment(total),
        }
    }
}

/// Fixed-weight demo scoring rule. Not a validated clinical model.
pub fn aggregate(scores: &FeatureScores, inputs: &ClinicalInputs) -> RiskResult {
    let total = round3((scores.mean() + inputs.contribution()).min(1.0));
    RiskResult::from_total(total)
}
