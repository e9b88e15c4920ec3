//! Descriptive labels for NDVI levels and confidence scores.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Growth stage implied by a single NDVI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhenologyStage {
    Dormant,
    EarlyGreenup,
    Greenup,
    PeakGreen,
    Blooming,
    Mature,
}

impl PhenologyStage {
    pub fn from_ndvi(ndvi: f64) -> Self {
        if ndvi < 0.2 {
            PhenologyStage::Dormant
        } else if ndvi < 0.4 {
            PhenologyStage::EarlyGreenup
        } else if ndvi < 0.6 {
            PhenologyStage::Greenup
        } else if ndvi < 0.75 {
            PhenologyStage::PeakGreen
        } else if ndvi < 0.85 {
            PhenologyStage::Blooming
        } else {
            PhenologyStage::Mature
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhenologyStage::Dormant => "dormant",
            PhenologyStage::EarlyGreenup => "early_greenup",
            PhenologyStage::Greenup => "greenup",
            PhenologyStage::PeakGreen => "peak_green",
            PhenologyStage::Blooming => "blooming",
            PhenologyStage::Mature => "mature",
        }
    }
}

impl fmt::Display for PhenologyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Five-level wording of a [0, 1] confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLabel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            ConfidenceLabel::VeryHigh
        } else if score >= 0.7 {
            ConfidenceLabel::High
        } else if score >= 0.5 {
            ConfidenceLabel::Medium
        } else if score >= 0.3 {
            ConfidenceLabel::Low
        } else {
            ConfidenceLabel::VeryLow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_boundaries_are_lower_inclusive() {
        assert_eq!(PhenologyStage::from_ndvi(0.0), PhenologyStage::Dormant);
        assert_eq!(PhenologyStage::from_ndvi(0.2), PhenologyStage::EarlyGreenup);
        assert_eq!(PhenologyStage::from_ndvi(0.59), PhenologyStage::Greenup);
        assert_eq!(PhenologyStage::from_ndvi(0.6), PhenologyStage::PeakGreen);
        assert_eq!(PhenologyStage::from_ndvi(0.8), PhenologyStage::Blooming);
        assert_eq!(PhenologyStage::from_ndvi(0.85), PhenologyStage::Mature);
        assert_eq!(PhenologyStage::EarlyGreenup.to_string(), "early_greenup");
    }

    #[test]
    fn confidence_labels_are_ordered() {
        assert_eq!(ConfidenceLabel::from_score(0.95), ConfidenceLabel::VeryHigh);
        assert_eq!(ConfidenceLabel::from_score(0.7), ConfidenceLabel::High);
        assert_eq!(ConfidenceLabel::from_score(0.5), ConfidenceLabel::Medium);
        assert_eq!(ConfidenceLabel::from_score(0.3), ConfidenceLabel::Low);
        assert_eq!(ConfidenceLabel::from_score(0.1), ConfidenceLabel::VeryLow);
        assert!(ConfidenceLabel::High > ConfidenceLabel::Low);
        assert_eq!(
            serde_json::to_string(&ConfidenceLabel::VeryHigh).unwrap(),
            "\"very_high\""
        );
    }
}
