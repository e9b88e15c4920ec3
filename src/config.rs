//! Engine-wide configuration.
//!
//! Every field has a default, so a JSON document only needs the settings
//! it changes:
//!
//! ```
//! use bloomwatch::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "scan": { "concurrency": 2 } }"#).unwrap();
//! assert_eq!(config.scan.concurrency, 2);
//! assert_eq!(config.normalize.max_gap_days, 16);
//! ```

use crate::detection::{AnomalyConfig, OnsetConfig, OutlierConfig};
use crate::error::{PhenologyError, Result};
use crate::grid::ScanConfig;
use crate::models::PredictionConfig;
use crate::phenology::{MetricsConfig, DEFAULT_SEASON_LEVEL};
use crate::transform::NormalizeConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub normalize: NormalizeConfig,
    pub onset: OnsetConfig,
    pub metrics: MetricsConfig,
    pub anomaly: AnomalyConfig,
    pub prediction: PredictionConfig,
    pub outliers: OutlierConfig,
    pub scan: ScanConfig,
    /// NDVI level for SOS/EOS extraction.
    pub season_level: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            normalize: NormalizeConfig::default(),
            onset: OnsetConfig::default(),
            metrics: MetricsConfig::default(),
            anomaly: AnomalyConfig::default(),
            prediction: PredictionConfig::default(),
            outliers: OutlierConfig::default(),
            scan: ScanConfig::default(),
            season_level: DEFAULT_SEASON_LEVEL,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PhenologyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PhenologyError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PhenologyError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.normalize.validate()?;
        self.onset.validate()?;
        self.metrics.validate()?;
        self.anomaly.validate()?;
        self.prediction.validate()?;
        self.scan.validate()?;
        if !(self.outliers.threshold.is_finite() && self.outliers.threshold > 0.0) {
            return Err(PhenologyError::InvalidParameter(
                "outlier threshold must be positive".to_string(),
            ));
        }
        if !self.season_level.is_finite() {
            return Err(PhenologyError::InvalidParameter(
                "season level must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::OnsetStrategy;
    use crate::models::PredictionStrategy;
    use crate::phenology::SeasonRule;

    #[test]
    fn empty_document_is_the_default() {
        assert_eq!(EngineConfig::from_json_str("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn nested_strategies_deserialize() {
        let json = r#"{
            "onset": { "strategy": { "strategy": "fixed_delta", "threshold": 0.2 } },
            "metrics": { "rule": { "rule": "derivative" } },
            "prediction": { "strategy": "linear_trend" },
            "scan": { "max_points": 100 }
        }"#;
        let config = EngineConfig::from_json_str(json).unwrap();

        assert_eq!(config.onset.strategy, OnsetStrategy::FixedDelta { threshold: 0.2 });
        assert_eq!(config.onset.confidence_gain, 10.0);
        assert_eq!(config.metrics.rule, SeasonRule::Derivative);
        assert_eq!(config.prediction.strategy, PredictionStrategy::LinearTrend);
        assert_eq!(config.prediction.min_history, 2);
        assert_eq!(config.scan.max_points, Some(100));
    }

    #[test]
    fn round_trips_through_json() {
        let config = EngineConfig::default();
        let json = config.to_json_string().unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn malformed_and_invalid_documents_are_rejected() {
        assert!(matches!(
            EngineConfig::from_json_str("{ not json"),
            Err(PhenologyError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "scan": { "concurrency": 0 } }"#),
            Err(PhenologyError::InvalidParameter(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_file("/nonexistent/bloomwatch.json"),
            Err(PhenologyError::Config(_))
        ));
    }
}
