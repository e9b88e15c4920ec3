//! Historical baseline comparison of peak timing.

use crate::error::{PhenologyError, Result};
use crate::utils::stats;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Minimum number of historical points for a defined spread.
pub const MIN_HISTORY_POINTS: usize = 2;

/// Substituted for a zero standard deviation.
const ZERO_SPREAD_EPSILON: f64 = 1e-6;

/// Z-score thresholds for the anomaly buckets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// `|z|` above this is significant and counts as an anomaly.
    pub significant_z: f64,
    /// `|z|` above this (and not significant) is moderate.
    pub moderate_z: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            significant_z: 2.0,
            moderate_z: 1.0,
        }
    }
}

impl AnomalyConfig {
    /// `|z|` above which a timing is significant.
    pub fn significant_z(mut self, z: f64) -> Self {
        self.significant_z = z;
        self
    }

    /// `|z|` above which a timing is moderate.
    pub fn moderate_z(mut self, z: f64) -> Self {
        self.moderate_z = z;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.moderate_z > 0.0 && self.significant_z >= self.moderate_z) {
            return Err(PhenologyError::InvalidParameter(format!(
                "anomaly thresholds must satisfy 0 < moderate ({}) <= significant ({})",
                self.moderate_z, self.significant_z
            )));
        }
        Ok(())
    }
}

/// Reading of a z-score in calendar terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpretation {
    SignificantlyDelayed,
    ModeratelyDelayed,
    Normal,
    ModeratelyEarly,
    SignificantlyEarly,
}

impl Interpretation {
    pub fn from_z_score(z: f64, config: &AnomalyConfig) -> Self {
        let magnitude = z.abs();
        if magnitude > config.significant_z {
            if z > 0.0 {
                Interpretation::SignificantlyDelayed
            } else {
                Interpretation::SignificantlyEarly
            }
        } else if magnitude > config.moderate_z {
            if z > 0.0 {
                Interpretation::ModeratelyDelayed
            } else {
                Interpretation::ModeratelyEarly
            }
        } else {
            Interpretation::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Interpretation::SignificantlyDelayed => "significantly_delayed",
            Interpretation::ModeratelyDelayed => "moderately_delayed",
            Interpretation::Normal => "normal",
            Interpretation::ModeratelyEarly => "moderately_early",
            Interpretation::SignificantlyEarly => "significantly_early",
        }
    }
}

impl std::fmt::Display for Interpretation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of comparing a season's peak day against history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub z_score: f64,
    pub anomaly_detected: bool,
    /// Current peak day minus historical mean, rounded.
    pub days_difference: i64,
    pub interpretation: Interpretation,
    /// Two-sided tail probability of `|z|` under a standard normal.
    pub p_value: f64,
    pub historical_mean: f64,
    pub historical_std: f64,
}

/// Score `current_day_of_year` against historical peak days.
///
/// Uses the population standard deviation. A zero spread is replaced by a
/// tiny epsilon, so any departure from a constant history is extreme.
pub fn detect_anomaly(
    current_day_of_year: f64,
    historical_days: &[f64],
    config: &AnomalyConfig,
) -> Result<AnomalyResult> {
    config.validate()?;
    if historical_days.len() < MIN_HISTORY_POINTS {
        return Err(PhenologyError::InsufficientHistory {
            needed: MIN_HISTORY_POINTS,
            got: historical_days.len(),
        });
    }
    if !current_day_of_year.is_finite() || historical_days.iter().any(|d| !d.is_finite()) {
        return Err(PhenologyError::InvalidParameter(
            "day-of-year values must be finite".to_string(),
        ));
    }

    let mean = stats::mean(historical_days);
    let std = stats::population_std_dev(historical_days);
    let spread = if std > 0.0 { std } else { ZERO_SPREAD_EPSILON };

    let z_score = (current_day_of_year - mean) / spread;
    let interpretation = Interpretation::from_z_score(z_score, config);

    Ok(AnomalyResult {
        z_score,
        anomaly_detected: z_score.abs() > config.significant_z,
        days_difference: (current_day_of_year - mean).round() as i64,
        interpretation,
        p_value: two_sided_p_value(z_score),
        historical_mean: mean,
        historical_std: std,
    })
}

fn two_sided_p_value(z: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(standard) => (2.0 * (1.0 - standard.cdf(z.abs()))).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn late_peak_is_significantly_delayed() {
        let history = [100.0, 102.0, 98.0, 101.0, 99.0];
        let result = detect_anomaly(150.0, &history, &AnomalyConfig::default()).unwrap();

        assert!(result.z_score > 30.0);
        assert!(result.anomaly_detected);
        assert_eq!(result.days_difference, 50);
        assert_eq!(result.interpretation, Interpretation::SignificantlyDelayed);
        assert!(result.p_value < 1e-6);
        assert_relative_eq!(result.historical_mean, 100.0, epsilon = 1e-12);
        assert_relative_eq!(result.historical_std, 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn interpretation_buckets_are_symmetric() {
        let config = AnomalyConfig::default();
        assert_eq!(
            Interpretation::from_z_score(-2.5, &config),
            Interpretation::SignificantlyEarly
        );
        assert_eq!(
            Interpretation::from_z_score(1.5, &config),
            Interpretation::ModeratelyDelayed
        );
        assert_eq!(
            Interpretation::from_z_score(-2.0, &config),
            Interpretation::ModeratelyEarly
        );
        assert_eq!(Interpretation::from_z_score(1.0, &config), Interpretation::Normal);
        assert_eq!(Interpretation::from_z_score(0.0, &config), Interpretation::Normal);
    }

    #[test]
    fn on_schedule_peak_is_normal() {
        let history = [100.0, 102.0, 98.0, 101.0, 99.0];
        let result = detect_anomaly(100.0, &history, &AnomalyConfig::default()).unwrap();
        assert_relative_eq!(result.z_score, 0.0, epsilon = 1e-12);
        assert!(!result.anomaly_detected);
        assert_eq!(result.interpretation, Interpretation::Normal);
        assert_relative_eq!(result.p_value, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn constant_history_does_not_divide_by_zero() {
        let result = detect_anomaly(101.0, &[100.0, 100.0, 100.0], &AnomalyConfig::default())
            .unwrap();
        assert!(result.z_score.is_finite());
        assert!(result.anomaly_detected);

        let same = detect_anomaly(100.0, &[100.0, 100.0], &AnomalyConfig::default()).unwrap();
        assert_eq!(same.z_score, 0.0);
        assert_eq!(same.interpretation, Interpretation::Normal);
    }

    #[test]
    fn short_history_is_rejected() {
        assert!(matches!(
            detect_anomaly(120.0, &[100.0], &AnomalyConfig::default()),
            Err(PhenologyError::InsufficientHistory { needed: 2, got: 1 })
        ));
        assert!(detect_anomaly(120.0, &[], &AnomalyConfig::default()).is_err());
    }

    #[test]
    fn interpretation_serializes_snake_case() {
        let json = serde_json::to_string(&Interpretation::SignificantlyDelayed).unwrap();
        assert_eq!(json, "\"significantly_delayed\"");
        assert_eq!(Interpretation::ModeratelyEarly.to_string(), "moderately_early");
    }

    #[test]
    fn thresholds_must_be_ordered() {
        assert!(AnomalyConfig::default().moderate_z(3.0).validate().is_err());
        assert!(AnomalyConfig::default().moderate_z(0.0).validate().is_err());
        assert!(AnomalyConfig::default().significant_z(3.0).validate().is_ok());
    }
}
