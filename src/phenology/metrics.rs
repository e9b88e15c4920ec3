//! Start, peak and end of season markers.

use crate::core::TimeSeries;
use crate::error::{PhenologyError, Result};
use crate::utils::stats;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// Minimum number of samples for metrics.
pub const MIN_METRIC_SAMPLES: usize = 3;

/// How greenup and senescence are located.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SeasonRule {
    /// Greenup is the first sample above `level`; senescence is the first
    /// sample at or after the peak that drops below it.
    Threshold { level: f64 },
    /// Greenup is the steepest rise; senescence is the steepest decline
    /// after the peak.
    Derivative,
}

impl Default for SeasonRule {
    fn default() -> Self {
        SeasonRule::Threshold { level: 0.4 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub rule: SeasonRule,
}

impl MetricsConfig {
    pub fn threshold(level: f64) -> Self {
        Self {
            rule: SeasonRule::Threshold { level },
        }
    }

    pub fn derivative() -> Self {
        Self {
            rule: SeasonRule::Derivative,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let SeasonRule::Threshold { level } = self.rule {
            if !level.is_finite() {
                return Err(PhenologyError::InvalidParameter(
                    "season threshold must be finite".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Season markers and NDVI statistics for one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhenologyMetrics {
    pub greenup_date: NaiveDate,
    pub peak_date: NaiveDate,
    pub senescence_date: NaiveDate,
    pub max_ndvi: f64,
    pub min_ndvi: f64,
    pub mean_ndvi: f64,
    /// Always `max_ndvi - min_ndvi`.
    pub amplitude: f64,
    pub growing_season_length_days: u32,
    /// Senescence fell before greenup; the season length was clamped to 0.
    pub degenerate: bool,
}

/// Compute phenology metrics for a normalized series.
pub fn compute_metrics(series: &TimeSeries, config: &MetricsConfig) -> Result<PhenologyMetrics> {
    config.validate()?;
    if series.len() < MIN_METRIC_SAMPLES {
        return Err(PhenologyError::InsufficientData {
            needed: MIN_METRIC_SAMPLES,
            got: series.len(),
        });
    }

    let samples = series.samples();
    let values = series.ndvi_values();
    let last = samples.len() - 1;
    let peak_idx = series.peak_index().unwrap_or(0);

    let (greenup_idx, senescence_idx) = match config.rule {
        SeasonRule::Threshold { level } => {
            let greenup = values.iter().position(|&v| v > level).unwrap_or(0);
            let senescence = (peak_idx..values.len())
                .find(|&i| values[i] < level)
                .unwrap_or(last);
            (greenup, senescence)
        }
        SeasonRule::Derivative => {
            let diffs = series.ndvi_differences();
            // diffs[k] is the step into sample k + 1
            let greenup = extreme_index(&diffs, 0, |a, b| a > b).map_or(0, |k| k + 1);
            let senescence = extreme_index(&diffs, peak_idx, |a, b| a < b).map_or(last, |k| k + 1);
            (greenup, senescence)
        }
    };

    let greenup_date = samples[greenup_idx].date;
    let senescence_date = samples[senescence_idx].date;
    let span = (senescence_date - greenup_date).num_days();
    let degenerate = span < 0;
    if degenerate {
        debug!(
            "senescence {} precedes greenup {}; clamping season length",
            senescence_date, greenup_date
        );
    }

    let max_ndvi = values[peak_idx];
    let min_ndvi = values.iter().copied().fold(f64::INFINITY, f64::min);

    Ok(PhenologyMetrics {
        greenup_date,
        peak_date: samples[peak_idx].date,
        senescence_date,
        max_ndvi,
        min_ndvi,
        mean_ndvi: stats::mean(&values),
        amplitude: max_ndvi - min_ndvi,
        growing_season_length_days: u32::try_from(span.max(0)).unwrap_or(u32::MAX),
        degenerate,
    })
}

/// Index of the first extreme value in `values[from..]`, by `better`.
fn extreme_index(values: &[f64], from: usize, better: impl Fn(f64, f64) -> bool) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .skip(from)
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if !better(v, b) => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Sample;
    use approx::assert_relative_eq;
    use chrono::Duration;

    fn base() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn make_series(values: &[f64]) -> TimeSeries {
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample::from_ndvi(base() + Duration::days(8 * i as i64), v))
            .collect();
        TimeSeries::new(samples).unwrap()
    }

    fn day(i: i64) -> NaiveDate {
        base() + Duration::days(8 * i)
    }

    #[test]
    fn threshold_rule_brackets_the_season() {
        let ts = make_series(&[0.2, 0.3, 0.5, 0.7, 0.8, 0.6, 0.35, 0.2]);
        let m = compute_metrics(&ts, &MetricsConfig::default()).unwrap();

        assert_eq!(m.greenup_date, day(2));
        assert_eq!(m.peak_date, day(4));
        assert_eq!(m.senescence_date, day(6));
        assert_eq!(m.growing_season_length_days, 32);
        assert!(!m.degenerate);
        assert_relative_eq!(m.max_ndvi, 0.8, epsilon = 1e-12);
        assert_relative_eq!(m.min_ndvi, 0.2, epsilon = 1e-12);
        assert_relative_eq!(m.amplitude, 0.6, epsilon = 1e-12);
        assert_relative_eq!(m.mean_ndvi, 3.65 / 8.0, epsilon = 1e-12);
    }

    #[test]
    fn threshold_rule_defaults_when_never_crossed() {
        // Never above 0.4: greenup falls back to the first sample.
        let ts = make_series(&[0.1, 0.2, 0.3, 0.2]);
        let m = compute_metrics(&ts, &MetricsConfig::default()).unwrap();
        assert_eq!(m.greenup_date, day(0));
        assert_eq!(m.senescence_date, day(2));

        // Never drops back: senescence falls back to the last sample.
        let ts = make_series(&[0.2, 0.5, 0.7, 0.6]);
        let m = compute_metrics(&ts, &MetricsConfig::default()).unwrap();
        assert_eq!(m.senescence_date, day(3));
        assert_eq!(m.growing_season_length_days, 16);
    }

    #[test]
    fn derivative_rule_uses_steepest_steps() {
        let ts = make_series(&[0.2, 0.25, 0.6, 0.7, 0.8, 0.7, 0.3, 0.25]);
        let m = compute_metrics(&ts, &MetricsConfig::derivative()).unwrap();

        assert_eq!(m.greenup_date, day(2));
        assert_eq!(m.peak_date, day(4));
        assert_eq!(m.senescence_date, day(6));
        assert_eq!(m.growing_season_length_days, 32);
    }

    #[test]
    fn late_greenup_is_flagged_degenerate() {
        // Steepest rise comes after the peak and its decline.
        let ts = make_series(&[0.9, 0.4, 0.3, 0.6, 0.65]);
        let m = compute_metrics(&ts, &MetricsConfig::derivative()).unwrap();
        assert_eq!(m.peak_date, day(0));
        assert_eq!(m.senescence_date, day(1));
        assert_eq!(m.greenup_date, day(3));
        assert_eq!(m.growing_season_length_days, 0);
        assert!(m.degenerate);
    }

    #[test]
    fn metrics_need_three_samples() {
        let ts = make_series(&[0.3, 0.6]);
        assert!(matches!(
            compute_metrics(&ts, &MetricsConfig::default()),
            Err(PhenologyError::InsufficientData { needed: 3, got: 2 })
        ));
    }

    #[test]
    fn extreme_index_keeps_first_on_ties() {
        assert_eq!(extreme_index(&[1.0, 3.0, 3.0], 0, |a, b| a > b), Some(1));
        assert_eq!(extreme_index(&[1.0, 3.0, 0.5], 1, |a, b| a < b), Some(2));
        assert_eq!(extreme_index(&[1.0], 1, |a, b| a < b), None);
    }
}
