//! Bloom onset detection.
//!
//! Finds the first rapid rise in NDVI. Two threshold rules are available:
//! an adaptive one scaled by the spread of the first differences, and a
//! fixed absolute step between consecutive samples.

use crate::core::TimeSeries;
use crate::error::{PhenologyError, Result};
use crate::utils::stats;
use chrono::{Duration, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};

/// Minimum number of samples needed to attempt detection.
pub const MIN_ONSET_SAMPLES: usize = 3;

/// Rule used to decide which NDVI step counts as an onset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum OnsetStrategy {
    /// Step must exceed `multiplier` times the population standard
    /// deviation of all first differences.
    AdaptiveStdDev { multiplier: f64 },
    /// Step must exceed a fixed absolute NDVI increase.
    FixedDelta { threshold: f64 },
}

impl Default for OnsetStrategy {
    fn default() -> Self {
        OnsetStrategy::AdaptiveStdDev { multiplier: 1.5 }
    }
}

/// Configuration for onset detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnsetConfig {
    pub strategy: OnsetStrategy,
    /// Confidence is `min(step * confidence_gain, 1)`.
    pub confidence_gain: f64,
}

impl Default for OnsetConfig {
    fn default() -> Self {
        Self {
            strategy: OnsetStrategy::default(),
            confidence_gain: 10.0,
        }
    }
}

impl OnsetConfig {
    /// Adaptive threshold at `multiplier` standard deviations (default 1.5).
    pub fn adaptive(multiplier: f64) -> Self {
        Self {
            strategy: OnsetStrategy::AdaptiveStdDev { multiplier },
            ..Self::default()
        }
    }

    /// Fixed absolute step threshold (default 0.15).
    pub fn fixed_delta(threshold: f64) -> Self {
        Self {
            strategy: OnsetStrategy::FixedDelta { threshold },
            ..Self::default()
        }
    }

    /// Scale applied to the qualifying step to get a confidence.
    pub fn confidence_gain(mut self, gain: f64) -> Self {
        self.confidence_gain = gain;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let value = match self.strategy {
            OnsetStrategy::AdaptiveStdDev { multiplier } => multiplier,
            OnsetStrategy::FixedDelta { threshold } => threshold,
        };
        if !value.is_finite() || value < 0.0 {
            return Err(PhenologyError::InvalidParameter(format!(
                "onset threshold must be a non-negative number, got {}",
                value
            )));
        }
        if !(self.confidence_gain.is_finite() && self.confidence_gain > 0.0) {
            return Err(PhenologyError::InvalidParameter(
                "confidence gain must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A detected bloom: onset of the rise and the season's NDVI peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloomEvent {
    pub onset_date: NaiveDate,
    pub onset_ndvi: f64,
    pub peak_date: NaiveDate,
    pub peak_ndvi: f64,
    /// In [0, 1].
    pub confidence: f64,
}

impl BloomEvent {
    /// Window in which peak bloom is expected: 7 to 14 days after onset.
    pub fn expected_peak_window(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.onset_date.checked_add_signed(Duration::days(7))?;
        let end = self.onset_date.checked_add_signed(Duration::days(14))?;
        Some((start, end))
    }
}

/// Threshold a first difference must exceed under `strategy`.
pub fn onset_threshold(differences: &[f64], strategy: OnsetStrategy) -> f64 {
    match strategy {
        OnsetStrategy::AdaptiveStdDev { multiplier } => {
            multiplier * stats::population_std_dev(differences)
        }
        OnsetStrategy::FixedDelta { threshold } => threshold,
    }
}

/// Every series index `i` whose step `ndvi[i] - ndvi[i-1]` exceeds the threshold.
pub fn onset_candidates(series: &TimeSeries, config: &OnsetConfig) -> Result<Vec<usize>> {
    config.validate()?;
    if series.len() < MIN_ONSET_SAMPLES {
        return Err(PhenologyError::InsufficientData {
            needed: MIN_ONSET_SAMPLES,
            got: series.len(),
        });
    }

    let differences = series.ndvi_differences();
    let threshold = onset_threshold(&differences, config.strategy);
    debug!("onset threshold {:.4} ({:?})", threshold, config.strategy);

    Ok(differences
        .iter()
        .enumerate()
        .filter(|(_, &d)| d > threshold)
        .map(|(k, _)| k + 1)
        .collect())
}

/// Detect the first bloom onset in a normalized series.
///
/// Returns `Ok(None)` when no step exceeds the threshold; a perfectly flat
/// series never qualifies. The peak is the global NDVI maximum of the whole
/// series, wherever it lies relative to the onset.
///
/// # Example
///
/// ```
/// use bloomwatch::core::{Sample, TimeSeries};
/// use bloomwatch::detection::{detect_bloom, OnsetConfig};
/// use chrono::{Duration, NaiveDate};
///
/// let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let samples = [0.2, 0.2, 0.2, 0.8, 0.8]
///     .iter()
///     .enumerate()
///     .map(|(i, &v)| Sample::from_ndvi(start + Duration::days(8 * i as i64), v))
///     .collect();
/// let series = TimeSeries::new(samples).unwrap();
///
/// let event = detect_bloom(&series, &OnsetConfig::default()).unwrap().unwrap();
/// assert_eq!(event.onset_date, start + Duration::days(24));
/// assert_eq!(event.peak_ndvi, 0.8);
/// ```
pub fn detect_bloom(series: &TimeSeries, config: &OnsetConfig) -> Result<Option<BloomEvent>> {
    let candidates = onset_candidates(series, config)?;

    let Some(&onset_idx) = candidates.first() else {
        debug!("no onset above threshold in {} samples", series.len());
        return Ok(None);
    };

    let samples = series.samples();
    let step = samples[onset_idx].ndvi - samples[onset_idx - 1].ndvi;
    let peak = series
        .peak_index()
        .map(|i| &samples[i])
        .unwrap_or(&samples[onset_idx]);

    let event = BloomEvent {
        onset_date: samples[onset_idx].date,
        onset_ndvi: samples[onset_idx].ndvi,
        peak_date: peak.date,
        peak_ndvi: peak.ndvi,
        confidence: (step * config.confidence_gain).clamp(0.0, 1.0),
    };
    debug!(
        "bloom onset {} (ndvi {:.3}), peak {} (ndvi {:.3})",
        event.onset_date, event.onset_ndvi, event.peak_date, event.peak_ndvi
    );

    Ok(Some(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Sample;
    use approx::assert_relative_eq;

    fn base() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn make_series(values: &[f64]) -> TimeSeries {
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample::from_ndvi(base() + Duration::days(8 * i as i64), v))
            .collect();
        TimeSeries::new(samples).unwrap()
    }

    #[test]
    fn isolated_jump_is_reported_at_jump_index() {
        let ts = make_series(&[0.2, 0.2, 0.2, 0.8, 0.8]);
        let event = detect_bloom(&ts, &OnsetConfig::default()).unwrap().unwrap();

        assert_eq!(event.onset_date, base() + Duration::days(24));
        assert_relative_eq!(event.onset_ndvi, 0.8, epsilon = 1e-12);
        assert_relative_eq!(event.peak_ndvi, 0.8, epsilon = 1e-12);
        assert_eq!(event.peak_date, event.onset_date);
        assert_relative_eq!(event.confidence, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn flat_series_never_blooms() {
        let ts = make_series(&[0.45; 12]);
        assert!(detect_bloom(&ts, &OnsetConfig::default()).unwrap().is_none());
        assert!(detect_bloom(&ts, &OnsetConfig::fixed_delta(0.15))
            .unwrap()
            .is_none());
    }

    #[test]
    fn peak_search_is_not_limited_to_after_onset() {
        // Global maximum precedes the first qualifying rise.
        let ts = make_series(&[0.9, 0.3, 0.3, 0.3, 0.32, 0.6, 0.6]);
        let event = detect_bloom(&ts, &OnsetConfig::fixed_delta(0.15))
            .unwrap()
            .unwrap();
        assert_eq!(event.onset_date, base() + Duration::days(40));
        assert_eq!(event.peak_date, base());
        assert_relative_eq!(event.peak_ndvi, 0.9, epsilon = 1e-12);
    }

    #[test]
    fn confidence_scales_with_step_size() {
        let ts = make_series(&[0.30, 0.30, 0.34, 0.34, 0.34]);
        let event = detect_bloom(&ts, &OnsetConfig::fixed_delta(0.01))
            .unwrap()
            .unwrap();
        assert_relative_eq!(event.confidence, 0.4, epsilon = 1e-9);
    }

    #[test]
    fn strategies_can_disagree() {
        // A small bump stands out against an otherwise quiet series.
        let ts = make_series(&[0.5, 0.5, 0.5, 0.52, 0.5, 0.5]);
        let event = detect_bloom(&ts, &OnsetConfig::adaptive(1.5))
            .unwrap()
            .unwrap();
        assert_eq!(event.onset_date, base() + Duration::days(24));
        assert!(detect_bloom(&ts, &OnsetConfig::fixed_delta(0.15))
            .unwrap()
            .is_none());
    }

    #[test]
    fn fixed_delta_lists_every_candidate() {
        let ts = make_series(&[0.1, 0.3, 0.3, 0.5, 0.4, 0.7]);
        let candidates = onset_candidates(&ts, &OnsetConfig::fixed_delta(0.15)).unwrap();
        assert_eq!(candidates, vec![1, 3, 5]);
    }

    #[test]
    fn short_series_are_insufficient() {
        let ts = make_series(&[0.2, 0.8]);
        assert!(matches!(
            detect_bloom(&ts, &OnsetConfig::default()),
            Err(PhenologyError::InsufficientData { needed: 3, got: 2 })
        ));
    }

    #[test]
    fn expected_peak_window_follows_onset() {
        let ts = make_series(&[0.2, 0.2, 0.2, 0.8, 0.8]);
        let event = detect_bloom(&ts, &OnsetConfig::default()).unwrap().unwrap();
        let (start, end) = event.expected_peak_window().unwrap();
        assert_eq!(start, event.onset_date + Duration::days(7));
        assert_eq!(end, event.onset_date + Duration::days(14));
    }

    #[test]
    fn negative_threshold_is_invalid() {
        assert!(OnsetConfig::fixed_delta(-0.1).validate().is_err());
        assert!(OnsetConfig::adaptive(f64::NAN).validate().is_err());
        assert!(OnsetConfig::default().validate().is_ok());
    }
}
