//! Outlier screening for vegetation-index values.
//!
//! Flags samples that sit far from the bulk of a series, typically cloud or
//! snow contamination that survived upstream quality masks.

use crate::core::TimeSeries;
use crate::utils::stats;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fewer values than this are never screened.
pub const MIN_SCREEN_VALUES: usize = 3;

/// 0.75 quantile of the standard normal, scales MAD to a standard deviation.
const MAD_SCALE: f64 = 0.6745;

/// Method for outlier screening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    /// Distance from the mean in population standard deviations.
    ZScore,
    /// Distance from the median in scaled median absolute deviations.
    ModifiedZScore,
}

/// Configuration for outlier screening.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    pub method: OutlierMethod,
    /// Scores strictly above this are outliers.
    pub threshold: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self::z_score(2.5)
    }
}

impl OutlierConfig {
    /// Z-score method with the given threshold (default 2.5).
    pub fn z_score(threshold: f64) -> Self {
        Self {
            method: OutlierMethod::ZScore,
            threshold,
        }
    }

    /// Modified z-score method with the given threshold (conventionally 3.5).
    pub fn modified_z_score(threshold: f64) -> Self {
        Self {
            method: OutlierMethod::ModifiedZScore,
            threshold,
        }
    }
}

/// Result of outlier screening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierResult {
    /// Indices of flagged values.
    pub outlier_indices: Vec<usize>,
    /// Absolute score per value.
    pub scores: Vec<f64>,
    pub threshold: f64,
    pub method: OutlierMethod,
}

impl OutlierResult {
    pub fn outlier_count(&self) -> usize {
        self.outlier_indices.len()
    }

    pub fn is_outlier(&self, index: usize) -> bool {
        self.outlier_indices.contains(&index)
    }

    pub fn outlier_percentage(&self) -> f64 {
        if self.scores.is_empty() {
            0.0
        } else {
            100.0 * self.outlier_indices.len() as f64 / self.scores.len() as f64
        }
    }
}

/// Screen a slice of values.
///
/// Fewer than three values, or values with no spread, yield no outliers.
pub fn detect_outliers(values: &[f64], config: &OutlierConfig) -> OutlierResult {
    let scores = match config.method {
        OutlierMethod::ZScore => z_scores(values),
        OutlierMethod::ModifiedZScore => modified_z_scores(values),
    };

    let outlier_indices = scores
        .iter()
        .enumerate()
        .filter(|(_, &score)| score > config.threshold)
        .map(|(i, _)| i)
        .collect();

    OutlierResult {
        outlier_indices,
        scores,
        threshold: config.threshold,
        method: config.method,
    }
}

/// Dates of the NDVI outliers in a series.
pub fn outlier_dates(series: &TimeSeries, config: &OutlierConfig) -> Vec<NaiveDate> {
    let result = detect_outliers(&series.ndvi_values(), config);
    result
        .outlier_indices
        .iter()
        .filter_map(|&i| series.get(i).map(|s| s.date))
        .collect()
}

fn z_scores(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < MIN_SCREEN_VALUES {
        return vec![0.0; n];
    }

    let mean = stats::mean(values);
    let std = stats::population_std_dev(values);
    if std < 1e-10 {
        return vec![0.0; n];
    }

    values.iter().map(|x| ((x - mean) / std).abs()).collect()
}

fn modified_z_scores(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < MIN_SCREEN_VALUES {
        return vec![0.0; n];
    }

    let median = stats::median(values);
    let deviations: Vec<f64> = values.iter().map(|x| (x - median).abs()).collect();
    let scaled_mad = stats::median(&deviations) / MAD_SCALE;

    if scaled_mad < 1e-10 {
        return vec![0.0; n];
    }

    values
        .iter()
        .map(|x| ((x - median) / scaled_mad).abs())
        .collect()
}
