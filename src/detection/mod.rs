//! Event and anomaly detection over vegetation-index series.
//!
//! This module provides tools for detecting:
//! - Bloom onset (adaptive or fixed-step thresholds)
//! - Peak-timing anomalies against a historical baseline
//! - Outlying samples

mod anomaly;
mod onset;
mod outlier;

pub use anomaly::{
    detect_anomaly, AnomalyConfig, AnomalyResult, Interpretation, MIN_HISTORY_POINTS,
};
pub use onset::{
    detect_bloom, onset_candidates, onset_threshold, BloomEvent, OnsetConfig, OnsetStrategy,
    MIN_ONSET_SAMPLES,
};
pub use outlier::{detect_outliers, outlier_dates, OutlierConfig, OutlierMethod, OutlierResult};
