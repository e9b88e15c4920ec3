//! # bloomwatch
//!
//! Vegetation phenology analytics over satellite NDVI time series.
//!
//! Raw samples are normalized into a gap-filled [`TimeSeries`](core::TimeSeries),
//! then analyzed for bloom onset, seasonal metrics, timing anomalies against
//! prior years and next-season predictions. A concurrent grid scanner applies
//! the same pipeline over a bounding box.
//!
//! ```
//! use bloomwatch::prelude::*;
//! use chrono::{Duration, NaiveDate};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let raw: Vec<Sample> = [0.2, 0.2, 0.25, 0.6, 0.75, 0.7, 0.4]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &v)| Sample::from_ndvi(start + Duration::days(8 * i as i64), v))
//!     .collect();
//!
//! let engine = PhenologyEngine::default();
//! let report = engine.analyze(&raw, &[], 2024).unwrap();
//! assert!(report.bloom.is_some());
//! assert_eq!(report.metrics.peak_date, start + Duration::days(32));
//! ```

pub mod config;
pub mod core;
pub mod detection;
pub mod engine;
pub mod error;
pub mod grid;
pub mod models;
pub mod phenology;
pub mod source;
pub mod transform;
pub mod utils;

pub use error::{PhenologyError, Result};

pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::core::{DateRange, HistoricalRecord, Sample, TimeSeries};
    pub use crate::detection::{detect_anomaly, detect_bloom, AnomalyResult, BloomEvent};
    pub use crate::engine::{PhenologyEngine, SeasonReport};
    pub use crate::error::{PhenologyError, Result};
    pub use crate::grid::{grid_points, BoundingBox, GridScanner, ScanReport};
    pub use crate::models::{predict_bloom, BloomPredictor, Prediction};
    pub use crate::phenology::{compute_metrics, PhenologyMetrics};
    pub use crate::source::{HistorySource, SampleSource};
    pub use crate::transform::normalize;
    pub use crate::utils::GeoPoint;
}
