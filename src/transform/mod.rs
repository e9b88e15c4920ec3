//! Series preparation: normalization and smoothing.
//!
//! # Example
//!
//! ```
//! use bloomwatch::core::Sample;
//! use bloomwatch::transform::{normalize, NormalizeConfig};
//! use chrono::NaiveDate;
//!
//! let raw = vec![
//!     Sample::from_ndvi(NaiveDate::from_ymd_opt(2024, 4, 10).unwrap(), 0.7),
//!     Sample::from_ndvi(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 0.2),
//! ];
//!
//! let series = normalize(&raw, &NormalizeConfig::default()).unwrap();
//! assert_eq!(series.len(), 6);
//! assert_eq!(series.interpolated_count(), 4);
//! ```

pub mod normalize;
pub mod window;

pub use normalize::{normalize, NormalizeConfig, INTERPOLATED_SOURCE};
pub use window::{moving_average, smooth_series};
