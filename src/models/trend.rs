//! Linear trend predictor.
//!
//! Fits `day_of_year = slope * index + intercept` over the records sorted
//! by year (index 0, 1, 2, ...) and extrapolates one index ahead. The
//! window is `trend_z` population standard deviations of the observed days,
//! a fixed-width approximation rather than a regression confidence band.
//! Extrapolations past either end of the year clamp to its first or last day.

use crate::core::{days_in_year, days_of_year, HistoricalRecord};
use crate::error::{PhenologyError, Result};
use crate::models::prediction::round_days;
use crate::models::{
    BloomPredictor, ConfidenceLevel, Prediction, PredictionConfig, PredictionStrategy,
};
use crate::utils::stats::{self, LinearFit};
use log::debug;

/// Minimum records for a trend fit.
pub const MIN_TREND_RECORDS: usize = 3;

#[derive(Debug, Clone)]
pub struct LinearTrendPredictor {
    config: PredictionConfig,
    fit: Option<LinearFit>,
    n: usize,
    std: f64,
}

impl LinearTrendPredictor {
    pub fn new(config: PredictionConfig) -> Self {
        Self {
            config,
            fit: None,
            n: 0,
            std: 0.0,
        }
    }

    /// Fitted trend line, if any.
    pub fn trend(&self) -> Option<&LinearFit> {
        self.fit.as_ref()
    }
}

impl Default for LinearTrendPredictor {
    fn default() -> Self {
        Self::new(PredictionConfig::default())
    }
}

impl BloomPredictor for LinearTrendPredictor {
    fn fit(&mut self, records: &[HistoricalRecord]) -> Result<()> {
        let needed = MIN_TREND_RECORDS.max(self.config.min_history);
        if records.len() < needed {
            return Err(PhenologyError::InsufficientHistory {
                needed,
                got: records.len(),
            });
        }

        let mut sorted = records.to_vec();
        sorted.sort_by_key(|r| r.year);
        let days = days_of_year(&sorted);

        let fit = stats::linear_fit(&days).ok_or(PhenologyError::InsufficientHistory {
            needed,
            got: days.len(),
        })?;

        self.std = stats::population_std_dev(&days);
        self.n = days.len();
        self.fit = Some(fit);
        Ok(())
    }

    fn predict(&self, target_year: i32) -> Result<Prediction> {
        let fit = self.fit.as_ref().ok_or(PhenologyError::FitRequired)?;
        let predicted = fit.at(self.n as f64);
        if !predicted.is_finite() {
            return Err(PhenologyError::InvalidParameter(
                "trend extrapolation is not finite".to_string(),
            ));
        }

        let last_day = i64::from(days_in_year(target_year));
        let rounded = predicted.round() as i64;
        let day_of_year = rounded.clamp(1, last_day);
        if day_of_year != rounded {
            debug!(
                "trend extrapolates to day {:.1}; clamped to {} of {}",
                predicted, day_of_year, target_year
            );
        }

        Prediction::from_day_of_year(
            target_year,
            day_of_year,
            round_days(self.config.trend_z * self.std),
            ConfidenceLevel::from_spread_days(self.std, &self.config),
            PredictionStrategy::LinearTrend,
        )
    }

    fn name(&self) -> &str {
        "LinearTrend"
    }

    fn is_fitted(&self) -> bool {
        self.fit.is_some()
    }
}
