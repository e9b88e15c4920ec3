//! Mean and standard deviation baseline predictor.
//!
//! Forecasts the historical mean day-of-year, with a window of one
//! population standard deviation either side.

use crate::core::{days_of_year, HistoricalRecord};
use crate::error::{PhenologyError, Result};
use crate::models::prediction::round_days;
use crate::models::{
    BloomPredictor, ConfidenceLevel, Prediction, PredictionConfig, PredictionStrategy,
};
use crate::utils::stats;

/// Baseline predictor from the mean and spread of past peak days.
#[derive(Debug, Clone)]
pub struct MeanStdPredictor {
    config: PredictionConfig,
    mean: Option<f64>,
    /// `None` when a single record leaves the spread undefined.
    std: Option<f64>,
}

impl MeanStdPredictor {
    pub fn new(config: PredictionConfig) -> Self {
        Self {
            config,
            mean: None,
            std: None,
        }
    }

    /// Fitted mean day-of-year.
    pub fn mean(&self) -> Option<f64> {
        self.mean
    }

    /// Fitted population standard deviation, if defined.
    pub fn std_dev(&self) -> Option<f64> {
        self.std
    }
}

impl Default for MeanStdPredictor {
    fn default() -> Self {
        Self::new(PredictionConfig::default())
    }
}

impl BloomPredictor for MeanStdPredictor {
    fn fit(&mut self, records: &[HistoricalRecord]) -> Result<()> {
        let needed = self.config.min_history.max(1);
        if records.len() < needed {
            return Err(PhenologyError::InsufficientHistory {
                needed,
                got: records.len(),
            });
        }

        let days = days_of_year(records);
        self.mean = Some(stats::mean(&days));
        self.std = (days.len() > 1).then(|| stats::population_std_dev(&days));
        Ok(())
    }

    fn predict(&self, target_year: i32) -> Result<Prediction> {
        let mean = self.mean.ok_or(PhenologyError::FitRequired)?;

        let (variability_days, spread) = match self.std {
            Some(std) => (round_days(std), std),
            None => {
                let fallback = self.config.default_variability_days;
                (fallback, f64::from(fallback))
            }
        };

        Prediction::from_day_of_year(
            target_year,
            mean.round() as i64,
            variability_days,
            ConfidenceLevel::from_spread_days(spread, &self.config),
            PredictionStrategy::MeanStd,
        )
    }

    fn name(&self) -> &str {
        "MeanStd"
    }

    fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }
}
