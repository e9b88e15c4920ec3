//! Prediction value type, strategy selection and the `predict_bloom` entry point.

use crate::core::{date_from_day_of_year, offset_days, HistoricalRecord};
use crate::error::{PhenologyError, Result};
use crate::models::{BoxedPredictor, LinearTrendPredictor, MeanStdPredictor};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// How a bloom date is forecast from history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStrategy {
    /// Historical mean day-of-year, window of one standard deviation.
    #[default]
    MeanStd,
    /// Least-squares trend over the year index, window of `trend_z` standard deviations.
    LinearTrend,
}

/// Qualitative confidence of a prediction window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// Bucket a historical spread given in days.
    pub fn from_spread_days(std_days: f64, config: &PredictionConfig) -> Self {
        if std_days < config.high_confidence_days {
            ConfidenceLevel::High
        } else if std_days < config.medium_confidence_days {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Configuration for bloom-date prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub strategy: PredictionStrategy,
    /// Fewest records the mean/std strategy accepts.
    pub min_history: usize,
    /// Window half-width used when a single record leaves the spread undefined.
    pub default_variability_days: u32,
    /// Spread below this many days is high confidence.
    pub high_confidence_days: f64,
    /// Spread below this many days is medium confidence.
    pub medium_confidence_days: f64,
    /// Multiplier on the spread for the trend window.
    pub trend_z: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            strategy: PredictionStrategy::MeanStd,
            min_history: 2,
            default_variability_days: 7,
            high_confidence_days: 7.0,
            medium_confidence_days: 14.0,
            trend_z: 1.96,
        }
    }
}

impl PredictionConfig {
    /// Select the forecasting model.
    pub fn strategy(mut self, strategy: PredictionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Fewest records accepted before predicting.
    pub fn min_history(mut self, min_history: usize) -> Self {
        self.min_history = min_history;
        self
    }

    /// Window half-width when a single record gives no spread.
    pub fn default_variability_days(mut self, days: u32) -> Self {
        self.default_variability_days = days;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_history == 0 {
            return Err(PhenologyError::InvalidParameter(
                "min_history must be at least 1".to_string(),
            ));
        }
        if !(self.high_confidence_days > 0.0
            && self.medium_confidence_days >= self.high_confidence_days)
        {
            return Err(PhenologyError::InvalidParameter(format!(
                "confidence limits must satisfy 0 < high ({}) <= medium ({})",
                self.high_confidence_days, self.medium_confidence_days
            )));
        }
        if !(self.trend_z.is_finite() && self.trend_z > 0.0) {
            return Err(PhenologyError::InvalidParameter(
                "trend_z must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the predictor selected by `strategy`.
    pub fn build(&self) -> BoxedPredictor {
        match self.strategy {
            PredictionStrategy::MeanStd => Box::new(MeanStdPredictor::new(*self)),
            PredictionStrategy::LinearTrend => Box::new(LinearTrendPredictor::new(*self)),
        }
    }
}

/// A forecast bloom date with its uncertainty window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_date: NaiveDate,
    /// Rounded day-of-year the date was derived from.
    pub predicted_day_of_year: i64,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub variability_days: u32,
    pub confidence_level: ConfidenceLevel,
    pub strategy: PredictionStrategy,
}

impl Prediction {
    /// Place a rounded day-of-year in `year` and open a symmetric window.
    pub(crate) fn from_day_of_year(
        year: i32,
        day_of_year: i64,
        variability_days: u32,
        confidence_level: ConfidenceLevel,
        strategy: PredictionStrategy,
    ) -> Result<Self> {
        let predicted_date = date_from_day_of_year(year, day_of_year)?;
        let half = i64::from(variability_days);
        Ok(Self {
            predicted_date,
            predicted_day_of_year: day_of_year,
            window_start: offset_days(predicted_date, -half)?,
            window_end: offset_days(predicted_date, half)?,
            variability_days,
            confidence_level,
            strategy,
        })
    }

    /// Number of days covered by the window, inclusive.
    pub fn window_days(&self) -> i64 {
        (self.window_end - self.window_start).num_days() + 1
    }
}

/// Predict the bloom date of `target_year` from historical records.
///
/// Returns `Ok(None)` when no records are supplied at all. Too few records
/// for the selected strategy is an `InsufficientHistory` error.
///
/// # Example
///
/// ```
/// use bloomwatch::core::HistoricalRecord;
/// use bloomwatch::models::{predict_bloom, ConfidenceLevel, PredictionConfig};
///
/// let records: Vec<HistoricalRecord> = [100, 105, 95, 110, 90]
///     .iter()
///     .zip(2019..)
///     .map(|(&doy, year)| HistoricalRecord::new(year, doy, 0.7).unwrap())
///     .collect();
///
/// let prediction = predict_bloom(&records, 2024, &PredictionConfig::default())
///     .unwrap()
///     .unwrap();
/// assert_eq!(prediction.predicted_day_of_year, 100);
/// assert_eq!(prediction.confidence_level, ConfidenceLevel::Medium);
/// ```
pub fn predict_bloom(
    records: &[HistoricalRecord],
    target_year: i32,
    config: &PredictionConfig,
) -> Result<Option<Prediction>> {
    config.validate()?;
    if records.is_empty() {
        debug!("no historical records; skipping prediction");
        return Ok(None);
    }

    let mut model = config.build();
    model.fit(records)?;
    let prediction = model.predict(target_year)?;
    debug!(
        "{} predicts {} (±{} days, {:?})",
        model.name(),
        prediction.predicted_date,
        prediction.variability_days,
        prediction.confidence_level
    );
    Ok(Some(prediction))
}

/// Round a non-negative day count into `u32`.
pub(crate) fn round_days(days: f64) -> u32 {
    if days.is_finite() && days > 0.0 {
        days.round().min(u32::MAX as f64) as u32
    } else {
        0
    }
}
