//! Predictor trait defining the common interface for bloom-date models.

use crate::core::HistoricalRecord;
use crate::error::Result;
use crate::models::Prediction;

/// Common interface for bloom-date predictors.
///
/// This trait is object-safe and can be used with `Box<dyn BloomPredictor>`.
pub trait BloomPredictor {
    /// Fit the model to historical peak records.
    fn fit(&mut self, records: &[HistoricalRecord]) -> Result<()>;

    /// Predict the bloom date for `target_year`.
    fn predict(&self, target_year: i32) -> Result<Prediction>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool;
}

/// Type alias for boxed predictor trait objects.
///
/// # Example
///
/// ```
/// use bloomwatch::models::{BoxedPredictor, MeanStdPredictor, PredictionConfig};
///
/// let model: BoxedPredictor = Box::new(MeanStdPredictor::new(PredictionConfig::default()));
/// assert_eq!(model.name(), "MeanStd");
/// assert!(!model.is_fitted());
/// ```
pub type BoxedPredictor = Box<dyn BloomPredictor + Send + Sync>;
