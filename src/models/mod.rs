//! Bloom-date prediction models.

mod traits;

pub mod mean_std;
pub mod prediction;
pub mod trend;

pub use mean_std::MeanStdPredictor;
pub use prediction::{
    predict_bloom, ConfidenceLevel, Prediction, PredictionConfig, PredictionStrategy,
};
pub use traits::{BloomPredictor, BoxedPredictor};
pub use trend::{LinearTrendPredictor, MIN_TREND_RECORDS};
