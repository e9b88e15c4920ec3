//! Phenology metrics: season markers, season bounds and stage labels.

mod metrics;
mod season;
mod stage;

pub use metrics::{compute_metrics, MetricsConfig, PhenologyMetrics, SeasonRule, MIN_METRIC_SAMPLES};
pub use season::{season_bounds, SeasonBounds, DEFAULT_SEASON_LEVEL};
pub use stage::{ConfidenceLabel, PhenologyStage};
