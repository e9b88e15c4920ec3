//! Engine facade tying the analytics together.
//!
//! [`PhenologyEngine`] holds one validated [`EngineConfig`] and exposes
//! every operation with that configuration applied, plus [`analyze`],
//! which runs the whole per-point pipeline.
//!
//! [`analyze`]: PhenologyEngine::analyze

use crate::config::EngineConfig;
use crate::core::{days_of_year, DateRange, HistoricalRecord, Sample, SeriesSummary, TimeSeries};
use crate::detection::{
    detect_anomaly, detect_bloom, outlier_dates, AnomalyResult, BloomEvent, MIN_HISTORY_POINTS,
};
use crate::error::{PhenologyError, Result};
use crate::grid::GridScanner;
use crate::models::{predict_bloom, Prediction, PredictionStrategy};
use crate::phenology::{
    compute_metrics, season_bounds, PhenologyMetrics, PhenologyStage, SeasonBounds,
};
use crate::source::{HistorySource, SampleSource};
use crate::transform::normalize;
use crate::utils::GeoPoint;
use chrono::{Datelike, NaiveDate};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Everything derived from one season at one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonReport {
    pub summary: SeriesSummary,
    pub interpolated_samples: usize,
    /// `None` when no onset qualified.
    pub bloom: Option<BloomEvent>,
    pub metrics: PhenologyMetrics,
    /// `None` when no sample reaches the season level.
    pub season: Option<SeasonBounds>,
    /// Stage implied by the most recent sample.
    pub current_stage: PhenologyStage,
    /// `None` without enough history.
    pub anomaly: Option<AnomalyResult>,
    /// `None` without enough history.
    pub prediction: Option<Prediction>,
    /// Dates of samples flagged by outlier screening.
    pub outliers: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct PhenologyEngine {
    config: EngineConfig,
}

impl PhenologyEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn normalize(&self, raw: &[Sample]) -> Result<TimeSeries> {
        normalize(raw, &self.config.normalize)
    }

    pub fn detect_bloom(&self, series: &TimeSeries) -> Result<Option<BloomEvent>> {
        detect_bloom(series, &self.config.onset)
    }

    pub fn compute_metrics(&self, series: &TimeSeries) -> Result<PhenologyMetrics> {
        compute_metrics(series, &self.config.metrics)
    }

    pub fn detect_anomaly(
        &self,
        current_day_of_year: f64,
        historical_days: &[f64],
    ) -> Result<AnomalyResult> {
        detect_anomaly(current_day_of_year, historical_days, &self.config.anomaly)
    }

    pub fn predict_bloom(
        &self,
        records: &[HistoricalRecord],
        target_year: i32,
    ) -> Result<Option<Prediction>> {
        predict_bloom(records, target_year, &self.config.prediction)
    }

    /// Predict with an explicit strategy, overriding the configured one.
    pub fn predict_bloom_with(
        &self,
        records: &[HistoricalRecord],
        target_year: i32,
        strategy: PredictionStrategy,
    ) -> Result<Option<Prediction>> {
        predict_bloom(records, target_year, &self.config.prediction.strategy(strategy))
    }

    /// A grid scanner over `source` sharing this engine's configuration.
    pub fn scanner<S: SampleSource>(&self, source: S) -> GridScanner<S> {
        GridScanner::new(source)
            .config(self.config.scan)
            .normalize_config(self.config.normalize)
            .onset_config(self.config.onset)
    }

    /// Run the full pipeline over one point's raw samples.
    ///
    /// Fails when the normalized series is too short for metrics. Missing
    /// or insufficient history is not an error: anomaly and prediction are
    /// simply absent.
    pub fn analyze(
        &self,
        raw: &[Sample],
        history: &[HistoricalRecord],
        target_year: i32,
    ) -> Result<SeasonReport> {
        let series = self.normalize(raw)?;
        let summary = series.summary().ok_or(PhenologyError::InsufficientData {
            needed: 1,
            got: 0,
        })?;

        let metrics = self.compute_metrics(&series)?;
        let bloom = self.detect_bloom(&series)?;
        let season = season_bounds(&series, self.config.season_level);
        let current_stage = series
            .last()
            .map_or(PhenologyStage::Dormant, |s| PhenologyStage::from_ndvi(s.ndvi));

        let anomaly = if history.len() >= MIN_HISTORY_POINTS {
            let peak_day = f64::from(metrics.peak_date.ordinal());
            Some(self.detect_anomaly(peak_day, &days_of_year(history))?)
        } else {
            debug!("{} historical records; skipping anomaly test", history.len());
            None
        };

        let prediction = match self.predict_bloom(history, target_year) {
            Ok(prediction) => prediction,
            Err(PhenologyError::InsufficientHistory { needed, got }) => {
                debug!("prediction needs {} records, have {}", needed, got);
                None
            }
            Err(e) => return Err(e),
        };

        Ok(SeasonReport {
            summary,
            interpolated_samples: series.interpolated_count(),
            bloom,
            metrics,
            season,
            current_stage,
            anomaly,
            prediction,
            outliers: outlier_dates(&series, &self.config.outliers),
        })
    }

    /// Fetch a point's samples and history from collaborators, then [`analyze`](Self::analyze).
    pub async fn analyze_point<S, H>(
        &self,
        samples: &S,
        history: &H,
        point: GeoPoint,
        range: DateRange,
        years_back: u32,
    ) -> Result<SeasonReport>
    where
        S: SampleSource,
        H: HistorySource,
    {
        let target_year = range.end().year();
        let raw = samples.fetch_samples(point, range).await?;
        let records = history.fetch_history(point, target_year, years_back).await?;
        info!(
            "analyzing ({}, {}): {} samples, {} historical records",
            point.lat,
            point.lon,
            raw.len(),
            records.len()
        );
        self.analyze(&raw, &records, target_year)
    }
}
