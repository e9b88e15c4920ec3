//! Concurrent per-cell scanning of a region.
//!
//! Each grid point is an independent task: fetch a short recent window of
//! samples from the [`SampleSource`], normalize it, average its NDVI and
//! classify the cell. Fetches run concurrently up to a limit, each under
//! its own timeout. A cell that fails, times out or comes back empty is
//! skipped and recorded in the report; it never aborts the scan.

use crate::core::{DateRange, TimeSeries};
use crate::detection::{detect_bloom, OnsetConfig, MIN_ONSET_SAMPLES};
use crate::error::{PhenologyError, Result};
use crate::grid::{grid_iter, BoundingBox};
use crate::source::SampleSource;
use crate::transform::{normalize, NormalizeConfig};
use crate::utils::GeoPoint;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Vegetation status of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    Dormant,
    Vegetated,
    Blooming,
}

/// Classify a mean NDVI: above `blooming_ndvi` is blooming, above
/// `vegetated_ndvi` is vegetated, anything else dormant.
pub fn classify_ndvi(ndvi: f64, config: &ScanConfig) -> CellStatus {
    if ndvi > config.blooming_ndvi {
        CellStatus::Blooming
    } else if ndvi > config.vegetated_ndvi {
        CellStatus::Vegetated
    } else {
        CellStatus::Dormant
    }
}

/// One classified grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub lat: f64,
    pub lon: f64,
    /// Mean NDVI over the scan window.
    pub aggregate_ndvi: f64,
    pub status: CellStatus,
    pub sample_count: usize,
    /// Bloom onset inside the window, when one was detected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset_date: Option<NaiveDate>,
}

/// Why a cell produced no result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    Empty,
    TimedOut,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCell {
    pub lat: f64,
    pub lon: f64,
    pub reason: SkipReason,
}

/// Outcome of a scan. Cells are in grid generation order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub cells: Vec<GridCell>,
    pub skipped: Vec<SkippedCell>,
    /// Points generated before any cap was applied.
    pub requested: usize,
    /// Points dropped by `max_points`.
    pub truncated: usize,
    /// Points never dispatched because the scan was cancelled.
    pub undispatched: usize,
    pub cancelled: bool,
}

impl ScanReport {
    pub fn count_by_status(&self, status: CellStatus) -> usize {
        self.cells.iter().filter(|c| c.status == status).count()
    }
}

/// Configuration for grid scans.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Length of the recent window fetched per cell, in days.
    pub window_days: u32,
    /// Maximum number of fetches in flight.
    pub concurrency: usize,
    /// Per-cell fetch timeout, in milliseconds.
    pub cell_timeout_ms: u64,
    /// Optional cap on the number of points scanned; `None` scans all.
    pub max_points: Option<usize>,
    pub blooming_ndvi: f64,
    pub vegetated_ndvi: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            window_days: 16,
            concurrency: 8,
            cell_timeout_ms: 10_000,
            max_points: None,
            blooming_ndvi: 0.6,
            vegetated_ndvi: 0.3,
        }
    }
}

impl ScanConfig {
    /// Set the per-cell window length in days.
    pub fn window_days(mut self, days: u32) -> Self {
        self.window_days = days;
        self
    }

    /// Set the maximum number of fetches in flight.
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit;
        self
    }

    /// Set the per-cell fetch timeout. Saturates at `u64::MAX` milliseconds.
    pub fn cell_timeout(mut self, timeout: Duration) -> Self {
        self.cell_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Cap the number of points scanned; `None` removes the cap.
    pub fn max_points(mut self, cap: Option<usize>) -> Self {
        self.max_points = cap;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.cell_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(PhenologyError::InvalidParameter(
                "scan concurrency must be at least 1".to_string(),
            ));
        }
        if self.cell_timeout_ms == 0 {
            return Err(PhenologyError::InvalidParameter(
                "cell timeout must be positive".to_string(),
            ));
        }
        if self.vegetated_ndvi > self.blooming_ndvi {
            return Err(PhenologyError::InvalidParameter(format!(
                "vegetated threshold {} above blooming threshold {}",
                self.vegetated_ndvi, self.blooming_ndvi
            )));
        }
        Ok(())
    }
}

/// Cancellation handle for a running scan.
///
/// Cloning shares the flag. Once cancelled, no further cell is dispatched;
/// cells already in flight finish and are reported.
#[derive(Debug, Clone, Default)]
pub struct ScanCancel(Arc<AtomicBool>);

impl ScanCancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

enum CellOutcome {
    Cell(GridCell),
    Skipped(SkipReason),
}

/// Scans grid points against a [`SampleSource`].
///
/// # Example
///
/// ```
/// use bloomwatch::grid::{BoundingBox, GridScanner, ScanConfig};
/// use bloomwatch::source::SyntheticSource;
/// use chrono::NaiveDate;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let scanner = GridScanner::new(SyntheticSource::new(7))
///     .config(ScanConfig::default().concurrency(4));
/// let bounds = BoundingBox::new(35.0, 37.0, -80.0, -78.0).unwrap();
/// let as_of = NaiveDate::from_ymd_opt(2024, 4, 20).unwrap();
///
/// let report = scanner.scan(&bounds, 1.0, as_of).await.unwrap();
/// assert_eq!(report.cells.len(), 4);
/// # });
/// ```
pub struct GridScanner<S> {
    source: S,
    config: ScanConfig,
    normalize: NormalizeConfig,
    onset: OnsetConfig,
    cancel: ScanCancel,
}

impl<S: SampleSource> GridScanner<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            config: ScanConfig::default(),
            normalize: NormalizeConfig::default(),
            onset: OnsetConfig::default(),
            cancel: ScanCancel::new(),
        }
    }

    /// Replace the scan configuration.
    pub fn config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Normalization applied to each cell's window.
    pub fn normalize_config(mut self, config: NormalizeConfig) -> Self {
        self.normalize = config;
        self
    }

    /// Onset detection applied to each cell's window.
    pub fn onset_config(mut self, config: OnsetConfig) -> Self {
        self.onset = config;
        self
    }

    /// Use an externally owned cancellation handle.
    pub fn with_cancel(mut self, cancel: ScanCancel) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> ScanCancel {
        self.cancel.clone()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Scan the grid over `bounds` at `resolution`, using the window ending `as_of`.
    ///
    /// Points are generated lazily, so `max_points` bounds the work even
    /// for very fine grids.
    pub async fn scan(
        &self,
        bounds: &BoundingBox,
        resolution: f64,
        as_of: NaiveDate,
    ) -> Result<ScanReport> {
        self.validate()?;
        let (rows, cols) = bounds.grid_shape(resolution)?;
        let requested = rows.checked_mul(cols).ok_or_else(|| {
            PhenologyError::InvalidParameter(format!(
                "grid of {} x {} points is too large",
                rows, cols
            ))
        })?;
        let cap = self.config.max_points.unwrap_or(requested);
        let points: Vec<GeoPoint> = grid_iter(bounds, resolution)?.take(cap).collect();
        self.run(points, requested, as_of).await
    }

    /// Scan an explicit list of points.
    ///
    /// Errors only on invalid configuration or window; per-cell problems
    /// are reported in [`ScanReport::skipped`].
    pub async fn scan_points(
        &self,
        mut points: Vec<GeoPoint>,
        as_of: NaiveDate,
    ) -> Result<ScanReport> {
        self.validate()?;
        let requested = points.len();
        if let Some(cap) = self.config.max_points {
            points.truncate(cap);
        }
        self.run(points, requested, as_of).await
    }

    fn validate(&self) -> Result<()> {
        self.config.validate()?;
        self.normalize.validate()?;
        self.onset.validate()
    }

    async fn run(
        &self,
        points: Vec<GeoPoint>,
        requested: usize,
        as_of: NaiveDate,
    ) -> Result<ScanReport> {
        let window = DateRange::trailing(as_of, self.config.window_days)?;

        let scheduled = points.len();
        let truncated = requested.saturating_sub(scheduled);
        if truncated > 0 {
            info!("scan capped at {} of {} points", scheduled, requested);
        }

        let cancel = self.cancel.clone();
        let mut outcomes: Vec<(usize, GeoPoint, CellOutcome)> =
            stream::iter(points.into_iter().enumerate())
                .take_while(|_| futures::future::ready(!cancel.is_cancelled()))
                .map(|(idx, point)| async move {
                    (idx, point, self.scan_cell(point, window).await)
                })
                .buffer_unordered(self.config.concurrency)
                .collect()
                .await;
        outcomes.sort_by_key(|(idx, _, _)| *idx);

        let undispatched = scheduled - outcomes.len();
        let cancelled = cancel.is_cancelled();
        if cancelled {
            info!("scan cancelled; {} points not dispatched", undispatched);
        }

        let mut report = ScanReport {
            requested,
            truncated,
            undispatched,
            cancelled,
            ..ScanReport::default()
        };
        for (_, point, outcome) in outcomes {
            match outcome {
                CellOutcome::Cell(cell) => report.cells.push(cell),
                CellOutcome::Skipped(reason) => report.skipped.push(SkippedCell {
                    lat: point.lat,
                    lon: point.lon,
                    reason,
                }),
            }
        }

        info!(
            "scanned {} cells ({} skipped) of {} requested",
            report.cells.len(),
            report.skipped.len(),
            requested
        );
        Ok(report)
    }

    async fn scan_cell(&self, point: GeoPoint, window: DateRange) -> CellOutcome {
        let fetched =
            tokio::time::timeout(self.config.timeout(), self.source.fetch_samples(point, window))
                .await;

        let samples = match fetched {
            Err(_) => {
                warn!("cell ({}, {}) timed out", point.lat, point.lon);
                return CellOutcome::Skipped(SkipReason::TimedOut);
            }
            Ok(Err(e)) => {
                warn!("cell ({}, {}) failed: {}", point.lat, point.lon, e);
                return CellOutcome::Skipped(SkipReason::Failed(e.to_string()));
            }
            Ok(Ok(samples)) => samples,
        };

        let in_window: Vec<_> = samples.into_iter().filter(|s| window.contains(s.date)).collect();
        if in_window.is_empty() {
            debug!("cell ({}, {}) has no samples in window", point.lat, point.lon);
            return CellOutcome::Skipped(SkipReason::Empty);
        }

        match normalize(&in_window, &self.normalize) {
            Ok(series) => CellOutcome::Cell(self.classify(point, &series)),
            Err(e) => {
                warn!("cell ({}, {}) rejected: {}", point.lat, point.lon, e);
                CellOutcome::Skipped(SkipReason::Failed(e.to_string()))
            }
        }
    }

    fn classify(&self, point: GeoPoint, series: &TimeSeries) -> GridCell {
        let aggregate_ndvi = series.summary().map_or(0.0, |s| s.mean_ndvi);
        let onset_date = if series.len() >= MIN_ONSET_SAMPLES {
            detect_bloom(series, &self.onset)
                .ok()
                .flatten()
                .map(|event| event.onset_date)
        } else {
            None
        };

        GridCell {
            lat: point.lat,
            lon: point.lon,
            aggregate_ndvi,
            status: classify_ndvi(aggregate_ndvi, &self.config),
            sample_count: series.len(),
            onset_date,
        }
    }
}
