//! Sorting, de-duplication and gap filling of raw sample sequences.

use crate::core::{Quality, Sample, TimeSeries};
use crate::error::{PhenologyError, Result};
use chrono::Duration;
use log::debug;
use serde::{Deserialize, Serialize};

/// Source tag written on interpolated samples.
pub const INTERPOLATED_SOURCE: &str = "interpolated";

/// Configuration for [`normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Gaps longer than this many days are filled.
    pub max_gap_days: i64,
    /// Spacing of the synthesised samples, in days.
    pub step_days: i64,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        // 8-day composites observed twice
        Self {
            max_gap_days: 16,
            step_days: 8,
        }
    }
}

impl NormalizeConfig {
    /// Fill gaps longer than `days`.
    pub fn max_gap_days(mut self, days: i64) -> Self {
        self.max_gap_days = days;
        self
    }

    /// Spacing of the filled samples, in days.
    pub fn step_days(mut self, days: i64) -> Self {
        self.step_days = days;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.step_days <= 0 || self.max_gap_days <= 0 {
            return Err(PhenologyError::InvalidParameter(
                "normalizer intervals must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Turn an unordered raw sample sequence into a [`TimeSeries`].
///
/// Samples are sorted by date (stable, so the first occurrence of a
/// duplicated date is kept). Every gap longer than `max_gap_days` between
/// neighbours is filled with `gap / step - 1` samples spaced `step_days`
/// apart whose values are linearly interpolated between the bounding pair;
/// those samples carry `Quality::Estimated` and `interpolated = true`.
///
/// Normalizing an already normalized series returns it unchanged.
pub fn normalize(raw: &[Sample], config: &NormalizeConfig) -> Result<TimeSeries> {
    config.validate()?;
    if raw.is_empty() {
        return Err(PhenologyError::InsufficientData { needed: 1, got: 0 });
    }
    for sample in raw {
        sample.ensure_finite()?;
    }

    let mut sorted = raw.to_vec();
    sorted.sort_by_key(|s| s.date);
    let before = sorted.len();
    sorted.dedup_by(|later, earlier| later.date == earlier.date);
    if sorted.len() < before {
        debug!("dropped {} duplicate-date samples", before - sorted.len());
    }

    let mut result = Vec::with_capacity(sorted.len());
    let mut filled = 0usize;
    for (i, sample) in sorted.iter().enumerate() {
        result.push(sample.clone());

        if let Some(next) = sorted.get(i + 1) {
            let gap = (next.date - sample.date).num_days();
            if gap > config.max_gap_days {
                let inserted = fill_gap(sample, next, gap, config.step_days);
                filled += inserted.len();
                result.extend(inserted);
            }
        }
    }

    if filled > 0 {
        debug!("interpolated {} samples across gaps", filled);
    }

    Ok(TimeSeries::from_sorted(result))
}

/// Samples strictly between `start` and `end`, `step_days` apart.
fn fill_gap(start: &Sample, end: &Sample, gap: i64, step_days: i64) -> Vec<Sample> {
    let segments = gap / step_days;
    (1..segments)
        .map(|j| {
            let t = j as f64 / segments as f64;
            Sample {
                date: start.date + Duration::days(step_days * j),
                ndvi: start.ndvi + t * (end.ndvi - start.ndvi),
                evi: start.evi + t * (end.evi - start.evi),
                quality: Quality::Estimated,
                source: INTERPOLATED_SOURCE.to_string(),
                interpolated: true,
                gdd: None,
            }
        })
        .collect()
}
