//! TimeSeries data structure for normalized vegetation-index samples.

use crate::core::{DateRange, Sample};
use crate::error::{PhenologyError, Result};
use crate::utils::stats;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Descriptive statistics of a series' NDVI values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub mean_ndvi: f64,
    pub max_ndvi: f64,
    pub min_ndvi: f64,
    /// Population standard deviation.
    pub std_ndvi: f64,
    pub data_points: usize,
}

/// A date-ordered series of vegetation-index samples.
///
/// Dates are strictly increasing and every sample is finite. Instances are
/// produced by the normalizer (or validated by [`TimeSeries::new`]) and are
/// not mutated by any analysis step. Deserialization applies the same checks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSeries")]
pub struct TimeSeries {
    samples: Vec<Sample>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    metadata: HashMap<String, String>,
}

#[derive(Deserialize)]
struct RawTimeSeries {
    samples: Vec<Sample>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl TryFrom<RawTimeSeries> for TimeSeries {
    type Error = PhenologyError;

    fn try_from(raw: RawTimeSeries) -> Result<Self> {
        let mut series = TimeSeries::new(raw.samples)?;
        series.metadata = raw.metadata;
        Ok(series)
    }
}

impl TimeSeries {
    /// Wrap already-ordered samples, validating the series invariants.
    pub fn new(samples: Vec<Sample>) -> Result<Self> {
        for sample in &samples {
            sample.ensure_finite()?;
        }
        for pair in samples.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(PhenologyError::InvalidRange(format!(
                    "dates must be strictly increasing: {} then {}",
                    pair[0].date, pair[1].date
                )));
            }
        }
        Ok(Self {
            samples,
            metadata: HashMap::new(),
        })
    }

    /// Internal constructor for callers that already guarantee the invariants.
    pub(crate) fn from_sorted(samples: Vec<Sample>) -> Self {
        debug_assert!(samples.windows(2).all(|w| w[0].date < w[1].date));
        Self {
            samples,
            metadata: HashMap::new(),
        }
    }

    /// Get the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.samples.iter().map(|s| s.date).collect()
    }

    pub fn ndvi_values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.ndvi).collect()
    }

    pub fn evi_values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.evi).collect()
    }

    /// Number of samples synthesised by gap filling.
    pub fn interpolated_count(&self) -> usize {
        self.samples.iter().filter(|s| s.interpolated).count()
    }

    /// First differences of NDVI: `d[i] = ndvi[i] - ndvi[i-1]` for `i >= 1`.
    ///
    /// The returned vector has `len() - 1` entries; entry `k` is `d[k + 1]`.
    pub fn ndvi_differences(&self) -> Vec<f64> {
        self.samples
            .windows(2)
            .map(|w| w[1].ndvi - w[0].ndvi)
            .collect()
    }

    /// Index of the global NDVI maximum (first occurrence on ties).
    pub fn peak_index(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, s) in self.samples.iter().enumerate() {
            match best {
                Some((_, v)) if s.ndvi <= v => {}
                _ => best = Some((i, s.ndvi)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Get metadata.
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Set metadata.
    pub fn set_metadata(&mut self, key: String, value: String) {
        self.metadata.insert(key, value);
    }

    /// Extract the samples at indices `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end {
            return Err(PhenologyError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(PhenologyError::InvalidParameter(format!(
                "slice end {} beyond length {}",
                end,
                self.len()
            )));
        }

        Ok(TimeSeries {
            samples: self.samples[start..end].to_vec(),
            metadata: self.metadata.clone(),
        })
    }

    /// Extract the samples whose dates fall within `range`.
    pub fn slice_dates(&self, range: &DateRange) -> TimeSeries {
        TimeSeries {
            samples: self
                .samples
                .iter()
                .filter(|s| range.contains(s.date))
                .cloned()
                .collect(),
            metadata: self.metadata.clone(),
        }
    }

    /// Descriptive NDVI statistics; `None` for an empty series.
    pub fn summary(&self) -> Option<SeriesSummary> {
        if self.is_empty() {
            return None;
        }
        let values = self.ndvi_values();
        Some(SeriesSummary {
            mean_ndvi: stats::mean(&values),
            max_ndvi: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min_ndvi: values.iter().copied().fold(f64::INFINITY, f64::min),
            std_ndvi: stats::population_std_dev(&values),
            data_points: values.len(),
        })
    }

    /// Most common spacing between consecutive samples, in days.
    pub fn modal_interval_days(&self) -> Result<i64> {
        if self.len() < 2 {
            return Err(PhenologyError::InsufficientData {
                needed: 2,
                got: self.len(),
            });
        }

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for w in self.samples.windows(2) {
            *counts.entry((w[1].date - w[0].date).num_days()).or_insert(0) += 1;
        }

        // Ties resolve to the shorter spacing.
        counts
            .into_iter()
            .max_by(|(da, ca), (db, cb)| ca.cmp(cb).then(db.cmp(da)))
            .map(|(days, _)| days)
            .ok_or(PhenologyError::InsufficientData { needed: 2, got: 0 })
    }
}
