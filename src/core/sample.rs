//! Vegetation-index samples and historical bloom records.

use crate::error::{PhenologyError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Quality flag attached to a sample by its producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Cloud-free composite or direct observation.
    Good,
    /// Derived value (interpolated gap or weather-based estimate).
    Estimated,
    #[default]
    Unknown,
}

/// One vegetation-index observation at a calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub date: NaiveDate,
    pub ndvi: f64,
    pub evi: f64,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub source: String,
    /// Set on samples synthesised by gap filling.
    #[serde(default)]
    pub interpolated: bool,
    /// Cumulative growing degree days, for weather-derived samples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gdd: Option<f64>,
}

impl Sample {
    /// Create an observed sample with `Good` quality.
    pub fn new(date: NaiveDate, ndvi: f64, evi: f64) -> Self {
        Self {
            date,
            ndvi,
            evi,
            quality: Quality::Good,
            source: String::new(),
            interpolated: false,
            gdd: None,
        }
    }

    /// Sample whose EVI is unknown; EVI is approximated as `0.8 * ndvi`.
    pub fn from_ndvi(date: NaiveDate, ndvi: f64) -> Self {
        Self::new(date, ndvi, ndvi * 0.8)
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_gdd(mut self, gdd: f64) -> Self {
        self.gdd = Some(gdd);
        self
    }

    /// Both index values are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.ndvi.is_finite() && self.evi.is_finite()
    }

    /// Day of year (1-366) of the sample date.
    pub fn day_of_year(&self) -> u32 {
        self.date.ordinal()
    }

    pub(crate) fn ensure_finite(&self) -> Result<()> {
        if self.is_finite() {
            Ok(())
        } else {
            Err(PhenologyError::NonFiniteValue { date: self.date })
        }
    }
}

/// Peak timing observed in a prior season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub year: i32,
    pub day_of_year: u32,
    pub peak_ndvi: f64,
}

impl HistoricalRecord {
    /// Create a record, validating the day of year against the calendar.
    pub fn new(year: i32, day_of_year: u32, peak_ndvi: f64) -> Result<Self> {
        if !(1..=366).contains(&day_of_year) {
            return Err(PhenologyError::InvalidRange(format!(
                "day of year {} outside 1..=366",
                day_of_year
            )));
        }
        if day_of_year == 366 && NaiveDate::from_yo_opt(year, 366).is_none() {
            return Err(PhenologyError::InvalidRange(format!(
                "{} is not a leap year",
                year
            )));
        }
        Ok(Self {
            year,
            day_of_year,
            peak_ndvi,
        })
    }

    /// Build a record from the calendar date of a prior peak.
    pub fn from_date(date: NaiveDate, peak_ndvi: f64) -> Self {
        Self {
            year: date.year(),
            day_of_year: date.ordinal(),
            peak_ndvi,
        }
    }

    /// Calendar date of the recorded peak.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_yo_opt(self.year, self.day_of_year)
    }
}

/// Day-of-year values of a record set, in input order.
pub fn days_of_year(records: &[HistoricalRecord]) -> Vec<f64> {
    records.iter().map(|r| r.day_of_year as f64).collect()
}
