//! Seeded synthetic vegetation and history generators.

use super::{latitude_bloom_day, point_rng, seasonal_factor, HistorySource, SampleSource};
use crate::core::{DateRange, HistoricalRecord, Quality, Sample};
use crate::error::{PhenologyError, Result};
use crate::utils::GeoPoint;
use chrono::{Datelike, Duration};
use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::Normal;
use std::future::Future;

/// Source tag on synthetic samples.
pub const SYNTHETIC_SOURCE: &str = "synthetic";

/// Gaussian seasonal NDVI curve with additive noise, one sample per cadence step.
///
/// The curve is `0.3 + 0.4 * exp(-(doy - base)^2 / (2 * 30^2))` where `base`
/// is the latitude-dependent bloom day. Noise is drawn per point from a
/// generator seeded with `seed` and the point's coordinates, so the same
/// point always yields the same series.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSource {
    seed: u64,
    cadence_days: i64,
    noise_std: f64,
    baseline: f64,
    amplitude: f64,
    width_days: f64,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            cadence_days: 8,
            noise_std: 0.05,
            baseline: 0.3,
            amplitude: 0.4,
            width_days: 30.0,
        }
    }

    /// Days between samples, at least 1.
    pub fn cadence_days(mut self, days: i64) -> Self {
        self.cadence_days = days.max(1);
        self
    }

    /// Standard deviation of the Gaussian NDVI noise; negative values become 0.
    pub fn noise_std(mut self, std: f64) -> Self {
        self.noise_std = std.max(0.0);
        self
    }

    /// Noise-free NDVI on `day_of_year` at latitude `lat`.
    pub fn expected_ndvi(&self, lat: f64, day_of_year: u32) -> f64 {
        let base = latitude_bloom_day(lat) as f64;
        self.baseline + self.amplitude * seasonal_factor(day_of_year as f64, base, self.width_days)
    }

    /// Generate the series for `point` over `range`, starting on its first day.
    pub fn generate(&self, point: GeoPoint, range: &DateRange) -> Vec<Sample> {
        let mut rng = point_rng(self.seed, point);
        let noise = Normal::new(0.0, self.noise_std).ok();

        let mut samples = Vec::new();
        let mut date = range.start();
        while date <= range.end() {
            let jitter = noise.as_ref().map_or(0.0, |n| n.sample(&mut rng));
            let ndvi = (self.expected_ndvi(point.lat, date.ordinal()) + jitter).clamp(0.0, 1.0);
            samples.push(
                Sample::from_ndvi(date, ndvi)
                    .with_quality(Quality::Good)
                    .with_source(SYNTHETIC_SOURCE),
            );
            match date.checked_add_signed(Duration::days(self.cadence_days)) {
                Some(next) => date = next,
                None => break,
            }
        }
        samples
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SampleSource for SyntheticSource {
    fn fetch_samples(
        &self,
        point: GeoPoint,
        range: DateRange,
    ) -> impl Future<Output = Result<Vec<Sample>>> + Send {
        futures::future::ready(Ok(self.generate(point, &range)))
    }
}

/// Historical peak records scattered around the latitude-dependent bloom day.
///
/// Each year's day-of-year is `base + U[-jitter, jitter)` and its peak NDVI
/// is `0.7 + U[-0.1, 0.1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticHistory {
    seed: u64,
    jitter_days: i64,
    peak_ndvi: f64,
    peak_jitter: f64,
}

impl SyntheticHistory {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            jitter_days: 10,
            peak_ndvi: 0.7,
            peak_jitter: 0.1,
        }
    }

    /// Half-width of the uniform spread around the bloom day.
    pub fn jitter_days(mut self, days: i64) -> Self {
        self.jitter_days = days.max(0);
        self
    }

    /// Records for the `years_back` years before `target_year`, oldest first.
    pub fn generate(
        &self,
        point: GeoPoint,
        target_year: i32,
        years_back: u32,
    ) -> Result<Vec<HistoricalRecord>> {
        let mut rng = point_rng(self.seed, point);
        let base = latitude_bloom_day(point.lat);
        let first_year = target_year
            .checked_sub_unsigned(years_back)
            .ok_or_else(|| PhenologyError::InvalidRange(format!("{} years back", years_back)))?;

        (first_year..target_year)
            .map(|year| {
                let offset = if self.jitter_days > 0 {
                    rng.gen_range(-self.jitter_days..self.jitter_days)
                } else {
                    0
                };
                let peak = if self.peak_jitter > 0.0 {
                    self.peak_ndvi + rng.gen_range(-self.peak_jitter..self.peak_jitter)
                } else {
                    self.peak_ndvi
                };
                let day = u32::try_from((base + offset).clamp(1, 365)).unwrap_or(1);
                HistoricalRecord::new(year, day, peak)
            })
            .collect()
    }
}

impl Default for SyntheticHistory {
    fn default() -> Self {
        Self::new(0)
    }
}

impl HistorySource for SyntheticHistory {
    fn fetch_history(
        &self,
        point: GeoPoint,
        target_year: i32,
        years_back: u32,
    ) -> impl Future<Output = Result<Vec<HistoricalRecord>>> + Send {
        futures::future::ready(self.generate(point, target_year, years_back))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{normalize, NormalizeConfig};
    use chrono::NaiveDate;

    fn dc() -> GeoPoint {
        GeoPoint::new(38.9, -77.0).unwrap()
    }

    fn spring_2024() -> DateRange {
        DateRange::parse("2024-01-01", "2024-12-31").unwrap()
    }

    #[test]
    fn synthetic_series_follows_cadence() {
        let samples = SyntheticSource::new(1).generate(dc(), &spring_2024());

        assert_eq!(samples.len(), 46);
        assert_eq!(samples[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(samples[1].date, NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
        assert!(samples.iter().all(|s| (0.0..=1.0).contains(&s.ndvi)));
        assert!(samples.iter().all(|s| s.source == SYNTHETIC_SOURCE));
        assert!(normalize(&samples, &NormalizeConfig::default()).is_ok());
    }

    #[test]
    fn noise_free_series_peaks_on_bloom_day() {
        let source = SyntheticSource::new(1).noise_std(0.0);
        let samples = source.generate(dc(), &spring_2024());
        let peak = samples
            .iter()
            .max_by(|a, b| a.ndvi.total_cmp(&b.ndvi))
            .unwrap();

        // Bloom day 112 at this latitude; samples fall on 1, 9, ..., 113.
        assert_eq!(peak.date.ordinal(), 113);
        assert!((source.expected_ndvi(38.9, 112) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn same_seed_same_series() {
        let a = SyntheticSource::new(42).generate(dc(), &spring_2024());
        let b = SyntheticSource::new(42).generate(dc(), &spring_2024());
        let c = SyntheticSource::new(43).generate(dc(), &spring_2024());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn history_scatters_around_bloom_day() {
        let records = SyntheticHistory::new(3).generate(dc(), 2024, 5).unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(records[0].year, 2019);
        assert_eq!(records[4].year, 2023);
        for r in &records {
            assert!((102..122).contains(&r.day_of_year));
            assert!((0.6..0.8).contains(&r.peak_ndvi));
        }
    }

    #[tokio::test]
    async fn sources_resolve_through_traits() {
        let samples = SyntheticSource::new(5)
            .fetch_samples(dc(), spring_2024())
            .await
            .unwrap();
        assert_eq!(samples.len(), 46);

        let history = SyntheticHistory::new(5)
            .fetch_history(dc(), 2024, 3)
            .await
            .unwrap();
        assert_eq!(history.len(), 3);
    }
}
