//! Weather covariates and the weather-driven NDVI estimator.

use super::{latitude_bloom_day, point_rng, seasonal_factor, SampleSource, WeatherSource};
use crate::core::{DateRange, Quality, Sample};
use crate::error::Result;
use crate::utils::GeoPoint;
use chrono::{Datelike, NaiveDate};
use log::debug;
use rand::distributions::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use std::future::Future;

/// Source tag on weather-derived samples.
pub const WEATHER_SOURCE: &str = "weather_estimate";

/// One day of weather at a point. Any field may be missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub date: NaiveDate,
    /// Mean air temperature, degrees Celsius.
    #[serde(default)]
    pub temp_avg: Option<f64>,
    #[serde(default)]
    pub temp_min: Option<f64>,
    #[serde(default)]
    pub temp_max: Option<f64>,
    /// Millimetres per day.
    #[serde(default)]
    pub precipitation: Option<f64>,
    /// Relative humidity, percent.
    #[serde(default)]
    pub humidity: Option<f64>,
}

impl WeatherObservation {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            ..Self::default()
        }
    }

    pub fn with_temperature(mut self, avg: f64) -> Self {
        self.temp_avg = Some(avg);
        self
    }

    pub fn with_precipitation(mut self, mm: f64) -> Self {
        self.precipitation = Some(mm);
        self
    }
}

/// Daily growing degree days: `max(0, (tmin + tmax) / 2 - base)`.
pub fn growing_degree_days(temp_min: f64, temp_max: f64, base_temp: f64) -> f64 {
    ((temp_min + temp_max) / 2.0 - base_temp).max(0.0)
}

/// Estimates NDVI from temperature, precipitation and seasonality.
///
/// For each day: `ndvi = 0.3 + 0.5 * s * t * p + noise`, clipped to [0, 1],
/// where `s` is a Gaussian seasonal bell around the latitude bloom day,
/// `t` a Gaussian response around the optimal temperature (0 when the
/// temperature is missing) and `p = min(1, precip / 5)` for wet days or
/// 0.5 otherwise. EVI is `0.8 * ndvi`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherNdviEstimator {
    pub base_temp: f64,
    pub optimal_temp: f64,
    pub temp_width: f64,
    pub seasonal_width_days: f64,
    pub noise_std: f64,
}

impl Default for WeatherNdviEstimator {
    fn default() -> Self {
        Self {
            base_temp: 10.0,
            optimal_temp: 20.0,
            temp_width: 10.0,
            seasonal_width_days: 30.0,
            noise_std: 0.05,
        }
    }
}

impl WeatherNdviEstimator {
    /// Standard deviation of the Gaussian NDVI noise; negative values become 0.
    pub fn noise_std(mut self, std: f64) -> Self {
        self.noise_std = std.max(0.0);
        self
    }

    fn temperature_factor(&self, temp: Option<f64>) -> f64 {
        match temp {
            Some(t) => (-(t - self.optimal_temp).powi(2) / (2.0 * self.temp_width.powi(2))).exp(),
            None => 0.0,
        }
    }

    fn precipitation_factor(precipitation: Option<f64>) -> f64 {
        match precipitation {
            Some(p) if p > 0.0 => (p / 5.0).min(1.0),
            _ => 0.5,
        }
    }

    /// Estimate one sample per observation, in input order.
    ///
    /// Each sample carries the cumulative GDD (days with mean temperature
    /// above `base_temp`) up to and including its date.
    pub fn estimate<R: Rng + ?Sized>(
        &self,
        weather: &[WeatherObservation],
        lat: f64,
        rng: &mut R,
    ) -> Vec<Sample> {
        let bloom_day = latitude_bloom_day(lat) as f64;
        let noise = Normal::new(0.0, self.noise_std).ok();
        let mut cumulative_gdd = 0.0;

        let samples: Vec<Sample> = weather
            .iter()
            .map(|obs| {
                if let Some(t) = obs.temp_avg.filter(|&t| t > self.base_temp) {
                    cumulative_gdd += t - self.base_temp;
                }

                let s = seasonal_factor(
                    obs.date.ordinal() as f64,
                    bloom_day,
                    self.seasonal_width_days,
                );
                let t = self.temperature_factor(obs.temp_avg);
                let p = Self::precipitation_factor(obs.precipitation);
                let jitter = noise.as_ref().map_or(0.0, |n| n.sample(&mut *rng));
                let ndvi = (0.3 + 0.5 * s * t * p + jitter).clamp(0.0, 1.0);

                Sample::from_ndvi(obs.date, ndvi)
                    .with_quality(Quality::Estimated)
                    .with_source(WEATHER_SOURCE)
                    .with_gdd(cumulative_gdd)
            })
            .collect();

        debug!("estimated {} samples from weather at lat {:.2}", samples.len(), lat);
        samples
    }
}

/// Adapts a [`WeatherSource`] into a [`SampleSource`] via the estimator.
#[derive(Debug, Clone)]
pub struct WeatherDerivedSource<W> {
    weather: W,
    estimator: WeatherNdviEstimator,
    seed: u64,
}

impl<W: WeatherSource> WeatherDerivedSource<W> {
    pub fn new(weather: W, seed: u64) -> Self {
        Self {
            weather,
            estimator: WeatherNdviEstimator::default(),
            seed,
        }
    }

    /// Replace the weather-to-NDVI estimator.
    pub fn estimator(mut self, estimator: WeatherNdviEstimator) -> Self {
        self.estimator = estimator;
        self
    }
}

impl<W: WeatherSource> SampleSource for WeatherDerivedSource<W> {
    fn fetch_samples(
        &self,
        point: GeoPoint,
        range: DateRange,
    ) -> impl Future<Output = Result<Vec<Sample>>> + Send {
        async move {
            let weather = self.weather.fetch_weather(point, range).await?;
            let mut rng = point_rng(self.seed, point);
            Ok(self.estimator.estimate(&weather, point.lat, &mut rng))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhenologyError;
    use approx::assert_relative_eq;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn gdd_clamps_cold_days_to_zero() {
        assert_relative_eq!(growing_degree_days(12.0, 24.0, 10.0), 8.0, epsilon = 1e-12);
        assert_eq!(growing_degree_days(-5.0, 8.0, 10.0), 0.0);
    }

    #[test]
    fn ideal_day_at_bloom_reaches_full_response() {
        // lat 0: bloom day 100 is April 9th 2024.
        let obs = WeatherObservation::new(date(2024, 4, 9))
            .with_temperature(20.0)
            .with_precipitation(10.0);
        let estimator = WeatherNdviEstimator::default().noise_std(0.0);
        let mut rng = StdRng::seed_from_u64(0);

        let samples = estimator.estimate(&[obs], 0.0, &mut rng);
        assert_eq!(samples.len(), 1);
        assert_relative_eq!(samples[0].ndvi, 0.8, epsilon = 1e-12);
        assert_relative_eq!(samples[0].evi, 0.64, epsilon = 1e-12);
        assert_eq!(samples[0].quality, Quality::Estimated);
        assert_eq!(samples[0].gdd, Some(10.0));
    }

    #[test]
    fn missing_temperature_leaves_baseline() {
        let obs = WeatherObservation::new(date(2024, 4, 9)).with_precipitation(2.0);
        let estimator = WeatherNdviEstimator::default().noise_std(0.0);
        let samples = estimator.estimate(&[obs], 0.0, &mut StdRng::seed_from_u64(0));
        assert_relative_eq!(samples[0].ndvi, 0.3, epsilon = 1e-12);
        assert_eq!(samples[0].gdd, Some(0.0));
    }

    #[test]
    fn dry_days_use_half_precipitation_factor() {
        let obs = WeatherObservation::new(date(2024, 4, 9)).with_temperature(20.0);
        let estimator = WeatherNdviEstimator::default().noise_std(0.0);
        let samples = estimator.estimate(&[obs], 0.0, &mut StdRng::seed_from_u64(0));
        assert_relative_eq!(samples[0].ndvi, 0.55, epsilon = 1e-12);
    }

    #[test]
    fn gdd_accumulates_over_warm_days() {
        let start = date(2024, 3, 1);
        let weather: Vec<_> = [8.0, 15.0, 12.0, 25.0]
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                WeatherObservation::new(start + Duration::days(i as i64)).with_temperature(t)
            })
            .collect();
        let samples = WeatherNdviEstimator::default().estimate(
            &weather,
            40.0,
            &mut StdRng::seed_from_u64(9),
        );
        let gdd: Vec<f64> = samples.iter().filter_map(|s| s.gdd).collect();
        assert_eq!(gdd, vec![0.0, 5.0, 7.0, 22.0]);
    }

    struct FixedWeather(Vec<WeatherObservation>);

    impl WeatherSource for FixedWeather {
        fn fetch_weather(
            &self,
            _point: GeoPoint,
            range: DateRange,
        ) -> impl Future<Output = Result<Vec<WeatherObservation>>> + Send {
            let days: Vec<_> = self
                .0
                .iter()
                .filter(|o| range.contains(o.date))
                .cloned()
                .collect();
            async move { Ok(days) }
        }
    }

    struct FailingWeather;

    impl WeatherSource for FailingWeather {
        fn fetch_weather(
            &self,
            _point: GeoPoint,
            _range: DateRange,
        ) -> impl Future<Output = Result<Vec<WeatherObservation>>> + Send {
            async { Err(PhenologyError::Source("weather service unavailable".to_string())) }
        }
    }

    #[tokio::test]
    async fn weather_source_adapts_into_samples() {
        let start = date(2024, 4, 1);
        let weather = (0..30)
            .map(|i| {
                WeatherObservation::new(start + Duration::days(i))
                    .with_temperature(18.0)
                    .with_precipitation(3.0)
            })
            .collect();
        let source = WeatherDerivedSource::new(FixedWeather(weather), 11);
        let point = GeoPoint::new(10.0, 20.0).unwrap();
        let range = DateRange::new(start, start + Duration::days(9)).unwrap();

        let samples = source.fetch_samples(point, range).await.unwrap();
        assert_eq!(samples.len(), 10);
        assert!(samples.iter().all(|s| s.source == WEATHER_SOURCE));

        let again = source.fetch_samples(point, range).await.unwrap();
        assert_eq!(samples, again);
    }

    #[tokio::test]
    async fn weather_failures_propagate() {
        let source = WeatherDerivedSource::new(FailingWeather, 0);
        let point = GeoPoint::new(10.0, 20.0).unwrap();
        let range = DateRange::trailing(date(2024, 4, 30), 16).unwrap();
        assert!(matches!(
            source.fetch_samples(point, range).await,
            Err(PhenologyError::Source(_))
        ));
    }
}
