//! Data collaborators feeding the engine.
//!
//! The analytics never fetch data themselves; callers hand them samples,
//! historical records or weather through these traits. Live clients live
//! outside this crate. The synthetic and weather-derived implementations
//! here are reproducible (seeded per point) and are what the tests and
//! benchmarks drive.
//!
//! Implementations must return `Send` futures so a grid scan can poll
//! many fetches concurrently. A source may return a partial or empty
//! vector for a range; that is not an error.

mod synthetic;
mod weather;

pub use synthetic::{SyntheticHistory, SyntheticSource, SYNTHETIC_SOURCE};
pub use weather::{
    growing_degree_days, WeatherDerivedSource, WeatherNdviEstimator, WeatherObservation,
    WEATHER_SOURCE,
};

use crate::core::{DateRange, HistoricalRecord, Sample};
use crate::error::Result;
use crate::utils::GeoPoint;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;

/// Supplier of raw vegetation-index samples for a point and date range.
pub trait SampleSource: Send + Sync {
    fn fetch_samples(
        &self,
        point: GeoPoint,
        range: DateRange,
    ) -> impl Future<Output = Result<Vec<Sample>>> + Send;
}

/// Supplier of prior-season peak records for a point.
pub trait HistorySource: Send + Sync {
    /// Records for the `years_back` years preceding `target_year`.
    fn fetch_history(
        &self,
        point: GeoPoint,
        target_year: i32,
        years_back: u32,
    ) -> impl Future<Output = Result<Vec<HistoricalRecord>>> + Send;
}

/// Supplier of daily weather observations for a point and date range.
pub trait WeatherSource: Send + Sync {
    fn fetch_weather(
        &self,
        point: GeoPoint,
        range: DateRange,
    ) -> impl Future<Output = Result<Vec<WeatherObservation>>> + Send;
}

/// A [`SampleSource`] backed by a closure.
///
/// # Example
///
/// ```
/// use bloomwatch::core::Sample;
/// use bloomwatch::source::sample_source_fn;
/// use bloomwatch::PhenologyError;
///
/// let empty = sample_source_fn(|_point, _range| async {
///     Ok::<_, PhenologyError>(Vec::<Sample>::new())
/// });
/// # let _ = empty;
/// ```
pub fn sample_source_fn<F, Fut>(f: F) -> FnSampleSource<F>
where
    F: Fn(GeoPoint, DateRange) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<Sample>>> + Send,
{
    FnSampleSource(f)
}

/// See [`sample_source_fn`].
pub struct FnSampleSource<F>(F);

impl<F, Fut> SampleSource for FnSampleSource<F>
where
    F: Fn(GeoPoint, DateRange) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<Sample>>> + Send,
{
    fn fetch_samples(
        &self,
        point: GeoPoint,
        range: DateRange,
    ) -> impl Future<Output = Result<Vec<Sample>>> + Send {
        (self.0)(point, range)
    }
}

/// Latitude-dependent day-of-year of peak bloom: later towards the pole.
pub fn latitude_bloom_day(lat: f64) -> i64 {
    100 + (lat / 90.0 * 30.0).trunc() as i64
}

/// Gaussian bell of width `width_days` centred on `center`.
pub(crate) fn seasonal_factor(day_of_year: f64, center: f64, width_days: f64) -> f64 {
    (-(day_of_year - center).powi(2) / (2.0 * width_days.powi(2))).exp()
}

/// Deterministic generator for one point under a base seed.
pub(crate) fn point_rng(seed: u64, point: GeoPoint) -> StdRng {
    let mixed = seed
        ^ point.lat.to_bits().rotate_left(17)
        ^ point.lon.to_bits().rotate_left(41).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    StdRng::seed_from_u64(mixed)
}
