//! Shared statistical and geodesic helpers.

pub mod geo;
pub mod stats;

pub use geo::{haversine_km, validate_coordinates, GeoPoint};
pub use stats::{linear_fit, mean, population_std_dev, LinearFit};
