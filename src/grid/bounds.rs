//! Bounding boxes and regular point grids.

use crate::error::{PhenologyError, Result};
use crate::utils::{validate_coordinates, GeoPoint};
use serde::{Deserialize, Serialize};

/// A latitude/longitude rectangle in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Create a box, rejecting inverted or out-of-range bounds.
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Result<Self> {
        if !validate_coordinates(min_lat, min_lon) || !validate_coordinates(max_lat, max_lon) {
            return Err(PhenologyError::InvalidRange(format!(
                "bounds ({}, {})..({}, {}) out of range",
                min_lat, min_lon, max_lat, max_lon
            )));
        }
        if min_lat > max_lat || min_lon > max_lon {
            return Err(PhenologyError::InvalidRange(format!(
                "inverted bounds: lat {}..{}, lon {}..{}",
                min_lat, max_lat, min_lon, max_lon
            )));
        }
        Ok(Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        })
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lon)
    }

    /// Number of grid points at `resolution`, as `(rows, columns)`.
    pub fn grid_shape(&self, resolution: f64) -> Result<(usize, usize)> {
        check_resolution(resolution)?;
        Ok((
            axis_len(self.min_lat, self.max_lat, resolution),
            axis_len(self.min_lon, self.max_lon, resolution),
        ))
    }
}

fn check_resolution(resolution: f64) -> Result<()> {
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(PhenologyError::InvalidParameter(format!(
            "grid resolution must be positive, got {}",
            resolution
        )));
    }
    Ok(())
}

/// Count of `start + k * step` values below `stop`.
fn axis_len(start: f64, stop: f64, step: f64) -> usize {
    let n = ((stop - start) / step).ceil();
    if n > 0.0 {
        n as usize
    } else {
        0
    }
}

fn axis(start: f64, stop: f64, step: f64) -> impl Iterator<Item = f64> + Clone {
    (0..axis_len(start, stop, step)).map(move |k| start + k as f64 * step)
}

/// Lazily walk the grid over `bounds` at `resolution`, row-major by latitude.
///
/// Each axis is half-open: the lower bound is included, the upper bound is
/// not. Points are produced on demand, so a capped walk over a very fine
/// grid never materializes the full grid.
pub fn grid_iter(
    bounds: &BoundingBox,
    resolution: f64,
) -> Result<impl Iterator<Item = GeoPoint>> {
    check_resolution(resolution)?;
    let lons = axis(bounds.min_lon, bounds.max_lon, resolution);
    Ok(axis(bounds.min_lat, bounds.max_lat, resolution)
        .flat_map(move |lat| lons.clone().map(move |lon| GeoPoint { lat, lon })))
}

/// Cartesian grid over `bounds` at `resolution` degrees, collected.
///
/// There is no built-in limit on the number of points; use [`grid_iter`]
/// with `take` to bound the work.
///
/// # Example
///
/// ```
/// use bloomwatch::grid::{grid_points, BoundingBox};
///
/// let bounds = BoundingBox::new(35.0, 37.0, -80.0, -77.0).unwrap();
/// let points = grid_points(&bounds, 1.0).unwrap();
/// assert_eq!(points.len(), 6);
/// assert_eq!((points[0].lat, points[0].lon), (35.0, -80.0));
/// assert_eq!((points[5].lat, points[5].lon), (36.0, -78.0));
/// ```
pub fn grid_points(bounds: &BoundingBox, resolution: f64) -> Result<Vec<GeoPoint>> {
    Ok(grid_iter(bounds, resolution)?.collect())
}
