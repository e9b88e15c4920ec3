//! Binning of point observations into coarser cells.

use crate::error::{PhenologyError, Result};
use crate::grid::GridCell;
use crate::utils::GeoPoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate of the observations falling into one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinnedCell {
    /// Cell corner: the truncated latitude, a multiple of the cell size.
    pub lat: f64,
    pub lon: f64,
    pub count: usize,
    pub mean_ndvi: f64,
    pub max_ndvi: f64,
}

/// Group `(point, ndvi)` observations into `cell_size`-degree cells.
///
/// Coordinates are truncated toward zero to a multiple of `cell_size`, so
/// cells straddling the equator or prime meridian are widened on the
/// positive side. Output is ordered by cell latitude, then longitude.
pub fn bin_points(points: &[(GeoPoint, f64)], cell_size: f64) -> Result<Vec<BinnedCell>> {
    if !(cell_size.is_finite() && cell_size > 0.0) {
        return Err(PhenologyError::InvalidParameter(format!(
            "cell size must be positive, got {}",
            cell_size
        )));
    }

    // (count, sum, max) per cell key
    let mut bins: BTreeMap<(i64, i64), (usize, f64, f64)> = BTreeMap::new();
    for (point, ndvi) in points {
        let key = (
            (point.lat / cell_size).trunc() as i64,
            (point.lon / cell_size).trunc() as i64,
        );
        let entry = bins.entry(key).or_insert((0, 0.0, f64::NEG_INFINITY));
        entry.0 += 1;
        entry.1 += ndvi;
        entry.2 = entry.2.max(*ndvi);
    }

    Ok(bins
        .into_iter()
        .map(|((lat_key, lon_key), (count, sum, max))| BinnedCell {
            lat: lat_key as f64 * cell_size,
            lon: lon_key as f64 * cell_size,
            count,
            mean_ndvi: sum / count as f64,
            max_ndvi: max,
        })
        .collect())
}

/// Bin scanned grid cells by their aggregate NDVI.
pub fn bin_cells(cells: &[GridCell], cell_size: f64) -> Result<Vec<BinnedCell>> {
    let points: Vec<(GeoPoint, f64)> = cells
        .iter()
        .map(|c| (GeoPoint { lat: c.lat, lon: c.lon }, c.aggregate_ndvi))
        .collect();
    bin_points(&points, cell_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn obs(lat: f64, lon: f64, ndvi: f64) -> (GeoPoint, f64) {
        (GeoPoint { lat, lon }, ndvi)
    }

    #[test]
    fn points_share_truncated_cells() {
        let points = vec![
            obs(38.1, -77.2, 0.4),
            obs(38.4, -77.4, 0.8),
            obs(38.6, -77.1, 0.5),
        ];
        let cells = bin_points(&points, 0.5).unwrap();

        assert_eq!(cells.len(), 2);
        let first = &cells[0];
        assert_relative_eq!(first.lat, 38.0, epsilon = 1e-12);
        assert_relative_eq!(first.lon, -77.0, epsilon = 1e-12);
        assert_eq!(first.count, 2);
        assert_relative_eq!(first.mean_ndvi, 0.6, epsilon = 1e-12);
        assert_relative_eq!(first.max_ndvi, 0.8, epsilon = 1e-12);

        assert_relative_eq!(cells[1].lat, 38.5, epsilon = 1e-12);
        assert_eq!(cells[1].count, 1);
    }

    #[test]
    fn empty_input_gives_no_cells() {
        assert!(bin_points(&[], 1.0).unwrap().is_empty());
    }

    #[test]
    fn cell_size_must_be_positive() {
        assert!(bin_points(&[obs(0.0, 0.0, 0.5)], 0.0).is_err());
        assert!(bin_points(&[obs(0.0, 0.0, 0.5)], -1.0).is_err());
    }
}
