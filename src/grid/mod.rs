//! Regional grid generation, scanning and aggregation.

mod aggregate;
mod bounds;
mod scan;

pub use aggregate::{bin_cells, bin_points, BinnedCell};
pub use bounds::{grid_iter, grid_points, BoundingBox};
pub use scan::{
    classify_ndvi, CellStatus, GridCell, GridScanner, ScanCancel, ScanConfig, ScanReport,
    SkipReason, SkippedCell,
};
