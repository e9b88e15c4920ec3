//! Start, end and length of season from a fixed NDVI level.

use crate::core::TimeSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Conventional level for SOS/EOS extraction.
pub const DEFAULT_SEASON_LEVEL: f64 = 0.5;

/// SOS, EOS and LOS of one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonBounds {
    /// First date at or above the level.
    pub start: NaiveDate,
    /// Last date at or above the level.
    pub end: NaiveDate,
    pub length_days: i64,
}

/// Season bounds at `level`, or `None` if no sample reaches it.
pub fn season_bounds(series: &TimeSeries, level: f64) -> Option<SeasonBounds> {
    let samples = series.samples();
    let start = samples.iter().find(|s| s.ndvi >= level)?.date;
    let end = samples.iter().rev().find(|s| s.ndvi >= level)?.date;

    Some(SeasonBounds {
        start,
        end,
        length_days: (end - start).num_days(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Sample;
    use chrono::Duration;

    fn make_series(values: &[f64]) -> TimeSeries {
        let base = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample::from_ndvi(base + Duration::days(8 * i as i64), v))
            .collect();
        TimeSeries::new(samples).unwrap()
    }

    #[test]
    fn bounds_span_first_to_last_crossing() {
        let ts = make_series(&[0.2, 0.5, 0.7, 0.45, 0.55, 0.3]);
        let bounds = season_bounds(&ts, DEFAULT_SEASON_LEVEL).unwrap();

        assert_eq!(bounds.start, NaiveDate::from_ymd_opt(2024, 2, 9).unwrap());
        assert_eq!(bounds.end, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(bounds.length_days, 24);
    }

    #[test]
    fn single_crossing_has_zero_length() {
        let ts = make_series(&[0.2, 0.6, 0.3]);
        let bounds = season_bounds(&ts, DEFAULT_SEASON_LEVEL).unwrap();
        assert_eq!(bounds.start, bounds.end);
        assert_eq!(bounds.length_days, 0);
    }

    #[test]
    fn low_series_has_no_season() {
        let ts = make_series(&[0.2, 0.3, 0.25]);
        assert!(season_bounds(&ts, DEFAULT_SEASON_LEVEL).is_none());
        assert!(season_bounds(&TimeSeries::default(), DEFAULT_SEASON_LEVEL).is_none());
    }
}
