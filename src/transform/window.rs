//! Moving-window smoothing.

use crate::core::{Sample, TimeSeries};

/// Centered moving average with shrinking windows at the edges.
///
/// Each output is the mean of `values[i - window/2 ..= i + window/2]`,
/// clipped to the slice bounds. Series shorter than `window` (or a
/// window of 0 or 1) are returned unchanged.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 || values.len() < window {
        return values.to_vec();
    }

    let n = values.len();
    let half = window / 2;

    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(n);
            let segment = &values[start..end];
            segment.iter().sum::<f64>() / segment.len() as f64
        })
        .collect()
}

/// Smooth the NDVI and EVI of a series, keeping dates and sample flags.
pub fn smooth_series(series: &TimeSeries, window: usize) -> TimeSeries {
    let ndvi = moving_average(&series.ndvi_values(), window);
    let evi = moving_average(&series.evi_values(), window);

    let samples: Vec<Sample> = series
        .samples()
        .iter()
        .zip(ndvi.into_iter().zip(evi))
        .map(|(s, (n, e))| Sample {
            ndvi: n,
            evi: e,
            ..s.clone()
        })
        .collect();

    TimeSeries::from_sorted(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn moving_average_uses_partial_edge_windows() {
        let result = moving_average(&[1.0, 2.0, 6.0, 4.0, 5.0], 3);
        assert_eq!(result.len(), 5);
        assert_relative_eq!(result[0], 1.5, epsilon = 1e-10);
        assert_relative_eq!(result[1], 3.0, epsilon = 1e-10);
        assert_relative_eq!(result[2], 4.0, epsilon = 1e-10);
        assert_relative_eq!(result[4], 4.5, epsilon = 1e-10);
    }

    #[test]
    fn short_series_pass_through() {
        assert_eq!(moving_average(&[1.0, 2.0], 3), vec![1.0, 2.0]);
        assert_eq!(moving_average(&[1.0, 9.0, 1.0], 1), vec![1.0, 9.0, 1.0]);
        assert!(moving_average(&[], 3).is_empty());
    }

    #[test]
    fn smoothing_preserves_dates() {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let samples: Vec<Sample> = [0.2, 0.8, 0.2]
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample::from_ndvi(base + Duration::days(8 * i as i64), v))
            .collect();
        let ts = TimeSeries::new(samples).unwrap();

        let smoothed = smooth_series(&ts, 3);
        assert_eq!(smoothed.dates(), ts.dates());
        assert_relative_eq!(smoothed.ndvi_values()[1], 0.4, epsilon = 1e-10);
    }
}
