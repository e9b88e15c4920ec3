//! Calendar arithmetic: date ranges, day-of-year conversion and seasons.

use crate::error::{PhenologyError, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range; `start` must not be after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(PhenologyError::InvalidRange(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a range from two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| {
                PhenologyError::InvalidRange(format!("invalid date '{}': {}", s, e))
            })
        };
        Self::new(parse(start)?, parse(end)?)
    }

    /// The `days`-long window ending on `end` (inclusive of both ends).
    pub fn trailing(end: NaiveDate, days: u32) -> Result<Self> {
        let start = end
            .checked_sub_signed(Duration::days(days as i64))
            .ok_or_else(|| {
                PhenologyError::InvalidRange(format!("{} days before {} underflows", days, end))
            })?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days from start to end.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Number of days in `year` (365 or 366).
pub fn days_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 31)
        .map(|d| d.ordinal())
        .unwrap_or(365)
}

/// Convert a day-of-year into a date of `year`.
///
/// Computed as January 1st plus `day_of_year - 1` days, so day 366 of a
/// non-leap year lands on January 1st of the following year and values
/// outside 1..=366 roll into neighbouring years.
pub fn date_from_day_of_year(year: i32, day_of_year: i64) -> Result<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| PhenologyError::InvalidRange(format!("year {} out of range", year)))?;
    jan1.checked_add_signed(Duration::days(day_of_year - 1))
        .ok_or_else(|| {
            PhenologyError::InvalidRange(format!(
                "day {} of year {} out of range",
                day_of_year, year
            ))
        })
}

/// Shift a date by a signed number of days.
pub fn offset_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    date.checked_add_signed(Duration::days(days)).ok_or_else(|| {
        PhenologyError::InvalidRange(format!("{} shifted by {} days out of range", date, days))
    })
}

/// Hemisphere, for season lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hemisphere {
    #[default]
    North,
    South,
}

impl Hemisphere {
    pub fn from_latitude(lat: f64) -> Self {
        if lat < 0.0 {
            Hemisphere::South
        } else {
            Hemisphere::North
        }
    }
}

/// Meteorological season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Season of a month (1-12); returns `None` for invalid months.
    pub fn for_month(month: u32, hemisphere: Hemisphere) -> Option<Self> {
        let north = match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => return None,
        };
        Some(match hemisphere {
            Hemisphere::North => north,
            Hemisphere::South => north.opposite(),
        })
    }

    pub fn for_date(date: NaiveDate, hemisphere: Hemisphere) -> Self {
        // month() is always 1..=12
        Self::for_month(date.month(), hemisphere).unwrap_or(Season::Winter)
    }

    fn opposite(self) -> Self {
        match self {
            Season::Winter => Season::Summer,
            Season::Spring => Season::Fall,
            Season::Summer => Season::Winter,
            Season::Fall => Season::Spring,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        assert!(DateRange::new(date(2024, 1, 1), date(2024, 3, 31)).is_ok());
        assert!(DateRange::new(date(2024, 1, 1), date(2024, 1, 1)).is_ok());
        assert!(matches!(
            DateRange::new(date(2024, 3, 31), date(2024, 1, 1)),
            Err(PhenologyError::InvalidRange(_))
        ));
    }

    #[test]
    fn date_range_parses_iso_dates() {
        let range = DateRange::parse("2024-01-01", "2024-03-31").unwrap();
        assert_eq!(range.num_days(), 90);
        assert!(range.contains(date(2024, 2, 29)));
        assert!(!range.contains(date(2024, 4, 1)));

        assert!(DateRange::parse("2024-13-01", "2024-12-31").is_err());
        assert!(DateRange::parse("yesterday", "2024-12-31").is_err());
    }

    #[test]
    fn trailing_window_ends_on_given_date() {
        let range = DateRange::trailing(date(2024, 5, 17), 16).unwrap();
        assert_eq!(range.start(), date(2024, 5, 1));
        assert_eq!(range.end(), date(2024, 5, 17));
    }

    #[test]
    fn day_of_year_conversion_handles_leap_years() {
        assert_eq!(date_from_day_of_year(2024, 100).unwrap(), date(2024, 4, 9));
        assert_eq!(date_from_day_of_year(2023, 100).unwrap(), date(2023, 4, 10));
        assert_eq!(date_from_day_of_year(2024, 366).unwrap(), date(2024, 12, 31));
        assert_eq!(date_from_day_of_year(2023, 366).unwrap(), date(2024, 1, 1));
        assert_eq!(date_from_day_of_year(2023, 0).unwrap(), date(2022, 12, 31));
    }

    #[test]
    fn days_in_year_counts_leap_days() {
        assert_eq!(days_in_year(2024), 366);
        assert_eq!(days_in_year(2023), 365);
        assert_eq!(days_in_year(1900), 365);
        assert_eq!(days_in_year(2000), 366);
    }

    #[test]
    fn seasons_flip_between_hemispheres() {
        assert_eq!(Season::for_month(4, Hemisphere::North), Some(Season::Spring));
        assert_eq!(Season::for_month(4, Hemisphere::South), Some(Season::Fall));
        assert_eq!(Season::for_month(1, Hemisphere::South), Some(Season::Summer));
        assert_eq!(Season::for_month(13, Hemisphere::North), None);
        assert_eq!(Hemisphere::from_latitude(-33.9), Hemisphere::South);
    }
}
