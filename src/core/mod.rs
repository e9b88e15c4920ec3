//! Core data structures for vegetation-index analysis.

mod calendar;
mod sample;
mod time_series;

pub use calendar::{
    date_from_day_of_year, days_in_year, offset_days, DateRange, Hemisphere, Season,
};
pub use sample::{days_of_year, HistoricalRecord, Quality, Sample};
pub use time_series::{SeriesSummary, TimeSeries};
