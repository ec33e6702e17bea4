//! Calendar aggregation and derived statistics
//!
//! Groups finished sessions into weekly, monthly, and yearly buckets of
//! per-subject hours, renders chart-ready slot series, and computes the
//! dashboard summary numbers. Everything here is a pure function over
//! the stored collection.

pub mod calendar;
pub mod charts;
pub mod stats;


pub use calendar::{
    days_in_month, week_bounds, week_of_year, weekday_index, Granularity, PeriodKey,
    MONTH_LABELS, WEEKDAY_LABELS,
};
pub use charts::{
    available_periods, available_years, bucket_by_period, build_chart, PeriodChart,
    PeriodSelection, SlotSeries,
};
pub use stats::{
    average_session_hours, current_streak, total_sessions, total_study_hours, StudySummary,
};
