//! Chart-ready aggregation over the stored collection
//!
//! Groups sessions into calendar buckets and renders one selected period
//! as a series with every slot present, the shape the dashboard charts
//! consume directly.

use super::calendar::{
    days_in_month, week_bounds, weekday_index, Granularity, PeriodKey, MONTH_LABELS,
    WEEKDAY_LABELS,
};
use crate::models::StoredSession;
use chrono::Datelike;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Hours accumulated per subject within one chart slot
#[derive(Debug, Clone, Default)]
pub struct SlotSeries {
    /// Slot label: weekday, day of month, or month
    pub label: String,

    /// Fractional hours keyed by subject
    pub hours_by_subject: HashMap<String, f64>,
}

impl SlotSeries {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            hours_by_subject: HashMap::new(),
        }
    }

    fn add(&mut self, subject: &str, hours: f64) {
        *self
            .hours_by_subject
            .entry(subject.to_string())
            .or_insert(0.0) += hours;
    }

    /// Total hours across subjects
    pub fn total_hours(&self) -> f64 {
        self.hours_by_subject.values().sum()
    }

    /// Hours for one subject, zero when absent
    pub fn hours_for(&self, subject: &str) -> f64 {
        self.hours_by_subject.get(subject).copied().unwrap_or(0.0)
    }

    /// Whether nothing landed in this slot
    pub fn is_empty(&self) -> bool {
        self.hours_by_subject.is_empty()
    }
}

/// One rendered period with every slot present, even when empty
#[derive(Debug, Clone)]
pub struct PeriodChart {
    pub granularity: Granularity,
    pub key: PeriodKey,

    /// Human label: "6/3 - 6/9" for a week, "Jun 2024", or "2024"
    pub label: String,

    /// Weekday, day-of-month, or month slots in calendar order
    pub slots: Vec<SlotSeries>,

    /// Distinct subjects across the whole collection, sorted (legend)
    pub subjects: Vec<String>,
}

impl PeriodChart {
    /// Total hours in the rendered period
    pub fn total_hours(&self) -> f64 {
        self.slots.iter().map(|s| s.total_hours()).sum()
    }
}

/// Pinned chart position
///
/// `None` means "most recent available". Pinning a different year drops
/// the sub-period pin, mirroring how the year dropdown resets the week
/// or month dropdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodSelection {
    pub year: Option<i32>,
    pub period: Option<u32>,
}

impl PeriodSelection {
    /// Follow the most recent available period
    pub fn latest() -> Self {
        Self::default()
    }

    pub fn pin_year(&mut self, year: i32) {
        if self.year != Some(year) {
            self.period = None;
        }
        self.year = Some(year);
    }

    pub fn pin_period(&mut self, period: u32) {
        self.period = Some(period);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Group sessions into calendar buckets by their UTC start time
pub fn bucket_by_period(
    sessions: &[StoredSession],
    granularity: Granularity,
) -> BTreeMap<PeriodKey, Vec<&StoredSession>> {
    let mut buckets: BTreeMap<PeriodKey, Vec<&StoredSession>> = BTreeMap::new();
    for session in sessions {
        let key = PeriodKey::for_start(session.start_time, granularity);
        buckets.entry(key).or_default().push(session);
    }
    buckets
}

/// Distinct session years, ascending
pub fn available_years(sessions: &[StoredSession]) -> Vec<i32> {
    let years: BTreeSet<i32> = sessions.iter().map(|s| s.start_time.year()).collect();
    years.into_iter().collect()
}

/// Distinct sub-periods (weeks or months) within a year, ascending
pub fn available_periods(
    sessions: &[StoredSession],
    granularity: Granularity,
    year: i32,
) -> Vec<u32> {
    bucket_by_period(sessions, granularity)
        .keys()
        .filter(|key| key.year() == year)
        .filter_map(|key| key.sub_period())
        .collect()
}

/// Build the chart for the selected period
///
/// Unpinned parts of the selection, and pins pointing at buckets that no
/// longer exist, fall back to the most recent available period. Returns
/// `None` for an empty collection.
pub fn build_chart(
    sessions: &[StoredSession],
    granularity: Granularity,
    selection: PeriodSelection,
) -> Option<PeriodChart> {
    let buckets = bucket_by_period(sessions, granularity);
    if buckets.is_empty() {
        return None;
    }

    let years = available_years(sessions);
    let year = selection
        .year
        .filter(|y| years.contains(y))
        .or_else(|| years.last().copied())?;

    let key = match granularity {
        Granularity::Yearly => PeriodKey::Year { year },
        Granularity::Weekly | Granularity::Monthly => {
            let periods = available_periods(sessions, granularity, year);
            let period = selection
                .period
                .filter(|p| periods.contains(p))
                .or_else(|| periods.last().copied())?;
            if granularity == Granularity::Weekly {
                PeriodKey::Week { year, week: period }
            } else {
                PeriodKey::Month { year, month: period }
            }
        }
    };

    let mut slots = build_slots(&key);
    if let Some(in_bucket) = buckets.get(&key) {
        for session in in_bucket {
            let index = slot_index(&key, session);
            if let Some(series) = slots.get_mut(index) {
                series.add(&session.subject, session.duration_hours());
            }
        }
    }

    let subjects: Vec<String> = sessions
        .iter()
        .map(|s| s.subject.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    Some(PeriodChart {
        granularity,
        key,
        label: chart_label(&key),
        slots,
        subjects,
    })
}

/// All-empty slots for a period: 7 weekdays, N month days, or 12 months
fn build_slots(key: &PeriodKey) -> Vec<SlotSeries> {
    match key {
        PeriodKey::Week { .. } => WEEKDAY_LABELS
            .iter()
            .map(|label| SlotSeries::new(*label))
            .collect(),
        PeriodKey::Month { year, month } => (1..=days_in_month(*year, *month))
            .map(|day| SlotSeries::new(day.to_string()))
            .collect(),
        PeriodKey::Year { .. } => MONTH_LABELS
            .iter()
            .map(|label| SlotSeries::new(*label))
            .collect(),
    }
}

fn slot_index(key: &PeriodKey, session: &StoredSession) -> usize {
    let date = session.start_time.date_naive();
    match key {
        PeriodKey::Week { .. } => weekday_index(date),
        PeriodKey::Month { .. } => date.day() as usize - 1,
        PeriodKey::Year { .. } => date.month() as usize - 1,
    }
}

fn chart_label(key: &PeriodKey) -> String {
    match key {
        PeriodKey::Week { year, week } => match week_bounds(*year, *week) {
            Some((monday, sunday)) => format!(
                "{}/{} - {}/{}",
                monday.month(),
                monday.day(),
                sunday.month(),
                sunday.day()
            ),
            None => key.to_string(),
        },
        PeriodKey::Month { year, month } => {
            let name = MONTH_LABELS
                .get(*month as usize - 1)
                .copied()
                .unwrap_or("?");
            format!("{} {}", name, year)
        }
        PeriodKey::Year { year } => year.to_string(),
    }
}
