//! Daily metric aggregation over the loaded event window.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::event::{EventRow, EventType};

/// Aggregate of all events for one calendar date. Derived on demand from the
/// loaded event window, never persisted; discarded and rebuilt on every
/// refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyMetric {
    pub date: NaiveDate,
    pub visits: u64,
    pub interactions: u64,
    /// Absent key means zero; keys appear lazily as steps are seen.
    pub steps: BTreeMap<String, u64>,
    pub sales_page_views: u64,
    pub checkouts: u64,
}

impl DailyMetric {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            visits: 0,
            interactions: 0,
            steps: BTreeMap::new(),
            sales_page_views: 0,
            checkouts: 0,
        }
    }
}

/// Bucket rows by the calendar-date portion of `created_at` and fold the
/// per-type counters. Output is ascending by date, one entry per distinct
/// date in the window. Unrecognized event types still open their date's
/// bucket but count toward nothing.
pub fn aggregate_daily(rows: &[EventRow]) -> Vec<DailyMetric> {
    let mut days: BTreeMap<NaiveDate, DailyMetric> = BTreeMap::new();
    for row in rows {
        let date = row.created_at.date_naive();
        let day = days.entry(date).or_insert_with(|| DailyMetric::new(date));
        match row.event_type {
            EventType::Visit => day.visits += 1,
            EventType::Interaction => day.interactions += 1,
            EventType::Step => {
                if let Some(step) = &row.step_name {
                    *day.steps.entry(step.clone()).or_insert(0) += 1;
                }
            }
            EventType::SalesView => day.sales_page_views += 1,
            EventType::Checkout => day.checkouts += 1,
            EventType::Unknown => {}
        }
    }
    days.into_values().collect()
}

/// Inclusive calendar-date range. `None` on either end leaves that end open.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// Sum of every daily counter across a filtered window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricTotals {
    pub visits: u64,
    pub interactions: u64,
    pub steps: BTreeMap<String, u64>,
    pub sales_page_views: u64,
    pub checkouts: u64,
}

pub fn totals_in_range(metrics: &[DailyMetric], range: DateRange) -> MetricTotals {
    let mut total = MetricTotals::default();
    for day in metrics.iter().filter(|m| range.contains(m.date)) {
        total.visits += day.visits;
        total.interactions += day.interactions;
        total.sales_page_views += day.sales_page_views;
        total.checkouts += day.checkouts;
        for (step, count) in &day.steps {
            *total.steps.entry(step.clone()).or_insert(0) += count;
        }
    }
    total
}

/// Share of `value` in `total` as a whole percentage, rounded to nearest.
/// Defined as 0 when `total` is 0 so funnel rows render before any visits
/// exist.
pub fn percentage(value: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    ((value as f64 / total as f64) * 100.0).round() as u64
}
