use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};

use quizfunnel_core::dashboard::Dashboard;
use quizfunnel_core::event::{EventRow, EventType, Metadata, NewEvent};
use quizfunnel_core::metrics::DateRange;
use quizfunnel_core::store::{EventStore, StoreError};
use quizfunnel_core::tracker::{TrackOutcome, Tracker};
use quizfunnel_supabase::MemoryStore;

fn row(date: &str, event_type: EventType, step: Option<&str>) -> EventRow {
    let date: NaiveDate = date.parse().expect("date");
    EventRow {
        id: uuid::Uuid::new_v4().to_string(),
        created_at: Utc.from_utc_datetime(&date.and_hms_opt(9, 15, 0).expect("time")),
        event_type,
        step_name: step.map(str::to_string),
        metadata: Metadata::new(),
    }
}

fn date(s: &str) -> NaiveDate {
    s.parse().expect("date")
}

#[tokio::test]
async fn refresh_buckets_events_by_calendar_date() {
    let store = Arc::new(MemoryStore::new());
    store.push_row(row("2026-02-10", EventType::Visit, None)).await;
    store
        .push_row(row("2026-02-10", EventType::Checkout, None))
        .await;
    store.push_row(row("2026-02-11", EventType::Visit, None)).await;

    let mut dashboard = Dashboard::new(store);
    dashboard.refresh().await.expect("refresh");

    let metrics = dashboard.metrics();
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0].date, date("2026-02-10"));
    assert_eq!(metrics[0].visits, 1);
    assert_eq!(metrics[0].checkouts, 1);
    assert_eq!(metrics[1].date, date("2026-02-11"));
    assert_eq!(metrics[1].visits, 1);
    assert_eq!(metrics[1].checkouts, 0);
}

#[tokio::test]
async fn start_date_filter_excludes_earlier_buckets() {
    let store = Arc::new(MemoryStore::new());
    store.push_row(row("2026-02-10", EventType::Visit, None)).await;
    store
        .push_row(row("2026-02-10", EventType::Checkout, None))
        .await;
    store.push_row(row("2026-02-11", EventType::Visit, None)).await;

    let mut dashboard = Dashboard::new(store);
    dashboard.refresh().await.expect("refresh");

    let total = dashboard.totals(DateRange {
        start: Some(date("2026-02-11")),
        end: None,
    });
    assert_eq!(total.visits, 1);
    assert_eq!(total.checkouts, 0);
}

#[tokio::test]
async fn totals_fold_steps_across_the_range() {
    let store = Arc::new(MemoryStore::new());
    store
        .push_row(row("2026-02-10", EventType::Step, Some("name")))
        .await;
    store
        .push_row(row("2026-02-11", EventType::Step, Some("name")))
        .await;
    store
        .push_row(row("2026-02-11", EventType::Step, Some("transition")))
        .await;

    let mut dashboard = Dashboard::new(store);
    dashboard.refresh().await.expect("refresh");

    let total = dashboard.totals(DateRange::default());
    assert_eq!(total.steps.get("name"), Some(&2));
    assert_eq!(total.steps.get("transition"), Some(&1));
}

#[tokio::test]
async fn fetch_window_drops_the_newest_overflow_rows() {
    let store = Arc::new(MemoryStore::new());
    store.push_row(row("2026-02-10", EventType::Visit, None)).await;
    store.push_row(row("2026-02-11", EventType::Visit, None)).await;
    store.push_row(row("2026-02-12", EventType::Visit, None)).await;

    let rows = store.fetch_events(2).await.expect("fetch");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].created_at.date_naive(), date("2026-02-10"));
    assert_eq!(rows[1].created_at.date_naive(), date("2026-02-11"));
}

#[tokio::test]
async fn clear_database_empties_store_metrics_and_session() {
    let store = Arc::new(MemoryStore::new());
    let backend = Arc::clone(&store) as Arc<dyn EventStore>;
    let mut tracker = Tracker::new(Arc::clone(&backend));
    let mut dashboard = Dashboard::new(backend);

    tracker.track_visit().await;
    dashboard.refresh().await.expect("refresh");
    assert_eq!(dashboard.metrics().len(), 1);

    dashboard
        .clear_database(tracker.session_mut())
        .await
        .expect("clear");

    assert!(store.is_empty().await);
    assert!(dashboard.metrics().is_empty());
    // Flags were reset: the same tab inserts again.
    assert_eq!(tracker.track_visit().await, TrackOutcome::Recorded);
    assert_eq!(store.len().await, 1);
}

/// Delegating store whose reads can be flipped to fail, for asserting that a
/// failed refresh never corrupts the loaded metrics.
struct FlakyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_reads: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl EventStore for FlakyStore {
    async fn insert_event(&self, event: NewEvent) -> Result<(), StoreError> {
        self.inner.insert_event(event).await
    }

    async fn fetch_events(&self, limit: u32) -> Result<Vec<EventRow>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::PermissionDenied(
                "permission denied for table analytics_events".to_string(),
            ));
        }
        self.inner.fetch_events(limit).await
    }

    async fn delete_session_events(&self, session_id: &str) -> Result<u64, StoreError> {
        self.inner.delete_session_events(session_id).await
    }

    async fn delete_all_events(&self) -> Result<(), StoreError> {
        self.inner.delete_all_events().await
    }
}

#[tokio::test]
async fn failed_refresh_leaves_previous_metrics_untouched() {
    let store = Arc::new(FlakyStore::new());
    store
        .inner
        .push_row(row("2026-02-10", EventType::Visit, None))
        .await;

    let mut dashboard = Dashboard::new(Arc::clone(&store) as Arc<dyn EventStore>);
    dashboard.refresh().await.expect("first refresh");
    assert_eq!(dashboard.metrics().len(), 1);

    store.fail_reads.store(true, Ordering::SeqCst);
    let err = dashboard.refresh().await.expect_err("second refresh fails");
    assert!(err.is_permission_denied());
    assert_eq!(dashboard.metrics().len(), 1, "no partial overwrite");
    assert_eq!(dashboard.metrics()[0].visits, 1);
}
