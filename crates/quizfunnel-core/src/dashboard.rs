use std::sync::Arc;

use tracing::info;

use crate::metrics::{aggregate_daily, totals_in_range, DailyMetric, DateRange, MetricTotals};
use crate::session::SessionState;
use crate::store::{EventStore, StoreError};

/// Only the oldest `EVENT_WINDOW` rows are loaded per refresh; beyond that
/// the newest rows are silently excluded. Accepted approximation for
/// dashboard performance, not a correctness guarantee.
pub const EVENT_WINDOW: u32 = 5000;

/// The literal word the operator must type before the destructive reset is
/// allowed to run.
pub const RESET_CONFIRMATION: &str = "DELETAR";

/// Operator-facing metric view over the hosted event table.
///
/// Metrics are recomputed wholesale on every [`refresh`](Dashboard::refresh)
/// and carry no identity beyond their date key.
pub struct Dashboard {
    store: Arc<dyn EventStore>,
    metrics: Vec<DailyMetric>,
}

impl Dashboard {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            metrics: Vec::new(),
        }
    }

    /// Daily metrics from the last successful refresh, ascending by date.
    pub fn metrics(&self) -> &[DailyMetric] {
        &self.metrics
    }

    /// Re-read the event window and rebuild the daily metrics.
    ///
    /// On failure the previous metrics are left untouched and the error is
    /// returned: unlike the write path, the consumer here is the trusted
    /// operator, so permission denials are surfaced with an actionable
    /// message at the call site.
    pub async fn refresh(&mut self) -> Result<(), StoreError> {
        let rows = self.store.fetch_events(EVENT_WINDOW).await?;
        self.metrics = aggregate_daily(&rows);
        Ok(())
    }

    /// Sum the loaded metrics over an inclusive date range.
    pub fn totals(&self, range: DateRange) -> MetricTotals {
        totals_in_range(&self.metrics, range)
    }

    /// Delete every stored event, then clear the loaded metrics and the
    /// session's dedup flags so a fresh visit is tracked again.
    ///
    /// Irreversible. Callers gate this behind [`RESET_CONFIRMATION`]; a
    /// permission denial comes back as a descriptive error, session and
    /// metrics untouched.
    pub async fn clear_database(
        &mut self,
        session: &mut SessionState,
    ) -> Result<(), StoreError> {
        self.store.delete_all_events().await?;
        session.clear();
        self.metrics.clear();
        info!("event history cleared");
        Ok(())
    }
}
