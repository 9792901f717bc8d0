use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use quizfunnel_core::event::{EventRow, NewEvent};
use quizfunnel_core::store::{EventStore, StoreError};

/// In-process store with the same contract as
/// [`SupabaseStore`](crate::SupabaseStore): store-assigned ids and
/// timestamps, ascending capped reads, metadata-based session deletes.
///
/// Data is discarded on drop. Intended for tests and offline development.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<EventRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a fully formed row, bypassing id and timestamp assignment, so
    /// tests can stage histories at fixed dates.
    pub async fn push_row(&self, row: EventRow) {
        let mut rows = self.rows.lock().await;
        rows.push(row);
        rows.sort_by_key(|r| r.created_at);
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }

    pub async fn rows(&self) -> Vec<EventRow> {
        self.rows.lock().await.clone()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert_event(&self, event: NewEvent) -> Result<(), StoreError> {
        let row = EventRow {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            event_type: event.event_type,
            step_name: event.step_name.map(|s| s.as_str().to_string()),
            metadata: event.metadata,
        };
        self.rows.lock().await.push(row);
        Ok(())
    }

    async fn fetch_events(&self, limit: u32) -> Result<Vec<EventRow>, StoreError> {
        let rows = self.rows.lock().await;
        let mut out = rows.clone();
        out.sort_by_key(|r| r.created_at);
        out.truncate(limit as usize);
        Ok(out)
    }

    async fn delete_session_events(&self, session_id: &str) -> Result<u64, StoreError> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|r| r.session_id() != Some(session_id));
        Ok((before - rows.len()) as u64)
    }

    async fn delete_all_events(&self) -> Result<(), StoreError> {
        self.rows.lock().await.clear();
        Ok(())
    }
}
