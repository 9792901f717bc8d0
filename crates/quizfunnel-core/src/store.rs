//! Event store abstraction.

use async_trait::async_trait;
use thiserror::Error;

use crate::event::{EventRow, NewEvent};

/// Errors reported by an [`EventStore`] implementation.
///
/// Permission denials get their own variant because handling differs by
/// path: the tracker swallows them with a warning so the public funnel is
/// never disrupted, while the dashboard surfaces them to the operator with a
/// hint about the store's access policies.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's access-control policy rejected the call (e.g. row-level
    /// security denying the anonymous role).
    #[error("permission denied by store policy: {0}")]
    PermissionDenied(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("store rejected request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::PermissionDenied(_))
    }
}

/// The hosted event table, reduced to the operations the funnel needs.
///
/// Rows are append-only: inserted by the tracker, read back by the
/// dashboard, and removed only by the session purge or the destructive
/// reset. There is no retry policy anywhere — a failed call is reported once
/// and dropped.
#[async_trait]
pub trait EventStore: Send + Sync + 'static {
    /// Append one event row. The store assigns `id` and `created_at`.
    async fn insert_event(&self, event: NewEvent) -> Result<(), StoreError>;

    /// Fetch up to `limit` rows ordered ascending by creation time. When
    /// more rows exist than the limit, the newest are silently excluded.
    async fn fetch_events(&self, limit: u32) -> Result<Vec<EventRow>, StoreError>;

    /// Delete every row whose metadata `sessionId` equals `session_id`.
    /// Returns the number of rows removed.
    async fn delete_session_events(&self, session_id: &str) -> Result<u64, StoreError>;

    /// Delete every row unconditionally. Irreversible; there is no
    /// soft-delete or undo.
    async fn delete_all_events(&self) -> Result<(), StoreError>;
}
