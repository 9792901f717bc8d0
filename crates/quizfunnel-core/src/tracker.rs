use std::sync::Arc;

use tracing::{error, info, warn};

use crate::event::{EventType, NewEvent, SESSION_ID_KEY};
use crate::funnel::FunnelStep;
use crate::session::SessionState;
use crate::store::EventStore;

/// What happened to one tracking call.
///
/// Store failures fold into [`TrackOutcome::Dropped`]: analytics must never
/// disturb the funnel, so write errors are logged and swallowed here instead
/// of propagating to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    /// One row was appended to the store.
    Recorded,
    /// The session flag for this category was already set; no insert.
    AlreadyTracked,
    /// The session is marked ignored; no insert.
    Ignored,
    /// The insert failed and the event was dropped. Never retried.
    Dropped,
}

/// Session-scoped event recorder: deduplication flags in front of a
/// fire-and-forget logger.
///
/// One `Tracker` serves one session. Methods take `&mut self` — there is no
/// concurrent in-process mutation to coordinate, suspension happens only at
/// the store-call boundary.
pub struct Tracker {
    store: Arc<dyn EventStore>,
    session: SessionState,
}

impl Tracker {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self::with_session(store, SessionState::new())
    }

    /// Resume an existing session, e.g. when a tab re-renders mid-funnel.
    pub fn with_session(store: Arc<dyn EventStore>, session: SessionState) -> Self {
        Self { store, session }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    /// At most one `visit` row per session.
    pub async fn track_visit(&mut self) -> TrackOutcome {
        if self.session.visited {
            return TrackOutcome::AlreadyTracked;
        }
        self.session.visited = true;
        self.log_event(NewEvent::new(EventType::Visit)).await
    }

    /// Records only the first interaction of the entire session, regardless
    /// of how many screens the user touches — a "did this user engage at
    /// all" signal, not an interaction counter.
    pub async fn track_interaction(&mut self) -> TrackOutcome {
        if self.session.interacted {
            return TrackOutcome::AlreadyTracked;
        }
        self.session.interacted = true;
        self.log_event(NewEvent::new(EventType::Interaction)).await
    }

    /// At most one row per step name per session; distinct steps are
    /// deduplicated independently.
    pub async fn track_step(&mut self, step: FunnelStep) -> TrackOutcome {
        if !self.session.viewed_steps.insert(step) {
            return TrackOutcome::AlreadyTracked;
        }
        self.log_event(NewEvent::step(step)).await
    }

    pub async fn track_sales_page_view(&mut self) -> TrackOutcome {
        if self.session.viewed_sales_page {
            return TrackOutcome::AlreadyTracked;
        }
        self.session.viewed_sales_page = true;
        self.log_event(NewEvent::new(EventType::SalesView)).await
    }

    pub async fn track_checkout(&mut self) -> TrackOutcome {
        if self.session.clicked_checkout {
            return TrackOutcome::AlreadyTracked;
        }
        self.session.clicked_checkout = true;
        self.log_event(NewEvent::new(EventType::Checkout)).await
    }

    /// Append one event row, tagging it with this session's identifier. A
    /// caller-supplied `sessionId` in the metadata is overwritten.
    ///
    /// Callers must have deduplicated already; no precondition is enforced
    /// here. Store failures are logged and swallowed so the public funnel
    /// never blocks or errors visibly over analytics misconfiguration.
    pub async fn log_event(&self, mut event: NewEvent) -> TrackOutcome {
        if self.session.ignored {
            return TrackOutcome::Ignored;
        }
        event.metadata.insert(
            SESSION_ID_KEY.to_string(),
            serde_json::Value::String(self.session.id().to_string()),
        );
        match self.store.insert_event(event).await {
            Ok(()) => TrackOutcome::Recorded,
            Err(e) if e.is_permission_denied() => {
                warn!(
                    error = %e,
                    "analytics insert blocked by store policy; check INSERT permissions for the anonymous role"
                );
                TrackOutcome::Dropped
            }
            Err(e) => {
                error!(error = %e, "analytics insert failed; event dropped");
                TrackOutcome::Dropped
            }
        }
    }

    /// Operator escape hatch: stop tracking this session and purge its
    /// stored history. The purge is best-effort — a denial is logged, not
    /// surfaced.
    pub async fn ignore_session(&mut self) {
        self.session.ignored = true;
        match self.store.delete_session_events(self.session.id()).await {
            Ok(deleted) => info!(deleted, "operator session detected; history purged"),
            Err(e) => warn!(
                error = %e,
                "could not purge operator session history (likely a DELETE policy denial)"
            ),
        }
    }
}
