use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::funnel::FunnelStep;

/// Open key-value bag attached to every event. The tracker always injects a
/// [`SESSION_ID_KEY`] entry; everything else is caller-supplied and opaque to
/// the aggregator.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metadata key carrying the writer's session identifier, kept for
/// traceability and retroactive session deletion.
pub const SESSION_ID_KEY: &str = "sessionId";

/// The closed set of tracked occurrence kinds.
///
/// Rows written with any other value deserialize to [`EventType::Unknown`]
/// and are skipped by aggregation instead of failing the whole load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Visit,
    Interaction,
    Step,
    SalesView,
    Checkout,
    Unknown,
}

impl EventType {
    pub fn parse(raw: &str) -> EventType {
        match raw {
            "visit" => EventType::Visit,
            "interaction" => EventType::Interaction,
            "step" => EventType::Step,
            "sales_view" => EventType::SalesView,
            "checkout" => EventType::Checkout,
            _ => EventType::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(EventType::parse(&raw))
    }
}

/// The insert payload for one tracked occurrence. The store assigns `id` and
/// `created_at` on write.
#[derive(Debug, Clone, Serialize)]
pub struct NewEvent {
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_name: Option<FunnelStep>,
    pub metadata: Metadata,
}

impl NewEvent {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            step_name: None,
            metadata: Metadata::new(),
        }
    }

    pub fn step(step: FunnelStep) -> Self {
        Self {
            event_type: EventType::Step,
            step_name: Some(step),
            metadata: Metadata::new(),
        }
    }
}

/// The stored version of an event — mirrors the `analytics_events` table
/// columns. Immutable once written; only inserted or bulk-deleted.
///
/// `step_name` stays a free-form string on the read side: the aggregator
/// buckets whatever the table holds without validating against
/// [`FunnelStep`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRow {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub event_type: EventType,
    pub step_name: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl EventRow {
    /// The session that produced this row, if the writer tagged one.
    pub fn session_id(&self) -> Option<&str> {
        self.metadata.get(SESSION_ID_KEY).and_then(|v| v.as_str())
    }
}
