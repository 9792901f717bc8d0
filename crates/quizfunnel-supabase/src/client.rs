use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use quizfunnel_core::config::Config;
use quizfunnel_core::event::{EventRow, NewEvent};
use quizfunnel_core::store::{EventStore, StoreError};

const TABLE: &str = "analytics_events";

/// Impossible row id used to express "delete everything" through PostgREST,
/// which refuses a bare DELETE with no filter at all.
const NIL_UUID: &str = "00000000-0000-0000-0000-000000000000";

/// Thin client for the hosted Postgres store, speaking its PostgREST surface
/// with the anonymous-role key on every request.
///
/// No retries, no timeouts beyond the HTTP client's defaults: a failed call
/// is reported once as a [`StoreError`] and the caller decides whether the
/// operator should see it.
pub struct SupabaseStore {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

/// PostgREST error body. `code` distinguishes policy denials (`42501`,
/// `PGRST301`) from everything else.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl SupabaseStore {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.store_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TABLE)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
    }

    /// Map a non-success response to the typed error, reading the PostgREST
    /// error body when one is present.
    async fn error_from_response(resp: reqwest::Response) -> StoreError {
        let status = resp.status();
        let body: PostgrestError = resp.json().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
            || body.code == "42501"
            || body.code == "PGRST301"
        {
            let message = if body.message.is_empty() {
                status.to_string()
            } else {
                body.message
            };
            StoreError::PermissionDenied(message)
        } else {
            StoreError::Api {
                status: status.as_u16(),
                message: body.message,
            }
        }
    }
}

#[async_trait]
impl EventStore for SupabaseStore {
    async fn insert_event(&self, event: NewEvent) -> Result<(), StoreError> {
        let resp = self
            .authed(self.http.post(self.table_url()))
            .header("Prefer", "return=minimal")
            .json(&event)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(resp).await)
        }
    }

    async fn fetch_events(&self, limit: u32) -> Result<Vec<EventRow>, StoreError> {
        let limit = limit.to_string();
        let resp = self
            .authed(self.http.get(self.table_url()))
            .query(&[
                ("select", "*"),
                ("order", "created_at.asc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }
        let rows: Vec<EventRow> = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        debug!(count = rows.len(), "event window fetched");
        Ok(rows)
    }

    async fn delete_session_events(&self, session_id: &str) -> Result<u64, StoreError> {
        // PostgREST `cs` (contains) on the jsonb column matches rows whose
        // metadata includes this sessionId.
        let filter = format!("cs.{}", json!({ "sessionId": session_id }));
        let resp = self
            .authed(self.http.delete(self.table_url()))
            .query(&[("metadata", filter.as_str())])
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }
        let deleted: Vec<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(deleted.len() as u64)
    }

    async fn delete_all_events(&self) -> Result<(), StoreError> {
        let filter = format!("neq.{NIL_UUID}");
        let resp = self
            .authed(self.http.delete(self.table_url()))
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=minimal")
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(resp).await)
        }
    }
}
