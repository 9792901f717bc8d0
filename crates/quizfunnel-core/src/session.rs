use std::collections::BTreeSet;

use crate::funnel::FunnelStep;

/// Per-session deduplication flags, modelled as an explicit struct instead
/// of ambient browser storage so tracking stays testable headlessly.
///
/// One instance lives for one session (one browser tab in the original
/// funnel). Each flag means "already recorded — suppress further inserts of
/// this category this session". Two simultaneous sessions own independent
/// state and may each record their own first visit.
#[derive(Debug, Clone)]
pub struct SessionState {
    id: String,
    pub visited: bool,
    pub interacted: bool,
    pub viewed_steps: BTreeSet<FunnelStep>,
    pub viewed_sales_page: bool,
    pub clicked_checkout: bool,
    /// Set through the operator entry point; suppresses every future insert
    /// for this session.
    pub ignored: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            id: generate_session_id(),
            visited: false,
            interacted: false,
            viewed_steps: BTreeSet::new(),
            viewed_sales_page: false,
            clicked_checkout: false,
            ignored: false,
        }
    }

    /// Generated once per session lifetime, never rotated within it.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Reset every flag and rotate the identifier, as clearing the browser's
    /// session storage would. A subsequent visit is tracked as new.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Random entropy combined with the current time, for uniqueness across
/// concurrently opened sessions.
pub fn generate_session_id() -> String {
    let entropy: u64 = rand::random();
    format!("{:016x}{:x}", entropy, chrono::Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        let a = SessionState::new();
        let b = SessionState::new();
        assert_ne!(a.id(), b.id());
        assert!(a.id().len() > 16);
    }

    #[test]
    fn clear_resets_flags_and_rotates_id() {
        let mut session = SessionState::new();
        let old_id = session.id().to_string();
        session.visited = true;
        session.interacted = true;
        session.viewed_steps.insert(FunnelStep::Name);
        session.ignored = true;

        session.clear();

        assert!(!session.visited);
        assert!(!session.interacted);
        assert!(session.viewed_steps.is_empty());
        assert!(!session.ignored);
        assert_ne!(session.id(), old_id);
    }
}
