//! In-memory flow session

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::flow_state::FlowState;

/// One visitor's flow, owned by the session registry
#[derive(Debug, Clone)]
pub struct FlowSession {
    pub session_id: Uuid,
    pub state: FlowState,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    /// Incremented on every accepted upload; a classification result is only
    /// folded back if it still belongs to the current attempt
    pub upload_attempt: u64,
}

impl FlowSession {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            state: FlowState::new(),
            created_at: now,
            last_activity: now,
            upload_attempt: 0,
        }
    }

    /// Record visitor activity
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Seconds since the last recorded activity
    pub fn idle_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_activity).num_seconds()
    }
}

impl Default for FlowSession {
    fn default() -> Self {
        Self::new()
    }
}
