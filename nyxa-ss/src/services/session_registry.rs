//! In-memory registry of flow sessions
//!
//! Sessions live only in process memory. Idle sessions are dropped by a
//! periodic sweep; a session in Processing is never swept so a classification
//! in flight always has somewhere to land.

use chrono::Utc;
use nyxa_common::events::{EventBus, FlowEvent, FlowStep};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::FlowSession;

/// Interval between idle sweeps
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Reason attached to sessions closed by the idle sweep
pub const IDLE_CLOSE_REASON: &str = "idle_timeout";

/// Shared session map
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, FlowSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and store a fresh session, returning its id
    pub async fn create(&self) -> Uuid {
        let session = FlowSession::new();
        let session_id = session.session_id;
        self.sessions.write().await.insert(session_id, session);
        session_id
    }

    /// Clone of a session, if present
    pub async fn get(&self, session_id: Uuid) -> Option<FlowSession> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    /// Run `f` on a session under the write lock and record activity
    ///
    /// Returns `None` when the session does not exist.
    pub async fn with_session<R>(
        &self,
        session_id: Uuid,
        f: impl FnOnce(&mut FlowSession) -> R,
    ) -> Option<R> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&session_id)?;
        session.touch();
        Some(f(session))
    }

    pub async fn remove(&self, session_id: Uuid) -> Option<FlowSession> {
        self.sessions.write().await.remove(&session_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle for at least `timeout_secs`, skipping Processing
    pub async fn expire_idle(&self, timeout_secs: u64) -> Vec<Uuid> {
        let now = Utc::now();
        let timeout = i64::try_from(timeout_secs).unwrap_or(i64::MAX);
        let mut sessions = self.sessions.write().await;

        let expired: Vec<Uuid> = sessions
            .values()
            .filter(|s| s.state.step() != FlowStep::Processing)
            .filter(|s| s.idle_seconds(now) >= timeout)
            .map(|s| s.session_id)
            .collect();

        for id in &expired {
            sessions.remove(id);
        }
        expired
    }
}

/// Spawn the periodic idle sweep
///
/// Closed sessions are announced on the event bus.
pub fn spawn_idle_sweeper(
    registry: SessionRegistry,
    event_bus: EventBus,
    idle_timeout_secs: u64,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let expired = registry.expire_idle(idle_timeout_secs).await;
            if expired.is_empty() {
                debug!("Idle sweep: nothing to expire");
                continue;
            }

            info!(count = expired.len(), "Expired idle flow sessions");
            for session_id in expired {
                event_bus.emit_lossy(FlowEvent::FlowSessionClosed {
                    session_id,
                    reason: IDLE_CLOSE_REASON.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
    })
}
