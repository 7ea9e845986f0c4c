//! Event system
//!
//! Flow events and the EventBus used to fan them out to SSE clients.

mod flow_types;

pub use flow_types::{FlowStep, Verdict};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Nyxa flow events
///
/// Every event is scoped to one session. Serialized with a `type` tag for SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FlowEvent {
    /// New session created in the Acquisition step
    FlowSessionCreated {
        session_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session moved between steps
    FlowStepChanged {
        session_id: Uuid,
        old_step: FlowStep,
        new_step: FlowStep,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// OCR recognition progress (0-100)
    ClassificationProgress {
        session_id: Uuid,
        percent: u8,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Classification finished with a verdict
    ClassificationCompleted {
        session_id: Uuid,
        verdict: Verdict,
        detected_stars: Option<u8>,
        confidence: f32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session torn down (explicit close or idle expiry)
    FlowSessionClosed {
        session_id: Uuid,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl FlowEvent {
    /// Event type name, used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            FlowEvent::FlowSessionCreated { .. } => "FlowSessionCreated",
            FlowEvent::FlowStepChanged { .. } => "FlowStepChanged",
            FlowEvent::ClassificationProgress { .. } => "ClassificationProgress",
            FlowEvent::ClassificationCompleted { .. } => "ClassificationCompleted",
            FlowEvent::FlowSessionClosed { .. } => "FlowSessionClosed",
        }
    }

    /// Session this event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            FlowEvent::FlowSessionCreated { session_id, .. }
            | FlowEvent::FlowStepChanged { session_id, .. }
            | FlowEvent::ClassificationProgress { session_id, .. }
            | FlowEvent::ClassificationCompleted { session_id, .. }
            | FlowEvent::FlowSessionClosed { session_id, .. } => *session_id,
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use nyxa_common::events::{EventBus, FlowEvent};
/// use uuid::Uuid;
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(FlowEvent::FlowSessionCreated {
///     session_id: Uuid::new_v4(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FlowEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Progress and step notifications are advisory: nobody watching is fine.
    pub fn emit_lossy(&self, event: FlowEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_without_subscribers_is_silent() {
        let bus = EventBus::new(10);
        bus.emit_lossy(FlowEvent::FlowSessionCreated {
            session_id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
        });

        let mut late = bus.subscribe();
        assert!(late.try_recv().is_err());
    }

    #[tokio::test]
    async fn subscriber_receives_step_change() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let session_id = Uuid::new_v4();

        bus.emit_lossy(FlowEvent::FlowStepChanged {
            session_id,
            old_step: FlowStep::Acquisition,
            new_step: FlowStep::Verification,
            timestamp: chrono::Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.session_id(), session_id);
        assert_eq!(event.event_type(), "FlowStepChanged");
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = FlowEvent::ClassificationProgress {
            session_id: Uuid::nil(),
            percent: 40,
            timestamp: chrono::Utc::now(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ClassificationProgress");
        assert_eq!(json["percent"], 40);
    }
}
