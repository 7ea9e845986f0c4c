//! Server-Sent Events (SSE) for flow progress streaming
//!
//! Each page subscribes to its own session's stream. Step changes and
//! classification progress arrive here instead of being polled.

use crate::{error::ApiError, AppState};
use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use nyxa_common::events::FlowEvent;
use nyxa_common::sse::{create_heartbeat_sse_stream, keep_alive, HEARTBEAT_INTERVAL};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// GET /events - connection status heartbeat
pub async fn general_event_stream() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    create_heartbeat_sse_stream("nyxa-ss")
}

/// GET /flow/{session_id}/events - SSE event stream for one session
///
/// Streams events:
/// - FlowStepChanged
/// - ClassificationProgress
/// - ClassificationCompleted
/// - FlowSessionClosed (stream ends afterwards)
pub async fn flow_event_stream(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    if state.sessions.get(session_id).await.is_none() {
        return Err(ApiError::NotFound(format!(
            "Flow session not found: {}",
            session_id
        )));
    }

    info!(session_id = %session_id, "New SSE client connected to flow events");

    // Subscribe to event broadcast
    let mut rx = state.event_bus.subscribe();

    let stream = async_stream::stream! {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                received = rx.recv() => {
                    let event = match received {
                        Ok(event) => event,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(session_id = %session_id, skipped, "SSE: Subscriber lagged");
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };

                    // Filter for this session's events only
                    if event.session_id() != session_id {
                        continue;
                    }

                    let event_type = event.event_type();
                    match serde_json::to_string(&event) {
                        Ok(event_json) => {
                            debug!("SSE: Broadcasting flow event: {}", event_type);
                            yield Ok(Event::default().event(event_type).data(event_json));
                        }
                        Err(e) => {
                            warn!("SSE: Failed to serialize event {}: {}", event_type, e);
                        }
                    }

                    if matches!(event, FlowEvent::FlowSessionClosed { .. }) {
                        info!(session_id = %session_id, "SSE: Session closed, ending stream");
                        break;
                    }
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(keep_alive()))
}
