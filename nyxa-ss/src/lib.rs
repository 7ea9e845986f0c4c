//! nyxa-ss library interface
//!
//! Review & reward self-service: a visitor leaves a 5-star App Store review,
//! uploads a screenshot of it and receives redemption codes once the
//! screenshot is verified.

pub mod api;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use nyxa_common::events::EventBus;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::{ReviewClassifier, SessionRegistry};

/// Event bus capacity
pub const EVENT_BUS_CAPACITY: usize = 100;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// In-memory flow sessions
    pub sessions: SessionRegistry,
    /// Screenshot classifier used for every upload
    pub classifier: Arc<dyn ReviewClassifier>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Request body cap (bytes)
    pub max_request_bytes: usize,
}

impl AppState {
    pub fn new(
        classifier: Arc<dyn ReviewClassifier>,
        event_bus: EventBus,
        max_request_bytes: usize,
    ) -> Self {
        Self {
            sessions: SessionRegistry::new(),
            classifier,
            event_bus,
            startup_time: Utc::now(),
            max_request_bytes,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_request_bytes;

    Router::new()
        // UI routes (HTML pages)
        .merge(api::ui_routes())
        // API routes
        .merge(api::flow_routes())
        .merge(api::reward_routes())
        .merge(api::health_routes())
        .route("/events", axum::routing::get(api::general_event_stream))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
