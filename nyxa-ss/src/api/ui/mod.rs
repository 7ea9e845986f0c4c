//! UI Routes - self-service page for nyxa-ss
//!
//! Single HTML page (vanilla JS, no frameworks). Each flow step is a panel;
//! the script shows the panel for the session's current step.

use axum::{routing::get, Router};
use crate::AppState;

mod self_service;
mod static_assets;

use self_service::self_service_page;
use static_assets::{serve_self_service_css, serve_self_service_js};

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(self_service_page))
        .route("/static/self-service.js", get(serve_self_service_js))
        .route("/static/self-service.css", get(serve_self_service_css))
}
