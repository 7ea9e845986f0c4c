//! Static asset handlers for the nyxa-ss UI
//!
//! Embeds and serves CSS/JS files at compile time

use axum::{http::StatusCode, response::{IntoResponse, Response}};

const SELF_SERVICE_JS: &str = include_str!("../../../static/self-service.js");
const SELF_SERVICE_CSS: &str = include_str!("../../../static/self-service.css");

/// GET /static/self-service.js
pub async fn serve_self_service_js() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "application/javascript"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        SELF_SERVICE_JS,
    )
        .into_response()
}

/// GET /static/self-service.css
pub async fn serve_self_service_css() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "text/css"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        SELF_SERVICE_CSS,
    )
        .into_response()
}
