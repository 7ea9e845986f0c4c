//! HTTP API handlers for nyxa-ss
//!
//! REST endpoints drive the flow; SSE streams push step changes and
//! classification progress to the page.

pub mod flow;
pub mod health;
pub mod rewards;
pub mod sse;
pub mod ui;

pub use flow::flow_routes;
pub use health::health_routes;
pub use rewards::reward_routes;
pub use sse::{flow_event_stream, general_event_stream};
pub use ui::ui_routes;
