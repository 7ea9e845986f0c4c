//! # Nyxa Common Library
//!
//! Shared code for the Nyxa self-service microsite including:
//! - Error types
//! - Configuration loading and resolution
//! - Flow event types and the broadcast EventBus
//! - SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
