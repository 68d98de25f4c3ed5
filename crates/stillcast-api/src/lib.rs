//! HTTP surface of the stillcast service.

pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod utils;
