//! Core types for the stillcast service: configuration, the unified error
//! taxonomy, and the domain models shared by the processing and API crates.

pub mod config;
pub mod error;
pub mod models;

pub use config::{Config, EncodeSettings, FetchStrategy};
pub use error::{AppError, ErrorMetadata, LogLevel};
