//! flightgraph-core: Shared types, configuration, and error handling for the flight graph.
//!
//! This crate provides the foundational pieces used by the graph layer and the CLI:
//! - Airport and Connection entities with their wire shape
//! - Configuration management
//! - Request parameter decoding (`key=value&key=value` bodies)
//! - Common error types

pub mod config;
pub mod error;
pub mod form;
pub mod types;

pub use config::FlightConfig;
pub use error::FlightError;
pub use form::{FormDecoding, Params};
pub use types::{Airport, Connection};
