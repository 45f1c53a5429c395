//! Error types for the flightgraph-graph crate.

use thiserror::Error;

use crate::catalog::Operation;
use crate::store::StoreError;

/// Errors from graph operations.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Missing parameter `{param}` for {operation}")]
    MissingParameter {
        operation: Operation,
        param: &'static str,
    },

    /// The store rejected or failed to execute the transaction.
    #[error("Store execution error: {0}")]
    Store(#[from] StoreError),

    #[error("Airport not found: {name}")]
    NotFound { name: String },

    #[error("Projection error: {0}")]
    Projection(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
