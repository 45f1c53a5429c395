//! Flightgraph Graph — transactional query layer for the airport connection graph.
//!
//! Every graph read and write flows through a [`SessionExecutor`]: it resolves
//! the operation in the fixed query catalog, binds parameters, opens a session
//! on the store, runs one transaction in the operation's mode, and projects the
//! records into airports, countries, connections, or a write acknowledgement.
//!
//! Two stores implement the contract: [`GraphClient`] (Neo4j over Bolt) and
//! [`MemoryStore`] (in-process).

pub mod catalog;
pub mod client;
pub mod error;
pub mod executor;
pub mod memory;
pub mod mutations;
pub mod pathfind;
pub mod projector;
pub mod queries;
pub mod store;

pub use catalog::Operation;
pub use client::{GraphClient, GraphConfig};
pub use error::GraphError;
pub use executor::{RetryPolicy, SessionExecutor};
pub use memory::MemoryStore;
pub use projector::{Acknowledgement, Outcome};
pub use store::{AccessMode, GraphStore, StoreError};
