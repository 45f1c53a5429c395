//! Typed write operations.
//!
//! Airports are created with CREATE, not MERGE: a second airport with the same
//! name is rejected by the uniqueness constraint. Connections are never
//! deduplicated.

use crate::catalog::Operation;
use crate::error::Result;
use crate::executor::SessionExecutor;
use crate::projector::{Acknowledgement, Outcome};
use crate::queries::{params, unexpected};
use crate::store::GraphStore;

impl<S: GraphStore> SessionExecutor<S> {
    /// Create an airport, returning its key.
    pub async fn create_airport(&self, name: &str, country: &str) -> Result<String> {
        let params = params(&[("name", name), ("country", country)]);
        match self.execute(Operation::CreateAirport, &params).await? {
            Outcome::Ack(Acknowledgement::AirportCreated { name }) => Ok(name),
            other => Err(unexpected(Operation::CreateAirport, &other)),
        }
    }

    /// Create a `HAS_CONNECTION` edge.
    ///
    /// Returns `false`, without error, when either airport does not exist.
    pub async fn create_connection(&self, departure: &str, destination: &str) -> Result<bool> {
        let params = params(&[("departure", departure), ("destination", destination)]);
        match self.execute(Operation::CreateConnection, &params).await? {
            Outcome::Ack(Acknowledgement::ConnectionCreated { created }) => Ok(created),
            other => Err(unexpected(Operation::CreateConnection, &other)),
        }
    }
}
