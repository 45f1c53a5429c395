//! Typed read operations.

use flightgraph_core::{Airport, Connection, Params};

use crate::catalog::Operation;
use crate::error::{GraphError, Result};
use crate::executor::SessionExecutor;
use crate::projector::Outcome;
use crate::store::GraphStore;

impl<S: GraphStore> SessionExecutor<S> {
    // ── Single Airport Lookups ───────────────────────────────────

    /// Get an airport by name. `None` when no airport has that name.
    pub async fn get_airport(&self, name: &str) -> Result<Option<Airport>> {
        let airports = self
            .read_airports(Operation::GetAirport, &[("name", name)])
            .await?;
        Ok(airports.into_iter().next())
    }

    /// Get an airport by name, failing with `NotFound` when it does not exist.
    pub async fn airport(&self, name: &str) -> Result<Airport> {
        self.get_airport(name)
            .await?
            .ok_or_else(|| GraphError::NotFound {
                name: name.to_string(),
            })
    }

    // ── List Queries ─────────────────────────────────────────────

    pub async fn list_airports(&self) -> Result<Vec<Airport>> {
        self.read_airports(Operation::ListAirports, &[]).await
    }

    pub async fn list_airports_by_country(&self, country: &str) -> Result<Vec<Airport>> {
        self.read_airports(Operation::ListAirportsByCountry, &[("country", country)])
            .await
    }

    /// Distinct non-empty countries, ordered.
    pub async fn list_countries(&self) -> Result<Vec<String>> {
        match self.execute(Operation::ListCountries, &Params::new()).await? {
            Outcome::Countries(countries) => Ok(countries),
            other => Err(unexpected(Operation::ListCountries, &other)),
        }
    }

    pub async fn list_connections(&self) -> Result<Vec<Connection>> {
        match self.execute(Operation::ListConnections, &Params::new()).await? {
            Outcome::Connections(connections) => Ok(connections),
            other => Err(unexpected(Operation::ListConnections, &other)),
        }
    }

    // ── Neighbor Queries ─────────────────────────────────────────

    /// Airports one outbound connection away, one entry per edge.
    pub async fn list_outgoing_connections(&self, name: &str) -> Result<Vec<Airport>> {
        self.read_airports(Operation::ListOutgoingConnections, &[("name", name)])
            .await
    }

    /// Airports one inbound connection away, one entry per edge.
    pub async fn list_incoming_connections(&self, name: &str) -> Result<Vec<Airport>> {
        self.read_airports(Operation::ListIncomingConnections, &[("name", name)])
            .await
    }

    // ── Path Queries ─────────────────────────────────────────────

    /// Fewest-hop route following connections forward.
    pub async fn shortest_path(&self, departure: &str, destination: &str) -> Result<Vec<Airport>> {
        let params = params(&[("departure", departure), ("destination", destination)]);
        match self.execute(Operation::ShortestPath, &params).await? {
            Outcome::Path(path) => Ok(path),
            other => Err(unexpected(Operation::ShortestPath, &other)),
        }
    }

    async fn read_airports(
        &self,
        operation: Operation,
        pairs: &[(&str, &str)],
    ) -> Result<Vec<Airport>> {
        match self.execute(operation, &params(pairs)).await? {
            Outcome::Airports(airports) => Ok(airports),
            other => Err(unexpected(operation, &other)),
        }
    }
}

pub(crate) fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub(crate) fn unexpected(operation: Operation, outcome: &Outcome) -> GraphError {
    GraphError::Projection(format!("{operation} produced {outcome:?}"))
}
