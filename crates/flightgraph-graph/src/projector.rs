//! Projection of positional store records into domain entities.

use serde::Serialize;

use flightgraph_core::{Airport, Connection};

use crate::catalog::ResultShape;
use crate::error::{GraphError, Result};
use crate::store::{Record, Value};

/// The result of a catalog operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Airports(Vec<Airport>),
    Countries(Vec<String>),
    Connections(Vec<Connection>),
    /// Airports from departure to destination inclusive; empty when there is no path.
    Path(Vec<Airport>),
    Ack(Acknowledgement),
}

/// Acknowledgement of a write operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "ack", rename_all = "snake_case")]
pub enum Acknowledgement {
    /// Carries the key of the created node.
    AirportCreated { name: String },
    /// `created` is false when an endpoint matched no airport.
    ConnectionCreated { created: bool },
}

/// Project records into the outcome for `shape`.
///
/// `ResultShape::Path` is assembled by the path finder, not from records.
pub fn project(shape: ResultShape, records: Vec<Record>) -> Result<Outcome> {
    match shape {
        ResultShape::Airports => airports(records).map(Outcome::Airports),
        ResultShape::Countries => countries(records).map(Outcome::Countries),
        ResultShape::Connections => connections(records).map(Outcome::Connections),
        ResultShape::Path => Err(GraphError::Projection(
            "paths are not projected from records".to_string(),
        )),
        ResultShape::CreatedAirport => {
            let name = match records.first() {
                Some(record) => required_text(record, 0)?,
                None => {
                    return Err(GraphError::Projection(
                        "create returned no node".to_string(),
                    ))
                }
            };
            Ok(Outcome::Ack(Acknowledgement::AirportCreated { name }))
        }
        ResultShape::CreatedConnection => {
            let created = match records.first().and_then(|r| r.get(0)) {
                Some(Value::Integer(n)) => *n > 0,
                None => false,
                Some(other) => {
                    return Err(GraphError::Projection(format!(
                        "expected an edge count, got {other:?}"
                    )))
                }
            };
            Ok(Outcome::Ack(Acknowledgement::ConnectionCreated { created }))
        }
    }
}

/// Field 0 is the name, field 1 (when present and non-null) the country.
pub fn airport(record: &Record) -> Result<Airport> {
    Ok(Airport {
        name: required_text(record, 0)?,
        country: optional_text(record, 1)?,
    })
}

pub fn airports(records: Vec<Record>) -> Result<Vec<Airport>> {
    records.iter().map(airport).collect()
}

pub fn countries(records: Vec<Record>) -> Result<Vec<String>> {
    records.iter().map(|r| required_text(r, 0)).collect()
}

pub fn connections(records: Vec<Record>) -> Result<Vec<Connection>> {
    records
        .iter()
        .map(|r| {
            Ok(Connection {
                departure: required_text(r, 0)?,
                destination: required_text(r, 1)?,
            })
        })
        .collect()
}

fn required_text(record: &Record, index: usize) -> Result<String> {
    match record.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        other => Err(GraphError::Projection(format!(
            "field {index}: expected a string, got {other:?}"
        ))),
    }
}

fn optional_text(record: &Record, index: usize) -> Result<String> {
    match record.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Ok(String::new()),
        Some(other) => Err(GraphError::Projection(format!(
            "field {index}: expected a string, got {other:?}"
        ))),
    }
}
