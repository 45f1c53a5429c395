//! Domain entities of the flight connection graph.
//!
//! Field names serialize in the capitalized form the rendering layer consumes
//! (`Name`, `Country`, `Departure`, `Destination`).

use serde::{Deserialize, Serialize};

/// An airport node. `name` is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Airport {
    #[serde(rename = "Name")]
    pub name: String,
    /// Empty when the airport was created without a country.
    #[serde(rename = "Country", default)]
    pub country: String,
}

impl Airport {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
        }
    }
}

/// A directed `HAS_CONNECTION` edge between two airports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    #[serde(rename = "Departure")]
    pub departure: String,
    #[serde(rename = "Destination")]
    pub destination: String,
}

impl Connection {
    pub fn new(departure: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            departure: departure.into(),
            destination: destination.into(),
        }
    }
}
