//! The fixed set of named graph operations.
//!
//! Each operation maps to a catalog entry: its access mode, the parameters it
//! binds, how it is executed, and the shape of its result. The mode is a
//! property of the entry and never inferred from the Cypher text.

use std::fmt;
use std::str::FromStr;

use flightgraph_core::Params;

use crate::error::GraphError;
use crate::store::{AccessMode, Bindings};

/// Label of airport nodes.
pub const AIRPORT_LABEL: &str = "Airport";

/// Relationship type of connection edges.
pub const CONNECTION_TYPE: &str = "HAS_CONNECTION";

/// A recognized graph operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    GetAirport,
    ListAirports,
    ListAirportsByCountry,
    ListCountries,
    ListOutgoingConnections,
    ListIncomingConnections,
    ListConnections,
    ShortestPath,
    CreateAirport,
    CreateConnection,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::GetAirport,
        Operation::ListAirports,
        Operation::ListAirportsByCountry,
        Operation::ListCountries,
        Operation::ListOutgoingConnections,
        Operation::ListIncomingConnections,
        Operation::ListConnections,
        Operation::ShortestPath,
        Operation::CreateAirport,
        Operation::CreateConnection,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::GetAirport => "get_airport",
            Operation::ListAirports => "list_airports",
            Operation::ListAirportsByCountry => "list_airports_by_country",
            Operation::ListCountries => "list_countries",
            Operation::ListOutgoingConnections => "list_outgoing_connections",
            Operation::ListIncomingConnections => "list_incoming_connections",
            Operation::ListConnections => "list_connections",
            Operation::ShortestPath => "shortest_path",
            Operation::CreateAirport => "create_airport",
            Operation::CreateConnection => "create_connection",
        }
    }

    /// The catalog entry describing this operation.
    pub fn entry(self) -> &'static CatalogEntry {
        match self {
            Operation::GetAirport => &GET_AIRPORT,
            Operation::ListAirports => &LIST_AIRPORTS,
            Operation::ListAirportsByCountry => &LIST_AIRPORTS_BY_COUNTRY,
            Operation::ListCountries => &LIST_COUNTRIES,
            Operation::ListOutgoingConnections => &LIST_OUTGOING,
            Operation::ListIncomingConnections => &LIST_INCOMING,
            Operation::ListConnections => &LIST_CONNECTIONS,
            Operation::ShortestPath => &SHORTEST_PATH,
            Operation::CreateAirport => &CREATE_AIRPORT,
            Operation::CreateConnection => &CREATE_CONNECTION,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| GraphError::UnknownOperation(s.to_string()))
    }
}

/// How a result column is read from a store row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// A string that may be null.
    Text,
    /// An integer aggregate.
    Count,
}

/// A named result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub key: &'static str,
    pub kind: ColumnKind,
}

const fn text(key: &'static str) -> Column {
    Column {
        key,
        kind: ColumnKind::Text,
    }
}

const fn count(key: &'static str) -> Column {
    Column {
        key,
        kind: ColumnKind::Count,
    }
}

/// A Cypher template and the columns it returns, in order.
#[derive(Debug)]
pub struct QueryTemplate {
    pub cypher: &'static str,
    pub columns: &'static [Column],
}

/// How an operation is carried out inside its transaction.
#[derive(Debug)]
pub enum Plan {
    /// A single statement.
    Query(&'static QueryTemplate),
    /// Directed breadth-first search over the airport and connection listings.
    PathSearch,
}

/// The typed result an operation projects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    Airports,
    Countries,
    Connections,
    Path,
    CreatedAirport,
    CreatedConnection,
}

/// A parameter an operation binds by name.
#[derive(Debug)]
pub struct ParamSpec {
    /// Name used both in requests and as the Cypher parameter.
    pub name: &'static str,
    /// Alternative request field names, e.g. the capitalized form fields.
    pub aliases: &'static [&'static str],
    /// Value bound when an optional parameter is absent; `None` makes it required.
    pub default: Option<&'static str>,
}

const fn required(name: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        aliases: &[],
        default: None,
    }
}

/// Everything needed to run one operation.
#[derive(Debug)]
pub struct CatalogEntry {
    pub operation: Operation,
    pub mode: AccessMode,
    pub params: &'static [ParamSpec],
    pub plan: Plan,
    pub shape: ResultShape,
}

impl CatalogEntry {
    /// Bind request parameters by name.
    ///
    /// Fails on the first missing required parameter, before any store work.
    pub fn bind(&self, params: &Params) -> Result<Bindings, GraphError> {
        let mut bindings = Bindings::new();
        for spec in self.params {
            let value = std::iter::once(spec.name)
                .chain(spec.aliases.iter().copied())
                .find_map(|key| params.get(key).cloned())
                .or_else(|| spec.default.map(str::to_string))
                .ok_or(GraphError::MissingParameter {
                    operation: self.operation,
                    param: spec.name,
                })?;
            bindings.insert(spec.name, value);
        }
        Ok(bindings)
    }
}

// ── Query templates ──────────────────────────────────────────────

pub static AIRPORT_BY_NAME: QueryTemplate = QueryTemplate {
    cypher: "MATCH (a:Airport)
             WHERE a.name = $name
             RETURN a.name AS name, a.country AS country
             LIMIT 1",
    columns: &[text("name"), text("country")],
};

pub static ALL_AIRPORTS: QueryTemplate = QueryTemplate {
    cypher: "MATCH (a:Airport)
             RETURN a.name AS name, a.country AS country
             ORDER BY name",
    columns: &[text("name"), text("country")],
};

pub static AIRPORTS_IN_COUNTRY: QueryTemplate = QueryTemplate {
    cypher: "MATCH (a:Airport)
             WHERE a.country = $country
             RETURN a.name AS name, a.country AS country
             ORDER BY name",
    columns: &[text("name"), text("country")],
};

pub static DISTINCT_COUNTRIES: QueryTemplate = QueryTemplate {
    cypher: "MATCH (a:Airport)
             WHERE a.country IS NOT NULL AND a.country <> ''
             RETURN DISTINCT a.country AS country
             ORDER BY country",
    columns: &[text("country")],
};

pub static OUTGOING_NEIGHBORS: QueryTemplate = QueryTemplate {
    cypher: "MATCH (a:Airport {name: $name})-[:HAS_CONNECTION]->(b:Airport)
             RETURN b.name AS name, b.country AS country
             ORDER BY name",
    columns: &[text("name"), text("country")],
};

pub static INCOMING_NEIGHBORS: QueryTemplate = QueryTemplate {
    cypher: "MATCH (a:Airport {name: $name})<-[:HAS_CONNECTION]-(b:Airport)
             RETURN b.name AS name, b.country AS country
             ORDER BY name",
    columns: &[text("name"), text("country")],
};

pub static ALL_CONNECTIONS: QueryTemplate = QueryTemplate {
    cypher: "MATCH (a:Airport)-[:HAS_CONNECTION]->(b:Airport)
             RETURN a.name AS departure, b.name AS destination
             ORDER BY departure, destination",
    columns: &[text("departure"), text("destination")],
};

pub static INSERT_AIRPORT: QueryTemplate = QueryTemplate {
    cypher: "CREATE (a:Airport {name: $name, country: $country})
             RETURN a.name AS name",
    columns: &[text("name")],
};

// A MATCH that finds no endpoint yields zero rows to CREATE from, and
// count() over zero rows still returns a single 0.
pub static INSERT_CONNECTION: QueryTemplate = QueryTemplate {
    cypher: "MATCH (a:Airport {name: $departure})
             MATCH (b:Airport {name: $destination})
             CREATE (a)-[r:HAS_CONNECTION]->(b)
             RETURN count(r) AS created",
    columns: &[count("created")],
};

/// Uniqueness of airport names, created by `GraphClient::ensure_schema`.
pub const AIRPORT_NAME_CONSTRAINT: &str = "CREATE CONSTRAINT airport_name IF NOT EXISTS
     FOR (a:Airport) REQUIRE a.name IS UNIQUE";

// ── Catalog entries ──────────────────────────────────────────────

static GET_AIRPORT: CatalogEntry = CatalogEntry {
    operation: Operation::GetAirport,
    mode: AccessMode::Read,
    params: &[required("name")],
    plan: Plan::Query(&AIRPORT_BY_NAME),
    shape: ResultShape::Airports,
};

static LIST_AIRPORTS: CatalogEntry = CatalogEntry {
    operation: Operation::ListAirports,
    mode: AccessMode::Read,
    params: &[],
    plan: Plan::Query(&ALL_AIRPORTS),
    shape: ResultShape::Airports,
};

static LIST_AIRPORTS_BY_COUNTRY: CatalogEntry = CatalogEntry {
    operation: Operation::ListAirportsByCountry,
    mode: AccessMode::Read,
    params: &[required("country")],
    plan: Plan::Query(&AIRPORTS_IN_COUNTRY),
    shape: ResultShape::Airports,
};

static LIST_COUNTRIES: CatalogEntry = CatalogEntry {
    operation: Operation::ListCountries,
    mode: AccessMode::Read,
    params: &[],
    plan: Plan::Query(&DISTINCT_COUNTRIES),
    shape: ResultShape::Countries,
};

static LIST_OUTGOING: CatalogEntry = CatalogEntry {
    operation: Operation::ListOutgoingConnections,
    mode: AccessMode::Read,
    params: &[required("name")],
    plan: Plan::Query(&OUTGOING_NEIGHBORS),
    shape: ResultShape::Airports,
};

static LIST_INCOMING: CatalogEntry = CatalogEntry {
    operation: Operation::ListIncomingConnections,
    mode: AccessMode::Read,
    params: &[required("name")],
    plan: Plan::Query(&INCOMING_NEIGHBORS),
    shape: ResultShape::Airports,
};

static LIST_CONNECTIONS: CatalogEntry = CatalogEntry {
    operation: Operation::ListConnections,
    mode: AccessMode::Read,
    params: &[],
    plan: Plan::Query(&ALL_CONNECTIONS),
    shape: ResultShape::Connections,
};

static SHORTEST_PATH: CatalogEntry = CatalogEntry {
    operation: Operation::ShortestPath,
    mode: AccessMode::Read,
    params: &[required("departure"), required("destination")],
    plan: Plan::PathSearch,
    shape: ResultShape::Path,
};

static CREATE_AIRPORT: CatalogEntry = CatalogEntry {
    operation: Operation::CreateAirport,
    mode: AccessMode::Write,
    params: &[
        ParamSpec {
            name: "name",
            aliases: &["Name"],
            default: None,
        },
        ParamSpec {
            name: "country",
            aliases: &["Country"],
            default: Some(""),
        },
    ],
    plan: Plan::Query(&INSERT_AIRPORT),
    shape: ResultShape::CreatedAirport,
};

static CREATE_CONNECTION: CatalogEntry = CatalogEntry {
    operation: Operation::CreateConnection,
    mode: AccessMode::Write,
    params: &[required("departure"), required("destination")],
    plan: Plan::Query(&INSERT_CONNECTION),
    shape: ResultShape::CreatedConnection,
};
