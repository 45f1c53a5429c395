//! Neo4j connection management and the Bolt-backed graph store.

use async_trait::async_trait;
use neo4rs::{
    query, ConfigBuilder, Graph, Neo4jClientErrorKind, Neo4jErrorKind, Neo4jSecurityErrorKind,
    Query, Row, Txn,
};

use flightgraph_core::config::Neo4jSettings;

use crate::catalog::{Column, ColumnKind, AIRPORT_NAME_CONSTRAINT};
use crate::error::GraphError;
use crate::store::{
    AccessMode, GraphStore, Record, Statement, StoreError, StoreSession, StoreTransaction, Value,
};

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::from(&Neo4jSettings::default())
    }
}

impl From<&Neo4jSettings> for GraphConfig {
    fn from(settings: &Neo4jSettings) -> Self {
        Self {
            uri: settings.uri.clone(),
            user: settings.user.clone(),
            password: settings.password.clone(),
            max_connections: settings.max_connections,
            fetch_size: settings.fetch_size,
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration and make sure the airport
    /// name constraint exists, so every client enforces unique names.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        let client = Self { graph };
        client.ensure_schema().await?;
        Ok(client)
    }

    /// Create the airport name uniqueness constraint if it is missing. Idempotent.
    pub async fn ensure_schema(&self) -> Result<(), GraphError> {
        self.graph
            .run(query(AIRPORT_NAME_CONSTRAINT))
            .await
            .map_err(StoreError::from)?;
        tracing::info!("Airport name constraint in place");
        Ok(())
    }

    /// Execute a statement outside the catalog, e.g. test fixture cleanup.
    pub async fn run(&self, query: Query) -> Result<(), GraphError> {
        self.graph.run(query).await.map_err(StoreError::from)?;
        Ok(())
    }
}

#[async_trait]
impl GraphStore for GraphClient {
    type Session = Neo4jSession;

    async fn open_session(&self) -> Result<Neo4jSession, StoreError> {
        Ok(Neo4jSession {
            graph: self.graph.clone(),
        })
    }
}

/// A session over the shared Bolt pool. Each transaction checks out its own
/// pooled connection, which returns to the pool when the transaction ends.
pub struct Neo4jSession {
    graph: Graph,
}

#[async_trait]
impl StoreSession for Neo4jSession {
    type Transaction = Neo4jTransaction;

    async fn begin(&mut self, mode: AccessMode) -> Result<Neo4jTransaction, StoreError> {
        let txn = self.graph.start_txn().await?;
        Ok(Neo4jTransaction { txn, mode })
    }

    async fn close(self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub struct Neo4jTransaction {
    txn: Txn,
    mode: AccessMode,
}

#[async_trait]
impl StoreTransaction for Neo4jTransaction {
    async fn run(&mut self, statement: &Statement) -> Result<Vec<Record>, StoreError> {
        if self.mode == AccessMode::Read && statement.operation().entry().mode == AccessMode::Write {
            return Err(StoreError::Query(format!(
                "{} cannot run in a read transaction",
                statement.operation()
            )));
        }

        let mut q = query(statement.cypher());
        for (name, value) in statement.bindings() {
            q = q.param(*name, value.clone());
        }

        let mut stream = self.txn.execute(q).await?;
        let mut records = Vec::new();
        while let Some(row) = stream.next(self.txn.handle()).await? {
            records.push(row_to_record(&row, statement.columns())?);
        }
        Ok(records)
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.txn.rollback().await?;
        Ok(())
    }
}

/// Convert a neo4rs row into a positional record following `columns`.
fn row_to_record(row: &Row, columns: &[Column]) -> Result<Record, StoreError> {
    let mut fields = Vec::with_capacity(columns.len());
    for column in columns {
        let value = match column.kind {
            ColumnKind::Text => row.get::<Option<String>>(column.key).map(Value::from),
            ColumnKind::Count => row.get::<i64>(column.key).map(Value::Integer),
        }
        .map_err(|e| {
            StoreError::Serialization(format!("Failed to read column {}: {e}", column.key))
        })?;
        fields.push(value);
    }
    Ok(Record::new(fields))
}

/// Status code Neo4j reports when a uniqueness constraint rejects a write.
const CONSTRAINT_VIOLATION: &str = "Neo.ClientError.Schema.ConstraintValidationFailed";

impl From<neo4rs::Error> for StoreError {
    fn from(e: neo4rs::Error) -> Self {
        match &e {
            neo4rs::Error::Neo4j(server) => classify(
                server.kind(),
                server.code(),
                format!("{}: {}", server.code(), server.message()),
            ),
            neo4rs::Error::DeserializationError(_)
            | neo4rs::Error::ConversionError
            | neo4rs::Error::StringTooLong
            | neo4rs::Error::MapTooBig
            | neo4rs::Error::BytesTooBig
            | neo4rs::Error::ListTooLong
            | neo4rs::Error::UnknownType(_)
            | neo4rs::Error::InvalidTypeMarker(_) => StoreError::Serialization(e.to_string()),
            _ => StoreError::Connection(e.to_string()),
        }
    }
}

/// Map a server-reported failure onto the store taxonomy by the driver's
/// classification of its status code. Retryable kinds follow the driver's own
/// retry rules: transient errors, cluster role changes and expired authorization.
fn classify(kind: Neo4jErrorKind, code: &str, message: String) -> StoreError {
    match kind {
        Neo4jErrorKind::Transient
        | Neo4jErrorKind::Client(Neo4jClientErrorKind::SessionExpired)
        | Neo4jErrorKind::Client(Neo4jClientErrorKind::Security(
            Neo4jSecurityErrorKind::AuthorizationExpired,
        )) => StoreError::Transient(message),
        Neo4jErrorKind::Client(_) if code == CONSTRAINT_VIOLATION => StoreError::Constraint(message),
        Neo4jErrorKind::Client(Neo4jClientErrorKind::Security(_)) => {
            StoreError::Connection(message)
        }
        Neo4jErrorKind::Client(_) | Neo4jErrorKind::Database | Neo4jErrorKind::Unknown => {
            StoreError::Query(message)
        }
    }
}
