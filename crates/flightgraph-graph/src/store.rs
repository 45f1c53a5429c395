//! The transactional contract every graph store implements.
//!
//! A store hands out sessions; a session begins transactions in a fixed
//! access mode; a transaction runs catalog statements and yields positional
//! records. Dropping a session or an uncommitted transaction releases it and
//! discards its work, so cancellation and panics cannot leak either.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::catalog::{Column, Operation, QueryTemplate};

/// Whether a transaction may mutate the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

/// Errors raised by a store while executing a transaction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("transient failure: {0}")]
    Transient(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("connection failure: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("unreadable row: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Transient failures may succeed when the whole transaction is replayed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

/// Parameter values bound to a statement, keyed by Cypher parameter name.
pub type Bindings = BTreeMap<&'static str, String>;

/// A catalog query with its parameters bound, ready to run.
#[derive(Debug, Clone)]
pub struct Statement {
    operation: Operation,
    template: &'static QueryTemplate,
    bindings: Bindings,
}

impl Statement {
    pub fn new(operation: Operation, template: &'static QueryTemplate, bindings: Bindings) -> Self {
        Self {
            operation,
            template,
            bindings,
        }
    }

    /// The catalog operation this statement was prepared for.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn cypher(&self) -> &'static str {
        self.template.cypher
    }

    pub fn columns(&self) -> &'static [Column] {
        self.template.columns
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Look up a bound parameter.
    pub fn binding(&self, name: &str) -> Result<&str, StoreError> {
        self.bindings
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| StoreError::Query(format!("parameter ${name} is not bound")))
    }
}

/// A single field of a result record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    String(String),
    Integer(i64),
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        value.map_or(Value::Null, Value::String)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

/// One result row, fields in column order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub fields: Vec<Value>,
}

impl Record {
    pub fn new(fields: Vec<Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }
}

/// A graph store that can open sessions.
#[async_trait]
pub trait GraphStore: Send + Sync {
    type Session: StoreSession;

    async fn open_session(&self) -> Result<Self::Session, StoreError>;
}

/// A scoped handle used for the transactions of one logical request.
#[async_trait]
pub trait StoreSession: Send {
    type Transaction: StoreTransaction;

    async fn begin(&mut self, mode: AccessMode) -> Result<Self::Transaction, StoreError>;

    /// Release the session.
    async fn close(self) -> Result<(), StoreError>;
}

/// An open transaction.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn run(&mut self, statement: &Statement) -> Result<Vec<Record>, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
