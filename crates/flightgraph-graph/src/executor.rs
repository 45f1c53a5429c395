//! Session-scoped execution of catalog operations.
//!
//! Every call opens its own session and runs exactly one transaction function
//! in the operation's access mode. Read transactions are always rolled back,
//! write transactions commit only when the whole function succeeded. The
//! session is closed on every exit path; if the future is dropped mid-flight
//! the session and transaction are released by their `Drop` impls.

use std::time::Duration;

use flightgraph_core::config::RetrySettings;
use flightgraph_core::Params;

use crate::catalog::{CatalogEntry, Operation, Plan};
use crate::error::{GraphError, Result};
use crate::pathfind;
use crate::projector::{self, Outcome};
use crate::store::{
    AccessMode, Bindings, GraphStore, Statement, StoreSession, StoreTransaction,
};

/// Replay policy for transient store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero behaves like one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// A policy that never replays.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
        }
    }
}

/// Runs catalog operations against a store.
///
/// Holds no session between calls, so a shared executor is safe to use from
/// concurrent tasks.
#[derive(Debug, Clone)]
pub struct SessionExecutor<S> {
    store: S,
    retry: RetryPolicy,
}

impl<S: GraphStore> SessionExecutor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run an operation by name.
    pub async fn invoke(&self, operation: &str, params: &Params) -> Result<Outcome> {
        let operation: Operation = operation.parse()?;
        self.execute(operation, params).await
    }

    /// Run an operation with named parameters.
    pub async fn execute(&self, operation: Operation, params: &Params) -> Result<Outcome> {
        let entry = operation.entry();
        let bindings = entry.bind(params)?;

        if let Plan::PathSearch = entry.plan {
            if bindings.get("departure") == bindings.get("destination") {
                tracing::debug!(%operation, "Departure equals destination, no path");
                return Ok(Outcome::Path(Vec::new()));
            }
        }

        let max_attempts = self.retry.max_attempts.max(1);
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 1;
        loop {
            match self.run_session(entry, &bindings).await {
                Err(GraphError::Store(e)) if e.is_transient() && attempt < max_attempts => {
                    tracing::warn!(
                        %operation,
                        attempt,
                        error = %e,
                        backoff_ms = backoff.as_millis() as u64,
                        "Transient store failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn run_session(&self, entry: &'static CatalogEntry, bindings: &Bindings) -> Result<Outcome> {
        let mut session = self.store.open_session().await?;
        let result = run_transaction(&mut session, entry, bindings).await;
        if let Err(e) = session.close().await {
            tracing::warn!(operation = %entry.operation, error = %e, "Failed to close session");
        }
        result
    }
}

async fn run_transaction<T: StoreSession>(
    session: &mut T,
    entry: &'static CatalogEntry,
    bindings: &Bindings,
) -> Result<Outcome> {
    let mut txn = session.begin(entry.mode).await?;
    tracing::debug!(operation = %entry.operation, mode = ?entry.mode, "Transaction started");

    let outcome = match run_plan(&mut txn, entry, bindings).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Err(rollback) = txn.rollback().await {
                tracing::warn!(operation = %entry.operation, error = %rollback, "Rollback failed");
            }
            return Err(e);
        }
    };

    match entry.mode {
        AccessMode::Write => txn.commit().await?,
        AccessMode::Read => {
            // Nothing to keep; the result has already been read.
            if let Err(e) = txn.rollback().await {
                tracing::warn!(operation = %entry.operation, error = %e, "Closing read transaction failed");
            }
        }
    }
    Ok(outcome)
}

async fn run_plan<X: StoreTransaction>(
    txn: &mut X,
    entry: &'static CatalogEntry,
    bindings: &Bindings,
) -> Result<Outcome> {
    match entry.plan {
        Plan::Query(template) => {
            let statement = Statement::new(entry.operation, template, bindings.clone());
            let records = txn.run(&statement).await?;
            projector::project(entry.shape, records)
        }
        Plan::PathSearch => {
            let departure = statement_param(bindings, "departure")?;
            let destination = statement_param(bindings, "destination")?;
            pathfind::search(txn, departure, destination)
                .await
                .map(Outcome::Path)
        }
    }
}

fn statement_param<'a>(bindings: &'a Bindings, name: &'static str) -> Result<&'a str> {
    bindings
        .get(name)
        .map(String::as_str)
        .ok_or(GraphError::MissingParameter {
            operation: Operation::ShortestPath,
            param: name,
        })
}
