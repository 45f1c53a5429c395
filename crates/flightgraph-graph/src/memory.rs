//! In-process graph store implementing the same transactional contract as Neo4j.
//!
//! Read transactions see the snapshot committed when they began. Write
//! transactions are serialized: each works on a private copy of the latest
//! snapshot and publishes it atomically on commit, so a dropped or rolled back
//! write leaves no trace.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use flightgraph_core::Airport;

use crate::catalog::{Operation, AIRPORT_LABEL};
use crate::store::{
    AccessMode, GraphStore, Record, Statement, StoreError, StoreSession, StoreTransaction, Value,
};

#[derive(Debug, Clone, Default)]
struct GraphState {
    airports: Vec<Airport>,
    by_name: HashMap<String, usize>,
    /// (departure, destination) airport indices, in creation order.
    connections: Vec<(usize, usize)>,
}

#[derive(Debug, Default)]
struct Shared {
    committed: RwLock<Arc<GraphState>>,
    writer: Arc<AsyncMutex<()>>,
    open_sessions: AtomicUsize,
    transactions_begun: AtomicUsize,
    faults: Mutex<VecDeque<Fault>>,
}

#[derive(Debug)]
enum Fault {
    Fail(StoreError),
    Panic(&'static str),
}

/// An in-memory graph store. Clones share the same graph.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions opened and not yet released.
    pub fn open_sessions(&self) -> usize {
        self.shared.open_sessions.load(Ordering::SeqCst)
    }

    /// Transactions begun since the store was created, including failed ones.
    pub fn transactions_begun(&self) -> usize {
        self.shared.transactions_begun.load(Ordering::SeqCst)
    }

    /// Make the next statement run fail with `error`. Queued faults fire in order.
    pub fn fail_next(&self, error: StoreError) {
        self.push_fault(Fault::Fail(error));
    }

    /// Make the next statement run panic with `message`.
    pub fn panic_next(&self, message: &'static str) {
        self.push_fault(Fault::Panic(message));
    }

    fn push_fault(&self, fault: Fault) {
        self.shared
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(fault);
    }

    fn snapshot(&self) -> Arc<GraphState> {
        self.shared
            .committed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    type Session = MemorySession;

    async fn open_session(&self) -> Result<MemorySession, StoreError> {
        self.shared.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(MemorySession {
            store: self.clone(),
        })
    }
}

/// A session on a [`MemoryStore`]; released when dropped.
#[derive(Debug)]
pub struct MemorySession {
    store: MemoryStore,
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.store.shared.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoreSession for MemorySession {
    type Transaction = MemoryTransaction;

    async fn begin(&mut self, mode: AccessMode) -> Result<MemoryTransaction, StoreError> {
        self.store
            .shared
            .transactions_begun
            .fetch_add(1, Ordering::SeqCst);

        let view = match mode {
            AccessMode::Read => View::Read(self.store.snapshot()),
            AccessMode::Write => {
                let guard = self.store.shared.writer.clone().lock_owned().await;
                let working = GraphState::clone(&self.store.snapshot());
                View::Write {
                    working,
                    _guard: guard,
                }
            }
        };
        Ok(MemoryTransaction {
            store: self.store.clone(),
            view,
        })
    }

    async fn close(self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Debug)]
enum View {
    Read(Arc<GraphState>),
    Write {
        working: GraphState,
        _guard: OwnedMutexGuard<()>,
    },
}

/// A transaction on a [`MemoryStore`]; uncommitted work is discarded on drop.
#[derive(Debug)]
pub struct MemoryTransaction {
    store: MemoryStore,
    view: View,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn run(&mut self, statement: &Statement) -> Result<Vec<Record>, StoreError> {
        let fault = self
            .store
            .shared
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match fault {
            Some(Fault::Fail(error)) => return Err(error),
            Some(Fault::Panic(message)) => panic!("{message}"),
            None => {}
        }

        match &mut self.view {
            View::Read(state) => {
                if statement.operation().entry().mode == AccessMode::Write {
                    return Err(StoreError::Query(format!(
                        "{} cannot run in a read transaction",
                        statement.operation()
                    )));
                }
                evaluate(state, statement)
            }
            View::Write { working, .. } => match statement.operation() {
                Operation::CreateAirport => create_airport(working, statement),
                Operation::CreateConnection => create_connection(working, statement),
                _ => evaluate(working, statement),
            },
        }
    }

    async fn commit(self) -> Result<(), StoreError> {
        if let View::Write {
            working,
            _guard: guard,
        } = self.view
        {
            *self
                .store
                .shared
                .committed
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Arc::new(working);
            drop(guard);
        }
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

fn airport_record(airport: &Airport) -> Record {
    Record::new(vec![
        Value::from(airport.name.as_str()),
        Value::from(airport.country.as_str()),
    ])
}

fn sorted_by_name(mut airports: Vec<&Airport>) -> Vec<Record> {
    airports.sort_by(|a, b| a.name.cmp(&b.name));
    airports.into_iter().map(airport_record).collect()
}

/// Run a read statement against a state.
fn evaluate(state: &GraphState, statement: &Statement) -> Result<Vec<Record>, StoreError> {
    let records = match statement.operation() {
        Operation::GetAirport => {
            let name = statement.binding("name")?;
            state
                .by_name
                .get(name)
                .map(|&i| airport_record(&state.airports[i]))
                .into_iter()
                .collect()
        }
        Operation::ListAirports => sorted_by_name(state.airports.iter().collect()),
        Operation::ListAirportsByCountry => {
            let country = statement.binding("country")?;
            sorted_by_name(
                state
                    .airports
                    .iter()
                    .filter(|a| a.country == country)
                    .collect(),
            )
        }
        Operation::ListCountries => state
            .airports
            .iter()
            .filter(|a| !a.country.is_empty())
            .map(|a| a.country.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|c| Record::new(vec![Value::from(c)]))
            .collect(),
        Operation::ListOutgoingConnections => {
            let name = statement.binding("name")?;
            let neighbors = match state.by_name.get(name) {
                Some(&from) => state
                    .connections
                    .iter()
                    .filter(|(d, _)| *d == from)
                    .map(|&(_, t)| &state.airports[t])
                    .collect(),
                None => Vec::new(),
            };
            sorted_by_name(neighbors)
        }
        Operation::ListIncomingConnections => {
            let name = statement.binding("name")?;
            let neighbors = match state.by_name.get(name) {
                Some(&to) => state
                    .connections
                    .iter()
                    .filter(|(_, t)| *t == to)
                    .map(|&(d, _)| &state.airports[d])
                    .collect(),
                None => Vec::new(),
            };
            sorted_by_name(neighbors)
        }
        Operation::ListConnections => {
            let mut pairs: Vec<(&str, &str)> = state
                .connections
                .iter()
                .map(|&(d, t)| {
                    (
                        state.airports[d].name.as_str(),
                        state.airports[t].name.as_str(),
                    )
                })
                .collect();
            pairs.sort();
            pairs
                .into_iter()
                .map(|(d, t)| Record::new(vec![Value::from(d), Value::from(t)]))
                .collect()
        }
        Operation::ShortestPath | Operation::CreateAirport | Operation::CreateConnection => {
            return Err(StoreError::Query(format!(
                "{} has no read statement",
                statement.operation()
            )))
        }
    };
    Ok(records)
}

fn create_airport(state: &mut GraphState, statement: &Statement) -> Result<Vec<Record>, StoreError> {
    let name = statement.binding("name")?;
    let country = statement.binding("country")?;
    if state.by_name.contains_key(name) {
        return Err(StoreError::Constraint(format!(
            "Node already exists with label `{AIRPORT_LABEL}` and property `name` = '{name}'"
        )));
    }
    state.by_name.insert(name.to_string(), state.airports.len());
    state.airports.push(Airport::new(name, country));
    Ok(vec![Record::new(vec![Value::from(name)])])
}

fn create_connection(
    state: &mut GraphState,
    statement: &Statement,
) -> Result<Vec<Record>, StoreError> {
    let departure = statement.binding("departure")?;
    let destination = statement.binding("destination")?;
    let created = match (state.by_name.get(departure), state.by_name.get(destination)) {
        (Some(&d), Some(&t)) => {
            state.connections.push((d, t));
            1
        }
        _ => 0,
    };
    Ok(vec![Record::new(vec![Value::Integer(created)])])
}
