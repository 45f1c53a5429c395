//! Shortest paths over directed connections.
//!
//! The airport and connection listings are read inside the caller's read
//! transaction and turned into a compact adjacency list. Breadth-first search
//! then finds a path of minimal hop count, following edges forward only.

use std::collections::{HashMap, VecDeque};

use flightgraph_core::{Airport, Connection};

use crate::catalog::{Operation, ALL_AIRPORTS, ALL_CONNECTIONS};
use crate::error::Result;
use crate::projector;
use crate::store::{Bindings, Statement, StoreTransaction};

/// In-memory snapshot of the connection graph.
#[derive(Debug, Clone, Default)]
pub struct RouteGraph {
    /// All airports, indexed densely.
    airports: Vec<Airport>,
    /// `adjacency[i]` = destinations reachable from airport `i`, sorted by name.
    adjacency: Vec<Vec<usize>>,
    /// Airport name → dense index.
    index: HashMap<String, usize>,
}

impl RouteGraph {
    /// Build from listings. Connections naming an unknown airport are ignored;
    /// parallel edges collapse into one.
    pub fn from_records(airports: Vec<Airport>, connections: &[Connection]) -> Self {
        let mut index = HashMap::with_capacity(airports.len());
        for (i, airport) in airports.iter().enumerate() {
            index.entry(airport.name.clone()).or_insert(i);
        }

        let mut adjacency = vec![Vec::new(); airports.len()];
        for conn in connections {
            if let (Some(&from), Some(&to)) =
                (index.get(&conn.departure), index.get(&conn.destination))
            {
                adjacency[from].push(to);
            }
        }

        // Stable neighbor order keeps tie-breaks reproducible between runs.
        for neighbors in &mut adjacency {
            neighbors.sort_by(|&a, &b| airports[a].name.cmp(&airports[b].name).then(a.cmp(&b)));
            neighbors.dedup();
        }

        Self {
            airports,
            adjacency,
            index,
        }
    }

    pub fn airport_count(&self) -> usize {
        self.airports.len()
    }

    pub fn connection_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Minimal-hop path from `departure` to `destination`, both inclusive.
    ///
    /// Empty when the endpoints are equal, when either is unknown, or when the
    /// destination is unreachable.
    pub fn shortest_path(&self, departure: &str, destination: &str) -> Vec<Airport> {
        if departure == destination {
            return Vec::new();
        }
        let (Some(&source), Some(&target)) = (self.index.get(departure), self.index.get(destination))
        else {
            return Vec::new();
        };

        match bfs(&self.adjacency, source, target) {
            Some(indices) => indices
                .into_iter()
                .map(|i| self.airports[i].clone())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Breadth-first search returning the node indices of a shortest path.
fn bfs(adjacency: &[Vec<usize>], source: usize, target: usize) -> Option<Vec<usize>> {
    let mut prev: Vec<Option<usize>> = vec![None; adjacency.len()];
    let mut visited = vec![false; adjacency.len()];
    let mut queue = VecDeque::new();

    visited[source] = true;
    queue.push_back(source);

    while let Some(node) = queue.pop_front() {
        if node == target {
            break;
        }
        for &next in &adjacency[node] {
            if !visited[next] {
                visited[next] = true;
                prev[next] = Some(node);
                queue.push_back(next);
            }
        }
    }

    if !visited[target] {
        return None;
    }

    let mut path = vec![target];
    let mut current = target;
    while let Some(parent) = prev[current] {
        path.push(parent);
        current = parent;
    }
    path.reverse();
    Some(path)
}

/// Run the search inside an open transaction.
///
/// Loads every airport and connection into memory for each request, so cost
/// grows with the whole graph, not with the path length.
pub(crate) async fn search<T: StoreTransaction>(
    txn: &mut T,
    departure: &str,
    destination: &str,
) -> Result<Vec<Airport>> {
    let airports = txn
        .run(&Statement::new(
            Operation::ListAirports,
            &ALL_AIRPORTS,
            Bindings::new(),
        ))
        .await?;
    let connections = txn
        .run(&Statement::new(
            Operation::ListConnections,
            &ALL_CONNECTIONS,
            Bindings::new(),
        ))
        .await?;

    let graph = RouteGraph::from_records(
        projector::airports(airports)?,
        &projector::connections(connections)?,
    );
    tracing::debug!(
        airports = graph.airport_count(),
        connections = graph.connection_count(),
        "Built route graph"
    );

    Ok(graph.shortest_path(departure, destination))
}
