//! End-to-end behaviour of the catalog operations against the in-memory store.

use std::time::Duration;

use flightgraph_core::form::{decode_body, FormDecoding};
use flightgraph_core::{Airport, Params};
use flightgraph_graph::store::StoreSession;
use flightgraph_graph::{
    AccessMode, Acknowledgement, GraphError, GraphStore, MemoryStore, Operation, Outcome,
    RetryPolicy, SessionExecutor, StoreError,
};

fn executor() -> SessionExecutor<MemoryStore> {
    SessionExecutor::new(MemoryStore::new()).with_retry_policy(RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
    })
}

fn names(airports: &[Airport]) -> Vec<&str> {
    airports.iter().map(|a| a.name.as_str()).collect()
}

async fn seed(exec: &SessionExecutor<MemoryStore>, airports: &[(&str, &str)], edges: &[(&str, &str)]) {
    for (name, country) in airports {
        exec.create_airport(name, country).await.unwrap();
    }
    for (dept, dest) in edges {
        assert!(exec.create_connection(dept, dest).await.unwrap());
    }
}

// ── Round trips ──────────────────────────────────────────────────

#[tokio::test]
async fn test_create_then_get_airport() {
    let exec = executor();
    let key = exec.create_airport("JFK", "USA").await.unwrap();
    assert_eq!(key, "JFK");

    let airport = exec.get_airport("JFK").await.unwrap();
    assert_eq!(airport, Some(Airport::new("JFK", "USA")));
    assert_eq!(exec.list_airports().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_missing_airport_is_empty_not_error() {
    let exec = executor();
    assert_eq!(exec.get_airport("NOPE").await.unwrap(), None);
    assert_eq!(
        exec.invoke("get_airport", &params(&[("name", "NOPE")]))
            .await
            .unwrap(),
        Outcome::Airports(vec![])
    );

    let err = exec.airport("NOPE").await.unwrap_err();
    assert!(matches!(err, GraphError::NotFound { ref name } if name == "NOPE"));
}

#[tokio::test]
async fn test_duplicate_airport_is_store_error() {
    let exec = executor();
    exec.create_airport("JFK", "USA").await.unwrap();
    let err = exec.create_airport("JFK", "USA").await.unwrap_err();
    assert!(matches!(err, GraphError::Store(StoreError::Constraint(_))));
    assert_eq!(exec.list_airports().await.unwrap().len(), 1);
}

// ── Connections ──────────────────────────────────────────────────

#[tokio::test]
async fn test_connections_are_additive() {
    let exec = executor();
    seed(&exec, &[("JFK", "USA"), ("LAX", "USA")], &[]).await;

    assert!(exec.create_connection("JFK", "LAX").await.unwrap());
    assert_eq!(
        names(&exec.list_outgoing_connections("JFK").await.unwrap()),
        vec!["LAX"]
    );

    assert!(exec.create_connection("JFK", "LAX").await.unwrap());
    assert_eq!(
        names(&exec.list_outgoing_connections("JFK").await.unwrap()),
        vec!["LAX", "LAX"]
    );
    assert_eq!(
        names(&exec.list_incoming_connections("LAX").await.unwrap()),
        vec!["JFK", "JFK"]
    );
    assert!(exec.list_incoming_connections("JFK").await.unwrap().is_empty());
    assert_eq!(exec.list_connections().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_connection_to_missing_airport_is_noop() {
    let exec = executor();
    seed(&exec, &[("JFK", "USA")], &[]).await;

    let before = exec.list_outgoing_connections("GHOST").await.unwrap();
    assert!(!exec.create_connection("GHOST", "JFK").await.unwrap());
    assert!(!exec.create_connection("JFK", "GHOST").await.unwrap());
    assert_eq!(exec.list_outgoing_connections("GHOST").await.unwrap(), before);
    assert!(exec.list_outgoing_connections("JFK").await.unwrap().is_empty());
    assert!(exec.list_connections().await.unwrap().is_empty());
}

// ── Countries ────────────────────────────────────────────────────

#[tokio::test]
async fn test_countries_are_distinct() {
    let exec = executor();
    seed(
        &exec,
        &[
            ("JFK", "USA"),
            ("LAX", "USA"),
            ("ORD", "USA"),
            ("CDG", "France"),
            ("XXX", ""),
        ],
        &[],
    )
    .await;

    assert_eq!(
        exec.list_countries().await.unwrap(),
        vec!["France".to_string(), "USA".to_string()]
    );
    assert_eq!(
        names(&exec.list_airports_by_country("USA").await.unwrap()),
        vec!["JFK", "LAX", "ORD"]
    );
    assert!(exec.list_airports_by_country("Peru").await.unwrap().is_empty());
}

// ── Shortest path ────────────────────────────────────────────────

#[tokio::test]
async fn test_path_is_directed() {
    let exec = executor();
    seed(&exec, &[("JFK", "USA"), ("LAX", "USA")], &[("JFK", "LAX")]).await;

    assert_eq!(
        exec.shortest_path("JFK", "LAX").await.unwrap(),
        vec![Airport::new("JFK", "USA"), Airport::new("LAX", "USA")]
    );
    assert!(exec.shortest_path("LAX", "JFK").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_path_is_minimal() {
    let exec = executor();
    seed(
        &exec,
        &[("A", ""), ("B", ""), ("C", "")],
        &[("A", "B"), ("B", "C")],
    )
    .await;
    assert_eq!(
        names(&exec.shortest_path("A", "C").await.unwrap()),
        vec!["A", "B", "C"]
    );

    // A shortcut makes the direct hop the only minimal path.
    exec.create_connection("A", "C").await.unwrap();
    assert_eq!(
        names(&exec.shortest_path("A", "C").await.unwrap()),
        vec!["A", "C"]
    );
}

#[tokio::test]
async fn test_path_with_ties_checks_length_and_endpoints() {
    let exec = executor();
    seed(
        &exec,
        &[("S", ""), ("M1", ""), ("M2", ""), ("T", "")],
        &[("S", "M1"), ("S", "M2"), ("M1", "T"), ("M2", "T")],
    )
    .await;

    let path = exec.shortest_path("S", "T").await.unwrap();
    assert_eq!(path.len(), 3);
    assert_eq!(path[0].name, "S");
    assert_eq!(path[2].name, "T");
}

#[tokio::test]
async fn test_self_path_is_empty_without_touching_store() {
    let exec = executor();
    seed(&exec, &[("JFK", "USA"), ("LAX", "USA")], &[("JFK", "LAX"), ("LAX", "JFK")]).await;

    let begun = exec.store().transactions_begun();
    assert!(exec.shortest_path("JFK", "JFK").await.unwrap().is_empty());
    assert!(exec.shortest_path("NOPE", "NOPE").await.unwrap().is_empty());
    assert_eq!(exec.store().transactions_begun(), begun);
}

#[tokio::test]
async fn test_reversed_edge_does_not_open_reverse_path() {
    let exec = executor();
    seed(&exec, &[("A", ""), ("B", "")], &[("B", "A")]).await;
    assert!(exec.shortest_path("A", "B").await.unwrap().is_empty());
    assert_eq!(names(&exec.shortest_path("B", "A").await.unwrap()), vec!["B", "A"]);
}

#[tokio::test]
async fn test_path_with_missing_endpoint_is_empty() {
    let exec = executor();
    seed(&exec, &[("A", "")], &[]).await;
    assert!(exec.shortest_path("A", "NOPE").await.unwrap().is_empty());
    assert!(exec.shortest_path("NOPE", "A").await.unwrap().is_empty());
}

// ── Parameter binding ────────────────────────────────────────────

#[tokio::test]
async fn test_missing_parameter_fails_before_store() {
    let exec = executor();
    let err = exec
        .invoke("create_connection", &params(&[("departure", "JFK")]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GraphError::MissingParameter {
            operation: Operation::CreateConnection,
            param: "destination"
        }
    ));
    assert_eq!(exec.store().transactions_begun(), 0);
    assert_eq!(exec.store().open_sessions(), 0);
}

#[tokio::test]
async fn test_unknown_operation() {
    let exec = executor();
    let err = exec.invoke("drop_everything", &Params::new()).await.unwrap_err();
    assert!(matches!(err, GraphError::UnknownOperation(_)));
}

#[tokio::test]
async fn test_invoke_with_form_body() {
    let exec = executor();
    let body = decode_body("Name=POS&Country=Trinidad%2BTobago", FormDecoding::Legacy).unwrap();
    let outcome = exec.invoke("create_airport", &body).await.unwrap();
    assert_eq!(
        outcome,
        Outcome::Ack(Acknowledgement::AirportCreated {
            name: "POS".to_string()
        })
    );

    let filter = params(&[("country", "Trinidad+Tobago")]);
    assert_eq!(
        exec.invoke("list_airports_by_country", &filter).await.unwrap(),
        Outcome::Airports(vec![Airport::new("POS", "Trinidad+Tobago")])
    );
}

// ── Sessions, retries, and failures ──────────────────────────────

#[tokio::test]
async fn test_sessions_released_after_success_and_failure() {
    let exec = executor();
    exec.create_airport("JFK", "USA").await.unwrap();
    assert_eq!(exec.store().open_sessions(), 0);

    exec.create_airport("JFK", "USA").await.unwrap_err();
    assert_eq!(exec.store().open_sessions(), 0);

    exec.store()
        .fail_next(StoreError::Connection("socket closed".to_string()));
    exec.list_airports().await.unwrap_err();
    assert_eq!(exec.store().open_sessions(), 0);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let exec = executor();
    exec.create_airport("JFK", "USA").await.unwrap();
    let begun = exec.store().transactions_begun();

    exec.store().fail_next(StoreError::Transient("deadlock".to_string()));
    exec.store().fail_next(StoreError::Transient("deadlock".to_string()));
    assert_eq!(exec.list_airports().await.unwrap().len(), 1);
    assert_eq!(exec.store().transactions_begun() - begun, 3);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let exec = executor();
    for _ in 0..3 {
        exec.store().fail_next(StoreError::Transient("deadlock".to_string()));
    }
    let err = exec.list_airports().await.unwrap_err();
    assert!(matches!(err, GraphError::Store(ref e) if e.is_transient()));
    assert_eq!(exec.store().transactions_begun(), 3);
}

#[tokio::test]
async fn test_terminal_error_is_not_masked_or_retried() {
    let exec = executor();
    exec.store()
        .fail_next(StoreError::Connection("socket closed".to_string()));

    let err = exec.get_airport("JFK").await.unwrap_err();
    assert!(matches!(err, GraphError::Store(StoreError::Connection(_))));
    assert_eq!(exec.store().transactions_begun(), 1);
}

#[tokio::test]
async fn test_failed_write_leaves_no_mutation() {
    let exec = executor();
    seed(&exec, &[("A", ""), ("B", "")], &[]).await;

    exec.store()
        .fail_next(StoreError::Query("boom".to_string()));
    exec.create_connection("A", "B").await.unwrap_err();
    assert!(exec.list_connections().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_request_releases_session() {
    let exec = executor();
    let store = exec.store().clone();

    // Hold the writer so the next write blocks in `begin`.
    let mut blocker = store.open_session().await.unwrap();
    let held = blocker.begin(AccessMode::Write).await.unwrap();

    let timed_out =
        tokio::time::timeout(Duration::from_millis(50), exec.create_airport("JFK", "USA")).await;
    assert!(timed_out.is_err());
    assert_eq!(store.open_sessions(), 1);

    drop(held);
    drop(blocker);
    assert_eq!(store.open_sessions(), 0);
    assert_eq!(exec.get_airport("JFK").await.unwrap(), None);
}

#[tokio::test]
async fn test_panic_during_operation_releases_session() {
    let exec = executor();
    exec.store().panic_next("statement handler failed");

    let task_exec = exec.clone();
    let result = tokio::spawn(async move { task_exec.create_airport("JFK", "USA").await }).await;

    assert!(result.unwrap_err().is_panic());
    assert_eq!(exec.store().open_sessions(), 0);

    // The abandoned write left nothing behind and released the writer.
    assert_eq!(exec.get_airport("JFK").await.unwrap(), None);
    exec.create_airport("JFK", "USA").await.unwrap();
    assert_eq!(exec.list_airports().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_writes_all_apply() {
    let exec = executor();
    exec.create_airport("HUB", "").await.unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let exec = exec.clone();
        handles.push(tokio::spawn(async move {
            let name = format!("S{i:02}");
            exec.create_airport(&name, "").await.unwrap();
            exec.create_connection("HUB", &name).await.unwrap()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap());
    }

    assert_eq!(exec.list_airports().await.unwrap().len(), 17);
    assert_eq!(exec.list_outgoing_connections("HUB").await.unwrap().len(), 16);
    assert_eq!(exec.store().open_sessions(), 0);
}

fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
