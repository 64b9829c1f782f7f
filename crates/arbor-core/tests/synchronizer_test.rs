#![allow(clippy::unwrap_used)]
// End-to-end tests for `TreeSynchronizer` against a wiremock tree service.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use arbor_core::{
    BusyPolicy, CancellationToken, CoreError, ErrorKind, FailureStage, NodeId, SyncConfig,
    SyncEvent, SyncState, Tree, TreeSynchronizer,
};

const TREE: &str = "{3fa85f64-5717-4562-b3fc-2c963f66afa6}";
const GET: &str = "/api.user.tree.get";
const CREATE: &str = "/api.user.tree.node.create";
const RENAME: &str = "/api.user.tree.node.rename";
const DELETE: &str = "/api.user.tree.node.delete";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(policy: BusyPolicy) -> (MockServer, TreeSynchronizer) {
    let server = MockServer::start().await;
    let mut config = SyncConfig::new(server.uri().parse().unwrap(), TREE);
    config.busy_policy = policy;
    let sync = TreeSynchronizer::new(config).unwrap();
    (server, sync)
}

fn tree_body(children: &Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "r1",
        "name": TREE,
        "children": children,
    }))
}

/// Serve `body` for exactly one `tree.get`. Earlier mounts win, so mount
/// in the order the fetches will happen.
async fn fetch_once(server: &MockServer, children: &Value) {
    Mock::given(method("GET"))
        .and(path(GET))
        .and(query_param("treeName", TREE))
        .respond_with(tree_body(children))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

async fn fetch_always(server: &MockServer, children: &Value) {
    Mock::given(method("GET"))
        .and(path(GET))
        .respond_with(tree_body(children))
        .mount(server)
        .await;
}

async fn ack(server: &MockServer, endpoint: &str) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

async fn hits(server: &MockServer, endpoint: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == endpoint)
        .count()
}

fn ids(tree: &Tree) -> Vec<String> {
    tree.walk().map(|e| e.node.id.to_string()).collect()
}

fn documents() -> Value {
    json!([{ "id": "n1", "name": "Documents", "children": [] }])
}

// ── Initial load ────────────────────────────────────────────────────

#[tokio::test]
async fn test_initial_load_populates_snapshot() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    fetch_always(&server, &documents()).await;

    assert!(sync.snapshot().is_none());
    assert!(sync.last_reconciled().is_none());

    let tree = sync.load().await.unwrap();

    assert_eq!(tree.root_id, NodeId::from("r1"));
    assert_eq!(ids(&tree), vec!["n1"]);
    assert_eq!(sync.snapshot().unwrap(), tree);
    assert!(sync.last_reconciled().is_some());
    assert_eq!(sync.current_state(), SyncState::Idle);
}

#[tokio::test]
async fn test_reconciliation_is_idempotent() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    fetch_always(
        &server,
        &json!([{
            "id": "n1",
            "name": "Documents",
            "children": [{ "id": "n2", "name": "Invoices", "children": [] }]
        }]),
    )
    .await;

    let first = sync.load().await.unwrap();
    let second = sync.load().await.unwrap();

    assert!(!Arc::ptr_eq(&first, &second), "snapshot should be replaced");
    assert_eq!(*first, *second);
}

#[tokio::test]
async fn test_failed_initial_load_leaves_snapshot_absent() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    Mock::given(method("GET"))
        .and(path(GET))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = sync.load().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteUnavailable);
    assert!(sync.snapshot().is_none());
    assert_eq!(sync.current_state(), SyncState::Idle);
}

#[tokio::test]
async fn test_root_without_id_is_malformed() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    Mock::given(method("GET"))
        .and(path(GET))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "children": [] })))
        .mount(&server)
        .await;

    let err = sync.load().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteMalformed);
    assert!(sync.snapshot().is_none());
}

// ── Mutation scenarios ──────────────────────────────────────────────

#[tokio::test]
async fn test_add_under_root_of_empty_tree() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    fetch_once(&server, &json!([])).await;
    fetch_once(&server, &documents()).await;
    Mock::given(method("GET"))
        .and(path(CREATE))
        .and(query_param("treeName", TREE))
        .and(query_param("parentNodeId", "r1"))
        .and(query_param("nodeName", "Documents"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let before = sync.load().await.unwrap();
    assert!(before.is_empty());

    let after = sync.request_add(None, "Documents").await.unwrap();

    assert_eq!(after.children.len(), 1);
    let added = &after.children[0];
    assert_eq!(added.name, "Documents");
    assert!(!before.contains(&added.id), "id must be new");
    assert_eq!(hits(&server, GET).await, 2);
}

#[tokio::test]
async fn test_add_under_nested_parent() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    fetch_once(&server, &documents()).await;
    fetch_once(
        &server,
        &json!([{
            "id": "n1",
            "name": "Documents",
            "children": [{ "id": "n7", "name": "Invoices", "children": [] }]
        }]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(CREATE))
        .and(query_param("parentNodeId", "n1"))
        .and(query_param("nodeName", "Invoices"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    sync.load().await.unwrap();
    let tree = sync
        .request_add(Some(NodeId::from("n1")), "Invoices")
        .await
        .unwrap();

    let parent = tree.find(&"n1".into()).unwrap();
    assert!(parent.children.iter().any(|c| c.name == "Invoices"));
    assert_eq!(tree.parent_of(&"n7".into()), Some(&NodeId::from("n1")));
}

#[tokio::test]
async fn test_rename_keeps_id() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    fetch_once(&server, &documents()).await;
    fetch_once(
        &server,
        &json!([{ "id": "n1", "name": "Archive", "children": [] }]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(RENAME))
        .and(query_param("treeName", TREE))
        .and(query_param("nodeId", "n1"))
        .and(query_param("newNodeName", "Archive"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    sync.load().await.unwrap();
    let tree = sync.request_rename("n1", "Archive").await.unwrap();

    let node = tree.find(&"n1".into()).unwrap();
    assert_eq!(node.name, "Archive");
    assert_eq!(tree.len(), 1);
}

#[tokio::test]
async fn test_delete_removes_subtree() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    fetch_once(
        &server,
        &json!([
            {
                "id": "n1",
                "name": "Documents",
                "children": [{ "id": "n2", "name": "Invoices", "children": [] }]
            },
            { "id": "n3", "name": "Photos", "children": [] }
        ]),
    )
    .await;
    fetch_once(
        &server,
        &json!([{ "id": "n3", "name": "Photos", "children": [] }]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(DELETE))
        .and(query_param("treeName", TREE))
        .and(query_param("nodeId", "n1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let before = sync.load().await.unwrap();
    let removed = before.subtree_ids(&"n1".into());
    assert_eq!(removed.len(), 2);

    let after = sync.request_delete("n1").await.unwrap();

    for id in &removed {
        assert!(!after.contains(id), "{id} should be gone");
    }
    assert_eq!(ids(&after), vec!["n3"]);
}

// ── Failure handling ────────────────────────────────────────────────

#[tokio::test]
async fn test_rejected_mutation_skips_reconciliation() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    fetch_always(&server, &documents()).await;
    Mock::given(method("GET"))
        .and(path(CREATE))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "type": "Secure",
            "id": 638_412,
            "data": { "message": "Duplicate name" }
        })))
        .mount(&server)
        .await;

    let before = sync.load().await.unwrap();
    let mut events = sync.subscribe();

    let err = sync.request_add(None, "Documents").await.unwrap_err();

    assert_eq!(
        err,
        CoreError::RemoteRejected {
            message: "Duplicate name".into(),
            status: Some(500),
        }
    );
    assert_eq!(*sync.snapshot().unwrap(), *before);
    assert_eq!(hits(&server, GET).await, 1, "no reconciliation after a rejection");

    match events.recv().await.unwrap() {
        SyncEvent::Failed {
            intent,
            stage,
            error,
        } => {
            assert_eq!(stage, FailureStage::Mutation);
            assert_eq!(error.kind(), ErrorKind::RemoteRejected);
            assert_eq!(intent.unwrap().operation(), "add");
        }
        other => panic!("expected Failed event, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_reconciliation_keeps_last_good_snapshot() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    fetch_once(&server, &documents()).await;
    Mock::given(method("GET"))
        .and(path(GET))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    ack(&server, RENAME).await;

    let before = sync.load().await.unwrap();
    let mut events = sync.subscribe();

    let err = sync.request_rename("n1", "Archive").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteUnavailable);
    let after = sync.snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(*after, *before);
    assert_eq!(after.find(&"n1".into()).unwrap().name, "Documents");

    let event = events.recv().await.unwrap();
    assert!(matches!(
        event,
        SyncEvent::Failed {
            stage: FailureStage::Reconciliation,
            ..
        }
    ));
}

#[tokio::test]
async fn test_add_before_load_is_a_precondition_failure() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    let mut events = sync.subscribe();

    let err = sync.request_add(None, "Documents").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert!(sync.snapshot().is_none());
    assert!(
        server.received_requests().await.unwrap().is_empty(),
        "no network call expected"
    );
    let event = events.recv().await.unwrap();
    assert!(matches!(
        event,
        SyncEvent::Failed {
            stage: FailureStage::Validation,
            ..
        }
    ));
}

#[tokio::test]
async fn test_unknown_target_is_not_sent() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    fetch_always(&server, &documents()).await;

    sync.load().await.unwrap();
    let err = sync.request_delete("n42").await.unwrap_err();

    assert_eq!(err, CoreError::NodeNotFound { id: "n42".into() });
    assert_eq!(hits(&server, DELETE).await, 0);
}

// ── Single-flight ───────────────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_request_is_rejected_as_busy() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    fetch_always(&server, &documents()).await;
    Mock::given(method("GET"))
        .and(path(CREATE))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    ack(&server, RENAME).await;

    sync.load().await.unwrap();

    let mut state = sync.state();
    let first = tokio::spawn({
        let sync = sync.clone();
        async move { sync.request_add(None, "Photos").await }
    });
    state
        .wait_for(|s| *s == SyncState::MutationInFlight)
        .await
        .unwrap();

    let err = sync.request_rename("n1", "Archive").await.unwrap_err();
    assert_eq!(err, CoreError::Busy);
    assert_eq!(sync.current_state(), SyncState::MutationInFlight);

    first.await.unwrap().unwrap();
    assert_eq!(hits(&server, RENAME).await, 0);
    assert_eq!(sync.current_state(), SyncState::Idle);
}

#[tokio::test]
async fn test_state_passes_through_reconciling() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    fetch_once(&server, &documents()).await;
    Mock::given(method("GET"))
        .and(path(GET))
        .respond_with(tree_body(&documents()).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    ack(&server, RENAME).await;

    sync.load().await.unwrap();
    assert_eq!(sync.current_state(), SyncState::Idle);

    let mut state = sync.state();
    let task = tokio::spawn({
        let sync = sync.clone();
        async move { sync.request_rename("n1", "Archive").await }
    });
    state
        .wait_for(|s| *s == SyncState::Reconciling)
        .await
        .unwrap();
    assert_eq!(hits(&server, RENAME).await, 1, "mutation precedes reconciliation");

    task.await.unwrap().unwrap();
    assert_eq!(*state.borrow_and_update(), SyncState::Idle);
}

#[tokio::test]
async fn test_queue_policy_serializes_requests() {
    let (server, sync) = setup(BusyPolicy::Queue).await;
    fetch_always(&server, &documents()).await;
    Mock::given(method("GET"))
        .and(path(CREATE))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(100)))
        .expect(2)
        .mount(&server)
        .await;

    sync.load().await.unwrap();

    let (a, b) = tokio::join!(
        sync.request_add(None, "Photos"),
        sync.request_add(Some(NodeId::from("n1")), "Invoices"),
    );
    a.unwrap();
    b.unwrap();

    // One initial load plus one reconciliation per mutation.
    assert_eq!(hits(&server, GET).await, 3);

    // Each mutation's reconciliation followed it before the next mutation.
    let order: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_owned())
        .collect();
    assert_eq!(order, vec![GET, CREATE, GET, CREATE, GET]);
}

// ── Subscriptions ───────────────────────────────────────────────────

#[tokio::test]
async fn test_snapshot_replaced_event_carries_cause() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    fetch_always(&server, &documents()).await;
    ack(&server, DELETE).await;

    let mut events = sync.subscribe();
    sync.load().await.unwrap();
    sync.request_delete("n1").await.unwrap();

    match events.recv().await.unwrap() {
        SyncEvent::SnapshotReplaced { cause, snapshot } => {
            assert!(cause.is_none());
            assert_eq!(snapshot.len(), 1);
        }
        other => panic!("expected SnapshotReplaced, got: {other:?}"),
    }
    match events.recv().await.unwrap() {
        SyncEvent::SnapshotReplaced { cause, .. } => {
            assert_eq!(cause.unwrap().to_string(), "delete n1");
        }
        other => panic!("expected SnapshotReplaced, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_snapshot_stream_yields_loaded_trees() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    fetch_always(&server, &documents()).await;

    let mut snapshots = sync.snapshots();
    assert!(snapshots.current().is_none());

    let loader = tokio::spawn({
        let sync = sync.clone();
        async move { sync.load().await }
    });
    let tree = snapshots.changed().await.unwrap();
    loader.await.unwrap().unwrap();

    assert_eq!(ids(&tree), vec!["n1"]);
    assert_eq!(snapshots.current().unwrap(), &tree);

    let mut stream = sync.snapshots().into_stream();
    let first = stream.next().await.unwrap();
    assert_eq!(*first, *tree);
}

#[tokio::test]
async fn test_background_refresh_picks_up_remote_changes() {
    let (server, sync) = setup(BusyPolicy::Reject).await;
    fetch_once(&server, &documents()).await;
    fetch_always(
        &server,
        &json!([
            { "id": "n1", "name": "Documents", "children": [] },
            { "id": "n9", "name": "Shared", "children": [] }
        ]),
    )
    .await;

    sync.load().await.unwrap();
    let mut snapshots = sync.snapshots();

    let cancel = CancellationToken::new();
    let handle = sync.spawn_refresh(Duration::from_millis(50), cancel.clone());

    let tree = tokio::time::timeout(Duration::from_secs(5), snapshots.changed())
        .await
        .unwrap()
        .unwrap();
    assert!(tree.contains(&"n9".into()));

    cancel.cancel();
    handle.await.unwrap();
}
