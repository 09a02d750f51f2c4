use std::time::Duration;

use latency_tester::worker::object_id;
use latency_tester::{
    report, BenchError, CallError, CallShape, ConnectOptions, Orchestrator, Payload, RpcClient,
    RpcConnector, StoreClient,
};
use rpc_util::{CODE_NOT_FOUND, GET, LOAD_WITHOUT_ID};
use serde_json::{json, Value};
use stub_store::SharedStore;

async fn spawn_store() -> (String, SharedStore) {
    let store = SharedStore::new();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let app = stub_store::router(store.clone());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (addr, store)
}

fn fast_options() -> ConnectOptions {
    ConnectOptions {
        connect_timeout: Duration::from_millis(500),
        reconnect_interval: Duration::from_millis(10),
        max_reconnects: 1,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn client_round_trips_calls() {
    let (addr, _store) = spawn_store().await;
    let mut client = RpcClient::connect(addr, fast_options()).await.unwrap();

    let stored = client
        .call(LOAD_WITHOUT_ID, vec![json!("{\"k\":1}")])
        .await
        .unwrap();
    assert_eq!(stored.data, vec![json!("0")]);

    let fetched = client.call(GET, vec![json!("0")]).await.unwrap();
    assert_eq!(fetched.data, vec![Value::String("{\"k\":1}".into())]);

    let missing = client.call(GET, vec![json!("404")]).await.unwrap_err();
    assert!(matches!(
        missing,
        CallError::Remote {
            code: CODE_NOT_FOUND,
            ..
        }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn write_then_read_against_stub_store() {
    let (addr, store) = spawn_store().await;
    let connector = RpcConnector::new(addr, fast_options());
    let payload = Payload::new("{\"name\":\"mock\"}");

    let written = Orchestrator::new(connector.clone())
        .shape(CallShape::WriteWithId {
            save_in_cache: true,
        })
        .run(3, 20, payload.clone())
        .await
        .unwrap();
    assert_eq!(written.len(), 3);
    assert!(written.iter().all(|r| r.samples == 20));
    assert_eq!(store.len(), 60);
    let obj = store.get(&object_id(3, 19)).unwrap();
    assert_eq!(obj.payload, payload.as_str());
    assert!(obj.cached);

    let read = Orchestrator::new(connector)
        .shape(CallShape::Read)
        .run(3, 20, payload)
        .await
        .unwrap();
    assert_eq!(read.len(), 3);
    assert!(read.iter().all(|r| r.samples == 20));
    assert!(report(&read).is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reads_of_missing_objects_still_complete() {
    let (addr, store) = spawn_store().await;
    let results = Orchestrator::new(RpcConnector::new(addr, fast_options()))
        .shape(CallShape::Read)
        .run(2, 10, Payload::new("{}"))
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.samples == 10));
    assert!(store.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_store_is_fatal() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let err = Orchestrator::new(RpcConnector::new(addr, fast_options()))
        .run(2, 5, Payload::new("{}"))
        .await
        .unwrap_err();
    match err {
        BenchError::Connect(e) => assert_eq!(e.attempts, 2),
        other => panic!("expected connect error, got {other:?}"),
    }
}
