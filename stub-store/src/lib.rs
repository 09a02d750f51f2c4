//! In-memory stand-in for the remote data store.
//!
//! Answers the same three procedures the latency tester drives, over `POST /call`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::RwLock;
use rpc_util::{
    CallRequest, CallResponse, CALL_PATH, CODE_BAD_REQUEST, CODE_NOT_FOUND, GET, LOAD_WITHOUT_ID,
    LOAD_WITH_ID,
};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub payload: String,
    pub cached: bool,
}

#[derive(Clone, Default)]
pub struct SharedStore {
    next_id: Arc<AtomicUsize>,
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl SharedStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<StoredObject> {
        self.objects.read().get(id).cloned()
    }

    fn insert(&self, id: String, payload: String, cached: bool) {
        self.objects
            .write()
            .insert(id, StoredObject { payload, cached });
    }

    /// Runs one procedure against the store.
    #[must_use]
    pub fn dispatch(&self, req: &CallRequest) -> CallResponse {
        match (req.procedure.as_str(), req.args.as_slice()) {
            (LOAD_WITHOUT_ID, [Value::String(payload)]) => {
                let id = self.next_id.fetch_add(1, Ordering::AcqRel).to_string();
                self.insert(id.clone(), payload.clone(), false);
                CallResponse::ok(vec![Value::String(id)])
            }
            (LOAD_WITH_ID, [Value::String(id), Value::Bool(cached), Value::String(payload)]) => {
                self.insert(id.clone(), payload.clone(), *cached);
                CallResponse::ok(vec![Value::String(id.clone())])
            }
            (GET, [Value::String(id)]) => match self.get(id) {
                Some(obj) => CallResponse::ok(vec![Value::String(obj.payload)]),
                None => CallResponse::failed(CODE_NOT_FOUND, format!("no object {id}")),
            },
            (LOAD_WITHOUT_ID | LOAD_WITH_ID | GET, _) => CallResponse::failed(
                CODE_BAD_REQUEST,
                format!("malformed arguments for {}", req.procedure),
            ),
            (other, _) => {
                CallResponse::failed(CODE_BAD_REQUEST, format!("unknown procedure {other}"))
            }
        }
    }
}

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route(CALL_PATH, post(call))
        .with_state(store)
}

#[inline]
async fn call(State(store): State<SharedStore>, Json(req): Json<CallRequest>) -> Json<CallResponse> {
    let resp = store.dispatch(&req);
    if !resp.is_ok() {
        tracing::debug!(procedure = %req.procedure, code = resp.code, "call rejected");
    }
    Json(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn load_without_id_generates_sequential_ids() {
        let store = SharedStore::new();
        let first = store.dispatch(&CallRequest::new(LOAD_WITHOUT_ID, vec![json!("{}")]));
        let second = store.dispatch(&CallRequest::new(LOAD_WITHOUT_ID, vec![json!("{}")]));
        assert_eq!(first.data, vec![json!("0")]);
        assert_eq!(second.data, vec![json!("1")]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn load_with_id_then_get() {
        let store = SharedStore::new();
        let put = store.dispatch(&CallRequest::new(
            LOAD_WITH_ID,
            vec![json!("10"), json!(true), json!("{\"a\":1}")],
        ));
        assert!(put.is_ok());
        assert_eq!(
            store.get("10"),
            Some(StoredObject {
                payload: "{\"a\":1}".to_string(),
                cached: true
            })
        );

        let got = store.dispatch(&CallRequest::new(GET, vec![json!("10")]));
        assert_eq!(got.data, vec![json!("{\"a\":1}")]);
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = SharedStore::new();
        let got = store.dispatch(&CallRequest::new(GET, vec![json!("nope")]));
        assert_eq!(got.code, CODE_NOT_FOUND);
    }

    #[test]
    fn rejects_malformed_and_unknown_calls() {
        let store = SharedStore::new();
        let bad_args = store.dispatch(&CallRequest::new(LOAD_WITH_ID, vec![json!("1")]));
        assert_eq!(bad_args.code, CODE_BAD_REQUEST);
        let unknown = store.dispatch(&CallRequest::new("drop", vec![]));
        assert_eq!(unknown.code, CODE_BAD_REQUEST);
        assert!(store.is_empty());
    }
}
