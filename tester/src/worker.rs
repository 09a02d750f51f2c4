//! One round of sequential, timed remote calls

use std::time::Duration;

use rpc_util::{GET, LOAD_WITHOUT_ID, LOAD_WITH_ID};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::client::StoreClient;
use crate::error::{BenchError, BenchResult, CallError};
use crate::payload::Payload;

/// Which procedure each call of a round invokes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CallShape {
    /// `loadWithoutId(payload)`
    Write,
    /// `loadWithId(id, save_in_cache, payload)`
    WriteWithId { save_in_cache: bool },
    /// `get(id)`, reading back what `WriteWithId` stored
    Read,
}

impl CallShape {
    #[must_use]
    pub fn procedure(&self) -> &'static str {
        match self {
            Self::Write => LOAD_WITHOUT_ID,
            Self::WriteWithId { .. } => LOAD_WITH_ID,
            Self::Read => GET,
        }
    }

    fn args(&self, worker_id: usize, op: usize, payload: &Payload) -> Vec<Value> {
        match self {
            Self::Write => vec![payload.to_value()],
            Self::WriteWithId { save_in_cache } => vec![
                Value::String(object_id(worker_id, op)),
                Value::Bool(*save_in_cache),
                payload.to_value(),
            ],
            Self::Read => vec![Value::String(object_id(worker_id, op))],
        }
    }
}

/// Identifier the id-based shapes use for operation `op` of worker `worker_id`.
#[must_use]
pub fn object_id(worker_id: usize, op: usize) -> String {
    format!("{worker_id}-{op}")
}

/// Elapsed seconds of every call one worker made, in call order.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSamples {
    pub worker_id: usize,
    pub samples: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Worker {
    id: usize,
    operations: usize,
    shape: CallShape,
    payload: Payload,
    call_timeout: Option<Duration>,
}

impl Worker {
    #[must_use]
    pub fn new(id: usize, operations: usize, shape: CallShape, payload: Payload) -> Self {
        Self {
            id,
            operations,
            shape,
            payload,
            call_timeout: None,
        }
    }

    /// Bounds every call. Unset, a hung call blocks the round indefinitely.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Makes `operations` calls and sends the full sample sequence once at the end.
    ///
    /// Failed calls are logged and still timed. The only error is a closed result channel.
    pub async fn run<C: StoreClient>(
        self,
        mut client: C,
        results: mpsc::Sender<RoundSamples>,
    ) -> BenchResult<()> {
        tracing::debug!(worker_id = self.id, shape = ?self.shape, "worker started");
        let mut samples = Vec::with_capacity(self.operations);
        for op in 0..self.operations {
            let args = self.shape.args(self.id, op, &self.payload);
            let start = Instant::now();
            let res = self.call(&mut client, args).await;
            samples.push(start.elapsed().as_secs_f64());

            match res {
                Ok(resp) if self.shape == CallShape::Read => {
                    tracing::debug!(
                        worker_id = self.id,
                        op,
                        code = resp.code,
                        data = ?resp.data,
                        "fetched object"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        worker_id = self.id,
                        op,
                        procedure = self.shape.procedure(),
                        error = %e,
                        "call failed"
                    );
                }
            }
        }

        results
            .send(RoundSamples {
                worker_id: self.id,
                samples,
            })
            .await
            .map_err(|_| BenchError::Worker {
                worker_id: self.id,
                reason: "result channel closed before samples were handed over".to_string(),
            })
    }

    async fn call<C: StoreClient>(
        &self,
        client: &mut C,
        args: Vec<Value>,
    ) -> Result<rpc_util::CallResponse, CallError> {
        let fut = client.call(self.shape.procedure(), args);
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| CallError::Timeout(limit))?,
            None => fut.await,
        }
    }
}
