//! Fan-out of workers and fan-in of their samples
//!
//! A run connects one client per worker, spawns the workers and a single aggregation task,
//! and only returns once both sides are done:
//!
//! 1. wait for every worker task,
//! 2. drop the last sender so the result channel closes,
//! 3. wait for the aggregation task to drain the channel.
//!
//! Closing earlier would lose rounds, never closing would leave the aggregator waiting.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::client::Connector;
use crate::error::{BenchError, BenchResult, StatsError};
use crate::payload::Payload;
use crate::report::ResultSet;
use crate::statistics::summarize;
use crate::worker::{CallShape, RoundSamples, Worker};

pub struct Orchestrator<C> {
    connector: C,
    shape: CallShape,
    call_timeout: Option<Duration>,
    channel_capacity: usize,
}

impl<C: Connector> Orchestrator<C> {
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            shape: CallShape::Write,
            call_timeout: None,
            channel_capacity: 1,
        }
    }

    #[must_use]
    pub fn shape(mut self, shape: CallShape) -> Self {
        self.shape = shape;
        self
    }

    #[must_use]
    pub fn call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Result channel capacity. Small values keep workers in step with the aggregator.
    #[must_use]
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Runs `workers` rounds of `operations` calls each, concurrently.
    ///
    /// Fails before any call is made if a worker cannot connect. The returned set holds
    /// exactly one summary per worker, in completion order.
    pub async fn run(
        &self,
        workers: usize,
        operations: usize,
        payload: Payload,
    ) -> BenchResult<ResultSet> {
        tracing::info!(
            workers,
            operations,
            shape = ?self.shape,
            call_timeout = ?self.call_timeout,
            "starting run"
        );
        let start = Instant::now();

        let mut clients = Vec::with_capacity(workers);
        for _ in 0..workers {
            clients.push(self.connector.connect().await?);
        }

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let aggregator = tokio::spawn(aggregate(rx, workers));

        let mut handles: Vec<(usize, JoinHandle<BenchResult<()>>)> = Vec::with_capacity(workers);
        for (idx, client) in clients.into_iter().enumerate() {
            let worker_id = idx + 1;
            let worker = Worker::new(worker_id, operations, self.shape, payload.clone())
                .with_call_timeout(self.call_timeout);
            handles.push((worker_id, tokio::spawn(worker.run(client, tx.clone()))));
        }

        let mut worker_failure = None;
        for (worker_id, handle) in handles {
            match handle.await {
                Ok(Ok(())) => tracing::debug!(worker_id, "worker completed"),
                Ok(Err(e)) => {
                    tracing::error!(worker_id, error = %e, "worker returned error");
                    worker_failure.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!(worker_id, error = %e, "worker task panicked");
                    worker_failure.get_or_insert(BenchError::Worker {
                        worker_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        // All workers are done; this is the last sender.
        drop(tx);

        let results = aggregator
            .await
            .map_err(|e| BenchError::Aggregation(e.to_string()))??;
        if let Some(e) = worker_failure {
            return Err(e);
        }
        if results.len() != workers {
            return Err(BenchError::Aggregation(format!(
                "expected {workers} rounds, aggregated {}",
                results.len()
            )));
        }

        tracing::info!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            rounds = results.len(),
            "run completed"
        );
        Ok(results)
    }
}

/// Sole owner of the result set: summarizes each round as it arrives until the channel closes.
async fn aggregate(
    mut rx: mpsc::Receiver<RoundSamples>,
    expected: usize,
) -> Result<ResultSet, StatsError> {
    let mut results = ResultSet::with_capacity(expected);
    while let Some(round) = rx.recv().await {
        let summary = summarize(&round.samples)?;
        tracing::debug!(
            worker_id = round.worker_id,
            samples = summary.samples,
            mean = summary.mean,
            "round aggregated"
        );
        results.push(summary);
    }
    Ok(results)
}

impl<C> std::fmt::Debug for Orchestrator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("shape", &self.shape)
            .field("call_timeout", &self.call_timeout)
            .field("channel_capacity", &self.channel_capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn aggregator_drains_until_closed() {
        let (tx, rx) = mpsc::channel(1);
        let agg = tokio::spawn(aggregate(rx, 2));
        for worker_id in 1..=2 {
            tx.send(RoundSamples {
                worker_id,
                samples: vec![0.1, 0.3],
            })
            .await
            .unwrap();
        }
        drop(tx);
        let results = agg.await.unwrap().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.samples == 2));
    }

    #[tokio::test]
    async fn aggregator_rejects_empty_round() {
        let (tx, rx) = mpsc::channel(1);
        let agg = tokio::spawn(aggregate(rx, 1));
        tx.send(RoundSamples {
            worker_id: 1,
            samples: vec![],
        })
        .await
        .unwrap();
        drop(tx);
        assert_eq!(agg.await.unwrap(), Err(StatsError::EmptySamples));
    }
}
