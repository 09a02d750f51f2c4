//! Error types for the latency tester

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Statistics that cannot be computed from the given input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// A round produced no samples
    #[error("cannot summarize an empty sample sequence")]
    EmptySamples,

    /// No rounds were aggregated
    #[error("cannot report on an empty result set")]
    EmptyResultSet,
}

/// Failure to establish a connection to the remote store
#[derive(Error, Debug)]
#[error("failed to connect to {addr} after {attempts} attempt(s): {reason}")]
pub struct ConnectError {
    pub addr: String,
    pub attempts: u32,
    pub reason: String,
}

/// A single remote call that did not succeed
#[derive(Error, Debug)]
pub enum CallError {
    /// Connection or protocol failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Request or reply body was not valid JSON for a call
    #[error("malformed call body: {0}")]
    Codec(#[from] serde_json::Error),

    /// The server answered with a non-zero code
    #[error("remote error {code}: {message}")]
    Remote { code: u32, message: String },

    /// The call exceeded the configured bound
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// Reconnecting a closed connection failed
    #[error(transparent)]
    Reconnect(#[from] ConnectError),
}

/// Payload could not be loaded at startup
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("failed to open mock file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("mock file {path} is not valid JSON: {source}")]
    Invalid {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Rejected run configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid worker count: {0}")]
    InvalidWorkers(String),

    #[error("invalid operation count: {0}")]
    InvalidOperations(String),

    #[error("invalid channel capacity: {0}")]
    InvalidChannelCapacity(String),
}

/// Failure of a whole benchmark run
#[derive(Error, Debug)]
pub enum BenchError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// A worker did not hand over its samples
    #[error("worker {worker_id} failed: {reason}")]
    Worker { worker_id: usize, reason: String },

    /// The aggregation task did not finish cleanly
    #[error("aggregation failed: {0}")]
    Aggregation(String),

    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// Result type alias
pub type BenchResult<T> = std::result::Result<T, BenchError>;
