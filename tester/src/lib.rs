//! Concurrent latency tester for a remote data store.
//!
//! Workers each make a fixed number of timed procedure calls over their own connection and
//! hand one sample sequence to a single aggregation task, which reduces it to a
//! [`RoundSummary`]. The resulting [`ResultSet`] is combined into an [`AggregateReport`].

pub mod client;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod payload;
pub mod report;
pub mod statistics;
pub mod worker;

pub use client::{ConnectOptions, Connector, RpcClient, RpcConnector, StoreClient};
pub use config::{BenchConfig, Cli, TestKind};
pub use error::{BenchError, BenchResult, CallError, ConfigError, ConnectError, PayloadError, StatsError};
pub use orchestrator::Orchestrator;
pub use payload::{load_payload, Payload, PayloadSelector};
pub use report::{render, report, AggregateReport, ResultSet};
pub use statistics::{summarize, RoundSummary};
pub use worker::{CallShape, RoundSamples, Worker};
