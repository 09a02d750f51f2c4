//! Command line and environment configuration

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};

use crate::client::ConnectOptions;
use crate::error::ConfigError;
use crate::payload::PayloadSelector;
use crate::worker::CallShape;

/// Kind of load one run generates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum TestKind {
    /// Store the payload under a server generated id
    Write,
    /// Store the payload under `<worker>-<operation>`
    WriteWithId,
    /// Read back what `write-with-id` stored
    Read,
}

impl TestKind {
    #[must_use]
    pub fn shape(self, save_in_cache: bool) -> CallShape {
        match self {
            Self::Write => CallShape::Write,
            Self::WriteWithId => CallShape::WriteWithId { save_in_cache },
            Self::Read => CallShape::Read,
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Write => "write",
            Self::WriteWithId => "write-with-id",
            Self::Read => "read",
        })
    }
}

#[derive(Parser, Debug)]
#[command(name = "latency-tester")]
#[command(about = "Measures write/read latency of a remote data store", long_about = None)]
pub struct Cli {
    /// Data store host
    #[arg(short = 's', long, env = "LATENCY_TESTER_SERVER", default_value = "localhost")]
    pub server: String,

    /// Data store host, takes precedence over --server
    #[arg(value_name = "SERVER")]
    pub server_arg: Option<String>,

    /// Data store port, ignored when the host already names one
    #[arg(long, env = "LATENCY_TESTER_PORT", default_value_t = 3013)]
    pub port: u16,

    /// Concurrent workers, one connection each
    #[arg(short, long, env = "LATENCY_TESTER_WORKERS", default_value_t = 5)]
    pub workers: usize,

    /// Calls per worker
    #[arg(short, long, env = "LATENCY_TESTER_OPERATIONS", default_value_t = 250)]
    pub operations: usize,

    /// Tests to run, in order. Repeat the flag to run several.
    #[arg(short, long = "test", value_enum, action = ArgAction::Append, default_values_t = [TestKind::Write])]
    pub tests: Vec<TestKind>,

    /// Directory holding input<N>.json mock payloads
    #[arg(long, env = "LATENCY_TESTER_MOCKS_DIR", default_value = "mocks")]
    pub mocks_dir: PathBuf,

    /// Mock index, or "random"
    #[arg(long, env = "LATENCY_TESTER_PAYLOAD", default_value = "0")]
    pub payload: PayloadSelector,

    /// Cache hint sent with write-with-id calls
    #[arg(long, env = "LATENCY_TESTER_SAVE_IN_CACHE", default_value_t = true, action = ArgAction::Set)]
    pub save_in_cache: bool,

    /// Bound on each connection attempt
    #[arg(long, env = "LATENCY_TESTER_CONNECT_TIMEOUT_MS", default_value_t = 1000)]
    pub connect_timeout_ms: u64,

    /// Pause between connection attempts
    #[arg(long, env = "LATENCY_TESTER_RECONNECT_INTERVAL_MS", default_value_t = 1000)]
    pub reconnect_interval_ms: u64,

    /// Connection attempts after the first
    #[arg(long, env = "LATENCY_TESTER_MAX_RECONNECTS", default_value_t = 3)]
    pub max_reconnects: u32,

    /// Bound on each call; unbounded when unset
    #[arg(long, env = "LATENCY_TESTER_CALL_TIMEOUT_MS")]
    pub call_timeout_ms: Option<u64>,

    /// Rounds that may wait in the result channel
    #[arg(long, env = "LATENCY_TESTER_CHANNEL_CAPACITY", default_value_t = 1)]
    pub channel_capacity: usize,
}

/// Validated settings for a whole invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub address: String,
    pub workers: usize,
    pub operations: usize,
    pub tests: Vec<TestKind>,
    pub mocks_dir: PathBuf,
    pub payload: PayloadSelector,
    pub save_in_cache: bool,
    pub connect: ConnectOptions,
    pub call_timeout: Option<Duration>,
    pub channel_capacity: usize,
}

impl BenchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers(
                "at least one worker is required".into(),
            ));
        }
        if self.operations == 0 {
            return Err(ConfigError::InvalidOperations(
                "each worker must make at least one call".into(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidChannelCapacity(
                "channel capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl TryFrom<Cli> for BenchConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let host = cli.server_arg.unwrap_or(cli.server);
        let address = if host.contains(':') {
            host
        } else {
            format!("{host}:{}", cli.port)
        };
        let config = Self {
            address,
            workers: cli.workers,
            operations: cli.operations,
            tests: cli.tests,
            mocks_dir: cli.mocks_dir,
            payload: cli.payload,
            save_in_cache: cli.save_in_cache,
            connect: ConnectOptions {
                connect_timeout: Duration::from_millis(cli.connect_timeout_ms),
                reconnect_interval: Duration::from_millis(cli.reconnect_interval_ms),
                max_reconnects: cli.max_reconnects,
            },
            call_timeout: cli.call_timeout_ms.map(Duration::from_millis),
            channel_capacity: cli.channel_capacity,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<BenchConfig, ConfigError> {
        let cli = Cli::try_parse_from(std::iter::once("latency-tester").chain(args.iter().copied()))
            .unwrap();
        BenchConfig::try_from(cli)
    }

    #[test]
    fn default_settings() {
        let cfg = parse(&[]).unwrap();
        assert_eq!(cfg.address, "localhost:3013");
        assert_eq!(cfg.workers, 5);
        assert_eq!(cfg.operations, 250);
        assert_eq!(cfg.tests, vec![TestKind::Write]);
        assert_eq!(cfg.payload, PayloadSelector::Index(0));
        assert!(cfg.save_in_cache);
        assert_eq!(cfg.connect, ConnectOptions::default());
        assert_eq!(cfg.call_timeout, None);
        assert_eq!(cfg.channel_capacity, 1);
    }

    #[test]
    fn positional_server_wins() {
        let cfg = parse(&["-s", "db1", "db2"]).unwrap();
        assert_eq!(cfg.address, "db2:3013");
        let cfg = parse(&["db3:4000"]).unwrap();
        assert_eq!(cfg.address, "db3:4000");
    }

    #[test]
    fn tests_run_in_given_order() {
        let cfg = parse(&["--test", "write-with-id", "--test", "read"]).unwrap();
        assert_eq!(cfg.tests, vec![TestKind::WriteWithId, TestKind::Read]);
        assert_eq!(
            cfg.tests[0].shape(cfg.save_in_cache),
            CallShape::WriteWithId {
                save_in_cache: true
            }
        );
    }

    #[test]
    fn optional_call_timeout_and_policy() {
        let cfg = parse(&[
            "--call-timeout-ms",
            "250",
            "--max-reconnects",
            "0",
            "--save-in-cache",
            "false",
            "--payload",
            "random",
        ])
        .unwrap();
        assert_eq!(cfg.call_timeout, Some(Duration::from_millis(250)));
        assert_eq!(cfg.connect.max_reconnects, 0);
        assert!(!cfg.save_in_cache);
        assert_eq!(cfg.payload, PayloadSelector::Random);
    }

    #[test]
    fn rejects_zero_counts() {
        assert!(matches!(
            parse(&["--workers", "0"]),
            Err(ConfigError::InvalidWorkers(_))
        ));
        assert!(matches!(
            parse(&["--operations", "0"]),
            Err(ConfigError::InvalidOperations(_))
        ));
        assert!(matches!(
            parse(&["--channel-capacity", "0"]),
            Err(ConfigError::InvalidChannelCapacity(_))
        ));
    }
}
