use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Full;
use hyper::client::conn::http1::{self, SendRequest};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST};
use hyper::Request;
use hyper_util::rt::TokioIo;
use rpc_util::drain::DrainBodyFuture;
use rpc_util::{byte_body, CallRequest, CallResponse, CALL_PATH};
use serde_json::Value;
use tokio::net::TcpStream;

use crate::error::{CallError, ConnectError};

/// Connection policy, fixed when a client is created.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Bound on each individual connection attempt
    pub connect_timeout: Duration,
    /// Pause between failed attempts
    pub reconnect_interval: Duration,
    /// Attempts after the first one
    pub max_reconnects: u32,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(1),
            reconnect_interval: Duration::from_secs(1),
            max_reconnects: 3,
        }
    }
}

/// One connection to the remote store.
#[async_trait]
pub trait StoreClient: Send {
    /// Invokes `procedure` with `args`. A non-zero reply code is an error.
    async fn call(&mut self, procedure: &str, args: Vec<Value>) -> Result<CallResponse, CallError>;
}

/// Opens a fresh, unshared connection per call to `connect`.
#[async_trait]
pub trait Connector: Send + Sync {
    type Client: StoreClient + 'static;

    async fn connect(&self) -> Result<Self::Client, ConnectError>;
}

/// Procedure calls posted as JSON over a dedicated HTTP/1 connection.
pub struct RpcClient {
    addr: String,
    options: ConnectOptions,
    sender: SendRequest<Full<Bytes>>,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("addr", &self.addr)
            .field("options", &self.options)
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl RpcClient {
    pub async fn connect(
        addr: impl Into<String>,
        options: ConnectOptions,
    ) -> Result<Self, ConnectError> {
        let addr = addr.into();
        let sender = establish(&addr, &options).await?;
        Ok(Self {
            addr,
            options,
            sender,
        })
    }

    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl StoreClient for RpcClient {
    async fn call(&mut self, procedure: &str, args: Vec<Value>) -> Result<CallResponse, CallError> {
        if self.sender.is_closed() {
            tracing::debug!(addr = %self.addr, "connection closed, reconnecting");
            self.sender = establish(&self.addr, &self.options).await?;
        }

        let body = serde_json::to_vec(&CallRequest::new(procedure, args))?;
        let request = Request::post(CALL_PATH)
            .header(HOST, self.addr.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(byte_body(body))
            .map_err(|e| CallError::Transport(e.to_string()))?;

        self.sender
            .ready()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;
        let resp = self
            .sender
            .send_request(request)
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(CallError::Status(resp.status().as_u16()));
        }
        let content_length: usize = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|hv| hv.to_str().ok())
            .and_then(|hv| hv.parse().ok())
            .unwrap_or(1024);
        let bytes = DrainBodyFuture::new_trusted_length(resp.into_body(), content_length)
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        let reply: CallResponse = serde_json::from_slice(&bytes)?;
        if !reply.is_ok() {
            return Err(CallError::Remote {
                code: reply.code,
                message: reply.error.unwrap_or_default(),
            });
        }
        Ok(reply)
    }
}

/// Runs the connect policy: one attempt plus up to `max_reconnects` retries.
async fn establish(
    addr: &str,
    options: &ConnectOptions,
) -> Result<SendRequest<Full<Bytes>>, ConnectError> {
    let attempts = options.max_reconnects.saturating_add(1);
    let mut reason = String::new();
    for attempt in 1..=attempts {
        match connect_once(addr, options.connect_timeout).await {
            Ok(sender) => return Ok(sender),
            Err(e) => {
                tracing::warn!(%addr, attempt, error = %e, "connection attempt failed");
                reason = e;
            }
        }
        if attempt < attempts {
            tokio::time::sleep(options.reconnect_interval).await;
        }
    }
    Err(ConnectError {
        addr: addr.to_string(),
        attempts,
        reason,
    })
}

async fn connect_once(
    addr: &str,
    connect_timeout: Duration,
) -> Result<SendRequest<Full<Bytes>>, String> {
    let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| format!("timed out after {connect_timeout:?}"))?
        .map_err(|e| e.to_string())?;
    let _ = stream.set_nodelay(true);
    let (sender, conn) = http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| e.to_string())?;
    let conn_addr = addr.to_string();
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!(addr = %conn_addr, error = %e, "connection terminated");
        }
    });
    Ok(sender)
}

/// Dials the configured address once per worker.
#[derive(Debug, Clone)]
pub struct RpcConnector {
    addr: String,
    options: ConnectOptions,
}

impl RpcConnector {
    #[must_use]
    pub fn new(addr: impl Into<String>, options: ConnectOptions) -> Self {
        Self {
            addr: addr.into(),
            options,
        }
    }
}

#[async_trait]
impl Connector for RpcConnector {
    type Client = RpcClient;

    async fn connect(&self) -> Result<RpcClient, ConnectError> {
        RpcClient::connect(self.addr.clone(), self.options).await
    }
}
