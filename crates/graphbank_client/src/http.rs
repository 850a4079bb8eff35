//! JSON-over-HTTP transport implementation.
//!
//! The actual HTTP client is abstracted via a trait to allow different
//! implementations (reqwest, hyper, ureq, or a loopback for tests).

use crate::config::StoreConfig;
use crate::error::{ClientError, ClientResult};
use crate::transport::StoreRpc;
use graphbank_model::{
    AlterRequest, ModelError, MutateRequest, MutateResponse, QueryRequest, QueryResponse,
    TxnContext,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. This keeps
/// the choice of HTTP library (or a non-HTTP loopback) out of the client.
pub trait HttpClient: Send + Sync {
    /// Sends a POST request and returns the response body.
    fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, String>;

    /// Checks if the client is connected/healthy.
    fn is_healthy(&self) -> bool;
}

/// Error classification carried inside an HTTP response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireErrorKind {
    /// Store unreachable.
    Connection,
    /// Schema text rejected.
    Schema,
    /// Query text rejected.
    Query,
    /// RPC-level failure.
    Transport,
    /// Write rejected (conflict or constraint violation).
    Mutation,
    /// Mutation on a read-only transaction.
    ReadOnly,
}

/// Error payload inside an HTTP response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    /// Error classification.
    pub kind: WireErrorKind,
    /// Human-readable reason.
    pub message: String,
}

impl WireError {
    /// Creates a wire error.
    pub fn new(kind: WireErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Converts into the client-side error taxonomy.
    #[must_use]
    pub fn into_client_error(self) -> ClientError {
        match self.kind {
            WireErrorKind::Connection => ClientError::connection(self.message),
            WireErrorKind::Schema => ClientError::schema(self.message),
            WireErrorKind::Query => ClientError::query(self.message),
            WireErrorKind::Transport => ClientError::transport(self.message),
            WireErrorKind::Mutation => ClientError::mutation(self.message),
            WireErrorKind::ReadOnly => ClientError::ReadOnly,
        }
    }
}

/// Response envelope used on every HTTP endpoint: either `data` or `error`
/// is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpEnvelope<T> {
    /// Successful payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Failure payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

impl<T> HttpEnvelope<T> {
    /// Wraps a successful payload.
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    /// Wraps a failure.
    pub fn fail(kind: WireErrorKind, message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(WireError::new(kind, message)),
        }
    }

    /// Unwraps the envelope into a client result.
    pub fn into_result(self) -> ClientResult<T> {
        if let Some(error) = self.error {
            return Err(error.into_client_error());
        }
        self.data
            .ok_or_else(|| ModelError::decode("response envelope has neither data nor error").into())
    }
}

/// JSON-over-HTTP store transport.
///
/// Endpoints mirror the RPC surface: `/alter`, `/query`, `/mutate`,
/// `/commit`, `/discard`.
pub struct HttpTransport<C: HttpClient> {
    config: StoreConfig,
    client: C,
    connected: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport for the configured endpoint.
    ///
    /// The configured timeout is advisory for the [`HttpClient`]
    /// implementation; the loopback client ignores it.
    pub fn new(config: StoreConfig, client: C) -> Self {
        Self {
            config,
            client,
            connected: AtomicBool::new(true),
            last_error: RwLock::new(None),
        }
    }

    /// Returns the connection configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.config.endpoint
    }

    /// Returns the last transport error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn set_error(&self, err: &str) {
        *self.last_error.write() = Some(err.to_string());
    }

    fn clear_error(&self) {
        *self.last_error.write() = None;
    }

    fn post_json<Req, Res>(&self, endpoint: &str, request: &Req) -> ClientResult<Res>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        if !self.is_connected() {
            return Err(ClientError::connection("transport closed"));
        }

        let body = serde_json::to_vec(request)
            .map_err(|e| ClientError::transport(format!("failed to encode request: {e}")))?;

        let url = format!("{}{}", self.base_url(), endpoint);
        let response_body = self.client.post(&url, body).map_err(|e| {
            self.set_error(&e);
            self.connected.store(false, Ordering::SeqCst);
            ClientError::transport(e)
        })?;

        self.clear_error();

        let envelope: HttpEnvelope<Res> = serde_json::from_slice(&response_body)
            .map_err(|e| ModelError::decode(format!("bad response envelope: {e}")))?;
        envelope.into_result()
    }
}

impl<C: HttpClient> StoreRpc for HttpTransport<C> {
    fn alter(&self, request: &AlterRequest) -> ClientResult<()> {
        self.post_json::<_, serde_json::Value>("/alter", request)
            .map(|_| ())
    }

    fn query(&self, request: &QueryRequest) -> ClientResult<QueryResponse> {
        self.post_json("/query", request)
    }

    fn mutate(&self, request: &MutateRequest) -> ClientResult<MutateResponse> {
        self.post_json("/mutate", request)
    }

    fn commit(&self, txn: &TxnContext) -> ClientResult<()> {
        self.post_json::<_, serde_json::Value>("/commit", txn)
            .map(|_| ())
    }

    fn discard(&self, txn: &TxnContext) -> ClientResult<()> {
        self.post_json::<_, serde_json::Value>("/discard", txn)
            .map(|_| ())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.client.is_healthy()
    }

    fn close(&self) -> ClientResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer {
    /// Handles a POST request and returns the response body.
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String>;
}

impl<T: LoopbackServer> LoopbackServer for std::sync::Arc<T> {
    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, String> {
        (**self).handle_post(path, body)
    }
}

/// A loopback HTTP client that routes requests directly to a server
/// implementation, without network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }
}

impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    fn post(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, String> {
        // Strip the base URL down to the endpoint path.
        let path = url.rfind('/').map(|i| &url[i..]).unwrap_or(url);
        self.server.handle_post(path, &body)
    }

    fn is_healthy(&self) -> bool {
        true
    }
}
