//! Transport adapters for talking to the remote code execution backend
//!
//! This crate hides the two ways a program can be run remotely behind small traits:
//! a one-shot request/response call ([`ExecutionClient`]) and a duplex channel that
//! streams output and prompts ([`ChannelConnector`]). The session layer depends only on
//! these traits, so production code uses the HTTP and WebSocket implementations while
//! tests swap in scripted fakes without touching the network.
//!
//! Channel activity is reported as [`ChannelEnvelope`]s pushed into a sink owned by the
//! caller. Every envelope is tagged with the [`SessionId`] that opened the channel so a
//! caller that has moved on to a newer session can recognise and drop stale events.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use coderun_types::ExecuteRequest;

pub mod channel;
pub mod error;
pub mod http_client;
pub mod snippets;
pub mod types;
pub mod websocket;

pub use channel::*;
pub use error::*;
pub use http_client::HttpExecutionClient;
pub use snippets::SnippetClient;
pub use types::*;
pub use websocket::WebSocketConnector;

/// One-shot execution: submit the whole program and its stdin, await one result.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// Submit a request and wait for the final response. Resolves with
    /// [`Submission::Cancelled`] as soon as `cancel` fires, abandoning the request.
    async fn submit(
        &self,
        request: ExecuteRequest,
        cancel: CancellationToken,
    ) -> Result<Submission, TransportError>;

    /// Check that the backend is reachable
    async fn health_check(&self) -> Result<(), TransportError>;
}

/// Interactive execution: opens duplex channels to the backend.
pub trait ChannelConnector: Send + Sync {
    /// Start connecting to `endpoint` and return immediately. Every event of the
    /// channel is delivered to `sink`, tagged with `session`, in arrival order.
    fn open(
        &self,
        endpoint: &str,
        session: SessionId,
        sink: UnboundedSender<ChannelEnvelope>,
    ) -> ChannelHandle;
}

/// Factory for the production transports
pub struct ClientFactory;

impl ClientFactory {
    /// Create an HTTP client for the one-shot endpoint
    pub fn create_http_client(base_url: String) -> Arc<dyn ExecutionClient> {
        Arc::new(HttpExecutionClient::new(base_url))
    }

    /// Create a WebSocket connector for the interactive endpoint
    pub fn create_websocket_connector() -> Arc<dyn ChannelConnector> {
        Arc::new(WebSocketConnector::new())
    }
}
