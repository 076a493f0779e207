//! Transport failures.
//!
//! Each failure mode keeps its own variant so the text shown to the user says what
//! actually went wrong (an unreachable host reads differently from a 500).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Failed to connect: {0}")]
    Connect(String),
    #[error("Backend returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Channel error: {0}")]
    Channel(String),
    #[error("Channel is not open")]
    NotOpen,
}

impl TransportError {
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        TransportError::HttpStatus {
            status,
            body: body.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_decode() {
            TransportError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::http_status(status.as_u16(), err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::NotOpen,
            WsError::Io(e) => TransportError::Network(e.to_string()),
            WsError::Http(response) => {
                TransportError::http_status(response.status().as_u16(), "WebSocket upgrade rejected")
            }
            other => TransportError::Channel(other.to_string()),
        }
    }
}
