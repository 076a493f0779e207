//! Error types for session management
//!
//! Failures are grouped by where they originate: the caller's request (validation),
//! the network (transport), the user (cancellation), the backend breaking the turn
//! protocol, or the local configuration. The controller converts everything except
//! validation and configuration errors into session status and output text.

use coderun_client::TransportError;
use thiserror::Error;

/// A `start` request that can never succeed. Reported before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Code is empty")]
    EmptyCode,
    #[error("Unsupported language: {0}")]
    UnknownLanguage(String),
}

/// An event or call that does not fit the current turn state. Logged and ignored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error("{event} received while {state}")]
    UnexpectedEvent { event: String, state: String },
    #[error("Input sent while {state}")]
    InputNotAwaited { state: String },
    #[error("No interactive session is running")]
    NoInteractiveSession,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Transport(#[from] TransportError),
    #[error("Execution stopped by user.")]
    Cancelled,
    #[error("Program failed: {0}")]
    Execution(String),
    #[error("Protocol violation: {0}")]
    ProtocolViolation(#[from] ProtocolViolation),
    #[error("Configuration error: {0}")]
    Config(String),
}
