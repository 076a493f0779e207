//! Execution session management for running code on a remote sandbox.
//!
//! This crate drives one code-execution attempt at a time from submission to
//! completion or cancellation. It owns the state the user sees (accumulated output,
//! the outstanding prompt, the session status) and keeps it consistent while
//! responses and channel events arrive asynchronously and sometimes late.
//!
//! # Architecture Overview
//!
//! - **Output accumulation**: an append-only buffer of fragments in receipt order
//! - **Turn protocol**: a pure state machine deciding when the program is streaming,
//!   waiting for input, or finished, and which frames to send next
//! - **Session control**: start/stop/input operations, supersession of live
//!   sessions, stale-event filtering and connect/input timeouts
//! - **Configuration system**: YAML configuration with defaults and environment overrides
//! - **Snippets**: a session-agnostic shelf of saved snippets used to seed new sessions

pub mod config;
pub mod controller;
pub mod errors;
pub mod output;
pub mod protocol;
pub mod session;
pub mod snippets;

pub use config::*;
pub use controller::{InputDisposition, SessionController};
pub use errors::{ProtocolViolation, SessionError, ValidationError};
pub use output::OutputBuffer;
pub use protocol::{TurnCommand, TurnEvent, TurnProtocol, TurnState, TurnStep};
pub use session::{ExecutionMode, Session, SessionStatus, StartRequest};
pub use snippets::{EditorSeed, SnippetShelf};

pub use coderun_client::SessionId;
