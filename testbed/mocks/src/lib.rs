//! Consolidated test mocks for the coderun project
//!
//! This crate provides scripted implementations of the transport traits so the
//! session core can be exercised without a network: responses are queued up front,
//! requests and sent frames are recorded, and channel events are injected by the test
//! exactly when it wants them.

pub mod channel;
pub mod execution;

pub use channel::*;
pub use execution::*;
