//! Terminal front end for the coderun session manager
//!
//! The binary reads code from a file, runs it through a
//! [`SessionController`](coderun_core::SessionController) and mirrors the session in
//! the terminal: output is printed as it arrives, prompts are answered from stdin and
//! Ctrl-C stops the run.

pub mod console;
pub mod source;
