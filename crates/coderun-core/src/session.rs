//! Session model: one attempt to execute a piece of code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use coderun_client::SessionId;
use coderun_types::Language;

/// How the code is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Send the code and all stdin at once, get one final result.
    #[default]
    OneShot,
    /// Stream output over a duplex channel and answer prompts as they come.
    Interactive,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::OneShot => write!(f, "one-shot"),
            ExecutionMode::Interactive => write!(f, "interactive"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "one-shot" | "oneshot" | "batch" => Ok(ExecutionMode::OneShot),
            "interactive" => Ok(ExecutionMode::Interactive),
            _ => Err(format!("Unknown execution mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Idle,
    Starting,
    Running,
    AwaitingInput,
    Completed,
    Stopped,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Stopped | SessionStatus::Failed
        )
    }

    /// True while a transport may still deliver something for the session.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            SessionStatus::Starting | SessionStatus::Running | SessionStatus::AwaitingInput
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Starting => "starting",
            SessionStatus::Running => "running",
            SessionStatus::AwaitingInput => "awaiting input",
            SessionStatus::Completed => "completed",
            SessionStatus::Stopped => "stopped",
            SessionStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What the caller asks to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub code: String,
    /// User-facing language name, resolved when the session starts.
    pub language: String,
    pub mode: ExecutionMode,
    /// All stdin for a one-shot run.
    pub captured_input: Option<String>,
}

impl StartRequest {
    pub fn one_shot(code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
            mode: ExecutionMode::OneShot,
            captured_input: None,
        }
    }

    pub fn interactive(code: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: language.into(),
            mode: ExecutionMode::Interactive,
            captured_input: None,
        }
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.captured_input = Some(input.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub mode: ExecutionMode,
    pub language: Language,
    /// Snapshot of the code taken at start.
    pub source_code: Arc<str>,
    pub status: SessionStatus,
    pub captured_input: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        mode: ExecutionMode,
        language: Language,
        source_code: Arc<str>,
        captured_input: Option<String>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            mode,
            language,
            source_code,
            status: SessionStatus::Idle,
            captured_input,
            started_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("one-shot".parse::<ExecutionMode>().unwrap(), ExecutionMode::OneShot);
        assert_eq!("Interactive".parse::<ExecutionMode>().unwrap(), ExecutionMode::Interactive);
        assert!("streaming".parse::<ExecutionMode>().is_err());
        assert_eq!(ExecutionMode::OneShot.to_string(), "one-shot");
    }

    #[test]
    fn test_status_classification() {
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Stopped.is_terminal());
        assert!(!SessionStatus::AwaitingInput.is_terminal());
        assert!(SessionStatus::AwaitingInput.is_live());
        assert!(!SessionStatus::Idle.is_live());
    }
}
