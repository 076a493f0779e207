//! Request and response bodies of the one-shot execution endpoint.

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Title the backend records when a run is saved without an explicit title.
pub const DEFAULT_SNIPPET_TITLE: &str = "New Code";

/// Body of `POST /api/execute/execute/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// The source code to execute.
    pub code: String,
    /// Backend language identifier (see [`Language::backend_id`]).
    pub language_id: u32,
    /// Whether the backend should also store the code as a snippet.
    pub save_snippet: bool,
    /// Title used when `save_snippet` is set.
    pub snippet_title: String,
    /// All stdin for the program, supplied up front.
    pub user_input: String,
}

impl ExecuteRequest {
    pub fn new(code: impl Into<String>, language: Language) -> Self {
        Self {
            code: code.into(),
            language_id: language.backend_id(),
            save_snippet: false,
            snippet_title: DEFAULT_SNIPPET_TITLE.to_string(),
            user_input: String::new(),
        }
    }

    pub fn with_user_input(mut self, input: impl Into<String>) -> Self {
        self.user_input = input.into();
        self
    }

    pub fn saving_as(mut self, title: impl Into<String>) -> Self {
        self.save_snippet = true;
        self.snippet_title = title.into();
        self
    }
}

/// Final status of a one-shot execution as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// The program ran to completion.
    Success,
    /// Compilation or runtime failure.
    Error,
    /// The program exceeded the backend's time limit.
    Timeout,
    /// The backend had not finished the run when it answered.
    Pending,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Body returned by the one-shot endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    /// Final status of the run.
    pub status: ExecutionStatus,
    /// Captured standard output.
    #[serde(default)]
    pub stdout: String,
    /// Captured standard error.
    #[serde(default)]
    pub stderr: String,
    /// Beginner-oriented explanation of a failure, possibly empty.
    #[serde(default)]
    pub friendly_error: Option<String>,
    /// Wall time of the run in seconds, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,
}

impl ExecuteResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Success,
            stdout: stdout.into(),
            stderr: String::new(),
            friendly_error: None,
            execution_time: None,
        }
    }

    pub fn failure(stderr: impl Into<String>, friendly_error: Option<String>) -> Self {
        Self {
            status: ExecutionStatus::Error,
            stdout: String::new(),
            stderr: stderr.into(),
            friendly_error,
            execution_time: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    /// The text to show for this response: stdout on success, otherwise the
    /// friendly explanation when non-empty, else stderr, prefixed with `Error: `.
    pub fn display_output(&self) -> String {
        if self.is_success() {
            return self.stdout.clone();
        }
        let detail = match self.friendly_error.as_deref() {
            Some(friendly) if !friendly.is_empty() => friendly,
            _ => self.stderr.as_str(),
        };
        format!("Error: {}", detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_output_success() {
        let response = ExecuteResponse::success("1\n");
        assert_eq!(response.display_output(), "1\n");
    }

    #[test]
    fn test_display_output_prefers_friendly_error() {
        let response = ExecuteResponse::failure(
            "Traceback...\nNameError: x",
            Some("You used a variable before defining it.".to_string()),
        );
        assert_eq!(
            response.display_output(),
            "Error: You used a variable before defining it."
        );
    }

    #[test]
    fn test_display_output_falls_back_to_stderr() {
        let response = ExecuteResponse::failure("segfault", Some(String::new()));
        assert_eq!(response.display_output(), "Error: segfault");

        let response = ExecuteResponse::failure("boom", None);
        assert_eq!(response.display_output(), "Error: boom");
    }

    #[test]
    fn test_response_tolerates_missing_and_unknown_fields() {
        let response: ExecuteResponse = serde_json::from_str(
            r#"{"status":"timeout","stderr":"Execution timed out","memory_used":0,"execution_time":10.0}"#,
        )
        .unwrap();
        assert_eq!(response.status, ExecutionStatus::Timeout);
        assert_eq!(response.stdout, "");
        assert_eq!(response.execution_time, Some(10.0));
        assert_eq!(response.display_output(), "Error: Execution timed out");

        let response: ExecuteResponse =
            serde_json::from_str(r#"{"status":"queued","friendly_error":null}"#).unwrap();
        assert_eq!(response.status, ExecutionStatus::Unknown);
    }
}
