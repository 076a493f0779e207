//! Configuration type definitions
//!
//! The configuration is split by concern: the backend endpoints, session timing and
//! defaults, and logging. Timeouts are stored as whole seconds so the YAML stays
//! readable; accessors convert them to [`Duration`]s.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use coderun_client::http_client::EXECUTE_PATH;
use coderun_client::snippets::SNIPPETS_PATH;
use coderun_client::websocket::INTERACTIVE_PATH;
use coderun_types::Language;

use crate::errors::SessionError;
use crate::session::ExecutionMode;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CoderunConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_execute_path")]
    pub execute_path: String,
    /// Explicit interactive endpoint; derived from `base_url` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive_url: Option<String>,
    #[serde(default = "default_snippets_path")]
    pub snippets_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            execute_path: default_execute_path(),
            interactive_url: None,
            snippets_path: default_snippets_path(),
        }
    }
}

impl BackendConfig {
    /// WebSocket URL of the interactive endpoint.
    pub fn interactive_endpoint(&self) -> String {
        if let Some(url) = &self.interactive_url {
            return url.clone();
        }
        let base = self.base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}{}", ws_base, INTERACTIVE_PATH)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSettings {
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default)]
    pub default_mode: ExecutionMode,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Idle limit while a prompt is unanswered. 0 disables it.
    #[serde(default = "default_input_timeout_secs")]
    pub input_timeout_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            default_mode: ExecutionMode::default(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            input_timeout_secs: default_input_timeout_secs(),
        }
    }
}

impl SessionSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn input_timeout(&self) -> Option<Duration> {
        (self.input_timeout_secs > 0).then(|| Duration::from_secs(self.input_timeout_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log destination for interactive runs, which keep the terminal for the program.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_execute_path() -> String {
    EXECUTE_PATH.to_string()
}

fn default_snippets_path() -> String {
    SNIPPETS_PATH.to_string()
}

fn default_language() -> String {
    Language::Python.display_name().to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_input_timeout_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("coderun.log")
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

impl CoderunConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        let base_url = &self.backend.base_url;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(SessionError::Config(format!(
                "backend.base_url must be an http(s) URL, got '{}'",
                base_url
            )));
        }

        if let Some(url) = &self.backend.interactive_url {
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(SessionError::Config(format!(
                    "backend.interactive_url must be a ws(s) URL, got '{}'",
                    url
                )));
            }
        }

        for (name, path) in [
            ("execute_path", &self.backend.execute_path),
            ("snippets_path", &self.backend.snippets_path),
        ] {
            if !path.starts_with('/') {
                return Err(SessionError::Config(format!(
                    "backend.{} must start with '/', got '{}'",
                    name, path
                )));
            }
        }

        if self.session.default_language.parse::<Language>().is_err() {
            return Err(SessionError::Config(format!(
                "session.default_language '{}' is not supported",
                self.session.default_language
            )));
        }

        if self.session.request_timeout_secs == 0 {
            return Err(SessionError::Config(
                "session.request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.session.connect_timeout_secs == 0 {
            return Err(SessionError::Config(
                "session.connect_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(SessionError::Config(format!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}
