//! Configuration loader for YAML files and environment overrides
//!
//! Values are resolved in increasing priority: built-in defaults, the YAML file,
//! then `CODERUN_*` environment variables. The result is validated before use.

use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::types::CoderunConfig;
use crate::errors::SessionError;

pub const ENV_BASE_URL: &str = "CODERUN_BASE_URL";
pub const ENV_INTERACTIVE_URL: &str = "CODERUN_INTERACTIVE_URL";
pub const ENV_LOG_LEVEL: &str = "CODERUN_LOG_LEVEL";

/// Configuration loader with environment resolution
pub struct ConfigLoader;

impl ConfigLoader {
    /// `<config dir>/coderun/config.yaml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("coderun").join("config.yaml"))
    }

    /// Load from `path` if given, else from the default path if it exists, else
    /// fall back to the defaults. Environment overrides apply in every case.
    pub async fn load(path: Option<&Path>) -> Result<CoderunConfig, SessionError> {
        if let Some(path) = path {
            return Self::from_file(path).await;
        }

        match Self::default_path() {
            Some(default_path) if default_path.exists() => Self::from_file(default_path).await,
            _ => {
                log::debug!("No configuration file found, using defaults");
                let mut config = CoderunConfig::default();
                Self::apply_environment(&mut config);
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<CoderunConfig, SessionError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).await.map_err(|e| {
            SessionError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        log::info!("Loaded configuration from {}", path.display());
        Self::from_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_str(content: &str) -> Result<CoderunConfig, SessionError> {
        // An empty document deserializes to unit, not to an empty mapping.
        let mut config: CoderunConfig = if content.trim().is_empty() {
            CoderunConfig::default()
        } else {
            serde_yaml::from_str(content)
                .map_err(|e| SessionError::Config(format!("Failed to parse YAML config: {}", e)))?
        };

        Self::apply_environment(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Apply `CODERUN_*` environment overrides
    pub fn apply_environment(config: &mut CoderunConfig) {
        if let Ok(base_url) = env::var(ENV_BASE_URL) {
            log::debug!("Overriding backend.base_url from {}", ENV_BASE_URL);
            config.backend.base_url = base_url;
        }
        if let Ok(interactive_url) = env::var(ENV_INTERACTIVE_URL) {
            log::debug!("Overriding backend.interactive_url from {}", ENV_INTERACTIVE_URL);
            config.backend.interactive_url = Some(interactive_url);
        }
        if let Ok(level) = env::var(ENV_LOG_LEVEL) {
            config.logging.level = level;
        }
    }

    /// Render a configuration back to YAML
    pub fn to_yaml(config: &CoderunConfig) -> Result<String, SessionError> {
        serde_yaml::to_string(config)
            .map_err(|e| SessionError::Config(format!("Failed to serialize config: {}", e)))
    }
}
