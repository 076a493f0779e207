//! Configuration module for the coderun client
//!
//! This module provides the YAML configuration system: where the backend lives,
//! how long to wait for it, which language and mode to use by default and where
//! logs go. Every field has a default so a missing file is a valid configuration.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;

#[cfg(test)]
mod tests;

use crate::errors::SessionError;
use std::path::Path;

/// Load a configuration from a YAML file
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<CoderunConfig, SessionError> {
    ConfigLoader::from_file(path).await
}

/// Validate a configuration
pub fn validate_config(config: &CoderunConfig) -> Result<(), SessionError> {
    config.validate()
}
