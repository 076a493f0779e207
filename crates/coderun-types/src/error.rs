//! Errors raised while interpreting wire values.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LanguageError {
    #[error("Unsupported language: {0}")]
    Unsupported(String),
    #[error("Unknown backend language id: {0}")]
    UnknownId(u32),
}
