//! Snippet persistence payloads.

use serde::{Deserialize, Serialize};

use crate::error::LanguageError;
use crate::language::Language;

/// Body of `POST /api/snippets/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSnippet {
    /// Title shown in the snippet list.
    pub title: String,
    /// The saved source code.
    pub code: String,
    /// Display name of the language.
    pub language: String,
    /// Whether other users can see the snippet.
    pub is_public: bool,
}

impl NewSnippet {
    pub fn new(title: impl Into<String>, code: impl Into<String>, language: Language) -> Self {
        Self {
            title: title.into(),
            code: code.into(),
            language: language.display_name().to_string(),
            is_public: false,
        }
    }

    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }
}

/// A snippet as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// Backend identifier.
    pub id: u64,
    /// Title shown in the snippet list.
    pub title: String,
    /// The saved source code.
    pub code: String,
    /// Display name of the snippet's language.
    pub language_name: String,
    /// Whether other users can see the snippet.
    #[serde(default)]
    pub is_public: bool,
}

impl Snippet {
    pub fn language(&self) -> Result<Language, LanguageError> {
        Language::from_display_name(&self.language_name)
    }
}
