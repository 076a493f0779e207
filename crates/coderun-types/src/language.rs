//! Language table shared by the one-shot and interactive contracts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LanguageError;

/// A language the execution backend can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// Python 3.
    Python,
    /// C.
    C,
    /// C++.
    #[serde(rename = "C++")]
    Cpp,
}

impl Language {
    /// Every supported language, in backend identifier order.
    pub const ALL: [Language; 3] = [Language::Python, Language::C, Language::Cpp];

    /// The user-facing name, as shown in the language picker.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::C => "C",
            Language::Cpp => "C++",
        }
    }

    /// The numeric identifier used by the one-shot endpoint.
    pub fn backend_id(&self) -> u32 {
        match self {
            Language::Python => 1,
            Language::C => 2,
            Language::Cpp => 3,
        }
    }

    /// The lowercase name sent in the interactive `start` frame.
    pub fn channel_name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::C => "c",
            Language::Cpp => "c++",
        }
    }

    /// The source file extension the backend writes the code to.
    pub fn extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }

    /// Resolves a user-facing display name. Matching is exact.
    pub fn from_display_name(name: &str) -> Result<Self, LanguageError> {
        Self::ALL
            .into_iter()
            .find(|language| language.display_name() == name)
            .ok_or_else(|| LanguageError::Unsupported(name.to_string()))
    }

    /// Resolves a backend identifier.
    pub fn from_backend_id(id: u32) -> Result<Self, LanguageError> {
        Self::ALL
            .into_iter()
            .find(|language| language.backend_id() == id)
            .ok_or(LanguageError::UnknownId(id))
    }

    /// Guesses the language from a file extension (without the dot).
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "py" => Some(Language::Python),
            "c" | "h" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "hpp" => Some(Language::Cpp),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Lenient parsing for command lines and config files: accepts display names
/// and the channel aliases (`python`, `c`, `cpp`, `c++`) in any case.
impl FromStr for Language {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(language) = Self::from_display_name(trimmed) {
            return Ok(language);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "c" => Ok(Language::C),
            "cpp" | "c++" => Ok(Language::Cpp),
            _ => Err(LanguageError::Unsupported(s.to_string())),
        }
    }
}
