//! JSON text frames exchanged over the interactive execution channel.

use serde::{Deserialize, Deserializer, Serialize};

use crate::language::Language;

/// Value of the `prompt` field used by backends that mark a prompt with a flag
/// and carry the prompt text in `output`.
pub const PROMPT_FLAG: &str = "true";

/// Frames sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Begins execution. Sent exactly once per channel.
    Start {
        /// Lowercase language name (see [`Language::channel_name`]).
        language: String,
        /// The source code to run.
        code: String,
    },
    /// One line of stdin for the running program.
    Input {
        /// The text typed by the user, without the trailing newline.
        data: String,
    },
}

impl ClientFrame {
    pub fn start(language: Language, code: impl Into<String>) -> Self {
        ClientFrame::Start {
            language: language.channel_name().to_string(),
            code: code.into(),
        }
    }

    pub fn input(data: impl Into<String>) -> Self {
        ClientFrame::Input { data: data.into() }
    }

    pub fn is_start(&self) -> bool {
        matches!(self, ClientFrame::Start { .. })
    }
}

/// Frames received from the backend. Every field is optional and several may be
/// present in the same frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFrame {
    /// A chunk of program output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// The program is blocked on stdin. Either the prompt text itself or
    /// [`PROMPT_FLAG`].
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_flag"
    )]
    pub prompt: Option<String>,
    /// A failure reported by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServerFrame {
    pub fn output(text: impl Into<String>) -> Self {
        Self {
            output: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            prompt: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            error: Some(detail.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_none() && self.prompt.is_none() && self.error.is_none()
    }

    /// True when `prompt` is the bare flag rather than the prompt text.
    pub fn is_flagged_prompt(&self) -> bool {
        self.prompt.as_deref() == Some(PROMPT_FLAG)
    }

    /// The prompt text to surface, if this frame requests input. For flagged
    /// prompts the text comes from `output` without its line terminator.
    pub fn prompt_text(&self) -> Option<String> {
        let prompt = self.prompt.as_deref()?;
        if prompt == PROMPT_FLAG {
            let text = self.output.as_deref().unwrap_or_default();
            return Some(text.trim_end_matches(['\r', '\n']).to_string());
        }
        Some(prompt.to_string())
    }
}

fn string_or_flag<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Flag(bool),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(text)) => Some(text),
        Some(Raw::Flag(true)) => Some(PROMPT_FLAG.to_string()),
        Some(Raw::Flag(false)) | None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flagged_prompt_takes_text_from_output() {
        let frame: ServerFrame =
            serde_json::from_str(r#"{"output":"Enter n:\n","prompt":"true"}"#).unwrap();
        assert!(frame.is_flagged_prompt());
        assert_eq!(frame.prompt_text().as_deref(), Some("Enter n:"));
    }

    #[test]
    fn test_boolean_prompt_flag() {
        let frame: ServerFrame =
            serde_json::from_str(r#"{"output":"Name? ","prompt":true}"#).unwrap();
        assert_eq!(frame.prompt_text().as_deref(), Some("Name? "));

        let frame: ServerFrame =
            serde_json::from_str(r#"{"output":"x","prompt":false}"#).unwrap();
        assert_eq!(frame.prompt, None);
        assert_eq!(frame.prompt_text(), None);
    }

    #[test]
    fn test_plain_prompt_text() {
        let frame = ServerFrame::prompt("Enter n:");
        assert!(!frame.is_flagged_prompt());
        assert_eq!(frame.prompt_text().as_deref(), Some("Enter n:"));
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let result = serde_json::from_str::<ClientFrame>(r#"{"action":"resize","rows":3}"#);
        assert!(result.is_err());
    }
}
