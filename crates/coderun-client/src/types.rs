use std::fmt;
use uuid::Uuid;

use coderun_types::{ExecuteResponse, ServerFrame};

/// Opaque identifier of one execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a one-shot submission that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The backend answered.
    Completed(ExecuteResponse),
    /// The caller cancelled before the answer arrived.
    Cancelled,
}

/// Something that happened on an interactive channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The channel is connected and accepts frames.
    Opened,
    /// The program wrote output.
    OutputChunk(String),
    /// The program is blocked waiting for a line of input.
    PromptRequested(String),
    /// The backend or the connection reported a failure.
    ErrorOccurred(String),
    /// The backend closed the channel.
    Closed(String),
}

impl ChannelEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ChannelEvent::Opened => "Opened",
            ChannelEvent::OutputChunk(_) => "OutputChunk",
            ChannelEvent::PromptRequested(_) => "PromptRequested",
            ChannelEvent::ErrorOccurred(_) => "ErrorOccurred",
            ChannelEvent::Closed(_) => "Closed",
        }
    }

    /// Expands one inbound frame into events, in the fixed order output, prompt, error.
    pub fn from_frame(frame: &ServerFrame) -> Vec<ChannelEvent> {
        let mut events = Vec::with_capacity(3);
        if let Some(output) = &frame.output {
            if !output.is_empty() {
                events.push(ChannelEvent::OutputChunk(output.clone()));
            }
        }
        if let Some(prompt) = frame.prompt_text() {
            events.push(ChannelEvent::PromptRequested(prompt));
        }
        if let Some(error) = &frame.error {
            events.push(ChannelEvent::ErrorOccurred(error.clone()));
        }
        events
    }
}

/// A channel event tagged with the session that opened the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEnvelope {
    pub session: SessionId,
    pub event: ChannelEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_expansion_order() {
        let frame = ServerFrame {
            output: Some("partial".to_string()),
            prompt: Some("Enter n:".to_string()),
            error: Some("boom".to_string()),
        };

        assert_eq!(
            ChannelEvent::from_frame(&frame),
            vec![
                ChannelEvent::OutputChunk("partial".to_string()),
                ChannelEvent::PromptRequested("Enter n:".to_string()),
                ChannelEvent::ErrorOccurred("boom".to_string()),
            ]
        );
    }

    #[test]
    fn test_flagged_prompt_expansion() {
        let frame: ServerFrame =
            serde_json::from_str(r#"{"output":"Enter n:\n","prompt":"true"}"#).unwrap();

        assert_eq!(
            ChannelEvent::from_frame(&frame),
            vec![
                ChannelEvent::OutputChunk("Enter n:\n".to_string()),
                ChannelEvent::PromptRequested("Enter n:".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_frame_yields_nothing() {
        assert!(ChannelEvent::from_frame(&ServerFrame::default()).is_empty());
        assert!(ChannelEvent::from_frame(&ServerFrame::output("")).is_empty());
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
