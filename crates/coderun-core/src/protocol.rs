//! Interactive turn protocol as a pure state machine.
//!
//! [`TurnProtocol::step`] takes one [`TurnEvent`] and returns the [`TurnCommand`]s the
//! owner must carry out, without touching any I/O itself. The owner feeds channel
//! events in delivery order, user input and stop requests as they happen, and timeouts
//! when a deadline passes.
//!
//! Policies where the wire contract is silent:
//! - a prompt that arrives while another is still unanswered replaces it;
//! - output that arrives while awaiting input is appended without leaving the state;
//! - a prompt before the program was started is a protocol violation and is ignored;
//! - every event after a terminal state is ignored.

use std::fmt;
use std::sync::Arc;

use coderun_client::ChannelEvent;
use coderun_types::{ClientFrame, Language};

use crate::errors::ProtocolViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Connecting,
    Streaming,
    AwaitingInput,
    Completed,
    Failed,
    Stopped,
}

impl TurnState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Completed | TurnState::Failed | TurnState::Stopped)
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnState::Connecting => "connecting",
            TurnState::Streaming => "streaming",
            TurnState::AwaitingInput => "awaiting input",
            TurnState::Completed => "completed",
            TurnState::Failed => "failed",
            TurnState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    Channel(ChannelEvent),
    UserInput(String),
    Stop,
    TimedOut(String),
}

impl TurnEvent {
    fn name(&self) -> &'static str {
        match self {
            TurnEvent::Channel(event) => event.name(),
            TurnEvent::UserInput(_) => "UserInput",
            TurnEvent::Stop => "Stop",
            TurnEvent::TimedOut(_) => "TimedOut",
        }
    }
}

/// Side effects requested by a step, to be executed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnCommand {
    Send(ClientFrame),
    AppendOutput(String),
    /// Replace the current prompt; `None` clears it.
    SetPrompt(Option<String>),
    CloseChannel,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TurnStep {
    pub commands: Vec<TurnCommand>,
    /// Set when the event was ignored.
    pub violation: Option<ProtocolViolation>,
}

impl TurnStep {
    fn apply(commands: Vec<TurnCommand>) -> Self {
        Self {
            commands,
            violation: None,
        }
    }

    fn ignore(violation: ProtocolViolation) -> Self {
        Self {
            commands: Vec::new(),
            violation: Some(violation),
        }
    }

    pub fn is_applied(&self) -> bool {
        self.violation.is_none()
    }
}

/// Turn state of one interactive channel.
#[derive(Debug, Clone)]
pub struct TurnProtocol {
    state: TurnState,
    start_sent: bool,
    language: Language,
    code: Arc<str>,
}

impl TurnProtocol {
    pub fn new(language: Language, code: Arc<str>) -> Self {
        Self {
            state: TurnState::Connecting,
            start_sent: false,
            language,
            code,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn start_sent(&self) -> bool {
        self.start_sent
    }

    pub fn step(&mut self, event: TurnEvent) -> TurnStep {
        if self.state.is_terminal() {
            return self.unexpected(&event);
        }

        match event {
            TurnEvent::Channel(ChannelEvent::Opened) => {
                if self.state != TurnState::Connecting || self.start_sent {
                    return self.unexpected(&TurnEvent::Channel(ChannelEvent::Opened));
                }
                self.start_sent = true;
                self.state = TurnState::Streaming;
                TurnStep::apply(vec![TurnCommand::Send(ClientFrame::start(
                    self.language,
                    self.code.to_string(),
                ))])
            }
            TurnEvent::Channel(ChannelEvent::OutputChunk(text)) => {
                if self.state == TurnState::Connecting {
                    return self.unexpected(&TurnEvent::Channel(ChannelEvent::OutputChunk(text)));
                }
                TurnStep::apply(vec![TurnCommand::AppendOutput(text)])
            }
            TurnEvent::Channel(ChannelEvent::PromptRequested(prompt)) => {
                if !self.start_sent {
                    return self.unexpected(&TurnEvent::Channel(ChannelEvent::PromptRequested(prompt)));
                }
                self.state = TurnState::AwaitingInput;
                TurnStep::apply(vec![TurnCommand::SetPrompt(Some(prompt))])
            }
            TurnEvent::Channel(ChannelEvent::ErrorOccurred(detail)) => self.fail(detail),
            TurnEvent::Channel(ChannelEvent::Closed(_)) => {
                self.state = TurnState::Completed;
                TurnStep::apply(vec![TurnCommand::SetPrompt(None), TurnCommand::CloseChannel])
            }
            TurnEvent::UserInput(text) => {
                if self.state != TurnState::AwaitingInput {
                    return TurnStep::ignore(ProtocolViolation::InputNotAwaited {
                        state: self.state.to_string(),
                    });
                }
                self.state = TurnState::Streaming;
                TurnStep::apply(vec![
                    TurnCommand::Send(ClientFrame::input(text.clone())),
                    TurnCommand::AppendOutput(format!("{}\n", text)),
                    TurnCommand::SetPrompt(None),
                ])
            }
            TurnEvent::Stop => {
                self.state = TurnState::Stopped;
                TurnStep::apply(vec![TurnCommand::SetPrompt(None), TurnCommand::CloseChannel])
            }
            TurnEvent::TimedOut(detail) => self.fail(format!("Timeout: {}", detail)),
        }
    }

    fn fail(&mut self, detail: String) -> TurnStep {
        self.state = TurnState::Failed;
        TurnStep::apply(vec![
            TurnCommand::AppendOutput(format!("\nError: {}", detail)),
            TurnCommand::SetPrompt(None),
            TurnCommand::CloseChannel,
        ])
    }

    fn unexpected(&self, event: &TurnEvent) -> TurnStep {
        TurnStep::ignore(ProtocolViolation::UnexpectedEvent {
            event: event.name().to_string(),
            state: self.state.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol() -> TurnProtocol {
        TurnProtocol::new(Language::Python, Arc::from("n = input()"))
    }

    fn channel(event: ChannelEvent) -> TurnEvent {
        TurnEvent::Channel(event)
    }

    #[test]
    fn test_opened_sends_start_once() {
        let mut protocol = protocol();

        let step = protocol.step(channel(ChannelEvent::Opened));
        assert_eq!(
            step.commands,
            vec![TurnCommand::Send(ClientFrame::start(Language::Python, "n = input()"))]
        );
        assert_eq!(protocol.state(), TurnState::Streaming);
        assert!(protocol.start_sent());

        let step = protocol.step(channel(ChannelEvent::Opened));
        assert!(step.commands.is_empty());
        assert!(!step.is_applied());
    }

    #[test]
    fn test_prompt_then_input_turn() {
        let mut protocol = protocol();
        protocol.step(channel(ChannelEvent::Opened));

        let step = protocol.step(channel(ChannelEvent::PromptRequested("Enter n:".to_string())));
        assert_eq!(step.commands, vec![TurnCommand::SetPrompt(Some("Enter n:".to_string()))]);
        assert_eq!(protocol.state(), TurnState::AwaitingInput);

        let step = protocol.step(TurnEvent::UserInput("5".to_string()));
        assert_eq!(
            step.commands,
            vec![
                TurnCommand::Send(ClientFrame::input("5")),
                TurnCommand::AppendOutput("5\n".to_string()),
                TurnCommand::SetPrompt(None),
            ]
        );
        assert_eq!(protocol.state(), TurnState::Streaming);
    }

    #[test]
    fn test_input_outside_prompt_is_ignored() {
        let mut protocol = protocol();
        protocol.step(channel(ChannelEvent::Opened));

        let step = protocol.step(TurnEvent::UserInput("5".to_string()));
        assert!(step.commands.is_empty());
        assert_eq!(
            step.violation,
            Some(ProtocolViolation::InputNotAwaited {
                state: "streaming".to_string()
            })
        );
        assert_eq!(protocol.state(), TurnState::Streaming);
    }

    #[test]
    fn test_output_while_awaiting_input_keeps_state() {
        let mut protocol = protocol();
        protocol.step(channel(ChannelEvent::Opened));
        protocol.step(channel(ChannelEvent::PromptRequested("a?".to_string())));

        let step = protocol.step(channel(ChannelEvent::OutputChunk("noise".to_string())));
        assert_eq!(step.commands, vec![TurnCommand::AppendOutput("noise".to_string())]);
        assert_eq!(protocol.state(), TurnState::AwaitingInput);
    }

    #[test]
    fn test_second_prompt_replaces_first() {
        let mut protocol = protocol();
        protocol.step(channel(ChannelEvent::Opened));
        protocol.step(channel(ChannelEvent::PromptRequested("a?".to_string())));

        let step = protocol.step(channel(ChannelEvent::PromptRequested("b?".to_string())));
        assert_eq!(step.commands, vec![TurnCommand::SetPrompt(Some("b?".to_string()))]);
        assert_eq!(protocol.state(), TurnState::AwaitingInput);
    }

    #[test]
    fn test_prompt_before_start_is_a_violation() {
        let mut protocol = protocol();

        let step = protocol.step(channel(ChannelEvent::PromptRequested("a?".to_string())));
        assert!(step.commands.is_empty());
        assert!(matches!(
            step.violation,
            Some(ProtocolViolation::UnexpectedEvent { ref event, .. }) if event == "PromptRequested"
        ));
        assert_eq!(protocol.state(), TurnState::Connecting);
    }

    #[test]
    fn test_error_fails_and_closes() {
        let mut protocol = protocol();
        protocol.step(channel(ChannelEvent::Opened));

        let step = protocol.step(channel(ChannelEvent::ErrorOccurred("boom".to_string())));
        assert_eq!(
            step.commands,
            vec![
                TurnCommand::AppendOutput("\nError: boom".to_string()),
                TurnCommand::SetPrompt(None),
                TurnCommand::CloseChannel,
            ]
        );
        assert_eq!(protocol.state(), TurnState::Failed);
    }

    #[test]
    fn test_closed_completes() {
        let mut protocol = protocol();
        protocol.step(channel(ChannelEvent::Opened));

        protocol.step(channel(ChannelEvent::Closed("program finished".to_string())));
        assert_eq!(protocol.state(), TurnState::Completed);
    }

    #[test]
    fn test_timeout_fails_with_detail() {
        let mut protocol = protocol();

        let step = protocol.step(TurnEvent::TimedOut("no connection within 10s".to_string()));
        assert_eq!(
            step.commands[0],
            TurnCommand::AppendOutput("\nError: Timeout: no connection within 10s".to_string())
        );
        assert_eq!(protocol.state(), TurnState::Failed);
    }

    #[test]
    fn test_terminal_state_ignores_everything() {
        let mut protocol = protocol();
        protocol.step(channel(ChannelEvent::Opened));
        protocol.step(TurnEvent::Stop);
        assert_eq!(protocol.state(), TurnState::Stopped);

        for event in [
            channel(ChannelEvent::OutputChunk("late".to_string())),
            channel(ChannelEvent::ErrorOccurred("late".to_string())),
            TurnEvent::Stop,
        ] {
            let step = protocol.step(event);
            assert!(step.commands.is_empty());
            assert!(!step.is_applied());
        }
        assert_eq!(protocol.state(), TurnState::Stopped);
    }
}
