//! Session controller: drives one execution attempt at a time.
//!
//! The controller owns everything the user sees about a run (status, output, the
//! outstanding prompt) and the single live transport. Operations such as
//! [`SessionController::start`] and [`SessionController::stop`] are synchronous
//! state changes that perform at most one outbound network operation. Network
//! activity is applied by [`SessionController::process_next`], which waits for the
//! next channel event, one-shot result or deadline and folds it into the state.
//!
//! Both transports report through queues shared by every session of the controller.
//! Each message carries the id of the session that produced it, and anything not
//! addressed to the current live session is dropped, so a superseded or stopped run
//! can never touch the state of a newer one.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use coderun_client::{
    ChannelConnector, ChannelEnvelope, ChannelEvent, ChannelHandle, ClientFactory, ExecutionClient,
    HttpExecutionClient, SessionId, Submission, TransportError,
};
use coderun_types::{ExecuteRequest, Language};

use crate::config::CoderunConfig;
use crate::errors::{ProtocolViolation, SessionError, ValidationError};
use crate::output::OutputBuffer;
use crate::protocol::{TurnCommand, TurnEvent, TurnProtocol, TurnState, TurnStep};
use crate::session::{ExecutionMode, Session, SessionStatus, StartRequest};

/// Appended to the output when the user stops a run.
pub const STOPPED_NOTICE: &str = "Execution stopped by user.";

/// Whether a `send_input` call reached the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputDisposition {
    Sent,
    Ignored(ProtocolViolation),
    /// The frame could not be sent and the session failed.
    Failed(SessionError),
}

struct OneShotResult {
    session: SessionId,
    result: Result<Submission, TransportError>,
}

enum LiveTransport {
    OneShot {
        cancel: CancellationToken,
        task: JoinHandle<()>,
    },
    Interactive {
        handle: ChannelHandle,
        protocol: TurnProtocol,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeadlineKind {
    Connect,
    Input,
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    kind: DeadlineKind,
    limit: Duration,
}

enum Inbound {
    Channel(ChannelEnvelope),
    OneShot(OneShotResult),
    DeadlineReached,
}

pub struct SessionController {
    client: Arc<dyn ExecutionClient>,
    connector: Arc<dyn ChannelConnector>,
    interactive_endpoint: String,
    connect_timeout: Duration,
    input_timeout: Option<Duration>,
    channel_tx: UnboundedSender<ChannelEnvelope>,
    channel_rx: UnboundedReceiver<ChannelEnvelope>,
    results_tx: UnboundedSender<OneShotResult>,
    results_rx: UnboundedReceiver<OneShotResult>,
    session: Option<Session>,
    live: Option<LiveTransport>,
    output: OutputBuffer,
    prompt: Option<String>,
    deadline: Option<Deadline>,
    last_error: Option<SessionError>,
}

impl SessionController {
    pub fn new(
        config: &CoderunConfig,
        client: Arc<dyn ExecutionClient>,
        connector: Arc<dyn ChannelConnector>,
    ) -> Self {
        let (channel_tx, channel_rx) = mpsc::unbounded_channel();
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            client,
            connector,
            interactive_endpoint: config.backend.interactive_endpoint(),
            connect_timeout: config.session.connect_timeout(),
            input_timeout: config.session.input_timeout(),
            channel_tx,
            channel_rx,
            results_tx,
            results_rx,
            session: None,
            live: None,
            output: OutputBuffer::new(),
            prompt: None,
            deadline: None,
            last_error: None,
        }
    }

    /// Build a controller with the HTTP and WebSocket transports described by `config`
    pub fn from_config(config: &CoderunConfig) -> Self {
        let client = HttpExecutionClient::new(config.backend.base_url.clone())
            .with_execute_path(config.backend.execute_path.clone())
            .with_timeout(config.session.request_timeout());
        Self::new(
            config,
            Arc::new(client),
            ClientFactory::create_websocket_connector(),
        )
    }

    pub fn status(&self) -> SessionStatus {
        self.session
            .as_ref()
            .map_or(SessionStatus::Idle, |session| session.status)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn output(&self) -> &OutputBuffer {
        &self.output
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    /// Why the last session did not complete, if it did not.
    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub fn is_live(&self) -> bool {
        self.status().is_live()
    }

    /// Start a new session, retiring any live one first.
    pub fn start(&mut self, request: StartRequest) -> Result<SessionId, SessionError> {
        if request.code.is_empty() {
            return Err(ValidationError::EmptyCode.into());
        }
        let language = Language::from_display_name(&request.language)
            .map_err(|_| ValidationError::UnknownLanguage(request.language.clone()))?;

        self.retire_live();
        self.output.reset();
        self.prompt = None;
        self.deadline = None;
        self.last_error = None;

        let code: Arc<str> = Arc::from(request.code.as_str());
        let mut session = Session::new(request.mode, language, code.clone(), request.captured_input);
        let session_id = session.id;

        match request.mode {
            ExecutionMode::OneShot => {
                let mut payload = ExecuteRequest::new(&*code, language);
                if let Some(input) = &session.captured_input {
                    payload = payload.with_user_input(input.clone());
                }

                let cancel = CancellationToken::new();
                let client = self.client.clone();
                let results = self.results_tx.clone();
                let token = cancel.clone();
                let task = tokio::spawn(async move {
                    let result = client.submit(payload, token).await;
                    let _ = results.send(OneShotResult {
                        session: session_id,
                        result,
                    });
                });

                session.status = SessionStatus::Running;
                self.live = Some(LiveTransport::OneShot { cancel, task });
            }
            ExecutionMode::Interactive => {
                if session.captured_input.is_some() {
                    log::debug!(
                        "Ignoring captured input for interactive session {}",
                        session_id
                    );
                }

                let handle = self.connector.open(
                    &self.interactive_endpoint,
                    session_id,
                    self.channel_tx.clone(),
                );
                session.status = SessionStatus::Starting;
                self.deadline = Some(Deadline {
                    at: Instant::now() + self.connect_timeout,
                    kind: DeadlineKind::Connect,
                    limit: self.connect_timeout,
                });
                self.live = Some(LiveTransport::Interactive {
                    handle,
                    protocol: TurnProtocol::new(language, code),
                });
            }
        }

        log::info!(
            "Started {} session {} ({}, {} bytes of code)",
            request.mode,
            session_id,
            language,
            request.code.len()
        );
        self.session = Some(session);
        Ok(session_id)
    }

    /// Stop the live session. Does nothing when no session is live.
    pub fn stop(&mut self) {
        if !self.is_live() {
            log::debug!("Stop requested with no live session");
            return;
        }

        if let Some(LiveTransport::Interactive { protocol, .. }) = self.live.as_mut() {
            let step = protocol.step(TurnEvent::Stop);
            self.execute_step(step);
        }
        self.retire_live();

        if !self.output.ends_with_newline() {
            self.output.append("\n");
        }
        self.output.append(STOPPED_NOTICE);
        self.last_error = Some(SessionError::Cancelled);
        self.set_status(SessionStatus::Stopped);
    }

    /// Answer the outstanding prompt of an interactive session.
    pub fn send_input(&mut self, text: &str) -> InputDisposition {
        let step = match self.live.as_mut() {
            Some(LiveTransport::Interactive { handle, protocol }) if handle.is_open() => {
                protocol.step(TurnEvent::UserInput(text.to_string()))
            }
            _ => {
                let violation = ProtocolViolation::NoInteractiveSession;
                log::warn!("Input ignored: {}", violation);
                return InputDisposition::Ignored(violation);
            }
        };

        if let Some(violation) = step.violation.clone() {
            log::warn!("Input ignored: {}", violation);
            return InputDisposition::Ignored(violation);
        }

        self.deliver_input(step)
    }

    fn deliver_input(&mut self, step: TurnStep) -> InputDisposition {
        let delivered = self.execute_step(step);
        self.sync_interactive_status();
        if delivered {
            return InputDisposition::Sent;
        }
        let error = self
            .last_error
            .clone()
            .unwrap_or(SessionError::Transport(TransportError::NotOpen));
        log::warn!("Input not delivered: {}", error);
        InputDisposition::Failed(error)
    }

    /// Empty the output without touching the session.
    pub fn clear_output(&mut self) {
        self.output.reset();
    }

    /// Wait for the next event of the live session and apply it. Events of other
    /// sessions are dropped without returning. Returns `None` when no session is
    /// live, otherwise the status after the event.
    pub async fn process_next(&mut self) -> Option<SessionStatus> {
        loop {
            if !self.is_live() {
                return None;
            }

            let deadline = self.deadline.map(|deadline| deadline.at);
            let inbound = tokio::select! {
                Some(envelope) = self.channel_rx.recv() => Inbound::Channel(envelope),
                Some(result) = self.results_rx.recv() => Inbound::OneShot(result),
                _ = sleep_until(deadline) => Inbound::DeadlineReached,
            };

            if self.apply(inbound) {
                return Some(self.status());
            }
        }
    }

    /// Process events until the session finishes or needs input.
    pub async fn settle(&mut self) -> SessionStatus {
        while let Some(status) = self.process_next().await {
            if status == SessionStatus::AwaitingInput {
                break;
            }
        }
        self.status()
    }

    fn apply(&mut self, inbound: Inbound) -> bool {
        let current = self.session.as_ref().map(|session| session.id);
        match inbound {
            Inbound::Channel(envelope) => {
                if Some(envelope.session) != current {
                    log::debug!(
                        "Dropping {} from stale session {}",
                        envelope.event.name(),
                        envelope.session
                    );
                    return false;
                }
                let Some(LiveTransport::Interactive { protocol, .. }) = self.live.as_mut() else {
                    log::debug!("Dropping {} for a finished session", envelope.event.name());
                    return false;
                };
                let step = protocol.step(TurnEvent::Channel(envelope.event));
                if let Some(violation) = &step.violation {
                    log::warn!("Protocol violation on session {}: {}", envelope.session, violation);
                    return false;
                }
                self.record_channel_failure(&step);
                self.execute_step(step);
                self.sync_interactive_status();
                true
            }
            Inbound::OneShot(OneShotResult { session, result }) => {
                if Some(session) != current || !matches!(self.live, Some(LiveTransport::OneShot { .. })) {
                    log::debug!("Dropping one-shot result of stale session {}", session);
                    return false;
                }
                self.live = None;
                self.finish_one_shot(result);
                true
            }
            Inbound::DeadlineReached => {
                let Some(deadline) = self.deadline.take() else {
                    return false;
                };
                let detail = match deadline.kind {
                    DeadlineKind::Connect => {
                        format!("no connection within {}s", deadline.limit.as_secs())
                    }
                    DeadlineKind::Input => {
                        format!("no input within {}s", deadline.limit.as_secs())
                    }
                };
                log::warn!("Session timed out: {}", detail);
                let Some(LiveTransport::Interactive { protocol, .. }) = self.live.as_mut() else {
                    return false;
                };
                let step = protocol.step(TurnEvent::TimedOut(detail.clone()));
                self.last_error = Some(SessionError::Transport(TransportError::Timeout(detail)));
                self.execute_step(step);
                self.sync_interactive_status();
                true
            }
        }
    }

    fn finish_one_shot(&mut self, result: Result<Submission, TransportError>) {
        match result {
            Ok(Submission::Completed(response)) => {
                if let Some(seconds) = response.execution_time {
                    log::debug!("Backend reported {:.3}s of execution time", seconds);
                }
                self.output.append(response.display_output());
                if response.is_success() {
                    self.set_status(SessionStatus::Completed);
                } else {
                    let detail = match response.friendly_error.as_deref() {
                        Some(friendly) if !friendly.is_empty() => friendly.to_string(),
                        _ => response.stderr.clone(),
                    };
                    self.last_error = Some(SessionError::Execution(detail));
                    self.set_status(SessionStatus::Failed);
                }
            }
            Ok(Submission::Cancelled) => {
                self.output.append(STOPPED_NOTICE);
                self.last_error = Some(SessionError::Cancelled);
                self.set_status(SessionStatus::Stopped);
            }
            Err(e) => {
                log::error!("One-shot execution failed: {}", e);
                self.output.append(format!("Error: {}", e));
                self.last_error = Some(SessionError::Transport(e));
                self.set_status(SessionStatus::Failed);
            }
        }
    }

    fn record_channel_failure(&mut self, step: &TurnStep) {
        let failed = match self.live.as_ref() {
            Some(LiveTransport::Interactive { protocol, .. }) => protocol.state() == TurnState::Failed,
            _ => false,
        };
        if !failed {
            return;
        }
        let detail = step.commands.iter().find_map(|command| match command {
            TurnCommand::AppendOutput(text) => text.strip_prefix("\nError: ").map(str::to_string),
            _ => None,
        });
        if let Some(detail) = detail {
            self.last_error = Some(SessionError::Transport(TransportError::Channel(detail)));
        }
    }

    /// Carry out the commands of a protocol step, in order. A frame that cannot be
    /// sent fails the session, skips the remaining commands and returns `false`.
    fn execute_step(&mut self, step: TurnStep) -> bool {
        for command in step.commands {
            match command {
                TurnCommand::Send(frame) => {
                    let sent = match self.live.as_ref() {
                        Some(LiveTransport::Interactive { handle, .. }) => handle.send(frame),
                        _ => Err(TransportError::NotOpen),
                    };
                    if let Err(e) = sent {
                        log::error!("Failed to send frame: {}", e);
                        self.fail_channel(e);
                        return false;
                    }
                }
                TurnCommand::AppendOutput(text) => self.output.append(text),
                TurnCommand::SetPrompt(prompt) => {
                    if prompt.is_some() {
                        self.deadline = self.input_timeout.map(|limit| Deadline {
                            at: Instant::now() + limit,
                            kind: DeadlineKind::Input,
                            limit,
                        });
                    }
                    self.prompt = prompt;
                }
                TurnCommand::CloseChannel => {
                    if let Some(LiveTransport::Interactive { handle, .. }) = self.live.as_ref() {
                        handle.close();
                    }
                }
            }
        }
        true
    }

    fn fail_channel(&mut self, error: TransportError) {
        if let Some(LiveTransport::Interactive { protocol, .. }) = self.live.as_mut() {
            let step = protocol.step(TurnEvent::Channel(ChannelEvent::ErrorOccurred(error.to_string())));
            self.last_error = Some(SessionError::Transport(error));
            // A failure step only appends, clears the prompt and closes.
            self.execute_step(step);
        }
    }

    /// Mirror the turn state into the session status and drop finished transports.
    fn sync_interactive_status(&mut self) {
        let Some(LiveTransport::Interactive { protocol, .. }) = self.live.as_ref() else {
            return;
        };
        let state = protocol.state();
        let status = match state {
            TurnState::Connecting => SessionStatus::Starting,
            TurnState::Streaming => SessionStatus::Running,
            TurnState::AwaitingInput => SessionStatus::AwaitingInput,
            TurnState::Completed => SessionStatus::Completed,
            TurnState::Failed => SessionStatus::Failed,
            TurnState::Stopped => SessionStatus::Stopped,
        };

        if !matches!(state, TurnState::Connecting | TurnState::AwaitingInput) {
            self.deadline = None;
        }
        if state.is_terminal() {
            self.retire_live();
        }
        self.set_status(status);
    }

    fn set_status(&mut self, status: SessionStatus) {
        if let Some(session) = self.session.as_mut() {
            if session.status != status {
                log::info!("Session {}: {} -> {}", session.id, session.status, status);
                session.status = status;
            }
        }
    }

    /// Close or cancel the live transport, if any.
    fn retire_live(&mut self) {
        match self.live.take() {
            Some(LiveTransport::OneShot { cancel, task }) => {
                cancel.cancel();
                // The task finishes on its own once the client observes the token.
                drop(task);
            }
            Some(LiveTransport::Interactive { handle, .. }) => handle.close(),
            None => {}
        }
        self.deadline = None;
        self.prompt = None;
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.retire_live();
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
