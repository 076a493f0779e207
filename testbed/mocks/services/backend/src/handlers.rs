use axum::{
    extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coderun_types::{
    ClientFrame, ExecuteRequest, ExecuteResponse, ExecutionStatus, Language, NewSnippet,
    ServerFrame, PROMPT_FLAG,
};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::programs::{render, FakeProgram, Step};
use crate::server::{BackendState, FailureMode, InteractiveRecord, PromptStyle};

const CHANNEL_LANGUAGES: [&str; 4] = ["python", "c", "cpp", "c++"];

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "backend-mock"
    }))
}

pub async fn execute(
    State(state): State<Arc<BackendState>>,
    Json(request): Json<ExecuteRequest>,
) -> Response {
    state.executions.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().unwrap().push(request.clone());

    if !state.options.response_delay.is_zero() {
        tokio::time::sleep(state.options.response_delay).await;
    }

    match state.options.failure {
        Some(FailureMode::InternalError) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        }
        Some(FailureMode::MalformedBody) => {
            return (StatusCode::OK, "<html>not json</html>").into_response();
        }
        None => {}
    }

    let Ok(language) = Language::from_backend_id(request.language_id) else {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response();
    };

    let run = FakeProgram::parse(&request.code).run_batch(&request.user_input);
    if !run.delay.is_zero() {
        tokio::time::sleep(run.delay).await;
    }

    let response = if run.success {
        ExecuteResponse {
            status: ExecutionStatus::Success,
            stdout: run.stdout,
            stderr: String::new(),
            friendly_error: Some(String::new()),
            execution_time: Some(0.01),
        }
    } else {
        ExecuteResponse {
            status: ExecutionStatus::Error,
            stdout: run.stdout,
            stderr: run.stderr,
            friendly_error: Some(format!("Your {} program stopped with an error.", language)),
            execution_time: Some(0.01),
        }
    };

    Json(response).into_response()
}

pub async fn list_snippets(State(state): State<Arc<BackendState>>) -> impl IntoResponse {
    let snippets = state.snippets.lock().unwrap().all().to_vec();
    Json(snippets)
}

pub async fn create_snippet(
    State(state): State<Arc<BackendState>>,
    Json(snippet): Json<NewSnippet>,
) -> Response {
    if snippet.title.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({"title": ["This field may not be blank."]})))
            .into_response();
    }
    let created = state.snippets.lock().unwrap().insert(snippet);
    (StatusCode::CREATED, Json(created)).into_response()
}

pub async fn interactive(
    ws: WebSocketUpgrade,
    State(state): State<Arc<BackendState>>,
) -> Response {
    ws.on_upgrade(move |socket| run_interactive(socket, state))
}

async fn run_interactive(mut socket: WebSocket, state: Arc<BackendState>) {
    let Some((language, code)) = wait_for_start(&mut socket).await else {
        return;
    };

    if !CHANNEL_LANGUAGES.contains(&language.as_str()) {
        let _ = send_frame(&mut socket, ServerFrame::error("Unsupported language.")).await;
        return;
    }

    let record_index = {
        let mut sessions = state.interactive.lock().unwrap();
        sessions.push(InteractiveRecord {
            language,
            code: code.clone(),
            inputs: Vec::new(),
        });
        sessions.len() - 1
    };

    let program = FakeProgram::parse(&code);
    let mut last_input = String::new();
    for step in program.steps() {
        match step {
            Step::Print(text) => {
                let line = format!("{}\n", render(text, &last_input));
                if send_frame(&mut socket, ServerFrame::output(line)).await.is_err() {
                    return;
                }
            }
            Step::Input(prompt) => {
                let frame = match state.options.prompt_style {
                    PromptStyle::Field => ServerFrame::prompt(prompt.clone()),
                    PromptStyle::Flag => ServerFrame {
                        output: Some(format!("{}\n", prompt)),
                        prompt: Some(PROMPT_FLAG.to_string()),
                        error: None,
                    },
                };
                if send_frame(&mut socket, frame).await.is_err() {
                    return;
                }
                let Some(data) = wait_for_input(&mut socket).await else {
                    tracing::debug!("Client left while the program was waiting for input");
                    return;
                };
                state.interactive.lock().unwrap()[record_index].inputs.push(data.clone());
                last_input = data;
            }
            Step::Error(message) => {
                let _ = send_frame(&mut socket, ServerFrame::error(render(message, &last_input))).await;
                let _ = close(&mut socket, "program failed").await;
                return;
            }
            Step::Sleep(duration) => tokio::time::sleep(*duration).await,
        }
    }

    let _ = close(&mut socket, "program finished").await;
}

async fn wait_for_start(socket: &mut WebSocket) -> Option<(String, String)> {
    loop {
        match socket.recv().await? {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientFrame>(&text) {
                Ok(ClientFrame::Start { language, code }) => {
                    return Some((language.trim().to_lowercase(), code));
                }
                Ok(ClientFrame::Input { .. }) => {
                    tracing::warn!("Input received before start");
                }
                Err(_) => {
                    send_frame(socket, ServerFrame::error("Invalid JSON.")).await.ok()?;
                }
            },
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

async fn wait_for_input(socket: &mut WebSocket) -> Option<String> {
    loop {
        match socket.recv().await? {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientFrame>(&text) {
                Ok(ClientFrame::Input { data }) => return Some(data),
                Ok(ClientFrame::Start { .. }) => tracing::warn!("Duplicate start frame ignored"),
                Err(_) => {
                    send_frame(socket, ServerFrame::error("Invalid JSON.")).await.ok()?;
                }
            },
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

async fn send_frame(socket: &mut WebSocket, frame: ServerFrame) -> Result<(), axum::Error> {
    let text = serde_json::to_string(&frame).unwrap_or_else(|_| "{}".to_string());
    socket.send(Message::Text(text.into())).await
}

async fn close(socket: &mut WebSocket, reason: &str) -> Result<(), axum::Error> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code: close_code::NORMAL,
            reason: reason.to_string().into(),
        })))
        .await
}
