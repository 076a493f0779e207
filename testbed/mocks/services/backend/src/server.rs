use axum::{
    routing::get,
    routing::post,
    Router,
};
use coderun_types::{ExecuteRequest, Snippet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::fixtures::SnippetFixture;
use crate::handlers::{create_snippet, execute, health_check, interactive, list_snippets};

/// How the one-shot endpoint misbehaves, when asked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Answer every execution with HTTP 500.
    InternalError,
    /// Answer every execution with a 200 whose body is not JSON.
    MalformedBody,
}

/// How prompts are encoded on the interactive channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptStyle {
    /// `{"prompt": "<text>"}`
    #[default]
    Field,
    /// `{"output": "<text>\n", "prompt": "true"}`
    Flag,
}

#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    pub failure: Option<FailureMode>,
    pub prompt_style: PromptStyle,
    pub response_delay: Duration,
}

/// What the mock saw on one interactive connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractiveRecord {
    pub language: String,
    pub code: String,
    pub inputs: Vec<String>,
}

pub struct BackendState {
    pub options: BackendOptions,
    pub(crate) snippets: Mutex<SnippetFixture>,
    pub(crate) requests: Mutex<Vec<ExecuteRequest>>,
    pub(crate) interactive: Mutex<Vec<InteractiveRecord>>,
    pub(crate) executions: AtomicUsize,
}

impl BackendState {
    fn new(options: BackendOptions, fixture: SnippetFixture) -> Self {
        Self {
            options,
            snippets: Mutex::new(fixture),
            requests: Mutex::new(Vec::new()),
            interactive: Mutex::new(Vec::new()),
            executions: AtomicUsize::new(0),
        }
    }
}

pub struct MockBackend {
    fixture: SnippetFixture,
    options: BackendOptions,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_fixture(SnippetFixture::create_test_fixture())
    }

    pub fn with_fixture(fixture: SnippetFixture) -> Self {
        Self {
            fixture,
            options: BackendOptions::default(),
        }
    }

    pub fn with_failure(mut self, failure: FailureMode) -> Self {
        self.options.failure = Some(failure);
        self
    }

    pub fn with_prompt_style(mut self, style: PromptStyle) -> Self {
        self.options.prompt_style = style;
        self
    }

    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.options.response_delay = delay;
        self
    }

    fn build(self) -> (Router, Arc<BackendState>) {
        let state = Arc::new(BackendState::new(self.options, self.fixture));
        let app = Router::new()
            .route("/health", get(health_check))
            .route("/api/execute/execute/", post(execute))
            .route("/api/snippets/", get(list_snippets).post(create_snippet))
            .route("/ws/interactive/", get(interactive))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());
        (app, state)
    }

    /// Serve on `addr` until the process exits
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let (app, _state) = self.build();
        let addr: SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Mock execution backend listening on {}", addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| anyhow::anyhow!("Mock backend error: {}", e))
    }

    /// Serve on an ephemeral local port in the background
    pub async fn spawn(self) -> anyhow::Result<RunningBackend> {
        let (app, state) = self.build();
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tracing::info!("Mock execution backend listening on {}", addr);
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Mock backend error: {}", e);
            }
        });

        Ok(RunningBackend {
            addr,
            state,
            handle,
        })
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// A mock backend serving in the background. Stops when dropped.
pub struct RunningBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    handle: JoinHandle<()>,
}

impl RunningBackend {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn interactive_url(&self) -> String {
        format!("ws://{}/ws/interactive/", self.addr)
    }

    pub fn execution_count(&self) -> usize {
        self.state.executions.load(Ordering::SeqCst)
    }

    pub fn execute_requests(&self) -> Vec<ExecuteRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn interactive_sessions(&self) -> Vec<InteractiveRecord> {
        self.state.interactive.lock().unwrap().clone()
    }

    pub fn snippets(&self) -> Vec<Snippet> {
        self.state.snippets.lock().unwrap().all().to_vec()
    }
}

impl Drop for RunningBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
