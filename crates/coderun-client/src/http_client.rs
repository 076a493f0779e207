use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use coderun_types::{ExecuteRequest, ExecuteResponse};

use crate::{ExecutionClient, Submission, TransportError};

/// Path of the one-shot endpoint relative to the backend base URL.
pub const EXECUTE_PATH: &str = "/api/execute/execute/";

/// HTTP client for the one-shot execution endpoint
pub struct HttpExecutionClient {
    base_url: String,
    execute_path: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpExecutionClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            execute_path: EXECUTE_PATH.to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_execute_path(mut self, path: impl Into<String>) -> Self {
        self.execute_path = path.into();
        self
    }

    pub fn execute_url(&self) -> String {
        format!("{}{}", self.base_url, self.execute_path)
    }

    async fn post_execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse, TransportError> {
        let response = self
            .client
            .post(self.execute_url())
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::http_status(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| TransportError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl ExecutionClient for HttpExecutionClient {
    async fn submit(
        &self,
        request: ExecuteRequest,
        cancel: CancellationToken,
    ) -> Result<Submission, TransportError> {
        log::debug!(
            "Submitting {} bytes of code (language {}) to {}",
            request.code.len(),
            request.language_id,
            self.execute_url()
        );

        // Dropping the request future aborts the underlying HTTP call.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("One-shot request cancelled before a response arrived");
                Ok(Submission::Cancelled)
            }
            result = self.post_execute(&request) => result.map(Submission::Completed),
        }
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .timeout(self.timeout)
            .send()
            .await?;

        // Any answer below 500 means something is listening.
        if response.status().is_server_error() {
            return Err(TransportError::http_status(
                response.status().as_u16(),
                "Health check failed",
            ));
        }

        Ok(())
    }
}
