use std::time::Duration;

use coderun_types::{NewSnippet, Snippet};

use crate::TransportError;

/// Path of the snippet collection relative to the backend base URL.
pub const SNIPPETS_PATH: &str = "/api/snippets/";

/// HTTP client for snippet persistence
pub struct SnippetClient {
    base_url: String,
    snippets_path: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl SnippetClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            snippets_path: SNIPPETS_PATH.to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_snippets_path(mut self, path: impl Into<String>) -> Self {
        self.snippets_path = path.into();
        self
    }

    fn collection_url(&self) -> String {
        format!("{}{}", self.base_url, self.snippets_path)
    }

    /// Store a snippet and return it as created by the backend
    pub async fn save(&self, snippet: &NewSnippet) -> Result<Snippet, TransportError> {
        let response = self
            .client
            .post(self.collection_url())
            .timeout(self.timeout)
            .json(snippet)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TransportError::http_status(status.as_u16(), body));
        }

        let created: Snippet =
            serde_json::from_str(&body).map_err(|e| TransportError::MalformedResponse(e.to_string()))?;
        log::info!("Saved snippet {} ({})", created.id, created.title);
        Ok(created)
    }

    /// List the snippets visible to the caller
    pub async fn list(&self) -> Result<Vec<Snippet>, TransportError> {
        let response = self
            .client
            .get(self.collection_url())
            .timeout(self.timeout)
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
