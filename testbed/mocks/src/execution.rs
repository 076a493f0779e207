//! Mock one-shot execution client

use async_trait::async_trait;
use coderun_client::{ExecutionClient, Submission, TransportError};
use coderun_types::{ExecuteRequest, ExecuteResponse};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// A configurable mock execution client for testing
#[derive(Clone)]
pub struct ScriptedExecutionClient {
    responses: Arc<Mutex<VecDeque<Result<ExecuteResponse, TransportError>>>>,
    requests: Arc<Mutex<Vec<ExecuteRequest>>>,
    call_count: Arc<Mutex<usize>>,
    hold_until_cancelled: bool,
}

impl ScriptedExecutionClient {
    pub fn new() -> Self {
        Self::with_responses(vec![ExecuteResponse::success("")])
    }

    pub fn with_responses(responses: Vec<ExecuteResponse>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<Result<ExecuteResponse, TransportError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(results.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            hold_until_cancelled: false,
        }
    }

    pub fn with_error(error: TransportError) -> Self {
        Self::with_results(vec![Err(error)])
    }

    /// Never answer; every submission resolves only when cancelled.
    pub fn pending() -> Self {
        let mut client = Self::with_results(Vec::new());
        client.hold_until_cancelled = true;
        client
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn requests(&self) -> Vec<ExecuteRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for ScriptedExecutionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionClient for ScriptedExecutionClient {
    async fn submit(
        &self,
        request: ExecuteRequest,
        cancel: CancellationToken,
    ) -> Result<Submission, TransportError> {
        *self.call_count.lock().unwrap() += 1;
        self.requests.lock().unwrap().push(request);

        if self.hold_until_cancelled {
            cancel.cancelled().await;
            return Ok(Submission::Cancelled);
        }

        if cancel.is_cancelled() {
            return Ok(Submission::Cancelled);
        }

        // The last scripted result repeats once the queue runs dry.
        let mut responses = self.responses.lock().unwrap();
        let next = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        next.unwrap_or_else(|| Ok(ExecuteResponse::success("")))
            .map(Submission::Completed)
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
