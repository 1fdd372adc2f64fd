//! Mock transport for testing purposes.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::sources::SearchError;
use crate::utils::{Transport, UpstreamRequest, UpstreamResponse};

/// Body returned once the queue is exhausted
const EMPTY_ENVELOPE: &str = r#"{"totalHits":0,"results":[]}"#;

/// A transport that replays queued responses and records every request.
///
/// When the queue is empty it answers with an empty result envelope.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<UpstreamResponse, SearchError>>>,
    requests: Mutex<Vec<UpstreamRequest>>,
    delay: Duration,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait this long before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue a response with the given status and body.
    pub fn push_response(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.push_result(Ok(UpstreamResponse::new(status, body)));
    }

    /// Queue a transport-level outcome.
    pub fn push_result(&self, result: Result<UpstreamResponse, SearchError>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(result);
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, SearchError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        next.unwrap_or_else(|| Ok(UpstreamResponse::new(200, EMPTY_ENVELOPE)))
    }
}
