use super::{Endpoint, RawResponse, Transport};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

enum Reply {
    Response(RawResponse),
    Failure(String),
}

/// A request captured by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub endpoint: Endpoint,
    pub body: serde_json::Value,
}

/// Replays queued replies in order and records every request it sees.
///
/// Once the queue is drained, each call answers `200` with a single text part.
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, response: RawResponse) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Response(response));
        self
    }

    /// Queue a `200` response whose only candidate carries `text`.
    pub fn with_text_response(self, text: &str) -> Self {
        self.with_response(text_response(text))
    }

    /// Queue a network-level failure.
    pub fn with_failure(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Failure(message.to_string()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn text_response(text: &str) -> RawResponse {
    RawResponse::json(
        200,
        &serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        }),
    )
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, endpoint: &Endpoint, body: String) -> Result<RawResponse> {
        let body = serde_json::from_str(&body)?;
        self.requests.lock().unwrap().push(RecordedRequest {
            endpoint: endpoint.clone(),
            body,
        });

        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Failure(message)) => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                message,
            ))),
            None => Ok(text_response("mock answer")),
        }
    }
}
