//! Scripted HTTP client for testing
//!
//! `MockClient` answers requests from a FIFO queue of `MockResponse`s and
//! records every request it receives, so action creators and the transport
//! can be exercised without a server. The response is taken from the queue
//! when the request is sent, before any simulated delay, which makes the
//! pairing of requests and responses deterministic even when requests
//! overlap.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use super::{HttpClient, HttpRequest, HttpResponse};
use crate::error::TransportError;

/// One scripted answer
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// Delay before the answer is delivered (simulates network latency)
    pub delay: Duration,
    /// Fail with `TransportError::Network` instead of answering
    pub network_error: Option<String>,
}

impl MockResponse {
    /// Answer with a JSON body
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
            delay: Duration::ZERO,
            network_error: None,
        }
    }

    /// Answer with a raw body
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.as_bytes().to_vec(),
            delay: Duration::ZERO,
            network_error: None,
        }
    }

    /// Fail without a response
    pub fn network_error(message: &str) -> Self {
        Self {
            status: 0,
            body: Vec::new(),
            delay: Duration::ZERO,
            network_error: Some(message.to_string()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
struct MockState {
    responses: VecDeque<MockResponse>,
    requests: Vec<HttpRequest>,
    cookies: HashMap<String, String>,
}

/// Mock HTTP client; clones share the same script and request log
#[derive(Clone, Default)]
pub struct MockClient {
    state: Arc<Mutex<MockState>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer to the next unanswered request
    pub fn push_response(&self, response: MockResponse) {
        self.state.lock().unwrap().responses.push_back(response);
    }

    pub fn set_cookie(&self, name: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .cookies
            .insert(name.to_string(), value.to_string());
    }

    /// All requests received so far, in order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Number of queued responses not yet consumed
    pub fn pending_responses(&self) -> usize {
        self.state.lock().unwrap().responses.len()
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let scripted = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            state.responses.pop_front()
        };

        let Some(scripted) = scripted else {
            return Err(TransportError::Network(format!(
                "No scripted response for {} {}",
                request.method, request.url
            )));
        };

        if !scripted.delay.is_zero() {
            sleep(scripted.delay).await;
        }

        if let Some(message) = scripted.network_error {
            return Err(TransportError::Network(message));
        }

        let status_text = reqwest::StatusCode::from_u16(scripted.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or_default()
            .to_string();

        Ok(HttpResponse {
            status: scripted.status,
            status_text,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: scripted.body,
        })
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.state.lock().unwrap().cookies.get(name).cloned()
    }
}
