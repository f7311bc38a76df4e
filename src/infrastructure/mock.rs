use crate::domain::ports::{HttpMethod, HttpResponse, SignedRequest, Transport, TransportError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use tracing::debug;
use url::Url;

/// In-memory [`Transport`] replaying scripted responses.
///
/// Responses are keyed by method and URL path. Queued responses are served in
/// order; the last one keeps answering once the queue drains. Every request is
/// recorded, including ones that had no scripted answer.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<(HttpMethod, String), VecDeque<HttpResponse>>>,
    requests: Mutex<Vec<SignedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a JSON response for `method path`.
    pub fn respond(&self, method: HttpMethod, path: &str, status: u16, body: Value) -> &Self {
        self.respond_raw(method, path, status, &body.to_string())
    }

    pub fn respond_raw(&self, method: HttpMethod, path: &str, status: u16, body: &str) -> &Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((method, path.to_string()))
            .or_default()
            .push_back(HttpResponse {
                status,
                body: body.to_string(),
            });
        self
    }

    pub fn requests(&self) -> Vec<SignedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Recorded requests whose URL path equals `path`.
    pub fn requests_to(&self, path: &str) -> Vec<SignedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| path_of(&r.url).as_deref() == Some(path))
            .collect()
    }
}

fn path_of(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|u| u.path().to_string())
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &SignedRequest) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let path = path_of(&request.url)
            .ok_or_else(|| TransportError::Request(format!("invalid url {}", request.url)))?;
        debug!("MockTransport: {} {}", request.method, path);

        let mut responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = responses
            .get_mut(&(request.method, path.clone()))
            .ok_or_else(|| {
                TransportError::Request(format!("no scripted response for {} {}", request.method, path))
            })?;
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        response.ok_or_else(|| TransportError::Request(format!("empty script for {}", path)))
    }
}
