//! In-memory collaborators for tests/dev.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::navigation::Navigator;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Method, TransportError};

/// Scripted outcome for one `(method, path)` pair.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(ApiResponse),
    Fail(TransportError),
    /// Wait (on the tokio clock), then produce the inner reply.
    Delayed(Duration, Box<Reply>),
    /// Never answer.
    Hang,
}

impl Reply {
    pub fn status(status: u16, body: Value) -> Self {
        Reply::Respond(ApiResponse::new(status, body))
    }

    pub fn ok(body: Value) -> Self {
        Reply::Respond(ApiResponse::ok(body))
    }
}

/// Scripted transport.
///
/// - Replies are looked up by exact `(method, path)`; unscripted routes answer 404
/// - Every request is recorded before it is answered, including ones that hang
#[derive(Debug, Default)]
pub struct MemoryTransport {
    replies: Mutex<HashMap<(Method, String), Reply>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script (or replace) the reply for a route.
    pub fn on(&self, method: Method, path: impl Into<String>, reply: Reply) -> &Self {
        lock(&self.replies).insert((method, path.into()), reply);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        lock(&self.requests).clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        lock(&self.requests)
            .iter()
            .filter(|request| request.path == path)
            .cloned()
            .collect()
    }

    pub fn call_count(&self, method: Method, path: &str) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .count()
    }
}

#[async_trait]
impl HttpTransport for MemoryTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let key = (request.method, request.path.clone());
        lock(&self.requests).push(request);

        let mut reply = lock(&self.replies).get(&key).cloned().unwrap_or_else(|| {
            Reply::status(404, json!({ "message": format!("no route for {} {}", key.0, key.1) }))
        });

        loop {
            match reply {
                Reply::Respond(response) => return Ok(response),
                Reply::Fail(err) => return Err(err),
                Reply::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
                Reply::Hang => return std::future::pending().await,
            }
        }
    }
}

/// Navigator that records every redirect it is asked to perform.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<String> {
        lock(&self.visited).clone()
    }

    pub fn last(&self) -> Option<String> {
        lock(&self.visited).last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        lock(&self.visited).push(path.to_string());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unscripted_routes_answer_not_found() {
        let transport = MemoryTransport::new();
        let resp = transport.send(ApiRequest::get("/missing")).await.unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(transport.call_count(Method::Get, "/missing"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_reply_is_recorded() {
        let transport = MemoryTransport::new();
        transport.on(Method::Post, "/slow", Reply::Hang);

        let outcome = tokio::time::timeout(
            Duration::from_secs(1),
            transport.send(ApiRequest::post("/slow")),
        )
        .await;

        assert!(outcome.is_err());
        assert_eq!(transport.requests_to("/slow").len(), 1);
    }
}
