//! Swappable HTTP transport: reqwest in production, a script in tests.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::request::{ProbeRequestSpec, ProbeResponse};
use crate::error::{ProbeError, Result};

/// Sends one probe request. Deadlines are enforced by the caller, so
/// implementations should not add their own timeouts.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &ProbeRequestSpec) -> Result<ProbeResponse>;
}

/// Production transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ProbeRequestSpec) -> Result<ProbeResponse> {
        let response = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone())
            .json(&request.body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok(ProbeResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            headers,
            body,
        ))
    }
}

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Respond(ProbeResponse),
    /// Respond after a delay (use with paused tokio time).
    Delayed(Duration, ProbeResponse),
    /// Fail at the transport level.
    Fail(String),
    /// Never respond.
    Hang,
}

impl ScriptedReply {
    pub fn json(status: u16, body: Value) -> Self {
        Self::Respond(ProbeResponse::json(status, &body))
    }

    pub fn ok() -> Self {
        Self::json(200, serde_json::json!({}))
    }

    /// OpenAI-style error envelope.
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(
            status,
            serde_json::json!({ "error": { "message": message, "type": "invalid_request_error" } }),
        )
    }
}

type Responder = Box<dyn Fn(&ProbeRequestSpec) -> ScriptedReply + Send + Sync>;

/// Deterministic transport double.
///
/// Queued replies are served first, in order; once the queue is empty the
/// responder (if any) decides, and otherwise every request gets `200 {}`.
/// Every request is recorded.
#[derive(Default)]
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<ScriptedReply>>,
    responder: Option<Responder>,
    requests: Mutex<Vec<ProbeRequestSpec>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responder(
        responder: impl Fn(&ProbeRequestSpec) -> ScriptedReply + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::default()
        }
    }

    pub fn push(&self, reply: ScriptedReply) -> &Self {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<ProbeRequestSpec> {
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

    fn next_reply(&self, request: &ProbeRequestSpec) -> ScriptedReply {
        let queued = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        queued
            .or_else(|| self.responder.as_ref().map(|respond| respond(request)))
            .unwrap_or_else(ScriptedReply::ok)
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &ProbeRequestSpec) -> Result<ProbeResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        match self.next_reply(request) {
            ScriptedReply::Respond(response) => Ok(response),
            ScriptedReply::Delayed(delay, response) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            ScriptedReply::Fail(message) => Err(ProbeError::Transport(message)),
            ScriptedReply::Hang => futures::future::pending::<Result<ProbeResponse>>().await,
        }
    }
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("requests", &self.request_count())
            .field("responder", &self.responder.as_ref().map(|_| ".."))
            .finish()
    }
}
