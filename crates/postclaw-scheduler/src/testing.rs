//! In-memory collaborators for scheduler tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use postclaw_core::traits::{ContainerRequest, MessagingGateway, PublishTarget, TransportError};
use postclaw_core::{PostClawError, Result, UserId};
use serde_json::{Value, json};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum TargetCall {
    Create(ContainerRequest),
    Publish(String),
}

/// Publish target with canned responses that records when each call landed.
pub struct FakeTarget {
    create_response: Value,
    publish_response: Value,
    create_error: Option<TransportError>,
    create_latency: Duration,
    publish_latency: Duration,
    calls: Mutex<Vec<(TargetCall, Instant)>>,
}

impl FakeTarget {
    pub fn new(create_response: Value, publish_response: Value) -> Self {
        Self {
            create_response,
            publish_response,
            create_error: None,
            create_latency: Duration::ZERO,
            publish_latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(creation_id: &str, post_id: &str) -> Self {
        Self::new(json!({"id": creation_id}), json!({"id": post_id}))
    }

    pub fn with_create_latency(mut self, latency: Duration) -> Self {
        self.create_latency = latency;
        self
    }

    pub fn with_publish_latency(mut self, latency: Duration) -> Self {
        self.publish_latency = latency;
        self
    }

    pub fn with_create_error(mut self, err: TransportError) -> Self {
        self.create_error = Some(err);
        self
    }

    pub fn calls(&self) -> Vec<(TargetCall, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PublishTarget for FakeTarget {
    async fn create_container(
        &self,
        request: &ContainerRequest,
    ) -> std::result::Result<Value, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((TargetCall::Create(request.clone()), Instant::now()));
        tokio::time::sleep(self.create_latency).await;
        match &self.create_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.create_response.clone()),
        }
    }

    async fn publish_container(
        &self,
        creation_id: &str,
    ) -> std::result::Result<Value, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((TargetCall::Publish(creation_id.to_string()), Instant::now()));
        tokio::time::sleep(self.publish_latency).await;
        Ok(self.publish_response.clone())
    }
}

/// Gateway that keeps every reply and can be told to fail sends.
#[derive(Default)]
pub struct RecordingGateway {
    replies: Mutex<Vec<(UserId, String)>>,
    fail_sends: bool,
    panic_for: Option<UserId>,
}

impl RecordingGateway {
    pub fn failing() -> Self {
        Self {
            fail_sends: true,
            ..Self::default()
        }
    }

    /// Panics on any reply to `user`.
    pub fn panicking_for(user: UserId) -> Self {
        Self {
            panic_for: Some(user),
            ..Self::default()
        }
    }

    pub fn replies(&self) -> Vec<(UserId, String)> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn reply(&self, user: UserId, text: &str, _formatted: bool) -> Result<()> {
        if self.panic_for == Some(user) {
            panic!("gateway crashed replying to {user}");
        }
        if self.fail_sends {
            return Err(PostClawError::Channel("chat unavailable".into()));
        }
        self.replies.lock().unwrap().push((user, text.to_string()));
        Ok(())
    }

    async fn send_media(&self, user: UserId, _payload_ref: &str, caption: &str) -> Result<()> {
        self.reply(user, caption, false).await
    }

    async fn download(&self, _payload_ref: &str) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}
