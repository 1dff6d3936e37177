//! Instagram Graph API publish target.
//!
//! Two form POSTs against the authenticated account: `/me/media` creates a
//! container, `/me/media_publish` publishes it. Response bodies are handed
//! back raw; the publisher decides what counts as success.

use std::time::Duration;

use async_trait::async_trait;
use postclaw_core::config::{InstagramConfig, PublishConfig};
use postclaw_core::traits::{ContainerRequest, PublishTarget, TransportError};
use serde_json::Value;

pub struct InstagramTarget {
    config: InstagramConfig,
    client: reqwest::Client,
    create_timeout: Duration,
    publish_timeout: Duration,
}

impl InstagramTarget {
    pub fn new(config: InstagramConfig, publish: &PublishConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            create_timeout: Duration::from_secs(publish.create_timeout_secs),
            publish_timeout: Duration::from_secs(publish.publish_timeout_secs),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/me/{path}", self.config.api_base.trim_end_matches('/'))
    }

    async fn post_form(
        &self,
        path: &str,
        mut form: Vec<(&'static str, String)>,
        timeout: Duration,
    ) -> Result<Value, TransportError> {
        form.push(("access_token", self.config.access_token.clone()));

        let response = self
            .client
            .post(self.endpoint(path))
            .form(&form)
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest)?;
        let status = response.status();
        let body: Value = response.json().await.map_err(map_reqwest)?;
        tracing::debug!("Instagram {path} → HTTP {status}: {body}");
        Ok(body)
    }
}

fn map_reqwest(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Other(e.to_string())
    }
}

#[async_trait]
impl PublishTarget for InstagramTarget {
    async fn create_container(&self, request: &ContainerRequest) -> Result<Value, TransportError> {
        tracing::info!("📡 Creating {} container", request.container_type());
        self.post_form("media", request.to_form(), self.create_timeout)
            .await
    }

    async fn publish_container(&self, creation_id: &str) -> Result<Value, TransportError> {
        tracing::info!("📡 Publishing container {creation_id}");
        let form = vec![("creation_id", creation_id.to_string())];
        self.post_form("media_publish", form, self.publish_timeout)
            .await
    }
}
