//! Publish protocol — create container, wait for remote processing, publish.
//!
//! Maps every remote outcome onto `PublishedPost` or a `PublishError`. No
//! retries happen here; retry policy belongs to the caller.

use std::sync::Arc;
use std::time::Duration;

use postclaw_core::MediaKind;
use postclaw_core::config::PublishConfig;
use postclaw_core::traits::{ContainerRequest, PublishTarget, TransportError};
use serde_json::Value;
use thiserror::Error;

use crate::engine::Shutdown;

/// A successfully published post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPost {
    pub post_id: String,
    /// Remote container type: IMAGE or REELS.
    pub post_type: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PublishError {
    /// Creation call answered without an id.
    #[error("Container failed: {0}")]
    Container(String),

    #[error("Container failed: timed out waiting for the media container to be created")]
    ContainerTimeout,

    /// Publish call answered without an id.
    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Publish failed: timed out waiting for the publish call to return")]
    PublishTimeout,

    /// Any other transport failure.
    #[error("Unexpected error: {0}")]
    Transport(String),

    #[error("Publish cancelled: scheduler is shutting down")]
    Cancelled,
}

pub struct Publisher {
    target: Arc<dyn PublishTarget>,
    image_delay: Duration,
    video_delay: Duration,
    create_timeout: Duration,
    publish_timeout: Duration,
    shutdown: Shutdown,
}

impl Publisher {
    pub fn new(target: Arc<dyn PublishTarget>, config: &PublishConfig, shutdown: Shutdown) -> Self {
        Self {
            target,
            image_delay: Duration::from_secs(config.image_delay_secs),
            video_delay: Duration::from_secs(config.video_delay_secs),
            create_timeout: Duration::from_secs(config.create_timeout_secs),
            publish_timeout: Duration::from_secs(config.publish_timeout_secs),
            shutdown,
        }
    }

    /// Remote processing wait between container creation and publish.
    pub fn processing_delay(&self, kind: MediaKind) -> Duration {
        match kind {
            MediaKind::Image => self.image_delay,
            MediaKind::Video => self.video_delay,
        }
    }

    pub async fn publish(
        &self,
        media_url: &str,
        caption: &str,
        kind: MediaKind,
    ) -> Result<PublishedPost, PublishError> {
        let request = ContainerRequest::new(media_url, caption, kind);
        let container_type = request.container_type();

        tracing::info!("🔧 Creating {container_type} container");
        let created =
            tokio::time::timeout(self.create_timeout, self.target.create_container(&request))
                .await
                .unwrap_or(Err(TransportError::Timeout));
        let body = match created {
            Ok(body) => body,
            Err(TransportError::Timeout) => return Err(PublishError::ContainerTimeout),
            Err(TransportError::Other(e)) => return Err(PublishError::Transport(e)),
        };
        tracing::debug!("📦 Container response: {body}");

        let creation_id = response_id(&body).ok_or_else(|| {
            PublishError::Container(error_message(&body, "Unknown container error"))
        })?;
        tracing::info!("✅ {container_type} container created: {creation_id}");

        let delay = self.processing_delay(kind);
        tracing::info!("⏳ Waiting {}s for remote processing", delay.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.shutdown.cancelled() => return Err(PublishError::Cancelled),
        }

        tracing::info!("🚀 Publishing container {creation_id}");
        let published = tokio::time::timeout(
            self.publish_timeout,
            self.target.publish_container(&creation_id),
        )
        .await
        .unwrap_or(Err(TransportError::Timeout));
        let body = match published {
            Ok(body) => body,
            Err(TransportError::Timeout) => return Err(PublishError::PublishTimeout),
            Err(TransportError::Other(e)) => return Err(PublishError::Transport(e)),
        };
        tracing::debug!("📮 Publish response: {body}");

        let post_id = response_id(&body)
            .ok_or_else(|| PublishError::Publish(error_message(&body, "Unknown publish error")))?;
        tracing::info!("✅ Published {kind}: {post_id}");

        Ok(PublishedPost {
            post_id,
            post_type: container_type.to_string(),
        })
    }
}

/// Non-empty `id` field, string or number.
fn response_id(body: &Value) -> Option<String> {
    match body.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn error_message(body: &Value, fallback: &str) -> String {
    body["error"]["message"]
        .as_str()
        .filter(|m| !m.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTarget, TargetCall};
    use serde_json::json;

    fn publisher(target: Arc<FakeTarget>) -> Publisher {
        Publisher::new(target, &PublishConfig::default(), Shutdown::never())
    }

    #[tokio::test(start_paused = true)]
    async fn test_video_waits_video_delay_before_publish() {
        let target = Arc::new(FakeTarget::ok("c-1", "p-1"));
        let post = publisher(target.clone())
            .publish("https://cdn/v.mp4", "reel", MediaKind::Video)
            .await
            .unwrap();
        assert_eq!(post.post_id, "p-1");
        assert_eq!(post.post_type, "REELS");

        let calls = target.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0].0, TargetCall::Create(ContainerRequest::Video { .. })));
        assert_eq!(calls[1].0, TargetCall::Publish("c-1".into()));
        assert_eq!(calls[1].1 - calls[0].1, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_image_waits_image_delay_before_publish() {
        let target = Arc::new(FakeTarget::ok("c-2", "p-2"));
        let post = publisher(target.clone())
            .publish("https://cdn/i.jpg", "pic", MediaKind::Image)
            .await
            .unwrap();
        assert_eq!(post.post_type, "IMAGE");

        let calls = target.calls();
        assert!(matches!(calls[0].0, TargetCall::Create(ContainerRequest::Image { .. })));
        assert_eq!(calls[1].1 - calls[0].1, Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_container_id_extracts_error_message() {
        let target = Arc::new(FakeTarget::new(
            json!({"error": {"message": "Invalid image URL"}}),
            json!({"id": "never"}),
        ));
        let err = publisher(target.clone())
            .publish("bad", "x", MediaKind::Image)
            .await
            .unwrap_err();
        assert_eq!(err, PublishError::Container("Invalid image URL".into()));
        assert_eq!(err.to_string(), "Container failed: Invalid image URL");
        assert_eq!(target.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_ids_use_generic_messages() {
        let target = Arc::new(FakeTarget::new(json!({}), json!({})));
        let err = publisher(target).publish("u", "c", MediaKind::Image).await.unwrap_err();
        assert_eq!(err.to_string(), "Container failed: Unknown container error");

        let target = Arc::new(FakeTarget::new(json!({"id": "c"}), json!({"id": ""})));
        let err = publisher(target).publish("u", "c", MediaKind::Image).await.unwrap_err();
        assert_eq!(err, PublishError::Publish("Unknown publish error".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_numeric_ids_accepted() {
        let target = Arc::new(FakeTarget::new(json!({"id": 17}), json!({"id": 18})));
        let post = publisher(target).publish("u", "c", MediaKind::Image).await.unwrap();
        assert_eq!(post.post_id, "18");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_are_distinguished_by_phase() {
        let slow_create =
            Arc::new(FakeTarget::ok("c", "p").with_create_latency(Duration::from_secs(61)));
        let err = publisher(slow_create).publish("u", "c", MediaKind::Video).await.unwrap_err();
        assert_eq!(err, PublishError::ContainerTimeout);

        let slow_publish =
            Arc::new(FakeTarget::ok("c", "p").with_publish_latency(Duration::from_secs(31)));
        let err = publisher(slow_publish).publish("u", "c", MediaKind::Image).await.unwrap_err();
        assert_eq!(err, PublishError::PublishTimeout);
        assert!(err.to_string().starts_with("Publish failed:"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_wrapped() {
        let target = Arc::new(FakeTarget::ok("c", "p").with_create_error(TransportError::Other(
            "connection reset".into(),
        )));
        let err = publisher(target).publish("u", "c", MediaKind::Image).await.unwrap_err();
        assert_eq!(err.to_string(), "Unexpected error: connection reset");
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_processing_delay() {
        let target = Arc::new(FakeTarget::ok("c", "p"));
        let (trigger, shutdown) = Shutdown::new();
        let publisher = Publisher::new(target.clone(), &PublishConfig::default(), shutdown);

        let handle = tokio::spawn(async move {
            publisher.publish("u", "c", MediaKind::Video).await
        });
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.trigger();

        assert_eq!(handle.await.unwrap(), Err(PublishError::Cancelled));
        assert_eq!(target.calls().len(), 1);
    }
}
