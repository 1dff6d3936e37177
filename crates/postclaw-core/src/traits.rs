//! Collaborator traits — the seams between the scheduling core and the
//! outside world. Concrete implementations live in `postclaw-channels`
//! (Telegram) and `postclaw-providers` (Cloudinary, Instagram).

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{MediaKind, UploadedMedia, UserId};

/// Outbound half of the chat transport.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send a text reply. `formatted` enables the transport's markup mode.
    async fn reply(&self, user: UserId, text: &str, formatted: bool) -> Result<()>;

    /// Send previously received media back to the user with a caption.
    async fn send_media(&self, user: UserId, payload_ref: &str, caption: &str) -> Result<()>;

    /// Fetch the raw bytes behind a payload reference.
    async fn download(&self, payload_ref: &str) -> Result<Vec<u8>>;
}

/// Media hosting: raw bytes in, durable URL out.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, kind: MediaKind) -> Result<UploadedMedia>;
}

/// Container creation request. The shape depends on the media kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerRequest {
    Image { image_url: String, caption: String },
    Video { video_url: String, caption: String },
}

impl ContainerRequest {
    pub fn new(media_url: &str, caption: &str, kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => Self::Image {
                image_url: media_url.to_string(),
                caption: caption.to_string(),
            },
            MediaKind::Video => Self::Video {
                video_url: media_url.to_string(),
                caption: caption.to_string(),
            },
        }
    }

    /// Remote container type reported back as the post type.
    pub fn container_type(&self) -> &'static str {
        match self {
            Self::Image { .. } => "IMAGE",
            Self::Video { .. } => "REELS",
        }
    }

    /// Key-value request body.
    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Image { image_url, caption } => vec![
                ("image_url", image_url.clone()),
                ("caption", caption.clone()),
            ],
            Self::Video { video_url, caption } => vec![
                ("media_type", "REELS".to_string()),
                ("video_url", video_url.clone()),
                ("caption", caption.clone()),
            ],
        }
    }
}

/// Network-level failure talking to the publish target.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("{0}")]
    Other(String),
}

/// Remote publishing API with a two-call container/publish protocol.
///
/// Both calls return the raw response body: success carries an `id`,
/// failure an `error.message`.
#[async_trait]
pub trait PublishTarget: Send + Sync {
    async fn create_container(
        &self,
        request: &ContainerRequest,
    ) -> std::result::Result<Value, TransportError>;

    async fn publish_container(
        &self,
        creation_id: &str,
    ) -> std::result::Result<Value, TransportError>;
}
