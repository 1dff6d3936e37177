//! Shared data types — users, media, inbound chat events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat user identifier as assigned by the messaging transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Kind of media a user submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// User-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Image => "Photo",
            MediaKind::Video => "Video",
        }
    }

    /// Single-glyph marker used in post listings.
    pub fn marker(&self) -> &'static str {
        match self {
            MediaKind::Image => "📸",
            MediaKind::Video => "🎥",
        }
    }

    /// Resource type string used by object stores.
    pub fn resource_type(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_type())
    }
}

/// Media accepted by the object store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedMedia {
    /// Durable public URL.
    pub url: String,
    pub kind: MediaKind,
    pub public_id: Option<String>,
    /// Duration reported by the store (videos only).
    pub duration_secs: Option<f64>,
}

/// One inbound event from the messaging gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub user: UserId,
    pub kind: InboundKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundKind {
    /// A slash command, name without the leading `/` and any `@bot` suffix.
    Command(String),
    /// Free text (including unrecognised slash words).
    Text(String),
    /// Photo or video. `payload_ref` is transport-specific (Telegram file_id).
    Media {
        kind: MediaKind,
        payload_ref: String,
        duration_secs: Option<u32>,
        size_bytes: Option<u64>,
    },
}

impl InboundEvent {
    pub fn command(user: impl Into<UserId>, name: &str) -> Self {
        Self {
            user: user.into(),
            kind: InboundKind::Command(name.to_string()),
        }
    }

    pub fn text(user: impl Into<UserId>, text: &str) -> Self {
        Self {
            user: user.into(),
            kind: InboundKind::Text(text.to_string()),
        }
    }

    pub fn media(
        user: impl Into<UserId>,
        kind: MediaKind,
        payload_ref: &str,
        duration_secs: Option<u32>,
        size_bytes: Option<u64>,
    ) -> Self {
        Self {
            user: user.into(),
            kind: InboundKind::Media {
                kind,
                payload_ref: payload_ref.to_string(),
                duration_secs,
                size_bytes,
            },
        }
    }
}

/// Truncate to at most `max` characters, never splitting a UTF-8 sequence.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("şimdi paylaş", 5), "şimdi");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_media_kind_serde() {
        let json = serde_json::to_string(&MediaKind::Video).unwrap();
        assert_eq!(json, "\"video\"");
        assert_eq!(MediaKind::Image.label(), "Photo");
    }
}
