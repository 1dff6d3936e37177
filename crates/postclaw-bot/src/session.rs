//! Per-user conversation sessions.

use std::collections::HashMap;

use postclaw_core::{MediaKind, UploadedMedia, UserId};
use tokio::sync::Mutex;

/// Where a user stands in the submit flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Ready,
    AwaitingCaption,
    AwaitingSchedule,
}

/// Session data. Each later state carries everything the earlier ones
/// gathered, so a caption can't exist without media.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Session {
    #[default]
    Ready,
    AwaitingCaption {
        media: UploadedMedia,
    },
    AwaitingSchedule {
        media: UploadedMedia,
        caption: String,
    },
}

impl Session {
    pub fn state(&self) -> SessionState {
        match self {
            Session::Ready => SessionState::Ready,
            Session::AwaitingCaption { .. } => SessionState::AwaitingCaption,
            Session::AwaitingSchedule { .. } => SessionState::AwaitingSchedule,
        }
    }

    pub fn media(&self) -> Option<&UploadedMedia> {
        match self {
            Session::Ready => None,
            Session::AwaitingCaption { media } | Session::AwaitingSchedule { media, .. } => {
                Some(media)
            }
        }
    }

    pub fn media_url(&self) -> Option<&str> {
        self.media().map(|m| m.url.as_str())
    }

    pub fn media_kind(&self) -> Option<MediaKind> {
        self.media().map(|m| m.kind)
    }

    pub fn caption(&self) -> Option<&str> {
        match self {
            Session::AwaitingSchedule { caption, .. } => Some(caption),
            _ => None,
        }
    }
}

/// All live sessions, keyed by user.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<UserId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session, creating a Ready one on first contact.
    pub async fn get_or_create(&self, user: UserId) -> Session {
        self.sessions.lock().await.entry(user).or_default().clone()
    }

    #[cfg(test)]
    pub async fn get(&self, user: UserId) -> Option<Session> {
        self.sessions.lock().await.get(&user).cloned()
    }

    pub async fn set(&self, user: UserId, session: Session) {
        self.sessions.lock().await.insert(user, session);
    }

    pub async fn reset(&self, user: UserId) {
        self.set(user, Session::Ready).await;
    }

    /// Number of users with a session.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> UploadedMedia {
        UploadedMedia {
            url: "https://cdn/x.jpg".into(),
            kind: MediaKind::Image,
            public_id: None,
            duration_secs: None,
        }
    }

    #[test]
    fn test_accessors_follow_state() {
        assert_eq!(Session::Ready.media_url(), None);

        let caption = Session::AwaitingCaption { media: media() };
        assert_eq!(caption.state(), SessionState::AwaitingCaption);
        assert_eq!(caption.media_url(), Some("https://cdn/x.jpg"));
        assert_eq!(caption.caption(), None);

        let schedule = Session::AwaitingSchedule {
            media: media(),
            caption: "hello".into(),
        };
        assert_eq!(schedule.caption(), Some("hello"));
        assert_eq!(schedule.media_kind(), Some(MediaKind::Image));
    }

    #[tokio::test]
    async fn test_store_creates_ready_on_first_contact() {
        let store = SessionStore::new();
        assert!(store.get(UserId(1)).await.is_none());
        assert_eq!(store.get_or_create(UserId(1)).await, Session::Ready);
        assert_eq!(store.len().await, 1);
    }
}
