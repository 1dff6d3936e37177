//! Conversation handler: routes every inbound event through the session
//! state machine.

use std::sync::Arc;

use postclaw_core::config::IntakeConfig;
use postclaw_core::traits::{MessagingGateway, ObjectStore};
use postclaw_core::{InboundEvent, InboundKind, MediaKind, UploadedMedia, UserId};
use postclaw_scheduler::{ItemStore, NewItem, local_now, parse_schedule};

use crate::intake::{self, IntakeError};
use crate::messages;
use crate::session::{Session, SessionStore};

/// The per-process conversation driver. Cheap to clone.
#[derive(Clone)]
pub struct Conversation {
    gateway: Arc<dyn MessagingGateway>,
    media_store: Arc<dyn ObjectStore>,
    items: Arc<ItemStore>,
    sessions: Arc<SessionStore>,
    limits: IntakeConfig,
}

impl Conversation {
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        media_store: Arc<dyn ObjectStore>,
        items: Arc<ItemStore>,
        sessions: Arc<SessionStore>,
        limits: IntakeConfig,
    ) -> Self {
        Self {
            gateway,
            media_store,
            items,
            sessions,
            limits,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handle one inbound event. Never fails: problems become chat replies.
    pub async fn handle(&self, event: InboundEvent) {
        let user = event.user;
        match event.kind {
            InboundKind::Command(name) => self.on_command(user, &name).await,
            InboundKind::Text(text) => self.on_text(user, &text).await,
            InboundKind::Media {
                kind,
                payload_ref,
                duration_secs,
                size_bytes,
            } => {
                self.on_media(user, kind, &payload_ref, duration_secs, size_bytes)
                    .await
            }
        }
    }

    async fn on_command(&self, user: UserId, name: &str) {
        match name {
            "start" => {
                self.sessions.reset(user).await;
                self.say(user, messages::WELCOME).await;
            }
            "help" => self.say(user, messages::HELP).await,
            "posts" => {
                let items = self.items.list_by_owner(user).await;
                self.say(user, &messages::posts_listing(&items)).await;
            }
            "cancel" => {
                self.sessions.reset(user).await;
                self.say(user, messages::CANCELLED).await;
            }
            other => self.on_text(user, &format!("/{other}")).await,
        }
    }

    async fn on_text(&self, user: UserId, text: &str) {
        match self.sessions.get_or_create(user).await {
            Session::Ready => self.say(user, messages::SEND_MEDIA_FIRST).await,
            Session::AwaitingCaption { media } => {
                self.sessions
                    .set(
                        user,
                        Session::AwaitingSchedule {
                            media,
                            caption: text.trim().to_string(),
                        },
                    )
                    .await;
                self.say(user, &messages::schedule_options()).await;
            }
            Session::AwaitingSchedule { media, caption } => {
                let now = local_now();
                let Some(scheduled_at) = parse_schedule(text, now) else {
                    self.say(user, messages::INVALID_TIME).await;
                    return;
                };
                let kind = media.kind;
                let id = self
                    .items
                    .insert(
                        NewItem {
                            owner: user,
                            media_url: media.url,
                            media_kind: kind,
                            caption,
                            scheduled_at,
                        },
                        now,
                    )
                    .await;
                tracing::info!("User {user} scheduled item {id} for {scheduled_at}");
                self.sessions.reset(user).await;
                self.say(user, &messages::scheduled(kind, scheduled_at)).await;
            }
        }
    }

    async fn on_media(
        &self,
        user: UserId,
        kind: MediaKind,
        payload_ref: &str,
        duration_secs: Option<u32>,
        size_bytes: Option<u64>,
    ) {
        self.say_plain(user, messages::MEDIA_RECEIVED).await;

        let media = match self
            .intake(kind, payload_ref, duration_secs, size_bytes)
            .await
        {
            Ok(media) => media,
            Err(e) => {
                tracing::warn!("Media from {user} rejected: {e}");
                self.say_plain(user, &messages::intake_failed(&e.to_string()))
                    .await;
                return;
            }
        };

        let duration = media.duration_secs;
        self.sessions
            .set(user, Session::AwaitingCaption { media })
            .await;

        match kind {
            MediaKind::Image => {
                if let Err(e) = self
                    .gateway
                    .send_media(user, payload_ref, messages::PHOTO_READY)
                    .await
                {
                    tracing::warn!("Failed to echo photo to {user}: {e}");
                }
            }
            MediaKind::Video => self.say(user, &messages::video_ready(duration)).await,
        }
    }

    async fn intake(
        &self,
        kind: MediaKind,
        payload_ref: &str,
        duration_secs: Option<u32>,
        size_bytes: Option<u64>,
    ) -> Result<UploadedMedia, IntakeError> {
        intake::check_reported(kind, duration_secs, size_bytes, &self.limits)?;
        let payload = self
            .gateway
            .download(payload_ref)
            .await
            .map_err(|e| IntakeError::Download(e.to_string()))?;
        intake::check_payload(kind, &payload, &self.limits)?;
        tracing::info!("⬆️ Uploading {kind} ({} bytes)", payload.len());
        self.media_store
            .upload(payload, kind)
            .await
            .map_err(|e| IntakeError::Upload(e.to_string()))
    }

    async fn say(&self, user: UserId, text: &str) {
        self.send(user, text, true).await;
    }

    /// Replies that embed arbitrary error text go out without markup.
    async fn say_plain(&self, user: UserId, text: &str) {
        self.send(user, text, false).await;
    }

    async fn send(&self, user: UserId, text: &str, formatted: bool) {
        if let Err(e) = self.gateway.reply(user, text, formatted).await {
            tracing::warn!("Failed to reply to {user}: {e}");
        }
    }
}
