//! Telegram Bot channel — long polling + message sending via Bot API.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::stream::Stream;
use postclaw_core::config::TelegramConfig;
use postclaw_core::error::{PostClawError, Result};
use postclaw_core::traits::MessagingGateway;
use postclaw_core::{InboundEvent, MediaKind, UserId};
use serde::{Deserialize, Serialize};

/// Commands the bot understands. Anything else starting with `/` is text.
pub const COMMANDS: &[&str] = &["start", "help", "posts", "cancel"];

/// Server-side long poll wait, in seconds.
const LONG_POLL_SECS: u64 = 30;

/// Telegram Bot channel with polling loop.
pub struct TelegramChannel {
    config: TelegramConfig,
    client: reqwest::Client,
    last_update_id: AtomicI64,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            last_update_id: AtomicI64::new(0),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base, self.config.bot_token, method
        )
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.config.api_base, self.config.bot_token, file_path
        )
    }

    /// Get updates using long polling.
    pub async fn get_updates(&self) -> Result<Vec<TelegramUpdate>> {
        let offset = self.last_update_id.load(Ordering::SeqCst) + 1;
        let response = self
            .client
            .get(self.api_url("getUpdates"))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", LONG_POLL_SECS.to_string()),
                ("allowed_updates", "[\"message\"]".into()),
            ])
            .send()
            .await
            .map_err(|e| PostClawError::Channel(format!("Telegram getUpdates failed: {e}")))?;

        let body: TelegramApiResponse<Vec<TelegramUpdate>> = response
            .json()
            .await
            .map_err(|e| PostClawError::Channel(format!("Invalid Telegram response: {e}")))?;

        let updates = body.into_result("getUpdates")?;
        if let Some(last) = updates.last() {
            self.last_update_id.store(last.update_id, Ordering::SeqCst);
        }
        Ok(updates)
    }

    /// Send a text message.
    pub async fn send_message(&self, chat_id: i64, text: &str, markdown: bool) -> Result<()> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if markdown {
            body["parse_mode"] = "Markdown".into();
        }
        self.call::<serde_json::Value>("sendMessage", &body).await?;
        Ok(())
    }

    /// Re-send an already uploaded photo by its file id.
    pub async fn send_photo(&self, chat_id: i64, file_id: &str, caption: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "photo": file_id,
            "caption": caption,
            "parse_mode": "Markdown",
        });
        self.call::<serde_json::Value>("sendPhoto", &body).await?;
        Ok(())
    }

    /// Resolve a file id to its server-side path.
    pub async fn get_file(&self, file_id: &str) -> Result<TelegramFile> {
        let body = serde_json::json!({ "file_id": file_id });
        self.call("getFile", &body).await
    }

    /// Get bot info.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        self.call("getMe", &serde_json::json!({})).await
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| PostClawError::Channel(format!("{method} failed: {e}")))?;

        let result: TelegramApiResponse<T> = response
            .json()
            .await
            .map_err(|e| PostClawError::Channel(format!("Invalid {method} response: {e}")))?;
        result.into_result(method)
    }

    /// Start polling loop — returns a stream of inbound events.
    ///
    /// The loop ends once the stream is dropped.
    pub fn start_polling(self: Arc<Self>) -> TelegramPollingStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let channel = self;
            tracing::info!("Telegram polling loop started");

            loop {
                match channel.get_updates().await {
                    Ok(updates) => {
                        for update in updates {
                            if let Some(event) = update.to_event()
                                && tx.send(event).is_err()
                            {
                                tracing::info!("Telegram polling stopped (receiver dropped)");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Telegram polling error: {e}");
                        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
                    }
                }

                if tx.is_closed() {
                    tracing::info!("Telegram polling stopped (receiver dropped)");
                    return;
                }
                tokio::time::sleep(tokio::time::Duration::from_secs(
                    channel.config.poll_interval_secs,
                ))
                .await;
            }
        });

        TelegramPollingStream { rx }
    }
}

/// Stream of inbound events from polling.
pub struct TelegramPollingStream {
    rx: tokio::sync::mpsc::UnboundedReceiver<InboundEvent>,
}

impl Stream for TelegramPollingStream {
    type Item = InboundEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Unpin for TelegramPollingStream {}

#[async_trait]
impl MessagingGateway for TelegramChannel {
    async fn reply(&self, user: UserId, text: &str, formatted: bool) -> Result<()> {
        self.send_message(user.0, text, formatted).await
    }

    async fn send_media(&self, user: UserId, payload_ref: &str, caption: &str) -> Result<()> {
        self.send_photo(user.0, payload_ref, caption).await
    }

    async fn download(&self, payload_ref: &str) -> Result<Vec<u8>> {
        let file = self.get_file(payload_ref).await?;
        let path = file
            .file_path
            .ok_or_else(|| PostClawError::Channel(format!("No file path for {payload_ref}")))?;

        let response = self
            .client
            .get(self.file_url(&path))
            .send()
            .await
            .map_err(|e| PostClawError::Channel(format!("File download failed: {e}")))?;
        if !response.status().is_success() {
            return Err(PostClawError::Channel(format!(
                "File download failed: HTTP {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PostClawError::Channel(format!("File download failed: {e}")))?;
        tracing::debug!("Downloaded {} bytes for {payload_ref}", bytes.len());
        Ok(bytes.to_vec())
    }
}

// --- Telegram API Types ---

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

impl<T> TelegramApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T> {
        if !self.ok {
            return Err(PostClawError::Channel(format!(
                "Telegram {method} error: {}",
                self.description.unwrap_or_default()
            )));
        }
        self.result
            .ok_or_else(|| PostClawError::Channel(format!("Telegram {method}: empty result")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    pub text: Option<String>,
    #[serde(default)]
    pub photo: Vec<TelegramPhotoSize>,
    pub video: Option<TelegramVideo>,
    pub date: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramPhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramVideo {
    pub file_id: String,
    pub duration: u32,
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramFile {
    pub file_id: String,
    pub file_path: Option<String>,
    pub file_size: Option<u64>,
}

impl TelegramUpdate {
    /// Convert to a PostClaw inbound event.
    pub fn to_event(&self) -> Option<InboundEvent> {
        let msg = self.message.as_ref()?;
        let from = msg.from.as_ref()?;

        // Skip bot messages
        if from.is_bot {
            return None;
        }
        let user = UserId(from.id);

        if let Some(video) = &msg.video {
            return Some(InboundEvent::media(
                user,
                MediaKind::Video,
                &video.file_id,
                Some(video.duration),
                video.file_size,
            ));
        }

        if let Some(photo) = msg
            .photo
            .iter()
            .max_by_key(|p| u64::from(p.width) * u64::from(p.height))
        {
            return Some(InboundEvent::media(
                user,
                MediaKind::Image,
                &photo.file_id,
                None,
                photo.file_size,
            ));
        }

        let text = msg.text.as_deref()?;
        match parse_command(text) {
            Some(name) => Some(InboundEvent::command(user, name)),
            None => Some(InboundEvent::text(user, text)),
        }
    }
}

/// `/posts@my_bot extra` → `posts`, for registered commands only.
pub fn parse_command(text: &str) -> Option<&str> {
    let word = text.split_whitespace().next()?.strip_prefix('/')?;
    let name = word.split_once('@').map_or(word, |(name, _)| name);
    COMMANDS.iter().copied().find(|c| *c == name)
}
