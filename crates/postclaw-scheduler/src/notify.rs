//! Owner notifications sent while an item is dispatched.
//! Fire-and-forget: a failed send is logged and never affects item state.

use postclaw_core::traits::MessagingGateway;
use postclaw_core::types::truncate_chars;
use postclaw_core::{MediaKind, UserId};

/// Characters of the caption echoed back on success.
const CAPTION_PREVIEW_CHARS: usize = 50;
/// Characters of the error shown to the user; the full text stays on the item.
const ERROR_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    ProcessingStarted { kind: MediaKind },
    Published { kind: MediaKind, caption: String },
    Failed { error: String },
}

impl Notice {
    /// Rendered text and whether it uses Markdown.
    pub fn render(&self) -> (String, bool) {
        match self {
            Notice::ProcessingStarted { kind } => (
                format!(
                    "🔄 Your {} post is being processed...",
                    kind.label().to_lowercase()
                ),
                false,
            ),
            Notice::Published { kind, caption } => (
                format!(
                    "✅ *{} post published!* 🎉\n📝 {}...",
                    kind.label(),
                    escape_markdown(truncate_chars(caption, CAPTION_PREVIEW_CHARS))
                ),
                true,
            ),
            Notice::Failed { error } => (
                format!(
                    "❌ *Post failed!*\nError: {}",
                    escape_markdown(truncate_chars(error, ERROR_PREVIEW_CHARS))
                ),
                true,
            ),
        }
    }
}

/// Send a notice to the item owner.
pub async fn notify_owner(gateway: &dyn MessagingGateway, owner: UserId, notice: Notice) {
    let (text, formatted) = notice.render();
    if let Err(e) = gateway.reply(owner, &text, formatted).await {
        tracing::warn!("⚠️ Failed to notify user {owner}: {e}");
    }
}

/// Escape Telegram MarkdownV1 special characters.
pub fn escape_markdown(s: &str) -> String {
    s.replace('_', "\\_")
        .replace('*', "\\*")
        .replace('[', "\\[")
        .replace('`', "\\`")
}
