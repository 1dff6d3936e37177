//! User-facing bot texts.

use chrono::NaiveDateTime;
use postclaw_core::MediaKind;
use postclaw_core::types::truncate_chars;
use postclaw_scheduler::ScheduledItem;
use postclaw_scheduler::notify::escape_markdown;
use postclaw_scheduler::timeparse::QUICK_OPTIONS;

/// Display format for schedule times.
pub const TIME_FORMAT: &str = "%d.%m.%Y %H:%M";
/// Posts shown by `/posts`.
pub const POSTS_SHOWN: usize = 5;

pub const WELCOME: &str = "\
🚀 *Instagram Auto-Post Bot* 🤖

☁️ Photos *and* videos supported

📸 *How it works:*
1. Send a photo or video
2. Write a caption
3. Pick a time
4. Done! It gets posted automatically 🎉

_Note: video posts take a little longer to process._";

pub const HELP: &str = "\
🤖 *Posting videos:*

📹 *Requirements:*
• Max 60 seconds
• MP4 format
• Max 100 MB

⏱️ *Processing time:*
• Upload: 1-2 minutes
• Instagram processing: 2-3 minutes
• Total: ~5 minutes

*Commands:*
/start - Start the bot
/help - Help
/posts - Your scheduled posts
/cancel - Cancel the current submission";

pub const MEDIA_RECEIVED: &str = "📥 Media received! Processing...";
pub const CANCELLED: &str = "❌ Cancelled.";
pub const SEND_MEDIA_FIRST: &str = "📸 Send a photo or video to get started!";
pub const INVALID_TIME: &str = "❌ Invalid time! Examples: `1h` or `tomorrow 09:00`";
pub const NO_POSTS: &str = "📭 You have no scheduled posts yet!";
pub const PHOTO_READY: &str = "📸 *Photo ready!* Write a caption:";

pub fn video_ready(duration_secs: Option<f64>) -> String {
    format!(
        "🎥 *Video ready!* ({:.1}s)\nWrite a caption:",
        duration_secs.unwrap_or(0.0)
    )
}

pub fn intake_failed(reason: &str) -> String {
    format!("❌ Media processing error: {reason}")
}

pub fn schedule_options() -> String {
    let mut text = String::from("⏰ *When should I post it?*\n\n*Quick options:*\n");
    for (keyword, meaning) in QUICK_OPTIONS {
        text.push_str(&format!("• `{keyword}` - {meaning}\n"));
    }
    text.push_str("\nOr send a time like `14:30` or `24.12.2026 18:00`.");
    text
}

pub fn scheduled(kind: MediaKind, at: NaiveDateTime) -> String {
    format!(
        "✅ *{} scheduled!* 🎉\n📅 {}\nYour posts: /posts",
        kind.label(),
        at.format(TIME_FORMAT)
    )
}

/// `/posts` listing: the first few items in store order.
pub fn posts_listing(items: &[ScheduledItem]) -> String {
    if items.is_empty() {
        return NO_POSTS.to_string();
    }
    let mut text = String::from("📋 *Your scheduled posts:*\n\n");
    for item in items.iter().take(POSTS_SHOWN) {
        text.push_str(&format!(
            "{} {} *{}*\n📝 {}...\n",
            item.media_kind.marker(),
            item.status.marker(),
            item.scheduled_at.format(TIME_FORMAT),
            escape_markdown(truncate_chars(&item.caption, 30)),
        ));
        if let Some(error) = &item.error_message {
            text.push_str(&format!("❌ {}\n", escape_markdown(truncate_chars(error, 50))));
        }
        text.push_str("━━━━━━━━━━━━━━━━━━━━\n");
    }
    text
}
