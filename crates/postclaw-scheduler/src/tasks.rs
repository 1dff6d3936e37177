//! Scheduled item definitions — the core data model for pending publishes.

use chrono::NaiveDateTime;
use postclaw_core::{MediaKind, UserId};
use serde::{Deserialize, Serialize};

/// One accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledItem {
    /// Store-assigned, strictly increasing.
    pub id: u64,
    pub owner: UserId,
    pub media_url: String,
    pub media_kind: MediaKind,
    pub caption: String,
    /// Target dispatch time.
    pub scheduled_at: NaiveDateTime,
    pub status: ItemStatus,
    /// Publish attempts made so far.
    pub attempts: u32,
    /// Last failure detail. Set only when Failed.
    pub error_message: Option<String>,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    /// Set only when Completed.
    pub remote_post_id: Option<String>,
    pub remote_post_type: Option<String>,
}

/// Item lifecycle: Pending → Processing → {Completed | Failed}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ItemStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Failed)
    }

    /// Whether `self → next` is an edge of the lifecycle graph.
    pub fn can_transition_to(&self, next: ItemStatus) -> bool {
        matches!(
            (self, next),
            (ItemStatus::Pending, ItemStatus::Processing)
                | (ItemStatus::Processing, ItemStatus::Completed)
                | (ItemStatus::Processing, ItemStatus::Failed)
        )
    }

    /// Glyph used in post listings.
    pub fn marker(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "⏳",
            ItemStatus::Processing => "🔄",
            ItemStatus::Completed => "✅",
            ItemStatus::Failed => "❌",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Pending => write!(f, "pending"),
            ItemStatus::Processing => write!(f, "processing"),
            ItemStatus::Completed => write!(f, "completed"),
            ItemStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Everything needed to create an item; the store assigns the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub owner: UserId,
    pub media_url: String,
    pub media_kind: MediaKind,
    pub caption: String,
    pub scheduled_at: NaiveDateTime,
}

impl ScheduledItem {
    pub(crate) fn from_new(id: u64, item: NewItem, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            owner: item.owner,
            media_url: item.media_url,
            media_kind: item.media_kind,
            caption: item.caption,
            scheduled_at: item.scheduled_at,
            status: ItemStatus::Pending,
            attempts: 0,
            error_message: None,
            created_at,
            completed_at: None,
            remote_post_id: None,
            remote_post_type: None,
        }
    }

    /// Pending and past its deadline.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.status == ItemStatus::Pending && self.scheduled_at <= now
    }

    /// Exactly one of: Completed with a post id, Failed with an error,
    /// Pending/Processing with neither.
    pub fn outcome_consistent(&self) -> bool {
        match self.status {
            ItemStatus::Completed => self.remote_post_id.is_some() && self.error_message.is_none(),
            ItemStatus::Failed => self.error_message.is_some() && self.remote_post_id.is_none(),
            ItemStatus::Pending | ItemStatus::Processing => {
                self.error_message.is_none() && self.remote_post_id.is_none()
            }
        }
    }
}
