//! In-memory scheduled item store.
//!
//! Owns every `ScheduledItem`. Callers only ever see snapshots; mutations go
//! through the transition methods, which enforce the lifecycle graph.
//! Nothing is ever evicted.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDateTime;
use postclaw_core::{MediaKind, UserId};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{Result, SchedulerError};
use crate::publish::PublishedPost;
use crate::tasks::{ItemStatus, NewItem, ScheduledItem};

/// Counts exposed by the status surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub images: usize,
    pub videos: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

pub struct ItemStore {
    items: Mutex<Vec<ScheduledItem>>,
    next_id: AtomicU64,
}

impl ItemStore {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Append a new Pending item and return its id.
    pub async fn insert(&self, item: NewItem, created_at: NaiveDateTime) -> u64 {
        let mut items = self.items.lock().await;
        // Allocated under the lock so ids also follow insertion order.
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        tracing::info!("📅 Item {id} scheduled for {} ({})", item.scheduled_at, item.media_kind);
        items.push(ScheduledItem::from_new(id, item, created_at));
        id
    }

    pub async fn get(&self, id: u64) -> Option<ScheduledItem> {
        self.items.lock().await.iter().find(|i| i.id == id).cloned()
    }

    /// Items of one owner, in insertion order.
    pub async fn list_by_owner(&self, owner: UserId) -> Vec<ScheduledItem> {
        self.items
            .lock()
            .await
            .iter()
            .filter(|i| i.owner == owner)
            .cloned()
            .collect()
    }

    /// Pending items whose deadline has passed, in store order.
    pub async fn all_due(&self, now: NaiveDateTime) -> Vec<ScheduledItem> {
        self.items
            .lock()
            .await
            .iter()
            .filter(|i| i.is_due(now))
            .cloned()
            .collect()
    }

    /// Move every due item to Processing in one critical section and return
    /// the claimed snapshots in store order.
    pub async fn claim_due(&self, now: NaiveDateTime) -> Vec<ScheduledItem> {
        let mut items = self.items.lock().await;
        let mut claimed = Vec::new();
        for item in items.iter_mut().filter(|i| i.is_due(now)) {
            item.status = ItemStatus::Processing;
            claimed.push(item.clone());
        }
        claimed
    }

    pub async fn mark_processing(&self, id: u64) -> Result<()> {
        self.transition(id, ItemStatus::Processing, |_| {}).await
    }

    pub async fn mark_completed(
        &self,
        id: u64,
        post: &PublishedPost,
        completed_at: NaiveDateTime,
    ) -> Result<()> {
        self.transition(id, ItemStatus::Completed, |item| {
            item.remote_post_id = Some(post.post_id.clone());
            item.remote_post_type = Some(post.post_type.clone());
            item.completed_at = Some(completed_at);
        })
        .await
    }

    /// Count the attempt, keep the error, and mark the item Failed.
    pub async fn record_failure(&self, id: u64, message: &str) -> Result<()> {
        self.transition(id, ItemStatus::Failed, |item| {
            item.attempts += 1;
            item.error_message = Some(message.to_string());
        })
        .await
    }

    async fn transition<F>(&self, id: u64, to: ItemStatus, apply: F) -> Result<()>
    where
        F: FnOnce(&mut ScheduledItem),
    {
        let mut items = self.items.lock().await;
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(SchedulerError::ItemNotFound(id))?;
        if !item.status.can_transition_to(to) {
            return Err(SchedulerError::InvalidTransition {
                id,
                from: item.status,
                to,
            });
        }
        item.status = to;
        apply(item);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    pub async fn stats(&self) -> StoreStats {
        let items = self.items.lock().await;
        let mut stats = StoreStats {
            total: items.len(),
            ..StoreStats::default()
        };
        for item in items.iter() {
            match item.media_kind {
                MediaKind::Image => stats.images += 1,
                MediaKind::Video => stats.videos += 1,
            }
            match item.status {
                ItemStatus::Pending => stats.pending += 1,
                ItemStatus::Processing => stats.processing += 1,
                ItemStatus::Completed => stats.completed += 1,
                ItemStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn new_item(owner: i64, kind: MediaKind, at: NaiveDateTime) -> NewItem {
        NewItem {
            owner: UserId(owner),
            media_url: "https://cdn.example/m".into(),
            media_kind: kind,
            caption: "caption".into(),
            scheduled_at: at,
        }
    }

    fn post(id: &str) -> PublishedPost {
        PublishedPost {
            post_id: id.into(),
            post_type: "IMAGE".into(),
        }
    }

    #[tokio::test]
    async fn test_ids_strictly_increasing_across_transitions() {
        let store = ItemStore::new();
        let a = store.insert(new_item(1, MediaKind::Image, now()), now()).await;
        store.mark_processing(a).await.unwrap();
        store.mark_completed(a, &post("p1"), now()).await.unwrap();

        let b = store.insert(new_item(1, MediaKind::Image, now()), now()).await;
        store.mark_processing(b).await.unwrap();
        store.record_failure(b, "boom").await.unwrap();

        let c = store.insert(new_item(2, MediaKind::Video, now()), now()).await;
        assert!(a < b && b < c);
        assert_eq!((a, b, c), (1, 2, 3));
    }

    #[tokio::test]
    async fn test_list_by_owner_keeps_insertion_order() {
        let store = ItemStore::new();
        let first = store.insert(new_item(7, MediaKind::Image, now()), now()).await;
        store.insert(new_item(8, MediaKind::Image, now()), now()).await;
        let third = store.insert(new_item(7, MediaKind::Video, now()), now()).await;

        let ids: Vec<u64> = store.list_by_owner(UserId(7)).await.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![first, third]);
        assert!(store.list_by_owner(UserId(99)).await.is_empty());
    }

    #[tokio::test]
    async fn test_all_due_and_claim_due() {
        let store = ItemStore::new();
        let past = store
            .insert(new_item(1, MediaKind::Image, now() - Duration::minutes(1)), now())
            .await;
        let exact = store.insert(new_item(1, MediaKind::Image, now()), now()).await;
        store
            .insert(new_item(1, MediaKind::Image, now() + Duration::minutes(1)), now())
            .await;

        let due: Vec<u64> = store.all_due(now()).await.iter().map(|i| i.id).collect();
        assert_eq!(due, vec![past, exact]);

        let claimed = store.claim_due(now()).await;
        assert_eq!(claimed.len(), 2);
        assert!(claimed.iter().all(|i| i.status == ItemStatus::Processing));
        assert!(store.claim_due(now()).await.is_empty());
        assert_eq!(store.get(past).await.unwrap().status, ItemStatus::Processing);
    }

    #[tokio::test]
    async fn test_invalid_transitions_rejected() {
        let store = ItemStore::new();
        let id = store.insert(new_item(1, MediaKind::Image, now()), now()).await;

        let err = store.mark_completed(id, &post("x"), now()).await.unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidTransition { .. }));

        store.mark_processing(id).await.unwrap();
        store.record_failure(id, "nope").await.unwrap();
        assert!(store.mark_processing(id).await.is_err());
        assert!(store.mark_completed(id, &post("x"), now()).await.is_err());

        let item = store.get(id).await.unwrap();
        assert_eq!(item.status, ItemStatus::Failed);
        assert_eq!(item.attempts, 1);
        assert!(item.outcome_consistent());

        assert!(matches!(
            store.mark_processing(404).await,
            Err(SchedulerError::ItemNotFound(404))
        ));
    }

    #[tokio::test]
    async fn test_stats() {
        let store = ItemStore::new();
        let a = store.insert(new_item(1, MediaKind::Image, now()), now()).await;
        store.insert(new_item(1, MediaKind::Video, now()), now()).await;
        store.insert(new_item(2, MediaKind::Video, now()), now()).await;
        store.mark_processing(a).await.unwrap();
        store.mark_completed(a, &post("p"), now()).await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.images, 1);
        assert_eq!(stats.videos, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.failed, 0);
    }
}
