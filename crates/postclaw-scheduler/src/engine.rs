//! Dispatch engine — the loop that finds due items and publishes them.
//!
//! Each sweep claims every due item (Pending → Processing) and hands it to
//! its own tokio task, so one item's remote processing delay never holds up
//! another. A semaphore caps how many publishes run at once.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use futures::FutureExt;
use postclaw_core::config::SchedulerConfig;
use postclaw_core::traits::MessagingGateway;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinHandle;

use crate::error::{Result, SchedulerError};
use crate::notify::{Notice, notify_owner};
use crate::publish::{PublishError, PublishedPost, Publisher};
use crate::store::ItemStore;
use crate::tasks::ScheduledItem;
use crate::timeparse::local_now;

type PublishResult = std::result::Result<PublishedPost, PublishError>;

/// Cooperative shutdown signal shared by the loop and pending timers.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Sending half of [`Shutdown`].
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    /// A signal that never fires.
    pub fn never() -> Shutdown {
        Self::new().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is triggered. Pends forever if the trigger was
    /// dropped without firing.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Drives scheduled items through the publish protocol.
#[derive(Clone)]
pub struct DispatchEngine {
    store: Arc<ItemStore>,
    publisher: Arc<Publisher>,
    gateway: Arc<dyn MessagingGateway>,
    permits: Arc<Semaphore>,
    tick: Duration,
    fault_backoff: Duration,
    shutdown: Shutdown,
}

impl DispatchEngine {
    pub fn new(
        store: Arc<ItemStore>,
        publisher: Arc<Publisher>,
        gateway: Arc<dyn MessagingGateway>,
        config: &SchedulerConfig,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            store,
            publisher,
            gateway,
            permits: Arc::new(Semaphore::new(config.max_concurrent_publishes.max(1))),
            tick: Duration::from_secs(config.tick_secs),
            fault_backoff: Duration::from_secs(config.fault_backoff_secs),
            shutdown,
        }
    }

    /// Claim all items due at `now` and start one dispatch task per item,
    /// in store order. Items inserted afterwards wait for the next sweep.
    pub async fn sweep(&self, now: NaiveDateTime) -> Vec<JoinHandle<()>> {
        let claimed = self.store.claim_due(now).await;
        if !claimed.is_empty() {
            tracing::info!("🔔 {} item(s) due", claimed.len());
        }
        claimed
            .into_iter()
            .map(|item| {
                let engine = self.clone();
                tokio::spawn(async move { engine.dispatch(item).await })
            })
            .collect()
    }

    /// Publish one claimed item and record the outcome. Failure is terminal.
    async fn dispatch(&self, item: ScheduledItem) {
        let Ok(_permit) = self.permits.clone().acquire_owned().await else {
            return;
        };
        let outcome = if self.shutdown.is_cancelled() {
            Err(PublishError::Cancelled)
        } else {
            tracing::info!("🔄 Processing {} item {}", item.media_kind, item.id);
            notify_owner(
                self.gateway.as_ref(),
                item.owner,
                Notice::ProcessingStarted { kind: item.media_kind },
            )
            .await;
            self.publish_guarded(&item).await
        };

        match outcome {
            Ok(post) => {
                if let Err(e) = self.store.mark_completed(item.id, &post, local_now()).await {
                    tracing::error!("❌ Item {} published but not recorded: {e}", item.id);
                }
                tracing::info!("✅ Item {} completed ({})", item.id, post.post_id);
                notify_owner(
                    self.gateway.as_ref(),
                    item.owner,
                    Notice::Published {
                        kind: item.media_kind,
                        caption: item.caption.clone(),
                    },
                )
                .await;
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!("⚠️ Item {} failed: {message}", item.id);
                if let Err(e) = self.store.record_failure(item.id, &message).await {
                    tracing::error!("❌ Could not record failure of item {}: {e}", item.id);
                }
                notify_owner(
                    self.gateway.as_ref(),
                    item.owner,
                    Notice::Failed { error: message },
                )
                .await;
            }
        }
    }

    /// Run the publish protocol; a panicking target counts as a transport failure.
    async fn publish_guarded(&self, item: &ScheduledItem) -> PublishResult {
        let publish = self
            .publisher
            .publish(&item.media_url, &item.caption, item.media_kind);
        AssertUnwindSafe(publish)
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(PublishError::Transport(panic_message(panic.as_ref()))))
    }

    /// Run until shutdown: sweep every tick, back off after a fault.
    pub async fn run(self) {
        tracing::info!("⏰ Dispatch loop started (sweep every {}s)", self.tick.as_secs());
        let mut inflight: Vec<JoinHandle<()>> = Vec::new();

        loop {
            let pause = match reap(&mut inflight).await {
                Ok(()) => {
                    inflight.extend(self.sweep(local_now()).await);
                    self.tick
                }
                Err(e) => {
                    tracing::error!(
                        "❌ Scheduler fault: {e}; backing off {}s",
                        self.fault_backoff.as_secs()
                    );
                    self.fault_backoff
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = self.shutdown.cancelled() => break,
            }
        }

        tracing::info!("Dispatch loop stopping, waiting for {} dispatch(es)", inflight.len());
        for handle in inflight {
            let _ = handle.await;
        }
    }
}

/// Collect finished dispatch tasks; a panicked one is a loop fault.
async fn reap(inflight: &mut Vec<JoinHandle<()>>) -> Result<()> {
    let (finished, running): (Vec<_>, Vec<_>) =
        std::mem::take(inflight).into_iter().partition(|h| h.is_finished());
    *inflight = running;

    let mut fault = None;
    for handle in finished {
        if let Err(e) = handle.await {
            fault.get_or_insert(SchedulerError::DispatchPanicked(e.to_string()));
        }
    }
    fault.map_or(Ok(()), Err)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".into());
    format!("publish target panicked: {detail}")
}
