//! # PostClaw Scheduler
//!
//! Turns a free-text time into a deadline, keeps the pending work items, and
//! drives each due item through the two-phase publish protocol.
//!
//! ## Architecture
//! ```text
//! DispatchEngine (tokio interval, 30s)
//!   ├── ItemStore::claim_due(now)      Pending → Processing
//!   └── per item task (bounded by semaphore)
//!         ├── notify owner: processing
//!         ├── Publisher::publish
//!         │     ├── create container   (60s timeout)
//!         │     ├── processing delay   (15s image / 60s video, cancellable)
//!         │     └── publish container  (30s timeout)
//!         └── Completed | Failed → notify owner
//! ```

pub mod engine;
pub mod error;
pub mod notify;
pub mod publish;
pub mod store;
pub mod tasks;
pub mod timeparse;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{DispatchEngine, Shutdown, ShutdownTrigger};
pub use error::{Result, SchedulerError};
pub use notify::Notice;
pub use publish::{PublishError, PublishedPost, Publisher};
pub use store::{ItemStore, StoreStats};
pub use tasks::{ItemStatus, NewItem, ScheduledItem};
pub use timeparse::{local_now, parse_schedule};
