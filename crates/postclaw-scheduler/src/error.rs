//! Scheduler error types.

use thiserror::Error;

use crate::tasks::ItemStatus;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduled item {0} not found")]
    ItemNotFound(u64),

    #[error("Item {id}: invalid transition {from} -> {to}")]
    InvalidTransition {
        id: u64,
        from: ItemStatus,
        to: ItemStatus,
    },

    #[error("Dispatch task panicked: {0}")]
    DispatchPanicked(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
