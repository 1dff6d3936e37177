//! # PostClaw Core
//!
//! Shared vocabulary for the PostClaw workspace: configuration, the error
//! type, media/user types, and the collaborator traits every other crate
//! plugs into.
//!
//! ```text
//! MessagingGateway ──► conversation (postclaw-bot) ──► ItemStore
//!        ▲                    │                           │
//!        │                    ▼                           ▼
//!        └──── notifications ◄── DispatchEngine ──► PublishTarget
//!                                                  ObjectStore (intake)
//! ```

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{PostClawError, Result};
pub use types::{InboundEvent, InboundKind, MediaKind, UploadedMedia, UserId};
