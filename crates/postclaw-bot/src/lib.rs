//! # PostClaw Bot
//!
//! Per-user conversation flow: media → caption → schedule.
//!
//! ```text
//! Ready ──media ok──► AwaitingCaption ──text──► AwaitingSchedule ──valid time──► Ready
//!   ▲                        │                        │  └─invalid time─┐
//!   └──── /start, /cancel ◄──┴────────────────────────┘ ◄───────────────┘ (stays)
//! ```

pub mod handler;
pub mod intake;
pub mod messages;
pub mod session;

pub use handler::Conversation;
pub use intake::IntakeError;
pub use session::{Session, SessionState, SessionStore};
