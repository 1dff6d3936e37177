//! # PostClaw Channels
//! Messaging channel implementations.

pub mod telegram;

pub use telegram::{TelegramChannel, TelegramPollingStream};
