//! # PostClaw Gateway
//! Read-only HTTP status surface: landing page, health check, stats API.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
