//! # Vigil Notify
//!
//! Outbound notification delivery.
//!
//! ## Features
//!
//! - `DiscordNotifier`: webhook transport with in-place message editing
//! - `LogNotifier`: tracing-only fallback when no transport is configured
//! - `NotificationDispatcher`: renders engine output into a status message
//!   and keeps one rolling message per validator

pub mod discord;
pub mod dispatcher;
pub mod log;

pub use discord::{DiscordConfig, DiscordNotifier};
pub use dispatcher::NotificationDispatcher;
pub use log::LogNotifier;
