//! Notification delivery seam.
//!
//! `StatusNotifier` abstracts the transport that carries a rendered status
//! message. Delivery is best-effort: callers log failures and move on.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::AlertLevel;

/// Opaque handle to a previously sent message, persisted so later rounds
/// can edit the same message instead of creating duplicates.
pub type MessageHandle = String;

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Sending a new message failed.
    #[error("send failed: {0}")]
    Send(String),

    /// Editing an existing message failed.
    #[error("edit failed: {0}")]
    Edit(String),

    /// The referenced message no longer exists.
    #[error("message not found: {0}")]
    MessageNotFound(MessageHandle),

    /// The transport rejected the request.
    #[error("transport returned {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },
}

/// A transport-agnostic rendered notification.
#[derive(Debug, Clone)]
pub struct NotificationContent {
    /// Message title, typically the validator name.
    pub title: String,
    /// Message body: stats summary plus alert/cleared lines.
    pub body: String,
    /// Overall level, used for styling.
    pub level: AlertLevel,
    /// User ids to mention when the level warrants a ping.
    pub mention_user_ids: Vec<String>,
}

/// Outbound message delivery.
#[async_trait]
pub trait StatusNotifier: Send + Sync {
    /// Transport name for logging.
    fn name(&self) -> &str;

    /// Send a new message and return its handle.
    async fn send(&self, content: &NotificationContent) -> Result<MessageHandle, NotifyError>;

    /// Edit a previously sent message in place.
    async fn edit(
        &self,
        handle: &MessageHandle,
        content: &NotificationContent,
    ) -> Result<(), NotifyError>;
}
