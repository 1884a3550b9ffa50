//! Tracing-only notifier, used when no transport is configured.

use async_trait::async_trait;
use tracing::{error, info, warn};

use vigil_protocols::{AlertLevel, MessageHandle, NotificationContent, NotifyError, StatusNotifier};

/// Writes notifications to the log instead of an external service.
pub struct LogNotifier;

#[async_trait]
impl StatusNotifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, content: &NotificationContent) -> Result<MessageHandle, NotifyError> {
        log_content(content);
        Ok("log".to_string())
    }

    async fn edit(
        &self,
        _handle: &MessageHandle,
        content: &NotificationContent,
    ) -> Result<(), NotifyError> {
        log_content(content);
        Ok(())
    }
}

fn log_content(content: &NotificationContent) {
    match content.level {
        AlertLevel::None => info!("[STATUS] {}: {}", content.title, content.body),
        AlertLevel::Warning => warn!("[STATUS] {}: {}", content.title, content.body),
        AlertLevel::High | AlertLevel::Critical => {
            error!("[STATUS] {}: {}", content.title, content.body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_returns_fixed_handle() {
        let notifier = LogNotifier;
        let content = NotificationContent {
            title: "validator".to_string(),
            body: "all good".to_string(),
            level: AlertLevel::None,
            mention_user_ids: vec![],
        };
        assert_eq!(notifier.send(&content).await.unwrap(), "log");
        notifier.edit(&"log".to_string(), &content).await.unwrap();
    }
}
