//! Renders engine output and keeps one rolling status message per validator.

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, warn};

use vigil_config::ConfigStore;
use vigil_protocols::{
    AlertLevel, NotificationContent, NotifyError, StatusNotifier, ValidatorAlertNotification,
    ValidatorStats,
};

/// Delivers notifications, editing the persisted status message in place
/// when a handle exists rather than creating duplicates.
pub struct NotificationDispatcher {
    notifier: Arc<dyn StatusNotifier>,
    store: Arc<ConfigStore>,
    mention_user_ids: Vec<String>,
}

impl NotificationDispatcher {
    /// Create a dispatcher over the given transport and config store.
    pub fn new(
        notifier: Arc<dyn StatusNotifier>,
        store: Arc<ConfigStore>,
        mention_user_ids: Vec<String>,
    ) -> Self {
        Self {
            notifier,
            store,
            mention_user_ids,
        }
    }

    /// Deliver one notification for a validator.
    ///
    /// Failures are returned for the caller to log; they never stop the
    /// polling cycle, and the next round retries delivery naturally.
    pub async fn dispatch(
        &self,
        validator: &str,
        chain_id: &str,
        stats: &ValidatorStats,
        notification: &ValidatorAlertNotification,
    ) -> Result<(), NotifyError> {
        let content = render(
            validator,
            chain_id,
            stats,
            notification,
            &self.mention_user_ids,
        );

        match self.store.status_message_id(validator) {
            Some(handle) => match self.notifier.edit(&handle, &content).await {
                Ok(()) => Ok(()),
                Err(NotifyError::MessageNotFound(_)) => {
                    warn!(
                        validator,
                        handle = %handle,
                        "status message vanished, sending a new one"
                    );
                    self.send_new(validator, &content).await
                }
                Err(e) => Err(e),
            },
            None => {
                let clear_only = notification.alerts.is_empty();
                if clear_only && !notification.notify_for_clear {
                    debug!(validator, "clear-only update with no message to edit, skipping");
                    return Ok(());
                }
                self.send_new(validator, &content).await
            }
        }
    }

    async fn send_new(
        &self,
        validator: &str,
        content: &NotificationContent,
    ) -> Result<(), NotifyError> {
        let handle = self.notifier.send(content).await?;
        if let Err(e) = self.store.set_status_message_id(validator, &handle) {
            // The message went out; a lost handle only costs a duplicate
            // next round.
            warn!(validator, "failed to persist status message handle: {e}");
        }
        Ok(())
    }
}

fn render(
    validator: &str,
    chain_id: &str,
    stats: &ValidatorStats,
    notification: &ValidatorAlertNotification,
    mention_user_ids: &[String],
) -> NotificationContent {
    let mut body = String::new();

    let _ = writeln!(body, "chain: {chain_id}");
    let _ = writeln!(body, "height: {}", stats.height);
    if stats.last_signed_height > 0 {
        let _ = writeln!(body, "last signed: {}", stats.last_signed_height);
    }
    if let Some(uptime) = stats.slashing_uptime {
        let _ = writeln!(body, "slashing-period uptime: {uptime:.2}%");
    }
    let _ = writeln!(
        body,
        "recent missed blocks: {} (peak {})",
        stats.recent_missed_blocks, stats.recent_missed_blocks_max
    );
    for sentry in &stats.sentry_stats {
        match sentry.height {
            Some(height) => {
                let _ = writeln!(body, "sentry {}: height {height}", sentry.name);
            }
            None => {
                let _ = writeln!(body, "sentry {}: unreachable", sentry.name);
            }
        }
    }

    if !notification.alerts.is_empty() {
        let _ = writeln!(body, "\nactive alerts:");
        for line in &notification.alerts {
            let _ = writeln!(body, "{} {line}", notification.alert_level.emoji());
        }
    }
    if !notification.cleared_alerts.is_empty() {
        let _ = writeln!(body, "\ncleared:");
        for line in &notification.cleared_alerts {
            let _ = writeln!(body, "{} {line}", AlertLevel::None.emoji());
        }
    }

    let mentions = if notification.alert_level >= AlertLevel::High
        && !notification.alerts.is_empty()
    {
        mention_user_ids.to_vec()
    } else {
        Vec::new()
    };

    NotificationContent {
        title: validator.to_string(),
        body,
        level: notification.alert_level,
        mention_user_ids: mentions,
    }
}
