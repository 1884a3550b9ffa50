//! Persisted configuration schema.
//!
//! Field names follow the YAML file's kebab-case keys. Tunable thresholds
//! are `Option` so that "unset, apply default" is distinguishable from an
//! explicit zero; they are resolved once at load time (see
//! [`crate::defaults`]) and the engine never sees an `Option`.

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

use serde::{Deserialize, Serialize};

use vigil_protocols::AlertType;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VigilConfig {
    /// Alert filtering.
    #[serde(default)]
    pub alerts: AlertsConfig,

    /// Outbound notification transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationsConfig>,

    /// Validators to monitor.
    #[serde(default)]
    pub validators: Vec<ValidatorMonitor>,
}

/// Alert filtering configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AlertsConfig {
    /// Alert types that never trigger notifications.
    ///
    /// Values outside the closed [`AlertType`] set reject the whole load.
    #[serde(default)]
    pub ignore_alerts: Vec<AlertType>,
}

impl AlertsConfig {
    /// Whether the given alert type participates in notifications.
    pub fn alert_active(&self, alert: AlertType) -> bool {
        !self.ignore_alerts.contains(&alert)
    }
}

/// Notification transport selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NotificationsConfig {
    /// Transport name, currently `discord`.
    pub service: String,

    /// Discord webhook settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord: Option<DiscordChannelConfig>,
}

/// Discord webhook identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DiscordWebhookConfig {
    /// Webhook id.
    pub id: String,
    /// Webhook token.
    pub token: String,
}

/// Discord channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DiscordChannelConfig {
    /// Webhook to post through.
    pub webhook: DiscordWebhookConfig,

    /// User ids mentioned on high/critical alerts.
    #[serde(default)]
    pub alert_user_ids: Vec<String>,

    /// Username override for posted messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// An auxiliary full node monitored alongside its validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Sentry {
    /// Name, used as the key for per-sentry state.
    pub name: String,
    /// Status endpoint address.
    pub grpc: String,
}

/// One monitored validator with its tunable thresholds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ValidatorMonitor {
    /// Display name.
    pub name: String,

    /// Primary RPC endpoint.
    pub rpc: String,

    /// Chain id, included in rendered notifications.
    pub chain_id: String,

    /// Validator consensus address as it appears in block commit
    /// signatures, upper-case hex.
    pub address: String,

    /// The monitored node is itself a full node whose sync state matters.
    #[serde(default)]
    pub fullnode: bool,

    /// Handle of the rolling Discord status message, written back by the
    /// dispatcher after the first send.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord_status_message_id: Option<String>,

    /// Attempts per RPC call before the call counts as failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_retries: Option<u32>,

    /// Slashing-period uptime percentage below which a warning fires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slashing_warn_threshold: Option<f64>,

    /// Slashing-period uptime percentage below which a high alert fires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slashing_error_threshold: Option<f64>,

    /// Sliding-window size in blocks for recent-miss tracking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_blocks_to_check: Option<i64>,

    /// Rounds between reminder notifications for a continuing alert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_every: Option<i64>,

    /// Recent misses at which the missed-blocks alert starts firing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missed_blocks_notify_threshold: Option<i64>,

    /// Upper bound of the green band (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missed_blocks_green_to: Option<i64>,

    /// Lower bound of the yellow band (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missed_blocks_yellow_from: Option<i64>,

    /// Upper bound of the yellow band (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missed_blocks_yellow_to: Option<i64>,

    /// Lower bound of the red band (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missed_blocks_red_from: Option<i64>,

    /// Consecutive status-query failures before a sentry alert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentry_grpc_error_threshold: Option<i64>,

    /// Consecutive out-of-sync rounds before a sentry alert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentry_out_of_sync_threshold: Option<i64>,

    /// Consecutive halted rounds before a sentry alert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentry_halt_threshold: Option<i64>,

    /// Height lag beyond which a sentry counts as out of sync.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentry_out_of_sync_blocks_threshold: Option<i64>,

    /// Sentries relaying for this validator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentries: Option<Vec<Sentry>>,
}

impl ValidatorMonitor {
    /// Sentries as a slice, empty when unconfigured.
    pub fn sentries(&self) -> &[Sentry] {
        self.sentries.as_deref().unwrap_or_default()
    }
}
