//! Alert severity, alert types and per-round/per-validator state.

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity level, ordered from least to most severe.
///
/// A validator's overall level is always the maximum across all
/// individually-evaluated alert signals.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// Nothing wrong.
    #[default]
    None,
    /// Degraded but not yet dangerous.
    Warning,
    /// Needs operator attention.
    High,
    /// Validator is jailed or tombstoned.
    Critical,
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertLevel::None => write!(f, "NONE"),
            AlertLevel::Warning => write!(f, "WARNING"),
            AlertLevel::High => write!(f, "HIGH"),
            AlertLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl AlertLevel {
    /// Get emoji for the level.
    pub fn emoji(&self) -> &'static str {
        match self {
            AlertLevel::None => "\u{2705}",
            AlertLevel::Warning => "\u{26a0}\u{fe0f}",
            AlertLevel::High => "\u{274c}",
            AlertLevel::Critical => "\u{1f6a8}",
        }
    }

    /// Get embed color for Discord.
    pub fn color(&self) -> u32 {
        match self {
            AlertLevel::None => 0x36a6_4f,     // green
            AlertLevel::Warning => 0xf0ad_4e,  // yellow
            AlertLevel::High => 0xd953_4f,     // red
            AlertLevel::Critical => 0x8000_00, // dark red
        }
    }
}

/// A named alert condition tracked and notified independently.
///
/// The set is closed: configuration values outside it fail to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertType {
    /// Validator is jailed.
    Jailed,
    /// Validator is tombstoned (permanently jailed).
    Tombstoned,
    /// The monitored node is catching up.
    OutOfSync,
    /// Latest block could not be fetched.
    BlockFetch,
    /// Missed blocks within the recent-blocks window.
    MissedRecentBlocks,
    /// Some other RPC query failed.
    GenericRpc,
    /// Chain height is no longer advancing.
    Halt,
    /// Slashing-period uptime below the SLA threshold.
    SlashingSla,
}

/// All alert types in their fixed declaration order.
///
/// Rendered notifications list alerts in this order.
pub const ALERT_TYPES: [AlertType; 8] = [
    AlertType::Jailed,
    AlertType::Tombstoned,
    AlertType::OutOfSync,
    AlertType::BlockFetch,
    AlertType::MissedRecentBlocks,
    AlertType::GenericRpc,
    AlertType::Halt,
    AlertType::SlashingSla,
];

impl AlertType {
    /// Short human-readable label used in cleared-alert lines.
    pub fn label(&self) -> &'static str {
        match self {
            AlertType::Jailed => "jailed",
            AlertType::Tombstoned => "tombstoned",
            AlertType::OutOfSync => "out of sync",
            AlertType::BlockFetch => "block fetch failure",
            AlertType::MissedRecentBlocks => "missed recent blocks",
            AlertType::GenericRpc => "rpc error",
            AlertType::Halt => "chain halt",
            AlertType::SlashingSla => "slashing uptime",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-round sentry failure classification, in increasing precedence.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum SentryAlertType {
    /// Sentry is healthy.
    #[default]
    None,
    /// The status query failed outright.
    GrpcError,
    /// Sentry height lags the chain beyond the configured threshold.
    OutOfSync,
    /// Sentry height stopped advancing while the chain moved on.
    Halt,
}

impl SentryAlertType {
    /// Severity contributed to the validator's overall level.
    pub fn level(&self) -> AlertLevel {
        match self {
            SentryAlertType::None => AlertLevel::None,
            SentryAlertType::GrpcError => AlertLevel::Warning,
            SentryAlertType::OutOfSync | SentryAlertType::Halt => AlertLevel::High,
        }
    }

    /// Short label for alert lines.
    pub fn label(&self) -> &'static str {
        match self {
            SentryAlertType::None => "ok",
            SentryAlertType::GrpcError => "grpc error",
            SentryAlertType::OutOfSync => "out of sync",
            SentryAlertType::Halt => "halted",
        }
    }
}

/// Per-round snapshot of one sentry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentryStats {
    /// Sentry name from configuration.
    pub name: String,
    /// Reported software version, if the query succeeded.
    pub version: Option<String>,
    /// Reported height, if the query succeeded.
    pub height: Option<i64>,
    /// Failure classification for this round.
    pub alert: SentryAlertType,
}

/// Per-round snapshot of one validator. Rebuilt from scratch every poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorStats {
    /// When the round ran.
    pub timestamp: DateTime<Utc>,
    /// Latest known chain height (the previous one when the round failed).
    pub height: i64,
    /// Missed blocks within the recent-blocks window.
    pub recent_missed_blocks: i64,
    /// Running peak of the missed-blocks counter.
    pub recent_missed_blocks_max: i64,
    /// Height of the last block the validator signed.
    pub last_signed_height: i64,
    /// Timestamp of the last signed block.
    pub last_signed_timestamp: Option<DateTime<Utc>>,
    /// Level derived from the missed-blocks band alone.
    pub recent_missed_alert_level: AlertLevel,
    /// Slashing-period uptime percentage, if observable this round.
    pub slashing_uptime: Option<f64>,
    /// Per-sentry snapshots, in configuration order.
    pub sentry_stats: Vec<SentryStats>,
    /// Overall level: maximum across all signals.
    pub alert_level: AlertLevel,
    /// Primary RPC failed this round.
    pub rpc_failure: bool,
}

/// The rolling per-validator memory carried across polling rounds.
///
/// Owned exclusively by one monitoring task; everything else is rebuilt
/// fresh each round.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorAlertState {
    /// Consecutive-notify counters per alert type.
    pub alert_type_counts: HashMap<AlertType, i64>,
    /// Consecutive status-query failures per sentry.
    pub sentry_grpc_error_counts: HashMap<String, i64>,
    /// Consecutive out-of-sync rounds per sentry.
    pub sentry_out_of_sync_counts: HashMap<String, i64>,
    /// Consecutive halted rounds per sentry.
    pub sentry_halt_counts: HashMap<String, i64>,
    /// Last height seen per sentry, for halt detection.
    pub sentry_latest_height: HashMap<String, i64>,
    /// Missed blocks currently inside the window.
    pub recent_missed_blocks: i64,
    /// Running peak of the counter.
    pub recent_missed_blocks_max: i64,
    /// Highest block height processed so far.
    pub latest_block_checked: i64,
    /// Highest block height the validator signed.
    pub latest_block_signed: i64,
    /// Timestamp of the latest signed block.
    pub latest_signed_timestamp: Option<DateTime<Utc>>,
    /// Heights inside the window the validator missed.
    pub missed_heights: VecDeque<i64>,
}

/// Output of one engine evaluation: what changed and how to present it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorAlertNotification {
    /// Newly active or reminder alert lines.
    pub alerts: Vec<String>,
    /// Lines for conditions that just cleared.
    pub cleared_alerts: Vec<String>,
    /// Whether clearing alone should still trigger a notification.
    pub notify_for_clear: bool,
    /// Overall level to render.
    pub alert_level: AlertLevel,
}

impl ValidatorAlertNotification {
    /// True when there is nothing to report.
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty() && self.cleared_alerts.is_empty()
    }
}
