//! The per-validator alert state machine.
//!
//! One `evaluate` call consumes the latest probe round plus the prior
//! persistent state and produces fresh stats and, when anything changed,
//! a notification. The engine never fails: unobservable conditions leave
//! their counters untouched ("unknown", not "healthy"), and malformed
//! band configuration degrades to level none.

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

use std::collections::HashMap;

use tracing::warn;

use vigil_chain::ProbeRound;
use vigil_config::{AlertsConfig, ResolvedThresholds, ValidatorMonitor};
use vigil_protocols::{
    ALERT_TYPES, AlertLevel, AlertType, SentryAlertType, ValidatorAlertNotification,
    ValidatorAlertState, ValidatorStats,
};

use crate::sentries::{SentryHealthTracker, SentryRound};
use crate::window;

/// Alert state machine for one validator.
pub struct AlertEngine {
    validator: String,
    thresholds: ResolvedThresholds,
    alerts: AlertsConfig,
    tracker: SentryHealthTracker,
    warned_band_gap: bool,
}

impl AlertEngine {
    /// Build an engine from a validator's configuration.
    pub fn new(
        monitor: &ValidatorMonitor,
        thresholds: ResolvedThresholds,
        alerts: AlertsConfig,
    ) -> Self {
        Self {
            validator: monitor.name.clone(),
            tracker: SentryHealthTracker::new(&thresholds),
            thresholds,
            alerts,
            warned_band_gap: false,
        }
    }

    /// Fold one probe round into the state and derive the outcome.
    pub fn evaluate(
        &mut self,
        state: &mut ValidatorAlertState,
        round: &ProbeRound,
    ) -> (ValidatorStats, Option<ValidatorAlertNotification>) {
        let chain_height = round.block.as_ref().map(|b| b.height);
        let chain_advanced = chain_height
            .is_some_and(|h| state.latest_block_checked > 0 && h > state.latest_block_checked);
        let chain_halted = chain_height
            .is_some_and(|h| state.latest_block_checked > 0 && h == state.latest_block_checked);

        // Sentries observe against the previous round's chain height, so
        // they run before the window update advances it.
        let sentry_rounds: Vec<SentryRound> = round
            .sentries
            .iter()
            .map(|probe| {
                self.tracker
                    .observe(state, chain_height, chain_advanced, probe)
            })
            .collect();

        if let Some(block) = &round.block {
            window::record_block(
                state,
                self.thresholds.recent_blocks_to_check,
                block.height,
                round.signed_latest,
                block.time,
            );
        }

        let band_level = self.missed_blocks_level(state.recent_missed_blocks);
        let active = self.active_alerts(state, round, chain_halted, chain_height);

        let mut alerts = Vec::new();
        let mut cleared = Vec::new();
        let mut notify_for_clear = false;
        let notify_every = self.thresholds.notify_every.max(1);

        for ty in ALERT_TYPES {
            if !observable(ty, round) {
                continue;
            }
            let ignored = !self.alerts.alert_active(ty);
            let count = state.alert_type_counts.get(&ty).copied().unwrap_or(0);

            match active.get(&ty) {
                Some(message) => {
                    let next = count + 1;
                    state.alert_type_counts.insert(ty, next);
                    let due = count == 0 || next % notify_every == 0;
                    if due && !ignored {
                        alerts.push(message.clone());
                    }
                }
                None if count > 0 => {
                    state.alert_type_counts.insert(ty, 0);
                    if !ignored {
                        cleared.push(format!("{} resolved", ty.label()));
                        if self.type_severity(ty, band_level, round.slashing_uptime)
                            >= AlertLevel::High
                        {
                            notify_for_clear = true;
                        }
                    }
                }
                None => {}
            }
        }

        for sentry in &sentry_rounds {
            if (sentry.newly_alerting || sentry.reminder_due)
                && self.sentry_gate(sentry.stats.alert)
            {
                alerts.push(sentry_line(sentry, chain_height));
            }
            for kind in &sentry.cleared {
                if self.sentry_gate(*kind) {
                    cleared.push(format!(
                        "sentry {}: {} resolved",
                        sentry.stats.name,
                        kind.label()
                    ));
                    if kind.level() >= AlertLevel::High {
                        notify_for_clear = true;
                    }
                }
            }
        }

        let mut level = band_level;
        for ty in active.keys() {
            level = level.max(self.type_severity(*ty, band_level, round.slashing_uptime));
        }
        for sentry in &sentry_rounds {
            level = level.max(sentry.stats.alert.level());
        }

        let stats = ValidatorStats {
            timestamp: round.timestamp,
            height: state.latest_block_checked,
            recent_missed_blocks: state.recent_missed_blocks,
            recent_missed_blocks_max: state.recent_missed_blocks_max,
            last_signed_height: state.latest_block_signed,
            last_signed_timestamp: state.latest_signed_timestamp,
            recent_missed_alert_level: band_level,
            slashing_uptime: round.slashing_uptime,
            sentry_stats: sentry_rounds.into_iter().map(|r| r.stats).collect(),
            alert_level: level,
            rpc_failure: round.failed(),
        };

        let notification = if alerts.is_empty() && cleared.is_empty() {
            None
        } else {
            Some(ValidatorAlertNotification {
                alerts,
                cleared_alerts: cleared,
                notify_for_clear,
                alert_level: level,
            })
        };

        (stats, notification)
    }

    /// Band lookup for a missed-block count. Gaps between bands resolve to
    /// `none` with a one-time warning instead of failing the round.
    fn missed_blocks_level(&mut self, count: i64) -> AlertLevel {
        let t = &self.thresholds;
        if count >= t.missed_blocks_red_from {
            AlertLevel::High
        } else if count >= t.missed_blocks_yellow_from && count <= t.missed_blocks_yellow_to {
            AlertLevel::Warning
        } else if count <= t.missed_blocks_green_to {
            AlertLevel::None
        } else {
            if !self.warned_band_gap {
                warn!(
                    validator = %self.validator,
                    count, "missed-block count falls between bands, treating as none"
                );
                self.warned_band_gap = true;
            }
            AlertLevel::None
        }
    }

    fn active_alerts(
        &self,
        state: &ValidatorAlertState,
        round: &ProbeRound,
        chain_halted: bool,
        chain_height: Option<i64>,
    ) -> HashMap<AlertType, String> {
        let t = &self.thresholds;
        let mut active = HashMap::new();

        if let Some(err) = &round.block_fetch_error {
            active.insert(
                AlertType::BlockFetch,
                format!("unable to fetch latest block: {err}"),
            );
        }
        if !round.rpc_errors.is_empty() {
            active.insert(AlertType::GenericRpc, round.rpc_errors.join("; "));
        }
        if let Some(signing) = &round.signing {
            if signing.jailed {
                active.insert(AlertType::Jailed, "validator is jailed".to_string());
            }
            if signing.tombstoned {
                active.insert(AlertType::Tombstoned, "validator is tombstoned".to_string());
            }
        }
        if round.own_node_syncing == Some(true) {
            active.insert(AlertType::OutOfSync, "node is catching up".to_string());
        }
        if chain_halted {
            active.insert(
                AlertType::Halt,
                format!(
                    "chain appears halted at height {}",
                    chain_height.unwrap_or(state.latest_block_checked)
                ),
            );
        }
        if round.block.is_some()
            && state.recent_missed_blocks >= t.missed_blocks_notify_threshold
        {
            active.insert(
                AlertType::MissedRecentBlocks,
                format!(
                    "missed {} of the last {} blocks (peak {})",
                    state.recent_missed_blocks,
                    t.recent_blocks_to_check,
                    state.recent_missed_blocks_max
                ),
            );
        }
        if let Some(uptime) = round.slashing_uptime {
            if uptime < t.slashing_error_threshold {
                active.insert(
                    AlertType::SlashingSla,
                    format!(
                        "slashing-period uptime {uptime:.2}% below error threshold {:.2}%",
                        t.slashing_error_threshold
                    ),
                );
            } else if uptime < t.slashing_warn_threshold {
                active.insert(
                    AlertType::SlashingSla,
                    format!(
                        "slashing-period uptime {uptime:.2}% below warning threshold {:.2}%",
                        t.slashing_warn_threshold
                    ),
                );
            }
        }

        active
    }

    fn type_severity(
        &self,
        ty: AlertType,
        band_level: AlertLevel,
        uptime: Option<f64>,
    ) -> AlertLevel {
        match ty {
            AlertType::Jailed | AlertType::Tombstoned => AlertLevel::Critical,
            AlertType::OutOfSync
            | AlertType::BlockFetch
            | AlertType::GenericRpc
            | AlertType::Halt => AlertLevel::High,
            AlertType::MissedRecentBlocks => band_level,
            AlertType::SlashingSla => {
                if uptime.is_some_and(|u| u < self.thresholds.slashing_error_threshold) {
                    AlertLevel::High
                } else {
                    AlertLevel::Warning
                }
            }
        }
    }

    // Sentry alert kinds are filtered through the matching validator-level
    // ignore entry.
    fn sentry_gate(&self, kind: SentryAlertType) -> bool {
        match kind {
            SentryAlertType::GrpcError => self.alerts.alert_active(AlertType::GenericRpc),
            SentryAlertType::OutOfSync => self.alerts.alert_active(AlertType::OutOfSync),
            SentryAlertType::Halt => self.alerts.alert_active(AlertType::Halt),
            SentryAlertType::None => false,
        }
    }
}

/// Whether a condition could be judged at all this round. Unobservable
/// conditions keep their counters untouched rather than clearing.
fn observable(ty: AlertType, round: &ProbeRound) -> bool {
    match ty {
        AlertType::BlockFetch | AlertType::GenericRpc => true,
        AlertType::Jailed | AlertType::Tombstoned => round.signing.is_some(),
        AlertType::SlashingSla => round.slashing_uptime.is_some(),
        AlertType::MissedRecentBlocks | AlertType::Halt => round.block.is_some(),
        AlertType::OutOfSync => round.own_node_syncing.is_some(),
    }
}

fn sentry_line(sentry: &SentryRound, chain_height: Option<i64>) -> String {
    let name = &sentry.stats.name;
    match sentry.stats.alert {
        SentryAlertType::Halt => format!(
            "sentry {name}: halted at height {}",
            sentry.stats.height.unwrap_or(0)
        ),
        SentryAlertType::OutOfSync => match (sentry.stats.height, chain_height) {
            (Some(height), Some(chain)) => {
                format!("sentry {name}: out of sync (height {height}, chain {chain})")
            }
            _ => format!("sentry {name}: out of sync"),
        },
        SentryAlertType::GrpcError => format!(
            "sentry {name}: status query failing ({})",
            sentry.error.as_deref().unwrap_or("unknown error")
        ),
        SentryAlertType::None => format!("sentry {name}: ok"),
    }
}
