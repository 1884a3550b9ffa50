//! Per-sentry consecutive-failure streak tracking.

#[cfg(test)]
#[path = "sentries_tests.rs"]
mod tests;

use vigil_chain::SentryProbe;
use vigil_config::ResolvedThresholds;
use vigil_protocols::{SentryAlertType, SentryStats, ValidatorAlertState};

/// One sentry's outcome for the round, beyond the raw stats.
#[derive(Debug)]
pub struct SentryRound {
    /// Snapshot for this round.
    pub stats: SentryStats,
    /// The round's failure streak just crossed its notify threshold.
    pub newly_alerting: bool,
    /// The streak continues and a periodic reminder is due.
    pub reminder_due: bool,
    /// Failure kinds that were alerting and recovered this round.
    pub cleared: Vec<SentryAlertType>,
    /// Error text when the status query failed.
    pub error: Option<String>,
}

/// Classifies each sentry round and maintains its failure streaks.
///
/// A round is exactly one of {ok, grpc-error, out-of-sync, halted}, with
/// halted taking priority over out-of-sync, which takes priority over
/// grpc-error. An ok round resets every streak; a failure round increments
/// only its own streak.
pub struct SentryHealthTracker {
    grpc_error_threshold: i64,
    out_of_sync_threshold: i64,
    halt_threshold: i64,
    lag_blocks: i64,
    notify_every: i64,
}

impl SentryHealthTracker {
    /// Build a tracker from a validator's resolved thresholds.
    pub fn new(thresholds: &ResolvedThresholds) -> Self {
        Self {
            grpc_error_threshold: thresholds.sentry_grpc_error_threshold,
            out_of_sync_threshold: thresholds.sentry_out_of_sync_threshold,
            halt_threshold: thresholds.sentry_halt_threshold,
            lag_blocks: thresholds.sentry_out_of_sync_blocks_threshold,
            notify_every: thresholds.notify_every.max(1),
        }
    }

    /// Classify one sentry's round and update its streaks in `state`.
    ///
    /// `chain_height` is the validator's latest observed height, when the
    /// round observed one; `chain_advanced` is whether that height moved
    /// past the previous round's.
    pub fn observe(
        &self,
        state: &mut ValidatorAlertState,
        chain_height: Option<i64>,
        chain_advanced: bool,
        probe: &SentryProbe,
    ) -> SentryRound {
        let name = &probe.name;
        let previously_alerting = self.alerting_kinds(state, name);

        let mut version = None;
        let mut height = None;
        let mut error = None;

        let classification = match &probe.status {
            Err(e) => {
                error = Some(e.to_string());
                bump(&mut state.sentry_grpc_error_counts, name);
                SentryAlertType::GrpcError
            }
            Ok(status) => {
                let previous_height = state.sentry_latest_height.get(name).copied();
                let halted =
                    previous_height == Some(status.height) && chain_advanced;
                let lagging = status.syncing
                    || chain_height.is_some_and(|h| h - status.height > self.lag_blocks);

                state
                    .sentry_latest_height
                    .insert(name.clone(), status.height);
                version = Some(status.version.clone());
                height = Some(status.height);

                if halted {
                    bump(&mut state.sentry_halt_counts, name);
                    SentryAlertType::Halt
                } else if lagging {
                    bump(&mut state.sentry_out_of_sync_counts, name);
                    SentryAlertType::OutOfSync
                } else {
                    state.sentry_grpc_error_counts.insert(name.clone(), 0);
                    state.sentry_out_of_sync_counts.insert(name.clone(), 0);
                    state.sentry_halt_counts.insert(name.clone(), 0);
                    SentryAlertType::None
                }
            }
        };

        let streak = self.streak(state, name, classification);
        let threshold = self.threshold(classification);
        let alerting = classification != SentryAlertType::None && streak >= threshold;

        let cleared = if classification == SentryAlertType::None {
            previously_alerting
        } else {
            Vec::new()
        };

        SentryRound {
            stats: SentryStats {
                name: name.clone(),
                version,
                height,
                alert: if alerting {
                    classification
                } else {
                    SentryAlertType::None
                },
            },
            newly_alerting: alerting && streak == threshold,
            reminder_due: alerting && streak > threshold && streak % self.notify_every == 0,
            cleared,
            error,
        }
    }

    fn threshold(&self, kind: SentryAlertType) -> i64 {
        match kind {
            SentryAlertType::GrpcError => self.grpc_error_threshold,
            SentryAlertType::OutOfSync => self.out_of_sync_threshold,
            SentryAlertType::Halt => self.halt_threshold,
            SentryAlertType::None => i64::MAX,
        }
    }

    fn streak(&self, state: &ValidatorAlertState, name: &str, kind: SentryAlertType) -> i64 {
        let counts = match kind {
            SentryAlertType::GrpcError => &state.sentry_grpc_error_counts,
            SentryAlertType::OutOfSync => &state.sentry_out_of_sync_counts,
            SentryAlertType::Halt => &state.sentry_halt_counts,
            SentryAlertType::None => return 0,
        };
        counts.get(name).copied().unwrap_or(0)
    }

    fn alerting_kinds(&self, state: &ValidatorAlertState, name: &str) -> Vec<SentryAlertType> {
        [
            SentryAlertType::GrpcError,
            SentryAlertType::OutOfSync,
            SentryAlertType::Halt,
        ]
        .into_iter()
        .filter(|kind| self.streak(state, name, *kind) >= self.threshold(*kind))
        .collect()
    }
}

fn bump(counts: &mut std::collections::HashMap<String, i64>, name: &str) {
    *counts.entry(name.to_string()).or_insert(0) += 1;
}
