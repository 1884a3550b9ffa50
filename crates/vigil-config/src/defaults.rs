//! Threshold defaults and load-time resolution.
//!
//! All default values live in [`ThresholdDefaults`] and nowhere else; the
//! struct is passed explicitly into the defaulting pass. Resolution fills
//! only truly-absent fields, so an explicit zero in the file survives.

use tracing::warn;

use crate::error::ConfigError;
use crate::schema::ValidatorMonitor;

/// Default thresholds applied to fields the config file leaves unset.
#[derive(Debug, Clone)]
pub struct ThresholdDefaults {
    /// 20 of the last 10,000 blocks missed.
    pub slashing_warn_threshold: f64,
    /// 200 of the last 10,000 blocks missed.
    pub slashing_error_threshold: f64,
    /// Recent-miss sliding window size in blocks.
    pub recent_blocks_to_check: i64,
    /// With ~30s rounds this reminds roughly every 10 minutes.
    pub notify_every: i64,
    /// Recent misses before the missed-blocks alert fires.
    pub missed_blocks_notify_threshold: i64,
    /// Green band upper bound.
    pub missed_blocks_green_to: i64,
    /// Yellow band lower bound.
    pub missed_blocks_yellow_from: i64,
    /// Yellow band upper bound.
    pub missed_blocks_yellow_to: i64,
    /// Red band lower bound.
    pub missed_blocks_red_from: i64,
    /// Attempts per RPC call.
    pub rpc_retries: u32,
    /// Sentry status-failure streak before alerting.
    pub sentry_grpc_error_threshold: i64,
    /// Sentry out-of-sync streak before alerting.
    pub sentry_out_of_sync_threshold: i64,
    /// Sentry halt streak before alerting.
    pub sentry_halt_threshold: i64,
    /// Height lag beyond which a sentry counts as out of sync.
    pub sentry_out_of_sync_blocks_threshold: i64,
}

impl Default for ThresholdDefaults {
    fn default() -> Self {
        Self {
            slashing_warn_threshold: 99.80,
            slashing_error_threshold: 98.0,
            recent_blocks_to_check: 20,
            notify_every: 20,
            missed_blocks_notify_threshold: 10,
            missed_blocks_green_to: 49,
            missed_blocks_yellow_from: 50,
            missed_blocks_yellow_to: 99,
            missed_blocks_red_from: 100,
            rpc_retries: 5,
            sentry_grpc_error_threshold: 1,
            sentry_out_of_sync_threshold: 1,
            sentry_halt_threshold: 1,
            sentry_out_of_sync_blocks_threshold: 10,
        }
    }
}

/// Fully-populated thresholds for one validator, resolved once at load.
#[derive(Debug, Clone)]
pub struct ResolvedThresholds {
    /// Uptime percentage below which a warning fires.
    pub slashing_warn_threshold: f64,
    /// Uptime percentage below which a high alert fires.
    pub slashing_error_threshold: f64,
    /// Sliding-window size in blocks.
    pub recent_blocks_to_check: i64,
    /// Rounds between reminder notifications.
    pub notify_every: i64,
    /// Recent misses at which the missed-blocks alert starts firing.
    pub missed_blocks_notify_threshold: i64,
    /// Green band upper bound (inclusive).
    pub missed_blocks_green_to: i64,
    /// Yellow band lower bound (inclusive).
    pub missed_blocks_yellow_from: i64,
    /// Yellow band upper bound (inclusive).
    pub missed_blocks_yellow_to: i64,
    /// Red band lower bound (inclusive).
    pub missed_blocks_red_from: i64,
    /// Attempts per RPC call.
    pub rpc_retries: u32,
    /// Sentry status-failure streak before alerting.
    pub sentry_grpc_error_threshold: i64,
    /// Sentry out-of-sync streak before alerting.
    pub sentry_out_of_sync_threshold: i64,
    /// Sentry halt streak before alerting.
    pub sentry_halt_threshold: i64,
    /// Height lag beyond which a sentry counts as out of sync.
    pub sentry_out_of_sync_blocks_threshold: i64,
}

impl ValidatorMonitor {
    /// Fill unset threshold fields so the persisted file carries effective
    /// values. Idempotent: a second pass changes nothing.
    pub fn apply_defaults(&mut self, defaults: &ThresholdDefaults) {
        self.rpc_retries.get_or_insert(defaults.rpc_retries);
        self.slashing_warn_threshold
            .get_or_insert(defaults.slashing_warn_threshold);
        self.slashing_error_threshold
            .get_or_insert(defaults.slashing_error_threshold);
        self.recent_blocks_to_check
            .get_or_insert(defaults.recent_blocks_to_check);
        self.notify_every.get_or_insert(defaults.notify_every);
        self.missed_blocks_notify_threshold
            .get_or_insert(defaults.missed_blocks_notify_threshold);
        self.missed_blocks_green_to
            .get_or_insert(defaults.missed_blocks_green_to);
        self.missed_blocks_yellow_from
            .get_or_insert(defaults.missed_blocks_yellow_from);
        self.missed_blocks_yellow_to
            .get_or_insert(defaults.missed_blocks_yellow_to);
        self.missed_blocks_red_from
            .get_or_insert(defaults.missed_blocks_red_from);
        self.sentry_grpc_error_threshold
            .get_or_insert(defaults.sentry_grpc_error_threshold);
        self.sentry_out_of_sync_threshold
            .get_or_insert(defaults.sentry_out_of_sync_threshold);
        self.sentry_halt_threshold
            .get_or_insert(defaults.sentry_halt_threshold);
        self.sentry_out_of_sync_blocks_threshold
            .get_or_insert(defaults.sentry_out_of_sync_blocks_threshold);
    }

    /// Resolve thresholds into a plain struct, falling back to defaults for
    /// any field still unset.
    pub fn resolved(&self, defaults: &ThresholdDefaults) -> ResolvedThresholds {
        ResolvedThresholds {
            slashing_warn_threshold: self
                .slashing_warn_threshold
                .unwrap_or(defaults.slashing_warn_threshold),
            slashing_error_threshold: self
                .slashing_error_threshold
                .unwrap_or(defaults.slashing_error_threshold),
            recent_blocks_to_check: self
                .recent_blocks_to_check
                .unwrap_or(defaults.recent_blocks_to_check),
            notify_every: self.notify_every.unwrap_or(defaults.notify_every),
            missed_blocks_notify_threshold: self
                .missed_blocks_notify_threshold
                .unwrap_or(defaults.missed_blocks_notify_threshold),
            missed_blocks_green_to: self
                .missed_blocks_green_to
                .unwrap_or(defaults.missed_blocks_green_to),
            missed_blocks_yellow_from: self
                .missed_blocks_yellow_from
                .unwrap_or(defaults.missed_blocks_yellow_from),
            missed_blocks_yellow_to: self
                .missed_blocks_yellow_to
                .unwrap_or(defaults.missed_blocks_yellow_to),
            missed_blocks_red_from: self
                .missed_blocks_red_from
                .unwrap_or(defaults.missed_blocks_red_from),
            rpc_retries: self.rpc_retries.unwrap_or(defaults.rpc_retries),
            sentry_grpc_error_threshold: self
                .sentry_grpc_error_threshold
                .unwrap_or(defaults.sentry_grpc_error_threshold),
            sentry_out_of_sync_threshold: self
                .sentry_out_of_sync_threshold
                .unwrap_or(defaults.sentry_out_of_sync_threshold),
            sentry_halt_threshold: self
                .sentry_halt_threshold
                .unwrap_or(defaults.sentry_halt_threshold),
            sentry_out_of_sync_blocks_threshold: self
                .sentry_out_of_sync_blocks_threshold
                .unwrap_or(defaults.sentry_out_of_sync_blocks_threshold),
        }
    }
}

/// Validate missed-block band boundaries for one validator.
///
/// Non-monotonic boundaries are rejected. Gaps between bands are legal but
/// logged, since the engine treats them as level `none`.
pub fn validate_bands(validator: &str, t: &ResolvedThresholds) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBands {
        validator: validator.to_string(),
        reason,
    };

    if t.missed_blocks_green_to < 0 {
        return Err(invalid(format!(
            "green-to must be non-negative, got {}",
            t.missed_blocks_green_to
        )));
    }
    if t.missed_blocks_yellow_from <= t.missed_blocks_green_to {
        return Err(invalid(format!(
            "yellow-from ({}) must be above green-to ({})",
            t.missed_blocks_yellow_from, t.missed_blocks_green_to
        )));
    }
    if t.missed_blocks_yellow_to < t.missed_blocks_yellow_from {
        return Err(invalid(format!(
            "yellow-to ({}) must not be below yellow-from ({})",
            t.missed_blocks_yellow_to, t.missed_blocks_yellow_from
        )));
    }
    if t.missed_blocks_red_from <= t.missed_blocks_yellow_to {
        return Err(invalid(format!(
            "red-from ({}) must be above yellow-to ({})",
            t.missed_blocks_red_from, t.missed_blocks_yellow_to
        )));
    }

    if t.missed_blocks_yellow_from != t.missed_blocks_green_to + 1
        || t.missed_blocks_red_from != t.missed_blocks_yellow_to + 1
    {
        warn!(
            validator,
            "missed-block bands have gaps; counts inside a gap resolve to level none"
        );
    }

    Ok(())
}
