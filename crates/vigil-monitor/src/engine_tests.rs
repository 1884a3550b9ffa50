//! Tests for the alert state machine.

use super::*;
use chrono::Utc;

use vigil_chain::SentryProbe;
use vigil_config::{ThresholdDefaults, ValidatorMonitor};
use vigil_protocols::{BlockInfo, ChainError, NodeStatus, SigningInfo};

const ADDRESS: &str = "AABBCCDD";

fn monitor() -> ValidatorMonitor {
    ValidatorMonitor {
        name: "test-validator".to_string(),
        rpc: "http://primary.invalid".to_string(),
        chain_id: "testchain-1".to_string(),
        address: ADDRESS.to_string(),
        recent_blocks_to_check: Some(20),
        missed_blocks_notify_threshold: Some(10),
        missed_blocks_green_to: Some(9),
        missed_blocks_yellow_from: Some(10),
        missed_blocks_yellow_to: Some(14),
        missed_blocks_red_from: Some(15),
        notify_every: Some(5),
        ..Default::default()
    }
}

fn engine_for(monitor: &ValidatorMonitor, alerts: AlertsConfig) -> AlertEngine {
    let thresholds = monitor.resolved(&ThresholdDefaults::default());
    AlertEngine::new(monitor, thresholds, alerts)
}

fn engine() -> AlertEngine {
    engine_for(&monitor(), AlertsConfig::default())
}

fn block(height: i64, signed: bool) -> BlockInfo {
    BlockInfo {
        height,
        time: Utc::now(),
        signers: if signed {
            vec![ADDRESS.to_string()]
        } else {
            vec!["EEFF0011".to_string()]
        },
    }
}

fn round_at(height: i64, signed: bool) -> ProbeRound {
    ProbeRound {
        timestamp: Utc::now(),
        block: Some(block(height, signed)),
        signed_latest: signed,
        signing: Some(SigningInfo {
            jailed: false,
            tombstoned: false,
            missed_blocks: 10,
        }),
        slashing_uptime: Some(99.9),
        own_node_syncing: None,
        sentries: Vec::new(),
        block_fetch_error: None,
        rpc_errors: Vec::new(),
    }
}

fn failed_round() -> ProbeRound {
    ProbeRound {
        timestamp: Utc::now(),
        block: None,
        signed_latest: false,
        signing: None,
        slashing_uptime: None,
        own_node_syncing: None,
        sentries: Vec::new(),
        block_fetch_error: Some("request timed out".to_string()),
        rpc_errors: Vec::new(),
    }
}

fn ok_sentry(height: i64) -> SentryProbe {
    SentryProbe {
        name: "sentry-1".to_string(),
        status: Ok(NodeStatus {
            height,
            syncing: false,
            version: "0.37.2".to_string(),
        }),
    }
}

#[test]
fn test_healthy_round_produces_no_notification() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    let (stats, notification) = engine.evaluate(&mut state, &round_at(100, true));

    assert!(notification.is_none());
    assert_eq!(stats.alert_level, AlertLevel::None);
    assert_eq!(stats.height, 100);
    assert!(!stats.rpc_failure);
}

#[test]
fn test_jailed_forces_critical() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    let mut round = round_at(100, true);
    round.signing = Some(SigningInfo {
        jailed: true,
        tombstoned: false,
        missed_blocks: 0,
    });

    let (stats, notification) = engine.evaluate(&mut state, &round);
    let notification = notification.unwrap();

    assert_eq!(stats.alert_level, AlertLevel::Critical);
    assert_eq!(notification.alert_level, AlertLevel::Critical);
    assert_eq!(notification.alerts, vec!["validator is jailed"]);
    assert_eq!(state.alert_type_counts[&AlertType::Jailed], 1);
}

#[test]
fn test_tombstoned_forces_critical_over_everything() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    // Tombstoned plus perfectly healthy uptime and no misses.
    let mut round = round_at(100, true);
    round.signing = Some(SigningInfo {
        jailed: false,
        tombstoned: true,
        missed_blocks: 0,
    });

    let (stats, _) = engine.evaluate(&mut state, &round);
    assert_eq!(stats.alert_level, AlertLevel::Critical);
}

#[test]
fn test_notify_every_cadence() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    let mut notified_rounds = Vec::new();
    for n in 1..=12 {
        let mut round = round_at(100 + n, true);
        round.signing = Some(SigningInfo {
            jailed: true,
            tombstoned: false,
            missed_blocks: 0,
        });
        let (_, notification) = engine.evaluate(&mut state, &round);
        if notification.is_some_and(|n| !n.alerts.is_empty()) {
            notified_rounds.push(n);
        }
    }

    // Newly active on round 1, then reminders at counter multiples of 5.
    assert_eq!(notified_rounds, vec![1, 5, 10]);
    assert_eq!(state.alert_type_counts[&AlertType::Jailed], 12);
}

#[test]
fn test_clear_notifies_once_and_resets() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    let mut round = round_at(101, true);
    round.signing = Some(SigningInfo {
        jailed: true,
        tombstoned: false,
        missed_blocks: 0,
    });
    engine.evaluate(&mut state, &round);

    // Healthy again: exactly one cleared notification.
    let (_, notification) = engine.evaluate(&mut state, &round_at(102, true));
    let notification = notification.unwrap();
    assert!(notification.alerts.is_empty());
    assert_eq!(notification.cleared_alerts, vec!["jailed resolved"]);
    assert!(notification.notify_for_clear);
    assert_eq!(state.alert_type_counts[&AlertType::Jailed], 0);

    // Still healthy: nothing further.
    let (_, notification) = engine.evaluate(&mut state, &round_at(103, true));
    assert!(notification.is_none());

    // Re-failure is a fresh newly-active event.
    let mut round = round_at(104, true);
    round.signing = Some(SigningInfo {
        jailed: true,
        tombstoned: false,
        missed_blocks: 0,
    });
    let (_, notification) = engine.evaluate(&mut state, &round);
    assert_eq!(notification.unwrap().alerts, vec!["validator is jailed"]);
}

#[test]
fn test_missed_blocks_scenario_escalates_then_recovers() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    engine.evaluate(&mut state, &round_at(100, true));

    // Twelve consecutive misses at 101..=112.
    let mut first_missed_alert = None;
    for height in 101..=112 {
        let (stats, notification) = engine.evaluate(&mut state, &round_at(height, false));
        if let Some(n) = notification {
            if n.alerts.iter().any(|a| a.contains("missed")) && first_missed_alert.is_none() {
                first_missed_alert = Some((height, stats.recent_missed_blocks));
            }
        }
    }
    // The notify threshold (10) fired exactly when the counter hit it.
    assert_eq!(first_missed_alert, Some((110, 10)));

    let (stats, _) = engine.evaluate(&mut state, &round_at(113, true));
    assert_eq!(stats.recent_missed_blocks, 12);
    assert_eq!(stats.recent_missed_alert_level, AlertLevel::Warning);

    // Signed blocks age the misses out of the 20-block window; the level
    // reverts to none without any manual reset.
    let mut cleared_at = None;
    for height in 114..=132 {
        let (stats, notification) = engine.evaluate(&mut state, &round_at(height, true));
        if let Some(n) = notification {
            if n.cleared_alerts.iter().any(|c| c.contains("missed")) {
                cleared_at = Some((height, stats.recent_missed_blocks));
            }
        }
    }
    // At 123 the counter fell to 9, back under the notify threshold.
    assert_eq!(cleared_at, Some((123, 9)));

    let (stats, _) = engine.evaluate(&mut state, &round_at(133, true));
    assert_eq!(stats.recent_missed_alert_level, AlertLevel::None);
    assert_eq!(stats.recent_missed_blocks_max, 12);
}

#[test]
fn test_band_levels_escalate_monotonically() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    let mut last_level = AlertLevel::None;
    let mut seen = Vec::new();
    for height in 1..=16 {
        let (stats, _) = engine.evaluate(&mut state, &round_at(height, false));
        assert!(stats.recent_missed_alert_level >= last_level);
        last_level = stats.recent_missed_alert_level;
        seen.push(stats.recent_missed_alert_level);
    }

    // 9 misses: none. 10: warning. 15: high.
    assert_eq!(seen[8], AlertLevel::None);
    assert_eq!(seen[9], AlertLevel::Warning);
    assert_eq!(seen[14], AlertLevel::High);
}

#[test]
fn test_band_gap_degrades_to_none() {
    let mut config = monitor();
    // Gap between green (..=9) and yellow (12..=14).
    config.missed_blocks_yellow_from = Some(12);
    let mut engine = engine_for(&config, AlertsConfig::default());
    let mut state = ValidatorAlertState::default();

    for height in 1..=10 {
        let (stats, _) = engine.evaluate(&mut state, &round_at(height, false));
        if height == 10 {
            // 10 misses falls in the gap: level none, no panic.
            assert_eq!(stats.recent_missed_alert_level, AlertLevel::None);
        }
    }
}

#[test]
fn test_failed_round_raises_block_fetch_and_preserves_state() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    // Build up some state first: a jailed alert and a few misses.
    let mut round = round_at(100, false);
    round.signing = Some(SigningInfo {
        jailed: true,
        tombstoned: false,
        missed_blocks: 0,
    });
    engine.evaluate(&mut state, &round);
    let jailed_count = state.alert_type_counts[&AlertType::Jailed];
    let missed_before = state.recent_missed_blocks;

    let (stats, notification) = engine.evaluate(&mut state, &failed_round());
    let notification = notification.unwrap();

    assert!(stats.rpc_failure);
    assert_eq!(stats.alert_level, AlertLevel::High);
    assert!(notification.alerts[0].contains("unable to fetch latest block"));

    // Unknown is not healthy: jailed was not cleared, misses untouched.
    assert_eq!(state.alert_type_counts[&AlertType::Jailed], jailed_count);
    assert_eq!(state.recent_missed_blocks, missed_before);
    assert_eq!(state.alert_type_counts[&AlertType::BlockFetch], 1);
}

#[test]
fn test_rpc_errors_raise_generic_rpc() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    let mut round = round_at(100, true);
    round.signing = None;
    round.slashing_uptime = None;
    round.rpc_errors = vec!["signing info: request timed out".to_string()];

    let (stats, notification) = engine.evaluate(&mut state, &round);

    assert_eq!(stats.alert_level, AlertLevel::High);
    assert!(
        notification
            .unwrap()
            .alerts
            .iter()
            .any(|a| a.contains("signing info"))
    );
}

#[test]
fn test_uptime_below_warning_threshold() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    let mut round = round_at(100, true);
    round.slashing_uptime = Some(99.5);
    let (stats, notification) = engine.evaluate(&mut state, &round);

    assert_eq!(stats.alert_level, AlertLevel::Warning);
    assert!(
        notification
            .unwrap()
            .alerts
            .iter()
            .any(|a| a.contains("below warning threshold"))
    );
}

#[test]
fn test_uptime_below_error_threshold() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    let mut round = round_at(100, true);
    round.slashing_uptime = Some(97.0);
    let (stats, notification) = engine.evaluate(&mut state, &round);

    assert_eq!(stats.alert_level, AlertLevel::High);
    assert!(
        notification
            .unwrap()
            .alerts
            .iter()
            .any(|a| a.contains("below error threshold"))
    );
}

#[test]
fn test_ignored_alert_tracks_counters_silently() {
    let alerts = AlertsConfig {
        ignore_alerts: vec![AlertType::Jailed],
    };
    let mut engine = engine_for(&monitor(), alerts);
    let mut state = ValidatorAlertState::default();

    let mut round = round_at(100, true);
    round.signing = Some(SigningInfo {
        jailed: true,
        tombstoned: false,
        missed_blocks: 0,
    });

    let (_, notification) = engine.evaluate(&mut state, &round);

    // No lines, no notification, but the counter still advanced.
    assert!(notification.is_none());
    assert_eq!(state.alert_type_counts[&AlertType::Jailed], 1);
}

#[test]
fn test_chain_halt_detected_and_cleared() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    engine.evaluate(&mut state, &round_at(100, true));

    // Same height again: the chain stopped.
    let (stats, notification) = engine.evaluate(&mut state, &round_at(100, true));
    assert_eq!(stats.alert_level, AlertLevel::High);
    assert!(
        notification
            .unwrap()
            .alerts
            .iter()
            .any(|a| a.contains("halted at height 100"))
    );

    // Progress resumes: one cleared line.
    let (_, notification) = engine.evaluate(&mut state, &round_at(101, true));
    let notification = notification.unwrap();
    assert_eq!(notification.cleared_alerts, vec!["chain halt resolved"]);
    assert!(notification.notify_for_clear);
}

#[test]
fn test_own_node_out_of_sync() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    let mut round = round_at(100, true);
    round.own_node_syncing = Some(true);
    let (stats, notification) = engine.evaluate(&mut state, &round);
    assert_eq!(stats.alert_level, AlertLevel::High);
    assert_eq!(notification.unwrap().alerts, vec!["node is catching up"]);

    let mut round = round_at(101, true);
    round.own_node_syncing = Some(false);
    let (_, notification) = engine.evaluate(&mut state, &round);
    assert_eq!(
        notification.unwrap().cleared_alerts,
        vec!["out of sync resolved"]
    );
}

#[test]
fn test_sentry_failure_flows_into_notification() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    let mut round = round_at(100, true);
    round.sentries = vec![SentryProbe {
        name: "sentry-1".to_string(),
        status: Err(ChainError::Transport("connection refused".to_string())),
    }];

    let (stats, notification) = engine.evaluate(&mut state, &round);

    assert_eq!(stats.sentry_stats.len(), 1);
    assert_eq!(stats.sentry_stats[0].alert, SentryAlertType::GrpcError);
    assert_eq!(stats.alert_level, AlertLevel::Warning);
    assert!(
        notification
            .unwrap()
            .alerts
            .iter()
            .any(|a| a.contains("sentry sentry-1"))
    );
}

#[test]
fn test_halted_sentry_raises_high_on_first_occurrence() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    let mut round = round_at(100, true);
    round.sentries = vec![ok_sentry(100)];
    let (_, notification) = engine.evaluate(&mut state, &round);
    assert!(notification.is_none());

    // Chain advanced by 5, sentry stuck.
    let mut round = round_at(105, true);
    round.sentries = vec![ok_sentry(100)];
    let (stats, notification) = engine.evaluate(&mut state, &round);

    assert_eq!(stats.sentry_stats[0].alert, SentryAlertType::Halt);
    assert_eq!(stats.alert_level, AlertLevel::High);
    assert!(
        notification
            .unwrap()
            .alerts
            .iter()
            .any(|a| a.contains("halted"))
    );
}

#[test]
fn test_sentry_recovery_clears() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    let mut round = round_at(100, true);
    round.sentries = vec![SentryProbe {
        name: "sentry-1".to_string(),
        status: Err(ChainError::Timeout),
    }];
    engine.evaluate(&mut state, &round);

    let mut round = round_at(101, true);
    round.sentries = vec![ok_sentry(101)];
    let (_, notification) = engine.evaluate(&mut state, &round);

    let notification = notification.unwrap();
    assert_eq!(
        notification.cleared_alerts,
        vec!["sentry sentry-1: grpc error resolved"]
    );
}

#[test]
fn test_alert_lines_follow_declaration_order() {
    let mut engine = engine();
    let mut state = ValidatorAlertState::default();

    // Jailed, tombstoned and an rpc error all at once.
    let mut round = round_at(100, true);
    round.signing = Some(SigningInfo {
        jailed: true,
        tombstoned: true,
        missed_blocks: 0,
    });
    round.rpc_errors = vec!["slashing params: request timed out".to_string()];

    let (_, notification) = engine.evaluate(&mut state, &round);
    let alerts = notification.unwrap().alerts;

    assert_eq!(alerts[0], "validator is jailed");
    assert_eq!(alerts[1], "validator is tombstoned");
    assert!(alerts[2].contains("slashing params"));
}
