//! Tests for the persisted configuration schema.

use super::*;
use vigil_protocols::AlertType;

const FULL: &str = r#"
alerts:
  ignore-alerts:
    - out-of-sync
    - generic-rpc
notifications:
  service: discord
  discord:
    webhook:
      id: "1122334455"
      token: "abcdef"
    username: vigil
    alert-user-ids:
      - "99887766"
validators:
  - name: mainnet-validator
    rpc: https://rpc.example.com:26657
    chain-id: examplehub-4
    address: AABBCCDDEEFF00112233445566778899AABBCCDD
    fullnode: true
    rpc-retries: 3
    recent-blocks-to-check: 50
    notify-every: 10
    missed-blocks-green-to: 9
    missed-blocks-yellow-from: 10
    missed-blocks-yellow-to: 24
    missed-blocks-red-from: 25
    sentries:
      - name: sentry-eu
        grpc: https://sentry-eu.example.com:26657
      - name: sentry-us
        grpc: https://sentry-us.example.com:26657
"#;

#[test]
fn test_parse_full_config() {
    let config: VigilConfig = serde_yml::from_str(FULL).unwrap();

    assert_eq!(config.alerts.ignore_alerts.len(), 2);
    assert!(config.alerts.ignore_alerts.contains(&AlertType::OutOfSync));

    let notifications = config.notifications.unwrap();
    assert_eq!(notifications.service, "discord");
    let discord = notifications.discord.unwrap();
    assert_eq!(discord.webhook.id, "1122334455");
    assert_eq!(discord.username.as_deref(), Some("vigil"));
    assert_eq!(discord.alert_user_ids, vec!["99887766"]);

    let validator = &config.validators[0];
    assert_eq!(validator.chain_id, "examplehub-4");
    assert!(validator.fullnode);
    assert_eq!(validator.rpc_retries, Some(3));
    assert_eq!(validator.recent_blocks_to_check, Some(50));
    assert_eq!(validator.sentries().len(), 2);
    assert_eq!(validator.sentries()[1].name, "sentry-us");
}

#[test]
fn test_unset_fields_stay_none() {
    let config: VigilConfig = serde_yml::from_str(
        r#"
validators:
  - name: v
    rpc: http://localhost:26657
    chain-id: c
    address: AA
"#,
    )
    .unwrap();

    let validator = &config.validators[0];
    assert!(validator.recent_blocks_to_check.is_none());
    assert!(validator.missed_blocks_green_to.is_none());
    assert!(validator.discord_status_message_id.is_none());
    assert!(validator.sentries().is_empty());
    assert!(!validator.fullnode);
}

#[test]
fn test_alert_active() {
    let alerts = AlertsConfig {
        ignore_alerts: vec![AlertType::Halt],
    };
    assert!(!alerts.alert_active(AlertType::Halt));
    assert!(alerts.alert_active(AlertType::Jailed));
}

#[test]
fn test_status_message_id_serializes_when_set() {
    let mut config: VigilConfig = serde_yml::from_str(
        r#"
validators:
  - name: v
    rpc: http://localhost:26657
    chain-id: c
    address: AA
"#,
    )
    .unwrap();

    let yaml = serde_yml::to_string(&config).unwrap();
    assert!(!yaml.contains("discord-status-message-id"));

    config.validators[0].discord_status_message_id = Some("msg-42".to_string());
    let yaml = serde_yml::to_string(&config).unwrap();
    assert!(yaml.contains("discord-status-message-id: msg-42"));
}
