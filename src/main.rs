//! Vigil - validator liveness monitoring and alerting daemon.
//!
//! Main entry point: loads the config (failing fast on malformed input),
//! wires the notification transport and runs one monitoring task per
//! validator until shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use vigil_config::ConfigStore;
use vigil_notify::{DiscordConfig, DiscordNotifier, LogNotifier};
use vigil_protocols::StatusNotifier;

mod cli;
mod signal;
mod supervisor;

use cli::{Cli, Commands};
use signal::SignalHandler;
use supervisor::MonitorSupervisor;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let store = Arc::new(
        ConfigStore::load(&cli.config)
            .with_context(|| format!("failed to load config {}", cli.config.display()))?,
    );

    match cli.command.unwrap_or(Commands::Monitor { interval: 30 }) {
        Commands::ValidateConfig => validate_config(&store),
        Commands::Monitor { interval } => run_monitor(store, interval).await,
    }
}

fn validate_config(store: &ConfigStore) -> anyhow::Result<()> {
    let validators = store.validators();
    for validator in &validators {
        let t = validator.resolved(store.defaults());
        println!("{} ({})", validator.name, validator.chain_id);
        println!("  rpc: {}", validator.rpc);
        println!("  rpc retries: {}", t.rpc_retries);
        println!(
            "  slashing uptime thresholds: warn below {:.2}%, error below {:.2}%",
            t.slashing_warn_threshold, t.slashing_error_threshold
        );
        println!(
            "  recent blocks window: {} (notify at {} missed)",
            t.recent_blocks_to_check, t.missed_blocks_notify_threshold
        );
        println!(
            "  missed-block bands: green 0-{}, yellow {}-{}, red {}+",
            t.missed_blocks_green_to,
            t.missed_blocks_yellow_from,
            t.missed_blocks_yellow_to,
            t.missed_blocks_red_from
        );
        println!("  notify every: {} rounds", t.notify_every);
        println!("  sentries: {}", validator.sentries().len());
    }
    println!("{} validator(s) configured, config is valid", validators.len());
    Ok(())
}

async fn run_monitor(store: Arc<ConfigStore>, interval: u64) -> anyhow::Result<()> {
    let notifier = build_notifier(&store)?;

    let signals = SignalHandler::new();
    signals.setup_os_signals().await?;

    let supervisor = MonitorSupervisor::new(
        store,
        notifier,
        Duration::from_secs(interval),
        signals,
    );
    supervisor.run().await
}

fn build_notifier(store: &ConfigStore) -> anyhow::Result<Arc<dyn StatusNotifier>> {
    match store.notifications() {
        Some(notifications) if notifications.service == "discord" => {
            let discord = notifications.discord.as_ref().context(
                "notifications.service is discord but notifications.discord is missing",
            )?;
            Ok(Arc::new(DiscordNotifier::new(DiscordConfig::from_channel(
                discord,
            ))))
        }
        Some(notifications) => anyhow::bail!(
            "unsupported notification service: {}",
            notifications.service
        ),
        None => {
            warn!("no notification service configured, alerts go to the log only");
            Ok(Arc::new(LogNotifier))
        }
    }
}
