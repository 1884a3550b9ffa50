//! Per-validator monitoring tasks.
//!
//! Each configured validator gets one independent task that probes,
//! evaluates and notifies forever on a fixed interval. Tasks share nothing
//! but the config store's save lock; a failed round is logged and the next
//! round proceeds.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, error, info};

use vigil_chain::{ChainProbe, HttpChainClient};
use vigil_config::{ConfigStore, ValidatorMonitor};
use vigil_monitor::AlertEngine;
use vigil_notify::NotificationDispatcher;
use vigil_protocols::{StatusNotifier, ValidatorAlertState};

use crate::signal::SignalHandler;

/// Drives one monitoring cycle per configured validator.
pub(crate) struct MonitorSupervisor {
    store: Arc<ConfigStore>,
    notifier: Arc<dyn StatusNotifier>,
    interval: Duration,
    signals: SignalHandler,
}

impl MonitorSupervisor {
    /// Create a supervisor over the loaded configuration.
    pub fn new(
        store: Arc<ConfigStore>,
        notifier: Arc<dyn StatusNotifier>,
        interval: Duration,
        signals: SignalHandler,
    ) -> Self {
        Self {
            store,
            notifier,
            interval,
            signals,
        }
    }

    /// Spawn all monitoring tasks and wait for them to finish.
    pub async fn run(&self) -> anyhow::Result<()> {
        let validators = self.store.validators();
        if validators.is_empty() {
            anyhow::bail!("no validators configured");
        }

        let alerts = self.store.alerts();
        let mention_user_ids = self
            .store
            .notifications()
            .and_then(|n| n.discord)
            .map(|d| d.alert_user_ids)
            .unwrap_or_default();

        let dispatcher = Arc::new(NotificationDispatcher::new(
            self.notifier.clone(),
            self.store.clone(),
            mention_user_ids,
        ));

        info!(
            validators = validators.len(),
            interval_secs = self.interval.as_secs(),
            notifier = self.notifier.name(),
            "starting monitoring tasks"
        );

        let mut handles = Vec::new();
        for monitor in validators {
            let thresholds = monitor.resolved(self.store.defaults());
            let client = Arc::new(HttpChainClient::new(&monitor.rpc));
            let probe = ChainProbe::new(client, &monitor, &thresholds);
            let engine = AlertEngine::new(&monitor, thresholds, alerts.clone());

            handles.push(tokio::spawn(run_validator(
                monitor,
                probe,
                engine,
                dispatcher.clone(),
                self.interval,
                self.signals.clone(),
            )));
        }

        futures::future::join_all(handles).await;
        info!("all monitoring tasks stopped");
        Ok(())
    }
}

async fn run_validator(
    monitor: ValidatorMonitor,
    probe: ChainProbe,
    mut engine: AlertEngine,
    dispatcher: Arc<NotificationDispatcher>,
    interval: Duration,
    signals: SignalHandler,
) {
    let mut shutdown: broadcast::Receiver<()> = signals.subscribe();
    let mut state = ValidatorAlertState::default();
    info!(validator = %monitor.name, chain_id = %monitor.chain_id, "monitoring started");

    loop {
        let round = probe.run_round().await;
        let (stats, notification) = engine.evaluate(&mut state, &round);

        debug!(
            validator = %monitor.name,
            height = stats.height,
            missed = stats.recent_missed_blocks,
            level = %stats.alert_level,
            "round complete"
        );

        if let Some(notification) = notification {
            if let Err(e) = dispatcher
                .dispatch(&monitor.name, &monitor.chain_id, &stats, &notification)
                .await
            {
                error!(validator = %monitor.name, "notification delivery failed: {e}");
            }
        }

        // Shutdown is observed only at round boundaries so an in-flight
        // probe/notify/persist triple always completes.
        if signals.is_shutdown_requested() {
            info!(validator = %monitor.name, "monitoring stopped");
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.recv() => {
                info!(validator = %monitor.name, "monitoring stopped");
                break;
            }
        }
    }
}
