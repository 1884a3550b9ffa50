//! One polling round per validator.
//!
//! The probe is a pure query layer: it never mutates alert state and never
//! fails the caller. Whatever could not be observed is reported as part of
//! the round, because "can't observe" is itself alert-worthy.

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, warn};

use vigil_config::{ResolvedThresholds, Sentry, ValidatorMonitor};
use vigil_protocols::{BlockInfo, ChainClient, ChainError, NodeStatus, SigningInfo};

use crate::retry::with_retries;

/// How one round went, overall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStatus {
    /// Every query answered.
    Success,
    /// The primary block query answered but something else did not.
    Partial,
    /// The primary block query failed; derived stats are unobservable.
    Failed,
}

/// Raw outcome of one sentry status query.
#[derive(Debug)]
pub struct SentryProbe {
    /// Sentry name from configuration.
    pub name: String,
    /// Status, or why it could not be fetched.
    pub status: Result<NodeStatus, ChainError>,
}

/// Everything one round observed. Consumed by the alert engine.
#[derive(Debug)]
pub struct ProbeRound {
    /// When the round ran.
    pub timestamp: DateTime<Utc>,
    /// Latest block, absent when the primary query failed.
    pub block: Option<BlockInfo>,
    /// The validator signed the latest block's commit.
    pub signed_latest: bool,
    /// Signing/jail status, absent on RPC failure.
    pub signing: Option<SigningInfo>,
    /// Slashing-period uptime percentage, absent when unobservable.
    pub slashing_uptime: Option<f64>,
    /// Whether the validator's own node reports catching up (fullnode only).
    pub own_node_syncing: Option<bool>,
    /// One probe result per configured sentry, in configuration order.
    pub sentries: Vec<SentryProbe>,
    /// Why the primary block query failed, if it did.
    pub block_fetch_error: Option<String>,
    /// Secondary query failures, for the generic-rpc alert.
    pub rpc_errors: Vec<String>,
}

impl ProbeRound {
    /// Overall round classification.
    pub fn status(&self) -> RoundStatus {
        if self.block.is_none() {
            RoundStatus::Failed
        } else if !self.rpc_errors.is_empty() {
            RoundStatus::Partial
        } else {
            RoundStatus::Success
        }
    }

    /// True when the primary block query failed.
    pub fn failed(&self) -> bool {
        self.block.is_none()
    }
}

/// Performs one polling round for a single validator.
pub struct ChainProbe {
    client: Arc<dyn ChainClient>,
    name: String,
    rpc: String,
    address: String,
    fullnode: bool,
    sentries: Vec<Sentry>,
    retries: u32,
}

impl ChainProbe {
    /// Create a probe for one configured validator.
    pub fn new(
        client: Arc<dyn ChainClient>,
        monitor: &ValidatorMonitor,
        thresholds: &ResolvedThresholds,
    ) -> Self {
        Self {
            client,
            name: monitor.name.clone(),
            rpc: monitor.rpc.clone(),
            address: monitor.address.clone(),
            fullnode: monitor.fullnode,
            sentries: monitor.sentries().to_vec(),
            retries: thresholds.rpc_retries,
        }
    }

    /// Run one round of queries.
    pub async fn run_round(&self) -> ProbeRound {
        let mut round = ProbeRound {
            timestamp: Utc::now(),
            block: None,
            signed_latest: false,
            signing: None,
            slashing_uptime: None,
            own_node_syncing: None,
            sentries: Vec::new(),
            block_fetch_error: None,
            rpc_errors: Vec::new(),
        };

        match with_retries(self.retries, || self.client.latest_block()).await {
            Ok(block) => {
                round.signed_latest = block.signed_by(&self.address);
                round.block = Some(block);
            }
            Err(e) => {
                warn!(validator = %self.name, "latest block fetch failed: {e}");
                round.block_fetch_error = Some(e.to_string());
            }
        }

        // Primary failure short-circuits derived queries. Sentries have
        // independent endpoints and are probed regardless.
        if !round.failed() {
            self.probe_signing(&mut round).await;

            if self.fullnode {
                match with_retries(self.retries, || self.client.node_status(&self.rpc)).await {
                    Ok(status) => round.own_node_syncing = Some(status.syncing),
                    Err(e) => round.rpc_errors.push(format!("node status: {e}")),
                }
            }
        }

        round.sentries = join_all(self.sentries.iter().map(|sentry| async move {
            SentryProbe {
                name: sentry.name.clone(),
                status: with_retries(self.retries, || self.client.node_status(&sentry.grpc))
                    .await,
            }
        }))
        .await;

        round
    }

    async fn probe_signing(&self, round: &mut ProbeRound) {
        match with_retries(self.retries, || self.client.signing_info(&self.address)).await {
            Ok(info) => round.signing = Some(info),
            Err(e) => round.rpc_errors.push(format!("signing info: {e}")),
        }

        let Some(signing) = &round.signing else {
            return;
        };

        match with_retries(self.retries, || self.client.slashing_window()).await {
            Ok(window) if window > 0 => {
                let missed = signing.missed_blocks as f64;
                round.slashing_uptime = Some(100.0 * (1.0 - missed / window as f64));
            }
            Ok(window) => {
                debug!(validator = %self.name, window, "unusable slashing window, skipping uptime");
            }
            Err(e) => round.rpc_errors.push(format!("slashing params: {e}")),
        }
    }
}
