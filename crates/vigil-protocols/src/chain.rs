//! Chain query seam.
//!
//! `ChainClient` is the read-only boundary to a chain's RPC surface. The
//! engine only ever consumes these four queries; everything else (retries,
//! timeouts, endpoint shapes) lives behind the trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Chain query errors, distinguishable by failure class.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The call did not complete within the per-attempt timeout.
    #[error("request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned {status}: {body}")]
    Protocol {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The queried entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with something unparseable.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ChainError {
    /// True for [`ChainError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, ChainError::Timeout)
    }

    /// True for [`ChainError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChainError::NotFound(_))
    }
}

/// Latest-block observation.
#[derive(Debug, Clone)]
pub struct BlockInfo {
    /// Block height.
    pub height: i64,
    /// Block time.
    pub time: DateTime<Utc>,
    /// Consensus addresses that signed the block's commit, upper-case hex.
    pub signers: Vec<String>,
}

impl BlockInfo {
    /// Whether the given consensus address signed this block.
    pub fn signed_by(&self, address: &str) -> bool {
        self.signers.iter().any(|s| s.eq_ignore_ascii_case(address))
    }
}

/// Signing/jail status for a validator from the chain's slashing module.
#[derive(Debug, Clone)]
pub struct SigningInfo {
    /// Validator is jailed.
    pub jailed: bool,
    /// Validator is tombstoned.
    pub tombstoned: bool,
    /// Missed blocks within the chain's own slashing window.
    pub missed_blocks: i64,
}

/// Status of a full node (validator's own node or a sentry).
#[derive(Debug, Clone)]
pub struct NodeStatus {
    /// Latest height the node knows about.
    pub height: i64,
    /// Node is still catching up.
    pub syncing: bool,
    /// Reported software version.
    pub version: String,
}

/// Read-only chain query client.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Fetch the latest block with its commit signatures.
    async fn latest_block(&self) -> Result<BlockInfo, ChainError>;

    /// Fetch signing/jail status for a validator consensus address.
    async fn signing_info(&self, address: &str) -> Result<SigningInfo, ChainError>;

    /// Fetch the chain's slashing window size in blocks.
    async fn slashing_window(&self) -> Result<i64, ChainError>;

    /// Fetch the status of a node at the given address.
    async fn node_status(&self, addr: &str) -> Result<NodeStatus, ChainError>;
}
