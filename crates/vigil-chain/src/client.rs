//! HTTP implementation of the `ChainClient` seam.
//!
//! Talks to a node's JSON RPC surface: Tendermint-style `/block` and
//! `/status`, plus the slashing module's REST queries. Cosmos JSON encodes
//! 64-bit integers as strings, hence the parse helpers.

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use vigil_protocols::{BlockInfo, ChainClient, ChainError, NodeStatus, SigningInfo};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY: usize = 256;

/// Chain client over HTTP JSON.
pub struct HttpChainClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpChainClient {
    /// Create a client for the given RPC base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom per-call timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, base: &str, path: &str) -> Result<T, ChainError> {
        let url = format!("{}{}", base.trim_end_matches('/'), path);

        let response = self.client.get(&url).send().await.map_err(map_transport)?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(ChainError::NotFound(url));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChainError::Protocol {
                status: status.as_u16(),
                body: truncate(body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ChainError::Decode(e.to_string()))
    }
}

fn map_transport(e: reqwest::Error) -> ChainError {
    if e.is_timeout() {
        ChainError::Timeout
    } else {
        ChainError::Transport(e.to_string())
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

fn parse_i64(value: &str, field: &str) -> Result<i64, ChainError> {
    value
        .parse()
        .map_err(|_| ChainError::Decode(format!("{field} is not an integer: {value}")))
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn latest_block(&self) -> Result<BlockInfo, ChainError> {
        let response: RpcResponse<BlockResult> = self.get_json(&self.base_url, "/block").await?;
        let block = response.result.block;

        let signers = block
            .last_commit
            .signatures
            .into_iter()
            .filter(|s| !s.validator_address.is_empty())
            .map(|s| s.validator_address.to_uppercase())
            .collect();

        Ok(BlockInfo {
            height: parse_i64(&block.header.height, "block height")?,
            time: block.header.time,
            signers,
        })
    }

    async fn signing_info(&self, address: &str) -> Result<SigningInfo, ChainError> {
        let path = format!("/cosmos/slashing/v1beta1/signing_infos/{address}");
        let response: SigningInfoResponse = self.get_json(&self.base_url, &path).await?;
        let info = response.val_signing_info;

        Ok(SigningInfo {
            jailed: info.jailed_until > Utc::now(),
            tombstoned: info.tombstoned,
            missed_blocks: parse_i64(&info.missed_blocks_counter, "missed_blocks_counter")?,
        })
    }

    async fn slashing_window(&self) -> Result<i64, ChainError> {
        let response: SlashingParamsResponse = self
            .get_json(&self.base_url, "/cosmos/slashing/v1beta1/params")
            .await?;
        parse_i64(&response.params.signed_blocks_window, "signed_blocks_window")
    }

    async fn node_status(&self, addr: &str) -> Result<NodeStatus, ChainError> {
        let response: RpcResponse<StatusResult> = self.get_json(addr, "/status").await?;
        let status = response.result;

        Ok(NodeStatus {
            height: parse_i64(&status.sync_info.latest_block_height, "latest_block_height")?,
            syncing: status.sync_info.catching_up,
            version: status.node_info.version,
        })
    }
}

// Wire shapes. Tendermint RPC wraps results in a JSON-RPC envelope; the
// slashing REST queries return flat objects.

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: T,
}

#[derive(Deserialize)]
struct BlockResult {
    block: RawBlock,
}

#[derive(Deserialize)]
struct RawBlock {
    header: RawHeader,
    last_commit: RawCommit,
}

#[derive(Deserialize)]
struct RawHeader {
    height: String,
    time: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawCommit {
    #[serde(default)]
    signatures: Vec<RawSignature>,
}

#[derive(Deserialize)]
struct RawSignature {
    #[serde(default)]
    validator_address: String,
}

#[derive(Deserialize)]
struct StatusResult {
    node_info: RawNodeInfo,
    sync_info: RawSyncInfo,
}

#[derive(Deserialize)]
struct RawNodeInfo {
    version: String,
}

#[derive(Deserialize)]
struct RawSyncInfo {
    latest_block_height: String,
    catching_up: bool,
}

#[derive(Deserialize)]
struct SigningInfoResponse {
    val_signing_info: RawSigningInfo,
}

#[derive(Deserialize)]
struct RawSigningInfo {
    jailed_until: DateTime<Utc>,
    #[serde(default)]
    tombstoned: bool,
    missed_blocks_counter: String,
}

#[derive(Deserialize)]
struct SlashingParamsResponse {
    params: RawSlashingParams,
}

#[derive(Deserialize)]
struct RawSlashingParams {
    signed_blocks_window: String,
}
