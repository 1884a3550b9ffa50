//! # Vigil Chain
//!
//! Chain access for the Vigil validator monitor.
//!
//! ## Features
//!
//! - `HttpChainClient`: reqwest-based implementation of the `ChainClient`
//!   seam against a node's JSON RPC surface
//! - `with_retries`: bounded retry with backoff for flaky endpoints
//! - `ChainProbe`: one polling round per validator, producing a structured
//!   `ProbeRound` instead of an error

pub mod client;
pub mod probe;
pub mod retry;

pub use client::HttpChainClient;
pub use probe::{ChainProbe, ProbeRound, RoundStatus, SentryProbe};
pub use retry::with_retries;
