//! # Vigil Monitor
//!
//! The per-validator alert engine.
//!
//! ## Features
//!
//! - Height-keyed sliding window for recent missed blocks
//! - Banded missed-block alert levels with hysteresis-free band lookup
//! - Per-sentry consecutive-failure streak tracking
//! - Per-alert-type notify / remind / clear decisions
//!
//! The engine is deliberately synchronous: it consumes one `ProbeRound`
//! plus the prior `ValidatorAlertState` and produces fresh stats and an
//! optional notification. All I/O lives in `vigil-chain` and
//! `vigil-notify`.

pub mod engine;
pub mod sentries;
pub mod window;

pub use engine::AlertEngine;
pub use sentries::{SentryHealthTracker, SentryRound};
