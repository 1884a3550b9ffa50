//! # Vigil Config
//!
//! YAML configuration for the Vigil validator monitor.
//!
//! ## Features
//!
//! - Schema types mirroring the persisted config file
//! - An explicit defaults struct and a one-shot resolution pass that turns
//!   optional fields into fully-populated thresholds
//! - Band-boundary validation (non-monotonic boundaries are rejected)
//! - `ConfigStore`: atomic whole-file persistence under a process-wide lock

pub mod defaults;
pub mod error;
pub mod schema;
pub mod store;

pub use defaults::{ResolvedThresholds, ThresholdDefaults};
pub use error::ConfigError;
pub use schema::{
    AlertsConfig, DiscordChannelConfig, DiscordWebhookConfig, NotificationsConfig, Sentry,
    ValidatorMonitor, VigilConfig,
};
pub use store::ConfigStore;
