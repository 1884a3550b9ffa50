//! # Vigil Protocols
//!
//! Shared types and trait seams for the Vigil validator monitor.
//!
//! ## Core Concepts
//!
//! - **AlertLevel / AlertType**: the ordered severity scale and the closed
//!   set of named conditions tracked per validator
//! - **ValidatorAlertState**: the only state carried across polling rounds
//! - **ChainClient**: query seam to a chain's RPC surface
//! - **StatusNotifier**: delivery seam for outbound status messages

pub mod chain;
pub mod notify;
pub mod types;

pub use chain::{BlockInfo, ChainClient, ChainError, NodeStatus, SigningInfo};
pub use notify::{MessageHandle, NotificationContent, NotifyError, StatusNotifier};
pub use types::{
    ALERT_TYPES, AlertLevel, AlertType, SentryAlertType, SentryStats, ValidatorAlertNotification,
    ValidatorAlertState, ValidatorStats,
};
