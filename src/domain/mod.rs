//! Domain types for the alert policy pipeline.
//!
//! This module provides:
//! - Identifier primitives: UserId, WalletId, ChainKey, Recipient
//! - Lossless native-unit amounts via the Decimal wrapper
//! - Classified events and their USD context
//! - Stored preference snapshots with total, lenient coercion
//! - Decision and the stable suppression-reason vocabulary

pub mod decimal;
pub mod decision;
pub mod event;
pub mod policy;
pub mod primitives;

pub use decimal::Decimal;
pub use decision::{Decision, MessageContext, SuppressionReason};
pub use event::{ClassifiedEvent, Direction, EventType, UsdContext};
pub use policy::{
    ActiveMute, AlertPolicy, CexFlowMode, GlobalPreferences, RawAlertPolicy, SmartFilterType,
    WalletOverride,
};
pub use primitives::{ChainKey, Recipient, UserId, WalletId};
