//! Snapshot loaders: the four independent reads behind one evaluation.

use crate::domain::{
    ActiveMute, AlertPolicy, ChainKey, GlobalPreferences, UserId, WalletId, WalletOverride,
};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod mock;

pub use mock::MockSnapshotSource;

/// Read access to a subscriber's stored preferences.
///
/// Each method returns `Ok(None)` for "not found"; `Err` is reserved for
/// I/O failures. Implementations must be safe to call concurrently.
#[async_trait]
pub trait SnapshotSource: Send + Sync + fmt::Debug {
    /// Subscriber-wide preferences, keyed by user.
    async fn load_global_preferences(
        &self,
        user: &UserId,
    ) -> Result<Option<GlobalPreferences>, SnapshotError>;

    /// Alert policy, keyed by user and chain.
    async fn load_alert_policy(
        &self,
        user: &UserId,
        chain: &ChainKey,
    ) -> Result<Option<AlertPolicy>, SnapshotError>;

    /// Per-wallet event-type override, keyed by user and wallet.
    async fn load_wallet_override(
        &self,
        user: &UserId,
        wallet: &WalletId,
    ) -> Result<Option<WalletOverride>, SnapshotError>;

    /// Active mute, keyed by user, chain and wallet. May be expired.
    async fn load_active_mute(
        &self,
        user: &UserId,
        chain: &ChainKey,
        wallet: &WalletId,
    ) -> Result<Option<ActiveMute>, SnapshotError>;
}

/// Error type for snapshot loads.
#[derive(Debug, Clone, Error)]
pub enum SnapshotError {
    /// Backing store failed (connection, query, pool exhaustion).
    #[error("backend error: {0}")]
    Backend(String),
    /// A row was returned but could not be decoded at all.
    #[error("decode error: {0}")]
    Decode(String),
    /// The store is temporarily unavailable.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for SnapshotError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                SnapshotError::Unavailable(err.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                SnapshotError::Decode(err.to_string())
            }
            other => SnapshotError::Backend(other.to_string()),
        }
    }
}

/// Which of the four snapshots a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    GlobalPreferences,
    AlertPolicy,
    WalletOverride,
    ActiveMute,
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotKind::GlobalPreferences => write!(f, "global_preferences"),
            SnapshotKind::AlertPolicy => write!(f, "alert_policy"),
            SnapshotKind::WalletOverride => write!(f, "wallet_override"),
            SnapshotKind::ActiveMute => write!(f, "active_mute"),
        }
    }
}
