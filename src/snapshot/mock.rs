//! In-memory snapshot source for tests and replays.

use super::{SnapshotError, SnapshotKind, SnapshotSource};
use crate::domain::{
    ActiveMute, AlertPolicy, ChainKey, GlobalPreferences, UserId, WalletId, WalletOverride,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Mock snapshot source returning predefined snapshots.
///
/// Supports injected failures and per-user latency so callers can exercise
/// per-recipient isolation.
#[derive(Debug, Clone, Default)]
pub struct MockSnapshotSource {
    globals: HashMap<UserId, GlobalPreferences>,
    policies: HashMap<(UserId, ChainKey), AlertPolicy>,
    overrides: HashMap<(UserId, WalletId), WalletOverride>,
    mutes: HashMap<(UserId, ChainKey, WalletId), ActiveMute>,
    failures: HashSet<(UserId, SnapshotKind)>,
    delays: HashMap<UserId, Duration>,
    loads: Arc<AtomicUsize>,
}

impl MockSnapshotSource {
    /// Create a new mock with no stored snapshots.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_global_preferences(mut self, user: &UserId, prefs: GlobalPreferences) -> Self {
        self.globals.insert(user.clone(), prefs);
        self
    }

    pub fn with_alert_policy(mut self, user: &UserId, chain: &ChainKey, policy: AlertPolicy) -> Self {
        self.policies.insert((user.clone(), chain.clone()), policy);
        self
    }

    pub fn with_wallet_override(
        mut self,
        user: &UserId,
        wallet: &WalletId,
        wallet_override: WalletOverride,
    ) -> Self {
        self.overrides
            .insert((user.clone(), wallet.clone()), wallet_override);
        self
    }

    pub fn with_active_mute(
        mut self,
        user: &UserId,
        chain: &ChainKey,
        wallet: &WalletId,
        mute: ActiveMute,
    ) -> Self {
        self.mutes
            .insert((user.clone(), chain.clone(), wallet.clone()), mute);
        self
    }

    /// Make one of the user's loads fail with a backend error.
    pub fn with_failure(mut self, user: &UserId, kind: SnapshotKind) -> Self {
        self.failures.insert((user.clone(), kind));
        self
    }

    /// Delay every load for the user.
    pub fn with_delay(mut self, user: &UserId, delay: Duration) -> Self {
        self.delays.insert(user.clone(), delay);
        self
    }

    /// Total number of load calls served.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    async fn begin(&self, user: &UserId, kind: SnapshotKind) -> Result<(), SnapshotError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(user) {
            tokio::time::sleep(*delay).await;
        }
        if self.failures.contains(&(user.clone(), kind)) {
            return Err(SnapshotError::Backend(format!(
                "injected {} failure for {}",
                kind, user
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotSource for MockSnapshotSource {
    async fn load_global_preferences(
        &self,
        user: &UserId,
    ) -> Result<Option<GlobalPreferences>, SnapshotError> {
        self.begin(user, SnapshotKind::GlobalPreferences).await?;
        Ok(self.globals.get(user).cloned())
    }

    async fn load_alert_policy(
        &self,
        user: &UserId,
        chain: &ChainKey,
    ) -> Result<Option<AlertPolicy>, SnapshotError> {
        self.begin(user, SnapshotKind::AlertPolicy).await?;
        Ok(self.policies.get(&(user.clone(), chain.clone())).cloned())
    }

    async fn load_wallet_override(
        &self,
        user: &UserId,
        wallet: &WalletId,
    ) -> Result<Option<WalletOverride>, SnapshotError> {
        self.begin(user, SnapshotKind::WalletOverride).await?;
        Ok(self.overrides.get(&(user.clone(), wallet.clone())).copied())
    }

    async fn load_active_mute(
        &self,
        user: &UserId,
        chain: &ChainKey,
        wallet: &WalletId,
    ) -> Result<Option<ActiveMute>, SnapshotError> {
        self.begin(user, SnapshotKind::ActiveMute).await?;
        Ok(self
            .mutes
            .get(&(user.clone(), chain.clone(), wallet.clone()))
            .copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SmartFilterType;

    fn alice() -> UserId {
        UserId::new("alice")
    }

    #[tokio::test]
    async fn test_mock_returns_stored_policy_per_chain() {
        let eth = ChainKey::new("ethereum");
        let policy = AlertPolicy::default().with_smart_filter(SmartFilterType::Buy);
        let mock = MockSnapshotSource::new().with_alert_policy(&alice(), &eth, policy.clone());

        let loaded = mock.load_alert_policy(&alice(), &eth).await.unwrap();
        assert_eq!(loaded, Some(policy));

        let other = mock
            .load_alert_policy(&alice(), &ChainKey::new("tron"))
            .await
            .unwrap();
        assert_eq!(other, None);
    }

    #[tokio::test]
    async fn test_mock_not_found_is_none() {
        let mock = MockSnapshotSource::new();
        let wallet = WalletId::new("w1");
        assert_eq!(mock.load_global_preferences(&alice()).await.unwrap(), None);
        assert_eq!(mock.load_wallet_override(&alice(), &wallet).await.unwrap(), None);
        assert_eq!(mock.load_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_injected_failure_is_scoped() {
        let bob = UserId::new("bob");
        let mock = MockSnapshotSource::new().with_failure(&alice(), SnapshotKind::GlobalPreferences);

        let err = mock.load_global_preferences(&alice()).await.unwrap_err();
        assert!(matches!(err, SnapshotError::Backend(_)));
        assert!(mock.load_global_preferences(&bob).await.is_ok());
        assert!(mock
            .load_alert_policy(&alice(), &ChainKey::new("ethereum"))
            .await
            .is_ok());
    }

    #[test]
    fn test_mock_usable_from_sync_context() {
        let mock = MockSnapshotSource::new().with_wallet_override(
            &alice(),
            &WalletId::new("w1"),
            WalletOverride {
                allow_transfer: false,
                allow_swap: true,
            },
        );
        let loaded =
            tokio_test::block_on(mock.load_wallet_override(&alice(), &WalletId::new("w1")))
                .unwrap();
        assert_eq!(loaded.map(|o| o.allow_transfer), Some(false));
    }
}
