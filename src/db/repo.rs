//! SQLite-backed snapshot source.
//!
//! Reads are lenient: a column that fails to decode is treated as NULL and
//! then coerced like any other missing value. Only query failures surface.

use crate::domain::{
    policy::DEFAULT_TIMEZONE, ActiveMute, AlertPolicy, ChainKey, Decimal, GlobalPreferences,
    RawAlertPolicy, UserId, WalletId, WalletOverride,
};
use crate::snapshot::{SnapshotError, SnapshotSource};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::{Sqlite, SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::debug;

/// Repository for preference snapshots.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
    default_timezone: String,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository {
            pool,
            default_timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }

    /// Timezone applied to policies stored without one.
    pub fn with_default_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.default_timezone = timezone.into();
        self
    }

    /// Insert or replace a subscriber's global preferences.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn save_global_preferences(
        &self,
        user: &UserId,
        prefs: &GlobalPreferences,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO global_preferences (
                user_id, min_amount, allow_transfer, allow_swap, muted_until_ms, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                min_amount = excluded.min_amount,
                allow_transfer = excluded.allow_transfer,
                allow_swap = excluded.allow_swap,
                muted_until_ms = excluded.muted_until_ms,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user.as_str())
        .bind(prefs.min_amount.to_canonical_string())
        .bind(prefs.allow_transfer as i64)
        .bind(prefs.allow_swap as i64)
        .bind(prefs.muted_until.map(|t| t.timestamp_millis()))
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace a subscriber's policy for one chain.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn save_alert_policy(
        &self,
        user: &UserId,
        chain: &ChainKey,
        policy: &AlertPolicy,
    ) -> Result<(), sqlx::Error> {
        let include = serde_json::Value::from(policy.include_dexes().to_vec()).to_string();
        let exclude = serde_json::Value::from(policy.exclude_dexes().to_vec()).to_string();

        sqlx::query(
            r#"
            INSERT INTO alert_policies (
                user_id, chain_key, threshold_usd, min_amount_usd, cex_flow_mode,
                smart_filter_type, include_dexes, exclude_dexes, quiet_from, quiet_to,
                timezone, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, chain_key) DO UPDATE SET
                threshold_usd = excluded.threshold_usd,
                min_amount_usd = excluded.min_amount_usd,
                cex_flow_mode = excluded.cex_flow_mode,
                smart_filter_type = excluded.smart_filter_type,
                include_dexes = excluded.include_dexes,
                exclude_dexes = excluded.exclude_dexes,
                quiet_from = excluded.quiet_from,
                quiet_to = excluded.quiet_to,
                timezone = excluded.timezone,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user.as_str())
        .bind(chain.as_str())
        .bind(policy.threshold_usd().to_string())
        .bind(policy.min_amount_usd().to_string())
        .bind(policy.cex_flow_mode.as_str())
        .bind(policy.smart_filter_type.as_str())
        .bind(include)
        .bind(exclude)
        .bind(policy.quiet_from.as_deref())
        .bind(policy.quiet_to.as_deref())
        .bind(policy.timezone.as_str())
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace a per-wallet override.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn save_wallet_override(
        &self,
        user: &UserId,
        wallet: &WalletId,
        wallet_override: &WalletOverride,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO wallet_overrides (user_id, wallet_id, allow_transfer, allow_swap, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id, wallet_id) DO UPDATE SET
                allow_transfer = excluded.allow_transfer,
                allow_swap = excluded.allow_swap,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user.as_str())
        .bind(wallet.as_str())
        .bind(wallet_override.allow_transfer as i64)
        .bind(wallet_override.allow_swap as i64)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or extend a wallet mute.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn save_active_mute(
        &self,
        user: &UserId,
        chain: &ChainKey,
        wallet: &WalletId,
        mute: &ActiveMute,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO active_mutes (user_id, chain_key, wallet_id, mute_until_ms)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, chain_key, wallet_id) DO UPDATE SET
                mute_until_ms = excluded.mute_until_ms
            "#,
        )
        .bind(user.as_str())
        .bind(chain.as_str())
        .bind(wallet.as_str())
        .bind(mute.mute_until.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SnapshotSource for Repository {
    async fn load_global_preferences(
        &self,
        user: &UserId,
    ) -> Result<Option<GlobalPreferences>, SnapshotError> {
        let row = sqlx::query(
            r#"
            SELECT min_amount, allow_transfer, allow_swap, muted_until_ms
            FROM global_preferences
            WHERE user_id = ?
            "#,
        )
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| GlobalPreferences {
            min_amount: lenient::<String>(&row, "min_amount")
                .map(|s| Decimal::parse_or_zero(&s))
                .unwrap_or_default(),
            allow_transfer: flag(lenient(&row, "allow_transfer")),
            allow_swap: flag(lenient(&row, "allow_swap")),
            muted_until: lenient::<i64>(&row, "muted_until_ms").and_then(millis_to_utc),
        }))
    }

    async fn load_alert_policy(
        &self,
        user: &UserId,
        chain: &ChainKey,
    ) -> Result<Option<AlertPolicy>, SnapshotError> {
        let row = sqlx::query(
            r#"
            SELECT threshold_usd, min_amount_usd, cex_flow_mode, smart_filter_type,
                   include_dexes, exclude_dexes, quiet_from, quiet_to, timezone
            FROM alert_policies
            WHERE user_id = ? AND chain_key = ?
            "#,
        )
        .bind(user.as_str())
        .bind(chain.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            RawAlertPolicy {
                threshold_usd: lenient(&row, "threshold_usd"),
                min_amount_usd: lenient(&row, "min_amount_usd"),
                cex_flow_mode: lenient(&row, "cex_flow_mode"),
                smart_filter_type: lenient(&row, "smart_filter_type"),
                include_dexes: lenient(&row, "include_dexes"),
                exclude_dexes: lenient(&row, "exclude_dexes"),
                quiet_from: lenient(&row, "quiet_from"),
                quiet_to: lenient(&row, "quiet_to"),
                timezone: lenient(&row, "timezone"),
            }
            .into_policy(&self.default_timezone)
        }))
    }

    async fn load_wallet_override(
        &self,
        user: &UserId,
        wallet: &WalletId,
    ) -> Result<Option<WalletOverride>, SnapshotError> {
        let row = sqlx::query(
            r#"
            SELECT allow_transfer, allow_swap
            FROM wallet_overrides
            WHERE user_id = ? AND wallet_id = ?
            "#,
        )
        .bind(user.as_str())
        .bind(wallet.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| WalletOverride {
            allow_transfer: flag(lenient(&row, "allow_transfer")),
            allow_swap: flag(lenient(&row, "allow_swap")),
        }))
    }

    async fn load_active_mute(
        &self,
        user: &UserId,
        chain: &ChainKey,
        wallet: &WalletId,
    ) -> Result<Option<ActiveMute>, SnapshotError> {
        let row = sqlx::query(
            r#"
            SELECT mute_until_ms
            FROM active_mutes
            WHERE user_id = ? AND chain_key = ? AND wallet_id = ?
            "#,
        )
        .bind(user.as_str())
        .bind(chain.as_str())
        .bind(wallet.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .and_then(|row| lenient::<i64>(&row, "mute_until_ms"))
            .and_then(millis_to_utc)
            .map(|mute_until| ActiveMute { mute_until }))
    }
}

/// Decode a nullable column, treating undecodable values as NULL.
fn lenient<'r, T>(row: &'r SqliteRow, column: &str) -> Option<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    match row.try_get::<Option<T>, _>(column) {
        Ok(value) => value,
        Err(e) => {
            debug!("ignoring undecodable column {}: {}", column, e);
            None
        }
    }
}

/// Stored booleans: only an explicit 0 disables.
fn flag(value: Option<i64>) -> bool {
    value != Some(0)
}

fn millis_to_utc(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::domain::{CexFlowMode, SmartFilterType};
    use tempfile::TempDir;

    async fn setup_repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("prefs.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    #[test]
    fn test_flag_only_zero_disables() {
        assert!(!flag(Some(0)));
        assert!(flag(Some(1)));
        assert!(flag(Some(7)));
        assert!(flag(None));
    }

    #[tokio::test]
    async fn test_missing_rows_load_as_none() {
        let (repo, _temp) = setup_repo().await;
        let user = UserId::new("nobody");
        let chain = ChainKey::new("ethereum");
        let wallet = WalletId::new("w");

        assert_eq!(repo.load_global_preferences(&user).await.unwrap(), None);
        assert_eq!(repo.load_alert_policy(&user, &chain).await.unwrap(), None);
        assert_eq!(repo.load_wallet_override(&user, &wallet).await.unwrap(), None);
        assert_eq!(repo.load_active_mute(&user, &chain, &wallet).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_policy_save_and_load() {
        let (repo, _temp) = setup_repo().await;
        let user = UserId::new("alice");
        let chain = ChainKey::new("bsc");
        let policy = AlertPolicy::default()
            .with_thresholds(250.0, 100.0)
            .with_cex_flow_mode(CexFlowMode::Out)
            .with_smart_filter(SmartFilterType::Sell)
            .with_dex_lists(["PancakeSwap V3"], ["1inch"])
            .with_quiet_hours("23:00", "07:00", "Europe/Berlin");

        repo.save_alert_policy(&user, &chain, &policy).await.unwrap();
        let loaded = repo.load_alert_policy(&user, &chain).await.unwrap();
        assert_eq!(loaded, Some(policy));
    }

    #[tokio::test]
    async fn test_global_preferences_save_overwrites() {
        let (repo, _temp) = setup_repo().await;
        let user = UserId::new("alice");
        let muted = Utc.timestamp_millis_opt(1_900_000_000_000).single().unwrap();

        let first = GlobalPreferences {
            min_amount: Decimal::from_str_canonical("0.25").unwrap(),
            allow_transfer: false,
            allow_swap: true,
            muted_until: Some(muted),
        };
        repo.save_global_preferences(&user, &first).await.unwrap();
        assert_eq!(repo.load_global_preferences(&user).await.unwrap(), Some(first));

        let second = GlobalPreferences::default();
        repo.save_global_preferences(&user, &second).await.unwrap();
        assert_eq!(repo.load_global_preferences(&user).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_default_timezone_applies_to_blank_rows() {
        let (repo, _temp) = setup_repo().await;
        let repo = repo.with_default_timezone("Asia/Singapore");
        sqlx::query("INSERT INTO alert_policies (user_id, chain_key, timezone) VALUES ('u', 'tron', '')")
            .execute(&repo.pool)
            .await
            .unwrap();

        let policy = repo
            .load_alert_policy(&UserId::new("u"), &ChainKey::new("tron"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(policy.timezone, "Asia/Singapore");
    }
}
