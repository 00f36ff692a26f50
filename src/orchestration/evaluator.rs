//! Recipient evaluator: load one recipient's snapshot, then run the stages.

use crate::cex::CexAddressBook;
use crate::domain::{
    ActiveMute, AlertPolicy, ChainKey, ClassifiedEvent, Decision, EventType, GlobalPreferences,
    MessageContext, Recipient, SuppressionReason, UsdContext, WalletOverride,
};
use crate::engine::{
    check_cex_flow, check_legacy_min_amount, check_semantic, evaluate_usd_threshold, is_quiet_at,
};
use crate::error::EvalError;
use crate::snapshot::{SnapshotKind, SnapshotSource};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_FANOUT_CONCURRENCY: usize = 32;

/// Everything stored about one recipient that the pipeline reads.
///
/// Missing global preferences and policy are already replaced by defaults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreferenceSnapshot {
    pub global: GlobalPreferences,
    pub policy: AlertPolicy,
    pub wallet_override: Option<WalletOverride>,
    pub active_mute: Option<ActiveMute>,
}

#[derive(Clone)]
pub struct RecipientEvaluator {
    snapshots: Arc<dyn SnapshotSource>,
    address_book: Arc<dyn CexAddressBook>,
    pub(crate) concurrency: usize,
}

impl RecipientEvaluator {
    pub fn new(snapshots: Arc<dyn SnapshotSource>, address_book: Arc<dyn CexAddressBook>) -> Self {
        Self {
            snapshots,
            address_book,
            concurrency: DEFAULT_FANOUT_CONCURRENCY,
        }
    }

    /// Cap on in-flight evaluations in `evaluate_batch`. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Issue the four snapshot loads concurrently and join them.
    pub async fn load_snapshot(
        &self,
        recipient: &Recipient,
        chain: &ChainKey,
    ) -> Result<PreferenceSnapshot, EvalError> {
        let user = &recipient.user_id;
        let wallet = &recipient.wallet_id;

        let (global, policy, wallet_override, active_mute) = tokio::try_join!(
            async {
                self.snapshots
                    .load_global_preferences(user)
                    .await
                    .map_err(|e| EvalError::load(SnapshotKind::GlobalPreferences, e))
            },
            async {
                self.snapshots
                    .load_alert_policy(user, chain)
                    .await
                    .map_err(|e| EvalError::load(SnapshotKind::AlertPolicy, e))
            },
            async {
                self.snapshots
                    .load_wallet_override(user, wallet)
                    .await
                    .map_err(|e| EvalError::load(SnapshotKind::WalletOverride, e))
            },
            async {
                self.snapshots
                    .load_active_mute(user, chain, wallet)
                    .await
                    .map_err(|e| EvalError::load(SnapshotKind::ActiveMute, e))
            },
        )?;

        Ok(PreferenceSnapshot {
            global: global.unwrap_or_default(),
            policy: policy.unwrap_or_default(),
            wallet_override,
            active_mute,
        })
    }

    /// Decide for one recipient at `now`.
    pub async fn evaluate(
        &self,
        recipient: &Recipient,
        event: &ClassifiedEvent,
        chain: &ChainKey,
        usd: &UsdContext,
        now: DateTime<Utc>,
    ) -> Result<Decision, EvalError> {
        let snapshot = self.load_snapshot(recipient, chain).await?;
        let decision = evaluate_snapshot(&snapshot, event, chain, usd, self.address_book.as_ref(), now);

        if let Some(reason) = decision.suppressed_reason {
            debug!(
                user = %recipient.user_id,
                wallet = %recipient.wallet_id,
                chain = %chain,
                reason = %reason,
                "alert suppressed"
            );
        }

        Ok(decision)
    }

    /// `evaluate` against the wall clock.
    pub async fn evaluate_now(
        &self,
        recipient: &Recipient,
        event: &ClassifiedEvent,
        chain: &ChainKey,
        usd: &UsdContext,
    ) -> Result<Decision, EvalError> {
        self.evaluate(recipient, event, chain, usd, Utc::now()).await
    }
}

impl std::fmt::Debug for RecipientEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipientEvaluator")
            .field("snapshots", &self.snapshots)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

/// Run the stage pipeline over a loaded snapshot.
///
/// Stages run in fixed order and the first suppression wins:
/// wallet mute, global mute, quiet hours, event-type toggle, legacy native
/// minimum, USD threshold, semantic filter, CEX flow.
pub fn evaluate_snapshot(
    snapshot: &PreferenceSnapshot,
    event: &ClassifiedEvent,
    chain: &ChainKey,
    usd: &UsdContext,
    address_book: &dyn CexAddressBook,
    now: DateTime<Utc>,
) -> Decision {
    let PreferenceSnapshot {
        global,
        policy,
        wallet_override,
        active_mute,
    } = snapshot;

    let raw_context = MessageContext {
        usd_amount: usd.finite_amount(),
        usd_unavailable: usd.usd_unavailable,
    };
    let suppress = |reason| Decision::suppress(reason, raw_context);

    if active_mute.is_some_and(|mute| mute.is_active_at(now)) {
        return suppress(SuppressionReason::WalletMuted24h);
    }

    if global.is_muted_at(now) {
        return suppress(SuppressionReason::GlobalMute);
    }

    if is_quiet_at(
        policy.quiet_from.as_deref(),
        policy.quiet_to.as_deref(),
        &policy.timezone,
        now,
    ) {
        return suppress(SuppressionReason::QuietHours);
    }

    let (allow_transfer, allow_swap) = match wallet_override {
        Some(o) => (o.allow_transfer, o.allow_swap),
        None => (global.allow_transfer, global.allow_swap),
    };
    match event.event_type {
        EventType::Transfer if !allow_transfer => {
            return suppress(SuppressionReason::TransferDisabled)
        }
        EventType::Swap if !allow_swap => return suppress(SuppressionReason::SwapDisabled),
        _ => {}
    }

    if let Some(reason) = check_legacy_min_amount(global.min_amount, event.value_formatted.as_deref()) {
        return suppress(reason);
    }

    let threshold = evaluate_usd_threshold(policy, usd);
    let resolved_context = MessageContext {
        usd_amount: threshold.usd_amount,
        usd_unavailable: threshold.usd_unavailable,
    };
    if !threshold.allowed {
        return Decision::suppress(SuppressionReason::ThresholdUsd, resolved_context);
    }

    if let Some(reason) = check_semantic(policy, event) {
        return Decision::suppress(reason, resolved_context);
    }

    if let Some(reason) = check_cex_flow(policy.cex_flow_mode, event, chain, address_book) {
        return Decision::suppress(reason, resolved_context);
    }

    // The unavailability warning only matters when a threshold depends on price.
    Decision::allow(MessageContext {
        usd_amount: threshold.usd_amount,
        usd_unavailable: threshold.usd_unavailable && policy.has_usd_threshold(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cex::StaticAddressBook;
    use crate::domain::{CexFlowMode, Decimal, Direction, SmartFilterType, UserId, WalletId};
    use crate::snapshot::MockSnapshotSource;
    use chrono::{Duration, TimeZone};

    const BINANCE_HOT: &str = "0x28C6c06298d514Db089934071355E5743bf21d60";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 14, 30, 0).unwrap()
    }

    fn eth() -> ChainKey {
        ChainKey::new("ethereum")
    }

    fn book() -> StaticAddressBook {
        StaticAddressBook::builtin()
    }

    fn run(snapshot: &PreferenceSnapshot, event: &ClassifiedEvent, usd: &UsdContext) -> Decision {
        evaluate_snapshot(snapshot, event, &eth(), usd, &book(), now())
    }

    fn transfer_out() -> ClassifiedEvent {
        ClassifiedEvent::transfer(Direction::Out, BINANCE_HOT).with_value("2.5")
    }

    #[test]
    fn test_default_snapshot_allows_everything() {
        let snapshot = PreferenceSnapshot::default();
        let decision = run(&snapshot, &transfer_out(), &UsdContext::priced(10.0));
        assert_eq!(decision, Decision::allow(MessageContext {
            usd_amount: Some(10.0),
            usd_unavailable: false,
        }));
    }

    #[test]
    fn test_wallet_mute_beats_everything() {
        let snapshot = PreferenceSnapshot {
            active_mute: Some(ActiveMute {
                mute_until: now() + Duration::hours(24),
            }),
            global: GlobalPreferences {
                muted_until: Some(now() + Duration::hours(1)),
                allow_transfer: false,
                ..GlobalPreferences::default()
            },
            ..PreferenceSnapshot::default()
        };
        let decision = run(&snapshot, &transfer_out(), &UsdContext::priced(10.0));
        assert_eq!(decision.suppressed_reason, Some(SuppressionReason::WalletMuted24h));
        assert!(!decision.allowed);
    }

    #[test]
    fn test_expired_wallet_mute_is_ignored() {
        let snapshot = PreferenceSnapshot {
            active_mute: Some(ActiveMute {
                mute_until: now() - Duration::minutes(1),
            }),
            ..PreferenceSnapshot::default()
        };
        assert!(run(&snapshot, &transfer_out(), &UsdContext::priced(10.0)).allowed);
    }

    #[test]
    fn test_global_mute_before_quiet_hours() {
        let snapshot = PreferenceSnapshot {
            global: GlobalPreferences {
                muted_until: Some(now() + Duration::hours(1)),
                ..GlobalPreferences::default()
            },
            policy: AlertPolicy::default().with_quiet_hours("00:00", "00:00", "UTC"),
            ..PreferenceSnapshot::default()
        };
        let decision = run(&snapshot, &transfer_out(), &UsdContext::priced(10.0));
        assert_eq!(decision.suppressed_reason, Some(SuppressionReason::GlobalMute));
    }

    #[test]
    fn test_quiet_hours_stage() {
        let snapshot = PreferenceSnapshot {
            policy: AlertPolicy::default().with_quiet_hours("14:00", "15:00", "UTC"),
            ..PreferenceSnapshot::default()
        };
        let decision = run(&snapshot, &transfer_out(), &UsdContext::priced(10.0));
        assert_eq!(decision.suppressed_reason, Some(SuppressionReason::QuietHours));
    }

    #[test]
    fn test_wallet_override_replaces_global_flags() {
        let snapshot = PreferenceSnapshot {
            global: GlobalPreferences {
                allow_transfer: false,
                allow_swap: true,
                ..GlobalPreferences::default()
            },
            wallet_override: Some(WalletOverride {
                allow_transfer: true,
                allow_swap: false,
            }),
            ..PreferenceSnapshot::default()
        };
        assert!(run(&snapshot, &transfer_out(), &UsdContext::priced(10.0)).allowed);

        let swap = ClassifiedEvent::swap(Direction::In, Some("Uniswap"));
        let decision = run(&snapshot, &swap, &UsdContext::priced(10.0));
        assert_eq!(decision.suppressed_reason, Some(SuppressionReason::SwapDisabled));
    }

    #[test]
    fn test_global_flags_apply_without_override() {
        let snapshot = PreferenceSnapshot {
            global: GlobalPreferences {
                allow_transfer: false,
                ..GlobalPreferences::default()
            },
            ..PreferenceSnapshot::default()
        };
        let decision = run(&snapshot, &transfer_out(), &UsdContext::priced(10.0));
        assert_eq!(decision.suppressed_reason, Some(SuppressionReason::TransferDisabled));
    }

    #[test]
    fn test_legacy_min_amount_before_usd_threshold() {
        let snapshot = PreferenceSnapshot {
            global: GlobalPreferences {
                min_amount: Decimal::from_str_canonical("5").unwrap(),
                ..GlobalPreferences::default()
            },
            policy: AlertPolicy::default().with_thresholds(1_000_000.0, 0.0),
            ..PreferenceSnapshot::default()
        };
        let decision = run(&snapshot, &transfer_out(), &UsdContext::priced(10.0));
        assert_eq!(decision.suppressed_reason, Some(SuppressionReason::LegacyMinAmount));
    }

    #[test]
    fn test_threshold_suppression_carries_resolved_amount() {
        let snapshot = PreferenceSnapshot {
            policy: AlertPolicy::default().with_thresholds(1000.0, 5000.0),
            ..PreferenceSnapshot::default()
        };
        let decision = run(&snapshot, &transfer_out(), &UsdContext::priced(3000.0));
        assert_eq!(decision.suppressed_reason, Some(SuppressionReason::ThresholdUsd));
        assert_eq!(decision.message_context.usd_amount, Some(3000.0));
    }

    #[test]
    fn test_unavailable_warning_only_with_threshold() {
        let with_threshold = PreferenceSnapshot {
            policy: AlertPolicy::default().with_thresholds(1000.0, 0.0),
            ..PreferenceSnapshot::default()
        };
        let decision = run(&with_threshold, &transfer_out(), &UsdContext::unavailable());
        assert!(decision.allowed);
        assert!(decision.message_context.usd_unavailable);
        assert_eq!(decision.message_context.usd_amount, None);

        let without = PreferenceSnapshot::default();
        let decision = run(&without, &transfer_out(), &UsdContext::unavailable());
        assert!(decision.allowed);
        assert!(!decision.message_context.usd_unavailable);
    }

    #[test]
    fn test_semantic_then_cex() {
        let snapshot = PreferenceSnapshot {
            policy: AlertPolicy::default()
                .with_smart_filter(SmartFilterType::Transfer)
                .with_cex_flow_mode(CexFlowMode::Out),
            ..PreferenceSnapshot::default()
        };
        let swap = ClassifiedEvent::swap(Direction::Out, Some("Uniswap"));
        let decision = run(&snapshot, &swap, &UsdContext::priced(10.0));
        assert_eq!(decision.suppressed_reason, Some(SuppressionReason::TypeFilter));

        let unmatched = ClassifiedEvent::transfer(Direction::Out, "0x1111111111111111111111111111111111111111");
        let decision = run(&snapshot, &unmatched, &UsdContext::priced(10.0));
        assert_eq!(decision.suppressed_reason, Some(SuppressionReason::CexNotMatched));

        assert!(run(&snapshot, &transfer_out(), &UsdContext::priced(10.0)).allowed);
    }

    #[tokio::test]
    async fn test_evaluate_loads_fresh_snapshot() {
        let user = UserId::new("u1");
        let wallet = WalletId::new("w1");
        let source = MockSnapshotSource::new().with_alert_policy(
            &user,
            &eth(),
            AlertPolicy::default().with_cex_flow_mode(CexFlowMode::In),
        );
        let evaluator = RecipientEvaluator::new(Arc::new(source.clone()), Arc::new(book()));
        let recipient = Recipient::new(user, wallet);

        let decision = evaluator
            .evaluate(&recipient, &transfer_out(), &eth(), &UsdContext::priced(1.0), now())
            .await
            .unwrap();
        assert_eq!(decision.suppressed_reason, Some(SuppressionReason::CexDirectionIn));
        assert_eq!(source.load_count(), 4);
    }

    #[tokio::test]
    async fn test_evaluate_surfaces_load_failure() {
        let user = UserId::new("u1");
        let source = MockSnapshotSource::new().with_failure(&user, SnapshotKind::ActiveMute);
        let evaluator = RecipientEvaluator::new(Arc::new(source), Arc::new(book()));
        let recipient = Recipient::new(user, WalletId::new("w1"));

        let err = evaluator
            .evaluate(&recipient, &transfer_out(), &eth(), &UsdContext::priced(1.0), now())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), SnapshotKind::ActiveMute);
    }
}
