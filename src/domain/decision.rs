//! Evaluation output: allow/suppress verdict with a stable reason code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable suppression-reason vocabulary, one per pipeline stage outcome.
///
/// Variants are declared in pipeline order, so `Ord` follows stage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionReason {
    #[serde(rename = "wallet_muted_24h")]
    WalletMuted24h,
    GlobalMute,
    QuietHours,
    TransferDisabled,
    SwapDisabled,
    LegacyMinAmount,
    ThresholdUsd,
    TypeFilter,
    DexInclude,
    DexExclude,
    CexTransferOnly,
    CexNotMatched,
    CexDirectionIn,
    CexDirectionOut,
}

impl SuppressionReason {
    pub const ALL: [SuppressionReason; 14] = [
        SuppressionReason::WalletMuted24h,
        SuppressionReason::GlobalMute,
        SuppressionReason::QuietHours,
        SuppressionReason::TransferDisabled,
        SuppressionReason::SwapDisabled,
        SuppressionReason::LegacyMinAmount,
        SuppressionReason::ThresholdUsd,
        SuppressionReason::TypeFilter,
        SuppressionReason::DexInclude,
        SuppressionReason::DexExclude,
        SuppressionReason::CexTransferOnly,
        SuppressionReason::CexNotMatched,
        SuppressionReason::CexDirectionIn,
        SuppressionReason::CexDirectionOut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SuppressionReason::WalletMuted24h => "wallet_muted_24h",
            SuppressionReason::GlobalMute => "global_mute",
            SuppressionReason::QuietHours => "quiet_hours",
            SuppressionReason::TransferDisabled => "transfer_disabled",
            SuppressionReason::SwapDisabled => "swap_disabled",
            SuppressionReason::LegacyMinAmount => "legacy_min_amount",
            SuppressionReason::ThresholdUsd => "threshold_usd",
            SuppressionReason::TypeFilter => "type_filter",
            SuppressionReason::DexInclude => "dex_include",
            SuppressionReason::DexExclude => "dex_exclude",
            SuppressionReason::CexTransferOnly => "cex_transfer_only",
            SuppressionReason::CexNotMatched => "cex_not_matched",
            SuppressionReason::CexDirectionIn => "cex_direction_in",
            SuppressionReason::CexDirectionOut => "cex_direction_out",
        }
    }
}

impl fmt::Display for SuppressionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// USD details handed to the message formatter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContext {
    pub usd_amount: Option<f64>,
    pub usd_unavailable: bool,
}

/// Verdict for one (recipient, event) pair.
///
/// `suppressed_reason` is `Some` iff `allowed` is false; use the constructors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub allowed: bool,
    pub suppressed_reason: Option<SuppressionReason>,
    pub message_context: MessageContext,
}

impl Decision {
    pub fn allow(message_context: MessageContext) -> Self {
        Decision {
            allowed: true,
            suppressed_reason: None,
            message_context,
        }
    }

    pub fn suppress(reason: SuppressionReason, message_context: MessageContext) -> Self {
        Decision {
            allowed: false,
            suppressed_reason: Some(reason),
            message_context,
        }
    }
}
