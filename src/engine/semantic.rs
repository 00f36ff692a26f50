//! Semantic event filter: buy/sell/transfer type gate and DEX lists.

use super::dex::canonicalize_dex;
use crate::domain::{AlertPolicy, ClassifiedEvent, Direction, EventType, SmartFilterType, SuppressionReason};

/// Whether the event's semantic type matches the smart-filter type.
pub fn type_matches(filter: SmartFilterType, event: &ClassifiedEvent) -> bool {
    match filter {
        SmartFilterType::All => true,
        SmartFilterType::Transfer => event.event_type == EventType::Transfer,
        SmartFilterType::Buy => event.event_type == EventType::Swap && event.direction == Direction::In,
        SmartFilterType::Sell => {
            event.event_type == EventType::Swap && event.direction == Direction::Out
        }
    }
}

/// DEX allow/deny check for swaps. Exclude is checked first.
pub fn check_dex_lists(policy: &AlertPolicy, event: &ClassifiedEvent) -> Option<SuppressionReason> {
    if !event.is_swap() {
        return None;
    }

    let dex = event.dex.as_deref().and_then(canonicalize_dex);

    if let Some(ref id) = dex {
        if policy.exclude_dexes().iter().any(|ex| ex == id) {
            return Some(SuppressionReason::DexExclude);
        }
    }

    let include = policy.include_dexes();
    if !include.is_empty() {
        let listed = dex.as_ref().is_some_and(|id| include.iter().any(|inc| inc == id));
        if !listed {
            return Some(SuppressionReason::DexInclude);
        }
    }

    None
}

/// Run the type gate, then the DEX gate.
pub fn check_semantic(policy: &AlertPolicy, event: &ClassifiedEvent) -> Option<SuppressionReason> {
    if !type_matches(policy.smart_filter_type, event) {
        return Some(SuppressionReason::TypeFilter);
    }
    check_dex_lists(policy, event)
}
