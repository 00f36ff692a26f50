//! CEX flow filter: alert only on transfers to/from known exchanges.

use crate::cex::CexAddressBook;
use crate::domain::{CexFlowMode, ChainKey, ClassifiedEvent, Direction, SuppressionReason};

pub fn check_cex_flow(
    mode: CexFlowMode,
    event: &ClassifiedEvent,
    chain: &ChainKey,
    book: &dyn CexAddressBook,
) -> Option<SuppressionReason> {
    if mode == CexFlowMode::Off {
        return None;
    }

    if !event.is_transfer() {
        return Some(SuppressionReason::CexTransferOnly);
    }

    if book.resolve_tag(chain, &event.counterparty_address).is_none() {
        return Some(SuppressionReason::CexNotMatched);
    }

    match (mode, event.direction) {
        (CexFlowMode::In, Direction::Out) => Some(SuppressionReason::CexDirectionIn),
        (CexFlowMode::Out, Direction::In) => Some(SuppressionReason::CexDirectionOut),
        _ => None,
    }
}
