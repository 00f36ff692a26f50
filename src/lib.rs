pub mod cex;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod snapshot;

pub use cex::{AddressBookError, CexAddressBook, StaticAddressBook};
pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    ActiveMute, AlertPolicy, CexFlowMode, ChainKey, ClassifiedEvent, Decimal, Decision, Direction,
    EventType, GlobalPreferences, MessageContext, Recipient, SmartFilterType, SuppressionReason,
    UsdContext, UserId, WalletId, WalletOverride,
};
pub use error::EvalError;
pub use orchestration::{BatchSummary, RecipientEvaluator, RecipientOutcome};
pub use snapshot::{MockSnapshotSource, SnapshotError, SnapshotKind, SnapshotSource};
