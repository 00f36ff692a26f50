//! Pure, synchronous pipeline stages.
//!
//! Every function here is deterministic in its inputs: time is passed in,
//! never read, and no stage touches shared state.

pub mod cex_flow;
pub mod dex;
pub mod quiet_hours;
pub mod semantic;
pub mod threshold;

pub use cex_flow::check_cex_flow;
pub use dex::canonicalize_dex;
pub use quiet_hours::is_quiet_at;
pub use semantic::check_semantic;
pub use threshold::{check_legacy_min_amount, evaluate_usd_threshold, ThresholdOutcome};
