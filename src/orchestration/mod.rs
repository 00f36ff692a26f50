//! Per-recipient evaluation and batch fan-out.

pub mod evaluator;
pub mod fanout;

pub use evaluator::{
    evaluate_snapshot, PreferenceSnapshot, RecipientEvaluator, DEFAULT_FANOUT_CONCURRENCY,
};
pub use fanout::{BatchSummary, RecipientOutcome};
