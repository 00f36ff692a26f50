//! Per-recipient fan-out for one event.

use super::evaluator::RecipientEvaluator;
use crate::domain::{ChainKey, ClassifiedEvent, Decision, Recipient, SuppressionReason, UsdContext};
use crate::error::EvalError;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Result of evaluating one recipient in a batch.
#[derive(Debug, Clone)]
pub struct RecipientOutcome {
    pub recipient: Recipient,
    pub result: Result<Decision, EvalError>,
}

impl RecipientOutcome {
    /// The decision when delivery is allowed.
    pub fn allowed(&self) -> Option<&Decision> {
        self.result.as_ref().ok().filter(|d| d.allowed)
    }
}

/// Counts over a batch, for caller-side metrics and logs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub allowed: usize,
    pub suppressed: BTreeMap<SuppressionReason, usize>,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[RecipientOutcome]) -> Self {
        let mut summary = BatchSummary::default();
        for outcome in outcomes {
            match &outcome.result {
                Ok(decision) => match decision.suppressed_reason {
                    Some(reason) => *summary.suppressed.entry(reason).or_insert(0) += 1,
                    None => summary.allowed += 1,
                },
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }

    pub fn total_suppressed(&self) -> usize {
        self.suppressed.values().sum()
    }
}

impl RecipientEvaluator {
    /// Evaluate every recipient independently, preserving input order.
    ///
    /// A failed load is reported in that recipient's outcome and never
    /// affects siblings.
    pub async fn evaluate_batch(
        &self,
        recipients: &[Recipient],
        event: &ClassifiedEvent,
        chain: &ChainKey,
        usd: &UsdContext,
        now: DateTime<Utc>,
    ) -> Vec<RecipientOutcome> {
        // Completion order frees slots; a slow recipient holds only its own.
        let mut indexed: Vec<(usize, RecipientOutcome)> =
            stream::iter(recipients.iter().enumerate())
                .map(|(idx, recipient)| async move {
                    let result = self.evaluate(recipient, event, chain, usd, now).await;
                    if let Err(ref e) = result {
                        warn!(recipient = %recipient, chain = %chain, "evaluation failed: {}", e);
                    }
                    let outcome = RecipientOutcome {
                        recipient: recipient.clone(),
                        result,
                    };
                    (idx, outcome)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        indexed.sort_unstable_by_key(|(idx, _)| *idx);
        let outcomes: Vec<RecipientOutcome> = indexed.into_iter().map(|(_, o)| o).collect();

        let summary = BatchSummary::from_outcomes(&outcomes);
        debug!(
            chain = %chain,
            allowed = summary.allowed,
            suppressed = summary.total_suppressed(),
            failed = summary.failed,
            "batch evaluated"
        );

        outcomes
    }
}
