use crate::snapshot::{SnapshotError, SnapshotKind};
use thiserror::Error;

/// Per-recipient evaluation failure.
///
/// Only snapshot loads can fail; the stage pipeline itself is total.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    #[error("failed to load {kind}: {source}")]
    Load {
        kind: SnapshotKind,
        #[source]
        source: SnapshotError,
    },
}

impl EvalError {
    pub fn load(kind: SnapshotKind, source: SnapshotError) -> Self {
        EvalError::Load { kind, source }
    }

    /// Which snapshot failed to load.
    pub fn kind(&self) -> SnapshotKind {
        match self {
            EvalError::Load { kind, .. } => *kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_error_display() {
        let err = EvalError::load(
            SnapshotKind::WalletOverride,
            SnapshotError::Backend("database is locked".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "failed to load wallet_override: backend error: database is locked"
        );
        assert_eq!(err.kind(), SnapshotKind::WalletOverride);
    }
}
