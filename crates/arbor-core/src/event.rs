// ── Synchronizer state and notifications ──

use std::sync::Arc;

use strum::Display;

use crate::error::CoreError;
use crate::intent::MutationIntent;
use crate::model::Tree;

/// Where the synchronizer is in its per-intent state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SyncState {
    #[default]
    Idle,
    MutationRequested,
    MutationInFlight,
    Reconciling,
}

/// The step at which an operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureStage {
    /// Refused locally before any request was sent (busy, precondition,
    /// unknown node, empty name).
    Validation,
    /// The create/rename/delete call failed. No reconciliation was issued.
    Mutation,
    /// The follow-up (or initial) tree fetch failed. The previous
    /// snapshot is still in place.
    Reconciliation,
}

/// Broadcast to every subscriber of [`TreeSynchronizer::subscribe`](crate::TreeSynchronizer::subscribe).
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A fetch succeeded and the snapshot was replaced.
    SnapshotReplaced {
        snapshot: Arc<Tree>,
        /// The intent that triggered the reload; `None` for a plain load.
        cause: Option<MutationIntent>,
    },
    /// An intent or load failed.
    Failed {
        intent: Option<MutationIntent>,
        stage: FailureStage,
        error: CoreError,
    },
}

impl SyncEvent {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn error(&self) -> Option<&CoreError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            Self::SnapshotReplaced { .. } => None,
        }
    }
}
