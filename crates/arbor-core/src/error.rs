// ── Core error types ──
//
// Errors surfaced by the synchronizer. Consumers never see raw transport
// errors: the `From<arbor_api::Error>` impl folds them into the
// unavailable / rejected / malformed split at the point of the call.

use strum::{Display, IntoStaticStr};
use thiserror::Error;

use crate::model::NodeId;

/// Unified error type for the core crate.
///
/// `Clone` so the same value can be returned to the caller and broadcast
/// to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Remote errors ────────────────────────────────────────────────
    #[error("Tree service unavailable: {reason}")]
    RemoteUnavailable { reason: String },

    #[error("Tree service rejected the request: {message}")]
    RemoteRejected {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Tree service returned a malformed response: {message}")]
    RemoteMalformed { message: String },

    // ── Local admission errors ───────────────────────────────────────
    #[error("Precondition failed: {message}")]
    Precondition { message: String },

    #[error("Another tree operation is already in flight")]
    Busy,

    #[error("Node not found: {id}")]
    NodeNotFound { id: NodeId },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Field-less discriminant of [`CoreError`], for matching and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    RemoteUnavailable,
    RemoteRejected,
    RemoteMalformed,
    Precondition,
    Busy,
    NodeNotFound,
    ValidationFailed,
    Config,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RemoteUnavailable { .. } => ErrorKind::RemoteUnavailable,
            Self::RemoteRejected { .. } => ErrorKind::RemoteRejected,
            Self::RemoteMalformed { .. } => ErrorKind::RemoteMalformed,
            Self::Precondition { .. } => ErrorKind::Precondition,
            Self::Busy => ErrorKind::Busy,
            Self::NodeNotFound { .. } => ErrorKind::NodeNotFound,
            Self::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// Returns `true` if the failure came from the remote round trip.
    pub fn is_remote(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RemoteUnavailable | ErrorKind::RemoteRejected | ErrorKind::RemoteMalformed
        )
    }

    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<arbor_api::Error> for CoreError {
    fn from(err: arbor_api::Error) -> Self {
        if err.is_unavailable() {
            return CoreError::RemoteUnavailable {
                reason: err.to_string(),
            };
        }

        match err {
            arbor_api::Error::Api { status, message } => CoreError::RemoteRejected {
                message,
                status: Some(status),
            },
            arbor_api::Error::Deserialization { message, body: _ } => {
                CoreError::RemoteMalformed { message }
            }
            arbor_api::Error::MissingRootId => CoreError::RemoteMalformed {
                message: "response lacks a root id".into(),
            },
            arbor_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            arbor_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            arbor_api::Error::Transport(e) => CoreError::RemoteUnavailable {
                reason: e.to_string(),
            },
        }
    }
}
