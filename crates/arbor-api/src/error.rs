use thiserror::Error;

/// Top-level error type for the `arbor-api` crate.
///
/// Covers every failure mode of a single request against the tree
/// service: transport, HTTP status, and response decoding.
/// `arbor-core` maps these into the synchronizer's error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Server ──────────────────────────────────────────────────────
    /// The service answered with a non-success status.
    #[error("Tree API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The tree payload parsed but carried no root id.
    #[error("Tree response is missing the root id")]
    MissingRootId,
}

impl Error {
    /// Returns `true` if the request never produced a usable answer
    /// from the service (network failure, timeout, or a gateway status).
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    /// Returns `true` if the response body could not be decoded.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Deserialization { .. } | Self::MissingRootId)
    }

    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_statuses_are_unavailable() {
        for status in [502, 503, 504] {
            let err = Error::Api {
                status,
                message: String::new(),
            };
            assert!(err.is_unavailable(), "HTTP {status} should be unavailable");
        }
    }

    #[test]
    fn business_failures_are_not_unavailable() {
        let err = Error::Api {
            status: 500,
            message: "Node name must be unique".into(),
        };
        assert!(!err.is_unavailable());
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn missing_root_is_malformed() {
        assert!(Error::MissingRootId.is_malformed());
        assert!(
            Error::Deserialization {
                message: "eof".into(),
                body: String::new(),
            }
            .is_malformed()
        );
    }
}
