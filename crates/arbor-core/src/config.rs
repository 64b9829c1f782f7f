// ── Runtime synchronizer configuration ──
//
// These types describe *which* tree to synchronize and how to reach it.
// They never touch disk: the CLI (or any other host) builds a
// `SyncConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use arbor_api::client::DEFAULT_NAMESPACE;

/// What to do with a request that arrives while another is in flight.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BusyPolicy {
    /// Fail immediately with [`CoreError::Busy`](crate::CoreError::Busy).
    #[default]
    Reject,
    /// Wait (FIFO) until the in-flight operation finishes.
    Queue,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for synchronizing a single remote tree.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Service base URL (e.g., `https://test.vmarmysh.com`).
    pub url: Url,
    /// Endpoint namespace prefix (e.g., `api.user`).
    pub namespace: String,
    /// Process-wide token naming the tree instance.
    pub tree_name: String,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout, enforced by the transport.
    pub timeout: Duration,
    /// Single-flight policy.
    pub busy_policy: BusyPolicy,
}

impl SyncConfig {
    /// Config with default namespace, TLS, timeout, and busy policy.
    pub fn new(url: Url, tree_name: impl Into<String>) -> Self {
        Self {
            url,
            namespace: DEFAULT_NAMESPACE.to_owned(),
            tree_name: tree_name.into(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            busy_policy: BusyPolicy::default(),
        }
    }
}
