//! Snapshot model and synchronizer between `arbor-api` and presentation layers.
//!
//! This crate owns the consistency model for a remote tree:
//!
//! - **[`TreeSynchronizer`]**: Holds the single authoritative snapshot.
//!   [`load()`](TreeSynchronizer::load) fetches it; the `request_*` methods
//!   dispatch one mutation and then reload the whole tree, replacing the
//!   snapshot wholesale. A failed reload keeps the last good snapshot.
//!   Only one operation is in flight at a time ([`BusyPolicy`]).
//!
//! - **[`SyncEvent`]**: Broadcast on every snapshot replacement and every
//!   failure, tagged with the [`FailureStage`] it happened at.
//!
//! - **[`SnapshotStream`]**: Subscription handle exposing `current()` /
//!   `latest()` / `changed()` for reactive rendering.
//!
//! - **Domain model** ([`model`]): [`Tree`], [`TreeNode`], and [`NodeId`],
//!   with a depth-first [`Tree::walk`] that is the only traversal shape
//!   consumers should rely on.

pub mod config;
pub mod convert;
pub mod error;
pub mod event;
pub mod intent;
pub mod model;
pub mod stream;
pub mod synchronizer;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{BusyPolicy, SyncConfig, TlsVerification};
pub use error::{CoreError, ErrorKind};
pub use event::{FailureStage, SyncEvent, SyncState};
pub use intent::MutationIntent;
pub use model::{NodeId, Tree, TreeEntry, TreeNode};
pub use stream::{SnapshotStream, SnapshotWatchStream};
pub use synchronizer::TreeSynchronizer;

pub use tokio_util::sync::CancellationToken;
