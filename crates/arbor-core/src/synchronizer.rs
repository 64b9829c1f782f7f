// ── Tree synchronizer ──
//
// Owns the snapshot of one remote tree. Every mutation is dispatched to
// the service and followed by a full reload that replaces the snapshot
// wholesale; a failed reload leaves the previous snapshot untouched.
// At most one operation runs at a time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use arbor_api::transport::{TlsMode, TransportConfig};
use arbor_api::TreeClient;

use crate::config::{BusyPolicy, SyncConfig, TlsVerification};
use crate::error::CoreError;
use crate::event::{FailureStage, SyncEvent, SyncState};
use crate::intent::{MutationIntent, RemoteMutation};
use crate::model::{NodeId, Tree};
use crate::stream::SnapshotStream;

const EVENT_CHANNEL_SIZE: usize = 64;
const MIN_REFRESH_PERIOD: Duration = Duration::from_millis(10);

type Outcome = Result<Arc<Tree>, (FailureStage, CoreError)>;

// ── TreeSynchronizer ─────────────────────────────────────────────

/// The main entry point for presentation layers.
///
/// Cheaply cloneable via `Arc<SyncInner>`; clones share the snapshot,
/// the event channel, and the single-flight guard.
#[derive(Clone)]
pub struct TreeSynchronizer {
    inner: Arc<SyncInner>,
}

struct SyncInner {
    client: TreeClient,
    tree_name: String,
    busy_policy: BusyPolicy,
    /// `None` until the first successful load. Only replaced, never edited.
    snapshot: watch::Sender<Option<Arc<Tree>>>,
    state: watch::Sender<SyncState>,
    events: broadcast::Sender<SyncEvent>,
    last_reconciled: watch::Sender<Option<DateTime<Utc>>>,
    /// Held for the whole of an intent or load.
    flight: Mutex<()>,
}

impl TreeSynchronizer {
    /// Create a synchronizer from configuration. Does NOT load --
    /// call [`load()`](Self::load) to fetch the initial snapshot.
    pub fn new(config: SyncConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let client = TreeClient::new(config.url, &transport)?.with_namespace(config.namespace);
        Ok(Self::with_client(client, config.tree_name, config.busy_policy))
    }

    /// Create a synchronizer around an already-built client.
    pub fn with_client(
        client: TreeClient,
        tree_name: impl Into<String>,
        busy_policy: BusyPolicy,
    ) -> Self {
        let (snapshot, _) = watch::channel(None);
        let (state, _) = watch::channel(SyncState::Idle);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (last_reconciled, _) = watch::channel(None);

        Self {
            inner: Arc::new(SyncInner {
                client,
                tree_name: tree_name.into(),
                busy_policy,
                snapshot,
                state,
                events,
                last_reconciled,
                flight: Mutex::new(()),
            }),
        }
    }

    pub fn tree_name(&self) -> &str {
        &self.inner.tree_name
    }

    pub fn busy_policy(&self) -> BusyPolicy {
        self.inner.busy_policy
    }

    // ── Observation ──────────────────────────────────────────────

    /// The current snapshot, or `None` before the first successful load.
    pub fn snapshot(&self) -> Option<Arc<Tree>> {
        self.inner.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot replacements.
    pub fn snapshots(&self) -> SnapshotStream {
        SnapshotStream::new(self.inner.snapshot.subscribe())
    }

    /// Subscribe to state-machine transitions.
    pub fn state(&self) -> watch::Receiver<SyncState> {
        self.inner.state.subscribe()
    }

    pub fn current_state(&self) -> SyncState {
        *self.inner.state.borrow()
    }

    /// Subscribe to replacement and failure events.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    /// When the snapshot was last replaced.
    pub fn last_reconciled(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_reconciled.borrow()
    }

    // ── Operations ───────────────────────────────────────────────

    /// Fetch the whole tree and replace the snapshot.
    ///
    /// Used for the initial load and for manual refreshes. On failure the
    /// previous snapshot (or its absence) is kept.
    pub async fn load(&self) -> Result<Arc<Tree>, CoreError> {
        let outcome = {
            let Some(_guard) = self.acquire().await else {
                return Err(self.reject_busy(None));
            };
            let outcome = self.reconcile().await;
            self.set_state(SyncState::Idle);
            outcome
        };
        self.finish(outcome, None)
    }

    /// Create `name` under `parent`, or under the root when `parent` is `None`.
    pub async fn request_add(
        &self,
        parent: Option<NodeId>,
        name: impl Into<String>,
    ) -> Result<Arc<Tree>, CoreError> {
        self.submit(MutationIntent::add(parent, name)).await
    }

    pub async fn request_rename(
        &self,
        id: impl Into<NodeId>,
        name: impl Into<String>,
    ) -> Result<Arc<Tree>, CoreError> {
        self.submit(MutationIntent::rename(id, name)).await
    }

    /// Delete a node. The service removes its subtree; the reload shows it.
    pub async fn request_delete(&self, id: impl Into<NodeId>) -> Result<Arc<Tree>, CoreError> {
        self.submit(MutationIntent::delete(id)).await
    }

    /// Run one intent through the state machine:
    /// validate, dispatch, then reconcile.
    ///
    /// Returns the reconciled snapshot. Every failure is also broadcast as
    /// [`SyncEvent::Failed`] with the stage it happened at.
    pub async fn submit(&self, intent: MutationIntent) -> Result<Arc<Tree>, CoreError> {
        let outcome = {
            let Some(_guard) = self.acquire().await else {
                return Err(self.reject_busy(Some(intent)));
            };
            let outcome = self.run(&intent).await;
            self.set_state(SyncState::Idle);
            outcome
        };
        self.finish(outcome, Some(intent))
    }

    /// Spawn a task that reloads the tree every `period` until `cancel`
    /// fires. Ticks that find another operation in flight are skipped.
    /// Periods shorter than 10ms are raised to 10ms.
    pub fn spawn_refresh(&self, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        if period < MIN_REFRESH_PERIOD {
            warn!(?period, "refresh period too short, using {MIN_REFRESH_PERIOD:?}");
        }
        let period = period.max(MIN_REFRESH_PERIOD);
        let sync = self.clone();
        tokio::spawn(refresh_task(sync, period, cancel))
    }

    // ── State machine ────────────────────────────────────────────

    async fn run(&self, intent: &MutationIntent) -> Outcome {
        self.set_state(SyncState::MutationRequested);
        let mutation = self
            .validate(intent)
            .map_err(|e| (FailureStage::Validation, e))?;

        self.set_state(SyncState::MutationInFlight);
        debug!(%intent, "dispatching mutation");
        self.dispatch(&mutation)
            .await
            .map_err(|e| (FailureStage::Mutation, e))?;

        self.reconcile().await
    }

    /// Check an intent against the current snapshot. Nothing is sent on
    /// failure.
    fn validate(&self, intent: &MutationIntent) -> Result<RemoteMutation, CoreError> {
        let Some(tree) = self.snapshot() else {
            return Err(CoreError::precondition(format!(
                "cannot {} before the tree has been loaded",
                intent.operation()
            )));
        };

        let name = match intent {
            MutationIntent::Add { name, .. } | MutationIntent::Rename { name, .. } => {
                Some(name.as_str())
            }
            MutationIntent::Delete { .. } => None,
        };
        if name.is_some_and(|n| n.trim().is_empty()) {
            return Err(CoreError::ValidationFailed {
                message: "node name must not be empty".into(),
            });
        }

        match intent {
            MutationIntent::Add { parent, name } => {
                let parent = match parent {
                    None => tree.root_id.clone(),
                    Some(id) if tree.is_root(id) || tree.contains(id) => id.clone(),
                    Some(id) => return Err(CoreError::NodeNotFound { id: id.clone() }),
                };
                Ok(RemoteMutation::Create {
                    parent,
                    name: name.clone(),
                })
            }
            MutationIntent::Rename { id, name } => {
                require_node(&tree, id, "rename")?;
                Ok(RemoteMutation::Rename {
                    id: id.clone(),
                    name: name.clone(),
                })
            }
            MutationIntent::Delete { id } => {
                require_node(&tree, id, "delete")?;
                Ok(RemoteMutation::Delete { id: id.clone() })
            }
        }
    }

    async fn dispatch(&self, mutation: &RemoteMutation) -> Result<(), CoreError> {
        let client = &self.inner.client;
        let tree = self.inner.tree_name.as_str();

        let result = match mutation {
            RemoteMutation::Create { parent, name } => {
                client.create_node(tree, parent.as_str(), name).await
            }
            RemoteMutation::Rename { id, name } => {
                client.rename_node(tree, id.as_str(), name).await
            }
            RemoteMutation::Delete { id } => client.delete_node(tree, id.as_str()).await,
        };

        result.map_err(CoreError::from)
    }

    /// Fetch the tree and swap it in. The snapshot is only written on
    /// success.
    async fn reconcile(&self) -> Outcome {
        self.set_state(SyncState::Reconciling);

        let response = self
            .inner
            .client
            .fetch_tree(&self.inner.tree_name)
            .await
            .map_err(|e| (FailureStage::Reconciliation, CoreError::from(e)))?;

        let tree = Arc::new(Tree::from(response));
        self.inner.snapshot.send_replace(Some(Arc::clone(&tree)));
        self.inner.last_reconciled.send_replace(Some(Utc::now()));
        info!(tree = %self.inner.tree_name, nodes = tree.len(), "snapshot replaced");
        Ok(tree)
    }

    /// Publish the outcome. Runs after the flight guard is released so
    /// subscribers may issue the next request right away.
    fn finish(
        &self,
        outcome: Outcome,
        cause: Option<MutationIntent>,
    ) -> Result<Arc<Tree>, CoreError> {
        match outcome {
            Ok(snapshot) => {
                let _ = self.inner.events.send(SyncEvent::SnapshotReplaced {
                    snapshot: Arc::clone(&snapshot),
                    cause,
                });
                Ok(snapshot)
            }
            Err((stage, error)) => Err(self.publish_failure(cause, stage, error)),
        }
    }

    // ── Single-flight ────────────────────────────────────────────

    async fn acquire(&self) -> Option<MutexGuard<'_, ()>> {
        match self.inner.busy_policy {
            BusyPolicy::Reject => self.inner.flight.try_lock().ok(),
            BusyPolicy::Queue => Some(self.inner.flight.lock().await),
        }
    }

    /// Busy rejections leave the state alone: it belongs to the
    /// operation that is actually running.
    fn reject_busy(&self, intent: Option<MutationIntent>) -> CoreError {
        self.publish_failure(intent, FailureStage::Validation, CoreError::Busy)
    }

    fn publish_failure(
        &self,
        intent: Option<MutationIntent>,
        stage: FailureStage,
        error: CoreError,
    ) -> CoreError {
        match &intent {
            Some(intent) => warn!(%intent, %stage, error = %error, "tree operation failed"),
            None => warn!(%stage, error = %error, "tree load failed"),
        }
        let _ = self.inner.events.send(SyncEvent::Failed {
            intent,
            stage,
            error: error.clone(),
        });
        error
    }

    fn set_state(&self, state: SyncState) {
        debug!(%state, "sync state");
        self.inner.state.send_replace(state);
    }
}

// ── Background refresh ───────────────────────────────────────────

async fn refresh_task(sync: TreeSynchronizer, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if sync.current_state() != SyncState::Idle {
                    debug!("refresh skipped: operation in flight");
                    continue;
                }
                match sync.load().await {
                    Ok(_) | Err(CoreError::Busy) => {}
                    Err(e) => debug!(error = %e, "periodic refresh failed"),
                }
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn require_node(tree: &Tree, id: &NodeId, operation: &str) -> Result<(), CoreError> {
    if tree.is_root(id) {
        return Err(CoreError::precondition(format!(
            "cannot {operation} the root node"
        )));
    }
    if !tree.contains(id) {
        return Err(CoreError::NodeNotFound { id: id.clone() });
    }
    Ok(())
}

/// Build a [`TransportConfig`] from the synchronizer configuration.
fn build_transport(config: &SyncConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
    }
}
