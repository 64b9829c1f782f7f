// ── Reactive snapshot stream ──
//
// Subscription type for consuming snapshot replacements. The underlying
// watch channel holds `None` until the first successful load; consumers
// of this type only ever see loaded snapshots.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Tree;

type SnapshotSlot = Option<Arc<Tree>>;

/// A subscription to the synchronizer's snapshot.
///
/// Provides both point-in-time access and change notification via
/// [`changed()`](Self::changed) or by converting to a `Stream`.
pub struct SnapshotStream {
    current: SnapshotSlot,
    receiver: watch::Receiver<SnapshotSlot>,
}

impl SnapshotStream {
    pub(crate) fn new(receiver: watch::Receiver<SnapshotSlot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation (or at the last `changed()`).
    pub fn current(&self) -> Option<&Arc<Tree>> {
        self.current.as_ref()
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Option<Arc<Tree>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next replacement, returning the new snapshot.
    /// Returns `None` once the synchronizer has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Tree>> {
        loop {
            self.receiver.changed().await.ok()?;
            let snap = self.receiver.borrow_and_update().clone();
            if let Some(tree) = snap {
                self.current = Some(Arc::clone(&tree));
                return Some(tree);
            }
        }
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The stream yields the current snapshot first (if loaded), then
    /// every replacement.
    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by the snapshot `watch::Receiver`.
pub struct SnapshotWatchStream {
    inner: WatchStream<SnapshotSlot>,
}

impl Stream for SnapshotWatchStream {
    type Item = Arc<Tree>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Some(tree))) => return Poll::Ready(Some(tree)),
                // Not loaded yet; WatchStream re-registers the waker.
                Poll::Ready(Some(None)) => {}
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
