// ── Registry subscriptions ──
//
// The registry republishes a whole snapshot per mutation on a watch
// channel. A subscriber only ever observes the newest snapshot; bursts of
// mutations between two polls collapse into one.

use std::sync::Arc;

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Shared, immutable snapshot of one entity kind, in registry order.
pub type Snapshot<T> = Arc<Vec<Arc<T>>>;

/// Subscription to the agents or the devices of a fleet.
pub struct EntityStream<T> {
    rx: watch::Receiver<Snapshot<T>>,
    seen: Snapshot<T>,
}

impl<T: Send + Sync + 'static> EntityStream<T> {
    pub(crate) fn new(mut rx: watch::Receiver<Snapshot<T>>) -> Self {
        let seen = Arc::clone(&rx.borrow_and_update());
        Self { rx, seen }
    }

    /// The snapshot this subscriber last observed.
    pub fn current(&self) -> &Snapshot<T> {
        &self.seen
    }

    /// Newest published snapshot, without marking it observed.
    pub fn latest(&self) -> Snapshot<T> {
        Arc::clone(&self.rx.borrow())
    }

    /// Wait for a publication newer than [`current`](Self::current).
    ///
    /// `None` once the registry is gone.
    pub async fn changed(&mut self) -> Option<Snapshot<T>> {
        self.rx.changed().await.ok()?;
        let snap = Arc::clone(&self.rx.borrow_and_update());
        Some(self.observe(snap))
    }

    /// Wait until a snapshot satisfies `ready`, checking the newest one
    /// first.
    pub async fn wait_until(
        &mut self,
        mut ready: impl FnMut(&[Arc<T>]) -> bool + Send,
    ) -> Option<Snapshot<T>> {
        let snap = self
            .rx
            .wait_for(|snap| ready(snap.as_slice()))
            .await
            .ok()
            .map(|snap| Arc::clone(&snap))?;
        Some(self.observe(snap))
    }

    /// Yield the newest snapshot now, then one per later publication.
    pub fn into_stream(self) -> impl Stream<Item = Snapshot<T>> + Send + Unpin {
        WatchStream::new(self.rx)
    }

    fn observe(&mut self, snap: Snapshot<T>) -> Snapshot<T> {
        self.seen = Arc::clone(&snap);
        snap
    }
}
