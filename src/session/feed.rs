//! Fan-out of "groups announced" events to disposable listeners.
//!
//! # Responsibilities
//! - Register listeners, each keyed by its own [`ListenerId`]
//! - Deliver every announcement batch to every registered listener
//! - Remove a listener exactly once, whichever exit path disposes it
//!
//! A listener only sees batches announced after it was registered, so a
//! resolver registers first and queries the snapshot second.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::net::ResourceGroup;
use crate::observability::metrics;

/// Identity of one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

type Batch = Vec<ResourceGroup>;

/// Registry of group listeners for one connection.
#[derive(Debug, Default)]
pub struct GroupFeed {
    listeners: DashMap<ListenerId, mpsc::UnboundedSender<Batch>>,
    closed: AtomicBool,
}

impl GroupFeed {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a listener. Batches announced from now on are delivered to it.
    ///
    /// On a closed feed the listener is returned already ended.
    pub fn listen(self: &Arc<Self>) -> GroupListener {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ListenerId::new();
        if !self.closed.load(Ordering::SeqCst) {
            self.listeners.insert(id, tx);
            // close() may have cleared the map between the check and the insert.
            if self.closed.load(Ordering::SeqCst) {
                self.listeners.remove(&id);
            }
            metrics::record_active_listeners(self.listeners.len());
        }
        tracing::trace!(listener = %id, "Group listener registered");
        GroupListener {
            id,
            feed: Arc::clone(self),
            rx,
            disposed: false,
        }
    }

    /// Deliver a batch to every registered listener. Returns how many received it.
    pub fn announce(&self, groups: Vec<ResourceGroup>) -> usize {
        if groups.is_empty() {
            return 0;
        }

        let mut delivered = 0;
        let mut gone = Vec::new();
        for entry in self.listeners.iter() {
            if entry.value().send(groups.clone()).is_ok() {
                delivered += 1;
            } else {
                gone.push(*entry.key());
            }
        }
        for id in gone {
            self.listeners.remove(&id);
        }

        tracing::debug!(groups = groups.len(), listeners = delivered, "Announcement delivered");
        delivered
    }

    /// Drop all listeners; waiting listeners observe the end of the feed.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.listeners.clear();
        metrics::record_active_listeners(0);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn remove(&self, id: &ListenerId) -> bool {
        let removed = self.listeners.remove(id).is_some();
        if removed {
            metrics::record_active_listeners(self.listeners.len());
        }
        removed
    }
}

/// A registered listener. Removed from its feed on [`dispose`](Self::dispose) or drop.
#[derive(Debug)]
pub struct GroupListener {
    id: ListenerId,
    feed: Arc<GroupFeed>,
    rx: mpsc::UnboundedReceiver<Batch>,
    disposed: bool,
}

impl GroupListener {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Next announced batch, or `None` once disposed or the feed closed.
    pub async fn next_batch(&mut self) -> Option<Batch> {
        if self.disposed {
            return None;
        }
        self.rx.recv().await
    }

    /// Unregister. Only the first call has an effect; returns whether it did.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        self.feed.remove(&self.id);
        self.rx.close();
        tracing::trace!(listener = %self.id, "Group listener disposed");
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for GroupListener {
    fn drop(&mut self) {
        self.dispose();
    }
}
