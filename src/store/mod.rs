//! The shared keyed-document store the game synchronizes through.
//!
//! The store holds one hierarchical JSON document per room, addressed by
//! slash-separated paths. Writes are last-write-wins at field level and
//! carry no transactions; concurrency control lives entirely in how the
//! clients structure their writes (own-path convention, partial merges,
//! idempotent intake). Subscribers receive full subtree snapshots on
//! every change, including echoes of their own writes.

pub mod memory;
pub mod path;

pub use memory::{MemoryConnection, MemoryStore};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::mpsc;

/// Errors from the store transport
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The connection was taken offline; writes are rejected until a new
    /// connection is established
    #[error("store connection is offline")]
    Offline,

    /// The backing store is gone (remote transports only)
    #[error("store connection closed")]
    Closed,
}

/// A multi-path field merge: relative paths under a common root mapped to
/// their new values. A `Value::Null` entry deletes the node at that path.
pub type Patch = BTreeMap<String, Value>;

/// One pushed snapshot: the full current value of the watched subtree, or
/// `None` when the subtree does not exist (deleted or never written)
pub type Snapshot = Option<Value>;

/// An active watch on a store path. Dropping the subscription detaches it
/// from the store; `recv` returns `None` once the watch is detached on
/// the store side (e.g. the connection went offline).
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Snapshot>,
    on_drop: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(
        rx: mpsc::UnboundedReceiver<Snapshot>,
        on_drop: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            rx,
            on_drop: Some(Box::new(on_drop)),
        }
    }

    /// Wait for the next pushed snapshot
    pub async fn recv(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.on_drop.take() {
            unsubscribe();
        }
    }
}

/// Connection handle to the shared store.
///
/// One connection per client process; presence hooks registered through
/// it fire if the connection drops without a clean teardown.
#[async_trait]
pub trait StoreConnection: Send + Sync {
    /// Read the current value at a path
    async fn read(&self, path: &str) -> Result<Snapshot, StoreError>;

    /// Overwrite the subtree at a path
    async fn put(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Apply a multi-path field merge under a common root. Paths not
    /// named in the patch are left untouched.
    async fn update(&self, root: &str, patch: Patch) -> Result<(), StoreError>;

    /// Delete the subtree at a path
    async fn remove(&self, path: &str) -> Result<(), StoreError>;

    /// Subscribe to a path. The current value is pushed immediately,
    /// followed by a snapshot for every subsequent change.
    async fn watch(&self, path: &str) -> Result<Subscription, StoreError>;

    /// Register a merge the store applies on our behalf if this
    /// connection drops without a clean teardown
    async fn on_disconnect_update(&self, root: &str, patch: Patch) -> Result<(), StoreError>;

    /// Discard any registered on-disconnect merges (clean teardown)
    async fn cancel_on_disconnect(&self) -> Result<(), StoreError>;

    /// Simulate an ungraceful network drop: registered on-disconnect
    /// merges fire, watches detach, and subsequent calls fail
    async fn go_offline(&self);
}
