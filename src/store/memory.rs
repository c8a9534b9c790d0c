//! In-process implementation of the store contract.
//!
//! One `MemoryStore` plays the role of the remote backend; every client
//! gets its own `MemoryConnection` against it, which is what lets tests
//! and the demo binary run several independent clients over genuinely
//! shared state. Presence semantics match the remote store: a connection
//! that goes offline (or is dropped without a clean teardown) has its
//! registered on-disconnect merges applied by the store itself.

use super::{Patch, Snapshot, StoreConnection, StoreError, Subscription};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::debug;

/// The shared in-process backend
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                tree: Mutex::new(Map::new()),
                watchers: Mutex::new(HashMap::new()),
                next_watcher_id: AtomicU64::new(1),
                next_conn_id: AtomicU64::new(1),
            }),
        }
    }

    /// Open a new client connection against this store
    pub fn connect(&self) -> MemoryConnection {
        let conn_id = self.inner.next_conn_id.fetch_add(1, Ordering::Relaxed);
        debug!(conn_id, "memory store connection opened");
        MemoryConnection {
            store: Arc::clone(&self.inner),
            conn_id,
            offline: AtomicBool::new(false),
            disconnect_patches: Mutex::new(Vec::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

struct StoreInner {
    /// The document tree, a nested JSON object keyed by path segments
    tree: Mutex<Map<String, Value>>,
    watchers: Mutex<HashMap<u64, Watcher>>,
    next_watcher_id: AtomicU64,
    next_conn_id: AtomicU64,
}

struct Watcher {
    path: Vec<String>,
    tx: mpsc::UnboundedSender<Snapshot>,
    conn_id: u64,
}

impl StoreInner {
    /// Apply a batch of absolute-path writes and notify affected watchers.
    /// Mutation and fan-out happen under the tree lock, so every watcher
    /// sees writes in a single global order.
    fn apply(&self, notify_root: &str, entries: Vec<(String, Value)>) {
        let mut tree = self.tree.lock().unwrap();
        for (path, value) in entries {
            set_at(&mut tree, &segments(&path), value);
        }
        self.notify_locked(&tree, notify_root);
    }

    fn notify_locked(&self, tree: &Map<String, Value>, changed: &str) {
        let changed_segs = segments(changed);
        let watchers = self.watchers.lock().unwrap();
        for watcher in watchers.values() {
            // A watcher is affected when its path and the changed path lie
            // on one line of the tree (either contains the other)
            if prefix_related(&watcher.path, &changed_segs) {
                let snapshot = get_at(tree, &watcher.path).cloned();
                let _ = watcher.tx.send(snapshot);
            }
        }
    }

    fn drop_watchers_for(&self, conn_id: u64) {
        self.watchers
            .lock()
            .unwrap()
            .retain(|_, w| w.conn_id != conn_id);
    }
}

/// One client's connection handle
pub struct MemoryConnection {
    store: Arc<StoreInner>,
    conn_id: u64,
    offline: AtomicBool,
    disconnect_patches: Mutex<Vec<(String, Patch)>>,
}

impl MemoryConnection {
    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Offline);
        }
        Ok(())
    }

    /// Apply every registered on-disconnect merge, as the store would
    /// when a remote client vanishes
    fn fire_disconnect_patches(&self) {
        let patches = std::mem::take(&mut *self.disconnect_patches.lock().unwrap());
        for (root, patch) in patches {
            debug!(conn_id = self.conn_id, root = %root, "applying on-disconnect merge");
            let entries = absolute_entries(&root, patch);
            self.store.apply(&root, entries);
        }
    }
}

#[async_trait]
impl StoreConnection for MemoryConnection {
    async fn read(&self, path: &str) -> Result<Snapshot, StoreError> {
        self.ensure_online()?;
        let tree = self.store.tree.lock().unwrap();
        Ok(get_at(&tree, &segments(path)).cloned())
    }

    async fn put(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.ensure_online()?;
        debug!(conn_id = self.conn_id, path = %path, "put");
        self.store.apply(path, vec![(path.to_string(), value)]);
        Ok(())
    }

    async fn update(&self, root: &str, patch: Patch) -> Result<(), StoreError> {
        self.ensure_online()?;
        if patch.is_empty() {
            return Ok(());
        }
        debug!(conn_id = self.conn_id, root = %root, fields = patch.len(), "merge update");
        let entries = absolute_entries(root, patch);
        self.store.apply(root, entries);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.ensure_online()?;
        debug!(conn_id = self.conn_id, path = %path, "remove");
        self.store.apply(path, vec![(path.to_string(), Value::Null)]);
        Ok(())
    }

    async fn watch(&self, path: &str) -> Result<Subscription, StoreError> {
        self.ensure_online()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.store.next_watcher_id.fetch_add(1, Ordering::Relaxed);
        let watcher = Watcher {
            path: segments(path),
            tx,
            conn_id: self.conn_id,
        };

        // Register and push the initial snapshot under the tree lock so no
        // write can slip between the two
        {
            let tree = self.store.tree.lock().unwrap();
            let initial = get_at(&tree, &watcher.path).cloned();
            let mut watchers = self.store.watchers.lock().unwrap();
            let _ = watcher.tx.send(initial);
            watchers.insert(id, watcher);
        }

        let store = Arc::clone(&self.store);
        Ok(Subscription::new(rx, move || {
            store.watchers.lock().unwrap().remove(&id);
        }))
    }

    async fn on_disconnect_update(&self, root: &str, patch: Patch) -> Result<(), StoreError> {
        self.ensure_online()?;
        self.disconnect_patches
            .lock()
            .unwrap()
            .push((root.to_string(), patch));
        Ok(())
    }

    async fn cancel_on_disconnect(&self) -> Result<(), StoreError> {
        self.disconnect_patches.lock().unwrap().clear();
        Ok(())
    }

    async fn go_offline(&self) {
        if self.offline.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(conn_id = self.conn_id, "connection going offline");
        self.fire_disconnect_patches();
        self.store.drop_watchers_for(self.conn_id);
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        // A connection dropped without a clean teardown counts as an
        // ungraceful disconnect: presence merges fire, watches detach
        if !self.offline.load(Ordering::SeqCst) {
            self.fire_disconnect_patches();
            self.store.drop_watchers_for(self.conn_id);
        }
    }
}

fn segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn prefix_related(a: &[String], b: &[String]) -> bool {
    let n = a.len().min(b.len());
    a[..n] == b[..n]
}

fn absolute_entries(root: &str, patch: Patch) -> Vec<(String, Value)> {
    patch
        .into_iter()
        .map(|(rel, value)| (format!("{root}/{rel}"), value))
        .collect()
}

/// Set the node at `segs`, creating intermediate objects as needed.
/// `Value::Null` deletes the node; parents emptied by a delete are pruned.
fn set_at(node: &mut Map<String, Value>, segs: &[String], value: Value) {
    let Some((first, rest)) = segs.split_first() else {
        return;
    };
    if rest.is_empty() {
        if value.is_null() {
            node.remove(first);
        } else {
            node.insert(first.clone(), value);
        }
        return;
    }
    let child = node
        .entry(first.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        // Writing below a scalar replaces it with an object
        *child = Value::Object(Map::new());
    }
    if let Value::Object(map) = child {
        set_at(map, rest, value);
        if map.is_empty() {
            node.remove(first);
        }
    }
}

fn get_at<'a>(node: &'a Map<String, Value>, segs: &[String]) -> Option<&'a Value> {
    let (first, rest) = segs.split_first()?;
    let mut current = node.get(first)?;
    for seg in rest {
        current = current.as_object()?.get(seg)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_then_read_roundtrip() {
        let store = MemoryStore::new();
        let conn = store.connect();

        conn.put("rooms/AAAA", json!({ "hostId": "p-1" }))
            .await
            .unwrap();

        let value = conn.read("rooms/AAAA").await.unwrap();
        assert_eq!(value, Some(json!({ "hostId": "p-1" })));
        let field = conn.read("rooms/AAAA/hostId").await.unwrap();
        assert_eq!(field, Some(json!("p-1")));
        assert_eq!(conn.read("rooms/ZZZZ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_merges_without_touching_siblings() {
        let store = MemoryStore::new();
        let conn = store.connect();

        conn.put(
            "rooms/AAAA",
            json!({ "gameStatus": "waiting", "players": { "p-1": { "score": 0 } } }),
        )
        .await
        .unwrap();

        let mut patch = Patch::new();
        patch.insert("gameStatus".to_string(), json!("playing"));
        patch.insert("players/p-1/score".to_string(), json!(100));
        conn.update("rooms/AAAA", patch).await.unwrap();

        let value = conn.read("rooms/AAAA").await.unwrap().unwrap();
        assert_eq!(value["gameStatus"], "playing");
        assert_eq!(value["players"]["p-1"]["score"], 100);
    }

    #[tokio::test]
    async fn test_null_in_patch_deletes_and_prunes() {
        let store = MemoryStore::new();
        let conn = store.connect();

        conn.put("rooms/AAAA/players", json!({ "p-1": { "score": 0 } }))
            .await
            .unwrap();

        let mut patch = Patch::new();
        patch.insert("players/p-1".to_string(), Value::Null);
        conn.update("rooms/AAAA", patch).await.unwrap();

        // The emptied players map is pruned along with the entry
        assert_eq!(conn.read("rooms/AAAA/players/p-1").await.unwrap(), None);
        assert_eq!(conn.read("rooms/AAAA/players").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_watch_receives_initial_then_own_writes() {
        let store = MemoryStore::new();
        let conn = store.connect();

        let mut sub = conn.watch("rooms/AAAA").await.unwrap();
        // Initial snapshot for a path that does not exist yet
        assert_eq!(sub.recv().await.unwrap(), None);

        conn.put("rooms/AAAA", json!({ "hostId": "p-1" }))
            .await
            .unwrap();
        let snapshot = sub.recv().await.unwrap();
        assert_eq!(snapshot, Some(json!({ "hostId": "p-1" })));
    }

    #[tokio::test]
    async fn test_watch_fans_out_across_connections() {
        let store = MemoryStore::new();
        let writer = store.connect();
        let watcher = store.connect();

        let mut sub = watcher.watch("rooms/AAAA").await.unwrap();
        assert_eq!(sub.recv().await.unwrap(), None);

        let mut patch = Patch::new();
        patch.insert("gameStatus".to_string(), json!("playing"));
        writer.update("rooms/AAAA", patch).await.unwrap();

        let snapshot = sub.recv().await.unwrap().unwrap();
        assert_eq!(snapshot["gameStatus"], "playing");
    }

    #[tokio::test]
    async fn test_unrelated_path_does_not_notify() {
        let store = MemoryStore::new();
        let conn = store.connect();

        let mut sub = conn.watch("rooms/AAAA").await.unwrap();
        assert_eq!(sub.recv().await.unwrap(), None);

        conn.put("rooms/BBBB", json!({ "hostId": "other" }))
            .await
            .unwrap();
        conn.put("rooms/AAAA", json!({ "hostId": "p-1" }))
            .await
            .unwrap();

        // The next snapshot is the AAAA write; BBBB produced nothing
        let snapshot = sub.recv().await.unwrap().unwrap();
        assert_eq!(snapshot["hostId"], "p-1");
    }

    #[tokio::test]
    async fn test_last_write_wins_between_connections() {
        let store = MemoryStore::new();
        let a = store.connect();
        let b = store.connect();

        a.put("rooms/AAAA/gameStatus", json!("waiting")).await.unwrap();
        b.put("rooms/AAAA/gameStatus", json!("playing")).await.unwrap();

        assert_eq!(
            a.read("rooms/AAAA/gameStatus").await.unwrap(),
            Some(json!("playing"))
        );
    }

    #[tokio::test]
    async fn test_remove_cascades_to_watchers() {
        let store = MemoryStore::new();
        let host = store.connect();
        let guest = store.connect();

        host.put("rooms/AAAA", json!({ "hostId": "p-1" }))
            .await
            .unwrap();
        let mut sub = guest.watch("rooms/AAAA").await.unwrap();
        assert!(sub.recv().await.unwrap().is_some());

        host.remove("rooms/AAAA").await.unwrap();
        assert_eq!(sub.recv().await.unwrap(), None);
        assert_eq!(guest.read("rooms/AAAA").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_on_disconnect_merge_fires_on_go_offline() {
        let store = MemoryStore::new();
        let observer = store.connect();
        let flaky = store.connect();

        flaky
            .put("rooms/AAAA/players/p-2", json!({ "isConnected": true }))
            .await
            .unwrap();

        let mut patch = Patch::new();
        patch.insert("players/p-2/isConnected".to_string(), json!(false));
        flaky.on_disconnect_update("rooms/AAAA", patch).await.unwrap();

        flaky.go_offline().await;

        let value = observer
            .read("rooms/AAAA/players/p-2/isConnected")
            .await
            .unwrap();
        assert_eq!(value, Some(json!(false)));
    }

    #[tokio::test]
    async fn test_cancel_on_disconnect_prevents_merge() {
        let store = MemoryStore::new();
        let observer = store.connect();
        let leaving = store.connect();

        leaving
            .put("rooms/AAAA/players/p-2", json!({ "isConnected": true }))
            .await
            .unwrap();

        let mut patch = Patch::new();
        patch.insert("players/p-2/isConnected".to_string(), json!(false));
        leaving
            .on_disconnect_update("rooms/AAAA", patch)
            .await
            .unwrap();
        leaving.cancel_on_disconnect().await.unwrap();

        leaving.go_offline().await;

        let value = observer
            .read("rooms/AAAA/players/p-2/isConnected")
            .await
            .unwrap();
        assert_eq!(value, Some(json!(true)));
    }

    #[tokio::test]
    async fn test_dropping_connection_counts_as_ungraceful() {
        let store = MemoryStore::new();
        let observer = store.connect();

        {
            let vanishing = store.connect();
            vanishing
                .put("rooms/AAAA/players/p-3", json!({ "isConnected": true }))
                .await
                .unwrap();
            let mut patch = Patch::new();
            patch.insert("players/p-3/isConnected".to_string(), json!(false));
            vanishing
                .on_disconnect_update("rooms/AAAA", patch)
                .await
                .unwrap();
            // Dropped here without teardown
        }

        let value = observer
            .read("rooms/AAAA/players/p-3/isConnected")
            .await
            .unwrap();
        assert_eq!(value, Some(json!(false)));
    }

    #[tokio::test]
    async fn test_offline_connection_rejects_calls_and_closes_watches() {
        let store = MemoryStore::new();
        let conn = store.connect();

        let mut sub = conn.watch("rooms/AAAA").await.unwrap();
        assert_eq!(sub.recv().await.unwrap(), None);

        conn.go_offline().await;

        assert!(matches!(
            conn.put("rooms/AAAA", json!({})).await,
            Err(StoreError::Offline)
        ));
        assert!(matches!(
            conn.read("rooms/AAAA").await,
            Err(StoreError::Offline)
        ));
        // The watch channel is closed on the store side
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dropping_subscription_detaches_watcher() {
        let store = MemoryStore::new();
        let conn = store.connect();

        let sub = conn.watch("rooms/AAAA").await.unwrap();
        assert_eq!(store.inner.watchers.lock().unwrap().len(), 1);
        drop(sub);
        assert_eq!(store.inner.watchers.lock().unwrap().len(), 0);
    }
}
