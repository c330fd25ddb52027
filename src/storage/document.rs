//! Document store abstraction
//!
//! Records are JSON objects grouped in named collections and scoped to an
//! owner. Writers broadcast a [`ChangeEvent`] for every mutation so readers
//! can hold a live view through [`Subscription`].

use std::sync::Arc;

use futures::Stream;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::types::{PawError, Result, UserId};

/// One stored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub collection: String,
    pub id: String,
    pub owner_id: UserId,
    /// Always a JSON object
    pub data: Value,
    pub created_at: String,
    pub updated_at: String,
}

impl Document {
    /// Deserialize the payload into a typed record
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Apply `patch` field by field onto `target` (last write wins)
pub fn merge_shallow(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

/// Require a JSON object payload
pub fn expect_object(value: Value, what: &str) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(PawError::Storage(format!(
            "{} must be a JSON object, got {}",
            what,
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Change feed
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A mutation, carrying the document state after it (before it, for deletes)
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub document: Document,
}

impl ChangeEvent {
    fn concerns(&self, collection: &str, owner: &UserId) -> bool {
        self.document.collection == collection && &self.document.owner_id == owner
    }
}

/// Reloads the full snapshot of one (collection, owner) view
pub type SnapshotLoader = Arc<dyn Fn() -> Result<Vec<Document>> + Send + Sync>;

/// Live view over one owner's documents in a collection
///
/// Holds the current snapshot (oldest first) and applies change events as
/// they arrive. A subscriber that falls behind the feed reloads the snapshot.
pub struct Subscription {
    collection: String,
    owner: UserId,
    snapshot: Vec<Document>,
    receiver: broadcast::Receiver<ChangeEvent>,
    loader: SnapshotLoader,
}

impl Subscription {
    /// Build from an initial snapshot.
    ///
    /// The receiver must be created before the snapshot is read so no change
    /// can fall between the two.
    pub fn new(
        collection: impl Into<String>,
        owner: UserId,
        receiver: broadcast::Receiver<ChangeEvent>,
        loader: SnapshotLoader,
    ) -> Result<Self> {
        let snapshot = loader()?;
        Ok(Self {
            collection: collection.into(),
            owner,
            snapshot,
            receiver,
            loader,
        })
    }

    pub fn snapshot(&self) -> &[Document] {
        &self.snapshot
    }

    /// Wait for the next change to this view and return the new snapshot.
    ///
    /// Returns `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<Vec<Document>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.concerns(&self.collection, &self.owner) => {
                    self.apply(event);
                    return Some(self.snapshot.clone());
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(
                        collection = %self.collection,
                        skipped,
                        "Subscription lagged, reloading snapshot"
                    );
                    match (self.loader)() {
                        Ok(snapshot) => {
                            self.snapshot = snapshot;
                            return Some(self.snapshot.clone());
                        }
                        Err(e) => {
                            warn!(collection = %self.collection, error = %e, "Snapshot reload failed");
                            continue;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    fn apply(&mut self, event: ChangeEvent) {
        let position = self
            .snapshot
            .iter()
            .position(|d| d.id == event.document.id);

        match (event.kind, position) {
            (ChangeKind::Created, None) => self.snapshot.push(event.document),
            (ChangeKind::Created | ChangeKind::Updated, Some(i)) => {
                self.snapshot[i] = event.document
            }
            (ChangeKind::Updated, None) => self.snapshot.push(event.document),
            (ChangeKind::Deleted, Some(i)) => {
                self.snapshot.remove(i);
            }
            (ChangeKind::Deleted, None) => {}
        }
    }

    /// Stream of snapshots: the initial one, then one per change
    pub fn into_stream(self) -> impl Stream<Item = Vec<Document>> + Send {
        futures::stream::unfold((self, true), |(mut sub, first)| async move {
            if first {
                let initial = sub.snapshot.clone();
                return Some((initial, (sub, false)));
            }
            sub.changed().await.map(|snapshot| (snapshot, (sub, false)))
        })
    }
}

// =============================================================================
// Store trait
// =============================================================================

/// Owner-scoped document persistence
pub trait DocumentStore: Send + Sync {
    /// Insert a new document; fails if the id already exists in the collection
    fn create(&self, collection: &str, id: &str, owner: &UserId, data: Value) -> Result<Document>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Merge `patch` field by field into an existing document
    fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Document>;

    /// Remove a document, returning it if it existed
    fn delete(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// All of `owner`'s documents in a collection, oldest first
    fn list(&self, collection: &str, owner: &UserId) -> Result<Vec<Document>>;

    fn subscribe(&self, collection: &str, owner: &UserId) -> Result<Subscription>;
}

pub type SharedDocumentStore = Arc<dyn DocumentStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, owner: &str, name: &str) -> Document {
        Document {
            collection: "pets".to_string(),
            id: id.to_string(),
            owner_id: UserId::from(owner),
            data: json!({ "name": name }),
            created_at: "2024-01-01T00:00:00.000000Z".to_string(),
            updated_at: "2024-01-01T00:00:00.000000Z".to_string(),
        }
    }

    #[test]
    fn test_merge_shallow() {
        let mut target = expect_object(json!({"a": 1, "b": {"x": 1}}), "doc").unwrap();
        let patch = expect_object(json!({"b": {"y": 2}, "c": 3}), "patch").unwrap();
        merge_shallow(&mut target, patch);

        assert_eq!(Value::Object(target), json!({"a": 1, "b": {"y": 2}, "c": 3}));
    }

    #[test]
    fn test_expect_object_rejects_arrays() {
        let err = expect_object(json!([1, 2]), "patch").unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[tokio::test]
    async fn test_subscription_filters_and_applies() {
        let (tx, rx) = broadcast::channel(16);
        let loader: SnapshotLoader = Arc::new(|| Ok(vec![doc("p1", "alice", "Rex")]));
        let mut sub = Subscription::new("pets", UserId::from("alice"), rx, loader).unwrap();
        assert_eq!(sub.snapshot().len(), 1);

        // Another owner's change is skipped
        tx.send(ChangeEvent {
            kind: ChangeKind::Created,
            document: doc("p9", "bob", "Spot"),
        })
        .unwrap();
        tx.send(ChangeEvent {
            kind: ChangeKind::Created,
            document: doc("p2", "alice", "Tom"),
        })
        .unwrap();

        let snapshot = sub.changed().await.unwrap();
        let ids: Vec<&str> = snapshot.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);

        tx.send(ChangeEvent {
            kind: ChangeKind::Deleted,
            document: doc("p1", "alice", "Rex"),
        })
        .unwrap();
        let snapshot = sub.changed().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "p2");
    }

    #[tokio::test]
    async fn test_lagged_subscription_reloads() {
        let (tx, rx) = broadcast::channel(1);
        let loader: SnapshotLoader = Arc::new(|| {
            Ok(vec![
                doc("a", "alice", "A"),
                doc("b", "alice", "B"),
                doc("c", "alice", "C"),
            ])
        });
        let mut sub = Subscription::new("pets", UserId::from("alice"), rx, loader).unwrap();

        for id in ["x", "y", "z"] {
            tx.send(ChangeEvent {
                kind: ChangeKind::Created,
                document: doc(id, "alice", id),
            })
            .unwrap();
        }

        let snapshot = sub.changed().await.unwrap();
        assert_eq!(snapshot.len(), 3);
    }

    #[tokio::test]
    async fn test_stream_ends_when_feed_closes() {
        use futures::StreamExt;

        let (tx, rx) = broadcast::channel(4);
        let loader: SnapshotLoader = Arc::new(|| Ok(Vec::new()));
        let sub = Subscription::new("pets", UserId::from("alice"), rx, loader).unwrap();

        tx.send(ChangeEvent {
            kind: ChangeKind::Created,
            document: doc("p1", "alice", "Rex"),
        })
        .unwrap();
        drop(tx);

        let snapshots: Vec<Vec<Document>> = sub.into_stream().collect().await;
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots[0].is_empty());
        assert_eq!(snapshots[1].len(), 1);
    }
}
