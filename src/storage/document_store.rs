//! SQLite-backed [`DocumentStore`] with an in-process change feed.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;

use super::database::{Database, SharedDatabase};
use super::document::{
    ChangeEvent, ChangeKind, Document, DocumentStore, SnapshotLoader, Subscription,
};
use crate::constants::storage::CHANGE_FEED_CAPACITY;
use crate::types::{Result, UserId};

pub struct SqliteDocumentStore {
    db: SharedDatabase,
    changes: broadcast::Sender<ChangeEvent>,
}

impl SqliteDocumentStore {
    /// Wrap an initialized database
    pub fn new(db: SharedDatabase) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { db, changes }
    }

    /// Open (and initialize) a database file
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let db = Database::open(path)?;
        db.initialize()?;
        Ok(Self::new(Arc::new(db)))
    }

    /// Fresh in-memory store for tests and dry runs
    pub fn in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        db.initialize()?;
        Ok(Self::new(Arc::new(db)))
    }

    fn publish(&self, kind: ChangeKind, document: &Document) {
        // No receivers is not an error
        let _ = self.changes.send(ChangeEvent {
            kind,
            document: document.clone(),
        });
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn create(&self, collection: &str, id: &str, owner: &UserId, data: Value) -> Result<Document> {
        let doc = self.db.insert_document(collection, id, owner, data)?;
        self.publish(ChangeKind::Created, &doc);
        Ok(doc)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.db.fetch_document(collection, id)
    }

    fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Document> {
        let doc = self.db.merge_document(collection, id, patch)?;
        self.publish(ChangeKind::Updated, &doc);
        Ok(doc)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let removed = self.db.remove_document(collection, id)?;
        if let Some(doc) = &removed {
            self.publish(ChangeKind::Deleted, doc);
        }
        Ok(removed)
    }

    fn list(&self, collection: &str, owner: &UserId) -> Result<Vec<Document>> {
        self.db.fetch_documents(collection, owner)
    }

    fn subscribe(&self, collection: &str, owner: &UserId) -> Result<Subscription> {
        let receiver = self.changes.subscribe();

        let db = self.db.clone();
        let loader_collection = collection.to_string();
        let loader_owner = owner.clone();
        let loader: SnapshotLoader =
            Arc::new(move || db.fetch_documents(&loader_collection, &loader_owner));

        Subscription::new(collection, owner.clone(), receiver, loader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_crud_cycle() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let owner = UserId::from("alice");

        store
            .create("pets", "p1", &owner, json!({"name": "Rex"}))
            .unwrap();
        store
            .update("pets", "p1", json!({"breed": "Beagle"}))
            .unwrap();

        let doc = store.get("pets", "p1").unwrap().unwrap();
        assert_eq!(doc.data, json!({"name": "Rex", "breed": "Beagle"}));

        assert!(store.delete("pets", "p1").unwrap().is_some());
        assert!(store.list("pets", &owner).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_subscription_sees_writes() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");

        store.create("pets", "p0", &alice, json!({"name": "Old"})).unwrap();
        let mut sub = store.subscribe("pets", &alice).unwrap();
        assert_eq!(sub.snapshot().len(), 1);

        store.create("pets", "b1", &bob, json!({"name": "Spot"})).unwrap();
        store.create("pets", "p1", &alice, json!({"name": "Rex"})).unwrap();
        let snapshot = sub.changed().await.unwrap();
        assert_eq!(snapshot.len(), 2);

        store.update("pets", "p1", json!({"name": "Max"})).unwrap();
        let snapshot = sub.changed().await.unwrap();
        assert_eq!(snapshot[1].data["name"], "Max");

        store.delete("pets", "p0").unwrap();
        let snapshot = sub.changed().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "p1");
    }

    #[tokio::test]
    async fn test_subscription_closes_with_store() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        let mut sub = store.subscribe("pets", &UserId::from("alice")).unwrap();
        drop(store);
        assert!(sub.changed().await.is_none());
    }
}
