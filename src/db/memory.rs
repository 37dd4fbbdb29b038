//! In-memory document store
//!
//! Backs dev mode when MongoDB is unreachable, and every registry unit
//! test. Insertion order is collection order.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::db::store::{Collection, DocumentStore};
use crate::model::StoredDocument;
use crate::types::{GatehouseError, Result};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<&'static str, Vec<StoredDocument>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection.name())
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }

    async fn insert(&self, collection: Collection, doc: StoredDocument) -> Result<()> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.name()).or_default();
        if docs.iter().any(|d| d.id == doc.id) {
            return Err(GatehouseError::Conflict(format!(
                "document {} already exists",
                doc.id
            )));
        }
        docs.push(doc);
        Ok(())
    }

    async fn replace(&self, collection: Collection, doc: StoredDocument) -> Result<()> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.name()).or_default();
        match docs.iter_mut().find(|d| d.id == doc.id) {
            Some(existing) => {
                if existing.rev != doc.rev {
                    return Err(GatehouseError::Conflict(format!(
                        "stale revision for document {}",
                        doc.id
                    )));
                }
                let mut updated = doc;
                updated.rev += 1;
                *existing = updated;
                Ok(())
            }
            None => Err(GatehouseError::NotFound),
        }
    }

    async fn remove(&self, collection: Collection, id: &str, rev: i64) -> Result<()> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.name()).or_default();
        match docs.iter().position(|d| d.id == id) {
            Some(pos) => {
                if docs[pos].rev != rev {
                    return Err(GatehouseError::Conflict(format!(
                        "stale revision for document {}",
                        id
                    )));
                }
                docs.remove(pos);
                Ok(())
            }
            None => Err(GatehouseError::NotFound),
        }
    }

    async fn all(&self, collection: Collection) -> Result<Vec<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection.name())
            .cloned()
            .unwrap_or_default())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocType;
    use serde_json::json;

    fn doc(id: &str) -> StoredDocument {
        StoredDocument::new(
            id.into(),
            format!("occi-{}", id),
            "user".into(),
            format!("http://h/u/compute/{}", id),
            json!({"kind": "http://x#compute"}),
            DocType::Resource,
        )
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let store = MemoryStore::new();
        store.insert(Collection::Resources, doc("a")).await.unwrap();
        let found = store.get(Collection::Resources, "a").await.unwrap();
        assert_eq!(found.unwrap().id, "a");
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let store = MemoryStore::new();
        store.insert(Collection::Resources, doc("a")).await.unwrap();
        let err = store
            .insert(Collection::Resources, doc("a"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatehouseError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_stale_revision_replace_conflicts() {
        let store = MemoryStore::new();
        store.insert(Collection::Resources, doc("a")).await.unwrap();

        // First writer wins and bumps the revision.
        let fresh = store.get(Collection::Resources, "a").await.unwrap().unwrap();
        store.replace(Collection::Resources, fresh.clone()).await.unwrap();

        // Second writer still holds rev 1.
        let err = store.replace(Collection::Resources, fresh).await.unwrap_err();
        assert!(matches!(err, GatehouseError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_remove_guarded_by_revision() {
        let store = MemoryStore::new();
        store.insert(Collection::Resources, doc("a")).await.unwrap();
        let err = store.remove(Collection::Resources, "a", 7).await.unwrap_err();
        assert!(matches!(err, GatehouseError::Conflict(_)));
        store.remove(Collection::Resources, "a", 1).await.unwrap();
        assert!(store
            .get(Collection::Resources, "a")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_all_preserves_insertion_order() {
        let store = MemoryStore::new();
        for id in ["c", "a", "b"] {
            store.insert(Collection::Kinds, doc(id)).await.unwrap();
        }
        let ids: Vec<String> = store
            .all(Collection::Kinds)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
