//! MongoDB document store backend

use async_trait::async_trait;
use bson::doc;
use futures_util::StreamExt;
use mongodb::{options::IndexOptions, Client, IndexModel};
use tracing::{error, info};

use crate::db::store::{Collection, DocumentStore};
use crate::model::StoredDocument;
use crate::types::{GatehouseError, Result};

/// MongoDB-backed store. One database, one collection per document type.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db_name: String,
}

impl MongoStore {
    /// Connect and verify the connection with a ping.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| GatehouseError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| GatehouseError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        let store = Self {
            client,
            db_name: db_name.to_string(),
        };
        store.apply_indexes().await?;
        Ok(store)
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<StoredDocument> {
        self.client
            .database(&self.db_name)
            .collection::<StoredDocument>(collection.name())
    }

    /// Index OCCI_ID and Location in every collection; lookups go through
    /// one of the two.
    async fn apply_indexes(&self) -> Result<()> {
        let indices = vec![
            IndexModel::builder().keys(doc! { "OCCI_ID": 1 }).build(),
            IndexModel::builder()
                .keys(doc! { "Location": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        ];
        for collection in Collection::ALL {
            self.collection(collection)
                .create_indexes(indices.clone())
                .await
                .map_err(|e| {
                    GatehouseError::Database(format!("Failed to create indexes: {}", e))
                })?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<StoredDocument>> {
        self.collection(collection)
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| GatehouseError::Database(format!("Find failed: {}", e)))
    }

    async fn insert(&self, collection: Collection, document: StoredDocument) -> Result<()> {
        self.collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| {
                if e.to_string().contains("duplicate key") {
                    GatehouseError::Conflict(format!("Insert collided: {}", e))
                } else {
                    GatehouseError::Database(format!("Insert failed: {}", e))
                }
            })?;
        Ok(())
    }

    async fn replace(&self, collection: Collection, document: StoredDocument) -> Result<()> {
        let filter = doc! { "_id": document.id.as_str(), "_rev": document.rev };
        let mut updated = document;
        updated.rev += 1;
        let id = updated.id.clone();

        let result = self
            .collection(collection)
            .replace_one(filter, updated)
            .await
            .map_err(|e| GatehouseError::Database(format!("Replace failed: {}", e)))?;

        if result.matched_count == 0 {
            // Distinguish a vanished document from a stale revision.
            return match self.get(collection, &id).await? {
                Some(_) => Err(GatehouseError::Conflict(format!(
                    "stale revision for document {}",
                    id
                ))),
                None => Err(GatehouseError::NotFound),
            };
        }
        Ok(())
    }

    async fn remove(&self, collection: Collection, id: &str, rev: i64) -> Result<()> {
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": id, "_rev": rev })
            .await
            .map_err(|e| GatehouseError::Database(format!("Delete failed: {}", e)))?;

        if result.deleted_count == 0 {
            return match self.get(collection, id).await? {
                Some(_) => Err(GatehouseError::Conflict(format!(
                    "stale revision for document {}",
                    id
                ))),
                None => Err(GatehouseError::NotFound),
            };
        }
        Ok(())
    }

    async fn all(&self, collection: Collection) -> Result<Vec<StoredDocument>> {
        let cursor = self
            .collection(collection)
            .find(doc! {})
            .sort(doc! { "CreationDate": 1 })
            .await
            .map_err(|e| GatehouseError::Database(format!("Find failed: {}", e)))?;

        let documents: Vec<StoredDocument> = cursor
            .filter_map(|doc| async {
                match doc {
                    Ok(d) => Some(d),
                    Err(e) => {
                        error!("Error reading document: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        Ok(documents)
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .database(&self.db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| GatehouseError::Database(format!("MongoDB ping failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running MongoDB instance;
    // registry tests run against db::MemoryStore instead.
}
