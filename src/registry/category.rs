//! Category registry: CRUD and uniqueness for kinds, mixins and actions

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::db::{Collection, DocumentStore};
use crate::idgen::IdGenerator;
use crate::locator;
use crate::matching;
use crate::model::{Category, CategoryClass, CategoryId, RawCategory, StoredDocument};
use crate::types::{GatehouseError, Result};

/// Description keys that may never change once a category is created.
const IMMUTABLE_KEYS: [&str; 3] = ["term", "scheme", "location"];

/// Recover the structured identity from a stored description.
pub(crate) fn id_of_description(value: &Value) -> Option<CategoryId> {
    let obj = value.as_object()?;
    Some(CategoryId::new(
        obj.get("scheme")?.as_str()?,
        obj.get("term")?.as_str()?,
    ))
}

pub struct CategoryRegistry {
    store: Arc<dyn DocumentStore>,
    idgen: Arc<dyn IdGenerator>,
    base_url: String,
}

impl CategoryRegistry {
    pub fn new(store: Arc<dyn DocumentStore>, idgen: Arc<dyn IdGenerator>, base_url: String) -> Self {
        Self {
            store,
            idgen,
            base_url,
        }
    }

    /// Register a new category.
    ///
    /// Rejects a duplicate identity with `Conflict` and a dangling
    /// relation or action reference with `BadRequest`; nothing is written
    /// in either case.
    pub async fn create(&self, category: Category, creator: &str) -> Result<String> {
        let class = category.class();
        let body = category.body();
        let id = locator::category_identity(&body.scheme, &body.term);
        let collection = Collection::from(class);

        for doc in self.store.all(collection).await? {
            if id_of_description(&doc.description).as_ref() == Some(&id) {
                debug!("category {} already registered", id);
                return Err(GatehouseError::Conflict(format!(
                    "a {} with identity {} already exists",
                    class, id
                )));
            }
        }

        if !matching::relations_exist(&body.related, &self.known_category_ids().await?) {
            return Err(GatehouseError::BadRequest(format!(
                "a related category of {} does not exist",
                id
            )));
        }
        if !matching::actions_exist(&body.actions, &self.known_action_ids().await?) {
            return Err(GatehouseError::BadRequest(format!(
                "a declared action of {} does not exist",
                id
            )));
        }

        let doc_id = self.idgen.generate();
        let location = locator::category_location(
            &self.base_url,
            class,
            creator,
            &category.path_segment(),
            &doc_id,
        );
        let doc = StoredDocument::new(
            doc_id,
            id.rendered(),
            creator.to_string(),
            location.clone(),
            category.to_value()?,
            class.into(),
        );
        self.store.insert(collection, doc).await?;

        info!("registered {} {} at {}", class, id, location);
        Ok(location)
    }

    /// Every stored description of the class, in collection order.
    pub async fn list_all(&self, class: CategoryClass) -> Result<Vec<StoredDocument>> {
        self.store.all(class.into()).await
    }

    /// The whole query interface: kinds, then mixins, then actions.
    pub async fn list_everything(&self) -> Result<Vec<StoredDocument>> {
        let mut docs = self.store.all(Collection::Kinds).await?;
        docs.extend(self.store.all(Collection::Mixins).await?);
        docs.extend(self.store.all(Collection::Actions).await?);
        Ok(docs)
    }

    /// Delete a category by identity.
    ///
    /// Entities referencing the deleted category are not touched.
    pub async fn delete_by_identity(&self, class: CategoryClass, id: &CategoryId) -> Result<()> {
        let collection = Collection::from(class);
        let doc = self
            .find_by_identity(collection, id)
            .await?
            .ok_or(GatehouseError::NotFound)?;
        self.store.remove(collection, &doc.id, doc.rev).await?;
        info!("deleted {} {}", class, id);
        Ok(())
    }

    /// Partial update of a stored description.
    ///
    /// All-or-nothing: an immutable key (`term`, `scheme`, `location`)
    /// with a changed value, or a key the description does not have,
    /// aborts the whole update and the stored document stays untouched.
    pub async fn update_description(
        &self,
        class: CategoryClass,
        id: &CategoryId,
        patch: &Map<String, Value>,
    ) -> Result<Value> {
        let collection = Collection::from(class);
        let mut doc = self
            .find_by_identity(collection, id)
            .await?
            .ok_or(GatehouseError::NotFound)?;

        let old = doc.description.as_object().ok_or_else(|| {
            GatehouseError::Internal(format!("stored description of {} is not an object", id))
        })?;
        let merged = matching::merge_description(old, patch, &IMMUTABLE_KEYS)
            .map_err(|rejection| GatehouseError::Forbidden(rejection.to_string()))?;
        let merged = Value::Object(merged);

        // The merge may not break the canonical shape.
        let raw: RawCategory = serde_json::from_value(merged.clone()).map_err(|e| {
            GatehouseError::BadRequest(format!("patch does not yield a valid description: {}", e))
        })?;
        Category::from_raw(raw).map_err(GatehouseError::BadRequest)?;

        doc.description = merged.clone();
        self.store.replace(collection, doc).await?;
        info!("updated {} {}", class, id);
        Ok(merged)
    }

    async fn find_by_identity(
        &self,
        collection: Collection,
        id: &CategoryId,
    ) -> Result<Option<StoredDocument>> {
        Ok(self
            .store
            .all(collection)
            .await?
            .into_iter()
            .find(|doc| id_of_description(&doc.description).as_ref() == Some(id)))
    }

    /// Rendered identities a `related` entry may reference: kinds and
    /// mixins.
    pub(crate) async fn known_category_ids(&self) -> Result<HashSet<String>> {
        let mut ids = HashSet::new();
        for collection in [Collection::Kinds, Collection::Mixins] {
            for doc in self.store.all(collection).await? {
                ids.insert(doc.occi_id);
            }
        }
        Ok(ids)
    }

    /// Rendered identities an `actions` entry may reference.
    pub(crate) async fn known_action_ids(&self) -> Result<HashSet<String>> {
        Ok(self
            .store
            .all(Collection::Actions)
            .await?
            .into_iter()
            .map(|doc| doc.occi_id)
            .collect())
    }
}
