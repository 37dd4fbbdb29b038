//! Entity registry: CRUD and partial-update semantics for resources and
//! links

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::db::{Collection, DocumentStore};
use crate::idgen::IdGenerator;
use crate::locator;
use crate::matching;
use crate::model::{Category, Entity, RawEntity, StoredDocument};
use crate::types::{GatehouseError, Result};

pub struct EntityRegistry {
    store: Arc<dyn DocumentStore>,
    idgen: Arc<dyn IdGenerator>,
    base_url: String,
}

impl EntityRegistry {
    pub fn new(store: Arc<dyn DocumentStore>, idgen: Arc<dyn IdGenerator>, base_url: String) -> Self {
        Self {
            store,
            idgen,
            base_url,
        }
    }

    /// Create an entity instance under a generated id.
    ///
    /// The kind and every attached mixin must already be registered.
    pub async fn create(&self, entity: Entity, creator: &str) -> Result<String> {
        let kind = self.resolve_kind(entity.kind()).await?;
        self.verify_mixins(&entity.body().mixins).await?;

        let unique_id = self.idgen.generate();
        let location = locator::entity_location(
            &self.base_url,
            creator,
            &kind.path_segment(),
            &unique_id,
        );
        let doc = StoredDocument::new(
            unique_id.clone(),
            unique_id,
            creator.to_string(),
            location.clone(),
            entity.to_value()?,
            entity.doc_type(),
        );
        self.store.insert(self.collection_for(&entity), doc).await?;

        info!("created {} at {}", entity.kind(), location);
        Ok(location)
    }

    /// Fetch one entity's description by its path.
    pub async fn get_by_path(&self, path_url: &str) -> Result<Value> {
        let (_, doc) = self
            .find_by_location(path_url)
            .await?
            .ok_or(GatehouseError::NotFound)?;
        Ok(doc.description)
    }

    /// Idempotent full replace, or create at a caller-chosen URL when the
    /// target does not exist yet.
    pub async fn update_full(&self, entity: Entity, creator: &str, path_url: &str) -> Result<String> {
        self.resolve_kind(entity.kind()).await?;
        self.verify_mixins(&entity.body().mixins).await?;

        let url = self.full_url(path_url);
        match self.find_by_location(path_url).await? {
            Some((collection, mut doc)) => {
                if collection != self.collection_for(&entity) {
                    return Err(GatehouseError::BadRequest(format!(
                        "{} cannot change entity type",
                        url
                    )));
                }
                doc.description = entity.to_value()?;
                self.store.replace(collection, doc).await?;
                info!("replaced entity at {}", url);
                Ok(url)
            }
            None => {
                let unique_id = self.idgen.generate();
                let doc = StoredDocument::new(
                    unique_id.clone(),
                    unique_id,
                    creator.to_string(),
                    url.clone(),
                    entity.to_value()?,
                    entity.doc_type(),
                );
                self.store.insert(self.collection_for(&entity), doc).await?;
                info!("created entity at custom location {}", url);
                Ok(url)
            }
        }
    }

    /// All-or-nothing partial update; the target must exist.
    pub async fn update_partial(&self, patch: &Map<String, Value>, path_url: &str) -> Result<String> {
        let (collection, mut doc) = self
            .find_by_location(path_url)
            .await?
            .ok_or(GatehouseError::NotFound)?;

        let old = doc.description.as_object().ok_or_else(|| {
            GatehouseError::Internal(format!(
                "stored description at {} is not an object",
                doc.location
            ))
        })?;
        // Entities have no immutable description keys; identity lives in
        // the envelope. Unknown keys still abort the whole merge.
        let merged = matching::merge_description(old, patch, &[])
            .map_err(|rejection| GatehouseError::Forbidden(rejection.to_string()))?;
        let merged = Value::Object(merged);

        let raw: RawEntity = serde_json::from_value(merged.clone()).map_err(|e| {
            GatehouseError::BadRequest(format!("patch does not yield a valid description: {}", e))
        })?;
        Entity::from_raw(raw).map_err(GatehouseError::BadRequest)?;

        let location = doc.location.clone();
        doc.description = merged;
        self.store.replace(collection, doc).await?;
        info!("updated entity at {}", location);
        Ok(location)
    }

    /// Remove an entity by its path.
    pub async fn delete_by_path(&self, path_url: &str) -> Result<()> {
        let (collection, doc) = self
            .find_by_location(path_url)
            .await?
            .ok_or(GatehouseError::NotFound)?;
        self.store.remove(collection, &doc.id, doc.rev).await?;
        info!("deleted entity at {}", doc.location);
        Ok(())
    }

    /// Every entity whose location is rooted at the given path
    /// (kind/mixin collection listing).
    pub async fn list_by_path(&self, path_url: &str) -> Result<Vec<StoredDocument>> {
        let mut found = Vec::new();
        for collection in Collection::ENTITIES {
            for doc in self.store.all(collection).await? {
                if self.location_rooted_at(&doc.location, path_url) {
                    found.push(doc);
                }
            }
        }
        Ok(found)
    }

    /// Every entity whose description satisfies the filter.
    pub async fn list_filtered(&self, filter: &Map<String, Value>) -> Result<Vec<StoredDocument>> {
        let mut found = Vec::new();
        for collection in Collection::ENTITIES {
            for doc in self.store.all(collection).await? {
                let matches = doc
                    .description
                    .as_object()
                    .map(|desc| matching::matches(desc, filter))
                    .unwrap_or(false);
                if matches {
                    found.push(doc);
                }
            }
        }
        Ok(found)
    }

    /// Validate that an action is applicable to the entity at the path.
    ///
    /// The action must be declared on the entity's kind or one of its
    /// attached mixins; the side effect itself belongs to the platform
    /// behind the gateway.
    pub async fn trigger_action(
        &self,
        action_id: &str,
        path_url: &str,
        payload: &Map<String, Value>,
    ) -> Result<()> {
        let (_, doc) = self
            .find_by_location(path_url)
            .await?
            .ok_or(GatehouseError::NotFound)?;
        let entity = Entity::from_value(&doc.description)?;

        let mut declared: HashSet<String> = HashSet::new();
        if let Ok(kind) = self.resolve_kind(entity.kind()).await {
            declared.extend(kind.body().actions.iter().cloned());
        }
        for mixin_id in &entity.body().mixins {
            if let Some(mixin) = self.find_category(Collection::Mixins, mixin_id).await? {
                declared.extend(mixin.body().actions.iter().cloned());
            }
        }

        // Callers may name the action by its full identity or by its bare
        // term (?action=start).
        let applicable = declared.iter().any(|id| {
            id == action_id || id.rsplit(['#', '/']).next() == Some(action_id)
        });
        if !applicable {
            debug!("action {} not declared for {}", action_id, doc.location);
            return Err(GatehouseError::BadRequest(format!(
                "action {} is not applicable to {}",
                action_id, doc.location
            )));
        }

        info!(
            "forwarding action {} for {} ({} payload attributes)",
            action_id,
            doc.location,
            payload.len()
        );
        Ok(())
    }

    fn collection_for(&self, entity: &Entity) -> Collection {
        match entity {
            Entity::Resource(_) => Collection::Resources,
            Entity::Link { .. } => Collection::Links,
        }
    }

    /// Absolute form of a request path; stored locations are absolute.
    fn full_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    fn location_rooted_at(&self, location: &str, path: &str) -> bool {
        let rel = location.strip_prefix(&self.base_url).unwrap_or(location);
        // A collection path matches with or without the owner prefix:
        // /compute/ lists /u1/compute/... for every owner.
        rel.starts_with(path) || rel.contains(path)
    }

    async fn find_by_location(&self, path_url: &str) -> Result<Option<(Collection, StoredDocument)>> {
        let url = self.full_url(path_url);
        for collection in Collection::ENTITIES {
            let found = self
                .store
                .all(collection)
                .await?
                .into_iter()
                .find(|doc| doc.location == url);
            if let Some(doc) = found {
                return Ok(Some((collection, doc)));
            }
        }
        Ok(None)
    }

    async fn resolve_kind(&self, kind_id: &str) -> Result<Category> {
        self.find_category(Collection::Kinds, kind_id)
            .await?
            .ok_or_else(|| {
                debug!("kind {} is not registered", kind_id);
                GatehouseError::BadRequest(format!("kind {} does not exist", kind_id))
            })
    }

    async fn find_category(
        &self,
        collection: Collection,
        rendered_id: &str,
    ) -> Result<Option<Category>> {
        for doc in self.store.all(collection).await? {
            if doc.occi_id == rendered_id {
                return Category::from_value(&doc.description).map(Some);
            }
        }
        Ok(None)
    }

    async fn verify_mixins(&self, mixins: &[String]) -> Result<()> {
        if mixins.is_empty() {
            return Ok(());
        }
        let known: HashSet<String> = self
            .store
            .all(Collection::Mixins)
            .await?
            .into_iter()
            .map(|doc| doc.occi_id)
            .collect();
        if !matching::relations_exist(mixins, &known) {
            return Err(GatehouseError::BadRequest(
                "an attached mixin does not exist".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::idgen::SequentialGenerator;
    use crate::model::RawCategory;
    use crate::registry::CategoryRegistry;
    use serde_json::json;

    const BASE: &str = "http://127.0.0.1:8090";
    const COMPUTE: &str = "http://schemas.ogf.org/occi/infrastructure#compute";
    const START: &str = "http://schemas.ogf.org/occi/infrastructure/compute/action#start";

    fn registries() -> (CategoryRegistry, EntityRegistry) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let idgen: Arc<dyn IdGenerator> = Arc::new(SequentialGenerator::default());
        (
            CategoryRegistry::new(Arc::clone(&store), Arc::clone(&idgen), BASE.to_string()),
            EntityRegistry::new(store, idgen, BASE.to_string()),
        )
    }

    async fn register_compute(categories: &CategoryRegistry) {
        categories
            .create(
                Category::from_raw(RawCategory {
                    term: "start".into(),
                    scheme: "http://schemas.ogf.org/occi/infrastructure/compute/action#".into(),
                    class: "action".into(),
                    ..Default::default()
                })
                .unwrap(),
                "admin",
            )
            .await
            .unwrap();
        categories
            .create(
                Category::from_raw(RawCategory {
                    term: "compute".into(),
                    scheme: "http://schemas.ogf.org/occi/infrastructure#".into(),
                    class: "kind".into(),
                    location: Some("/compute/".into()),
                    actions: vec![START.into()],
                    ..Default::default()
                })
                .unwrap(),
                "admin",
            )
            .await
            .unwrap();
    }

    fn vm(cores: i64) -> Entity {
        Entity::from_raw(RawEntity {
            kind: COMPUTE.into(),
            attributes: json!({"occi.compute.cores": cores})
                .as_object()
                .unwrap()
                .clone(),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_requires_registered_kind() {
        let (categories, entities) = registries();
        let err = entities.create(vm(2), "user").await.unwrap_err();
        assert!(matches!(err, GatehouseError::BadRequest(_)));

        register_compute(&categories).await;
        let location = entities.create(vm(2), "user").await.unwrap();
        // Ids id-1/id-2 went to the categories; the entity draws id-3.
        assert_eq!(location, format!("{}/user/compute/id-3", BASE));
    }

    #[tokio::test]
    async fn test_create_requires_registered_mixins() {
        let (categories, entities) = registries();
        register_compute(&categories).await;
        let entity = Entity::from_raw(RawEntity {
            kind: COMPUTE.into(),
            mixins: vec!["http://example.org/template#small".into()],
            ..Default::default()
        })
        .unwrap();
        let err = entities.create(entity, "user").await.unwrap_err();
        assert!(matches!(err, GatehouseError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_get_by_path_round_trip() {
        let (categories, entities) = registries();
        register_compute(&categories).await;
        let location = entities.create(vm(2), "user").await.unwrap();
        let path = location.strip_prefix(BASE).unwrap();

        let description = entities.get_by_path(path).await.unwrap();
        assert_eq!(description["kind"], COMPUTE);
        assert_eq!(description["attributes"]["occi.compute.cores"], 2);
    }

    #[tokio::test]
    async fn test_get_unknown_path_is_not_found() {
        let (_, entities) = registries();
        let err = entities.get_by_path("/user/compute/nope").await.unwrap_err();
        assert!(matches!(err, GatehouseError::NotFound));
    }

    #[tokio::test]
    async fn test_put_creates_at_custom_url_once_kind_exists() {
        let (categories, entities) = registries();

        let err = entities
            .update_full(vm(2), "user", "/user/compute/mine")
            .await
            .unwrap_err();
        assert!(matches!(err, GatehouseError::BadRequest(_)));

        register_compute(&categories).await;
        let location = entities
            .update_full(vm(2), "user", "/user/compute/mine")
            .await
            .unwrap();
        assert_eq!(location, format!("{}/user/compute/mine", BASE));

        // Second PUT is a full replace, not a second document.
        entities
            .update_full(vm(8), "user", "/user/compute/mine")
            .await
            .unwrap();
        let description = entities.get_by_path("/user/compute/mine").await.unwrap();
        assert_eq!(description["attributes"]["occi.compute.cores"], 8);
        assert_eq!(entities.list_by_path("/compute/").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_partial_update_merges_known_keys_only() {
        let (categories, entities) = registries();
        register_compute(&categories).await;
        let location = entities.create(vm(2), "user").await.unwrap();
        let path = location.strip_prefix(BASE).unwrap().to_string();

        let patch = json!({"attributes": {"occi.compute.cores": 4}})
            .as_object()
            .unwrap()
            .clone();
        entities.update_partial(&patch, &path).await.unwrap();
        let description = entities.get_by_path(&path).await.unwrap();
        assert_eq!(description["attributes"]["occi.compute.cores"], 4);

        let bad = json!({"flavor": "large"}).as_object().unwrap().clone();
        let err = entities.update_partial(&bad, &path).await.unwrap_err();
        assert!(matches!(err, GatehouseError::Forbidden(_)));
        let description = entities.get_by_path(&path).await.unwrap();
        assert!(description.get("flavor").is_none());
    }

    #[tokio::test]
    async fn test_partial_update_requires_existing_target() {
        let (_, entities) = registries();
        let patch = json!({"title": "vm"}).as_object().unwrap().clone();
        let err = entities
            .update_partial(&patch, "/user/compute/nope")
            .await
            .unwrap_err();
        assert!(matches!(err, GatehouseError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_never_created_is_not_found() {
        let (_, entities) = registries();
        let err = entities
            .delete_by_path("/user/compute/nope")
            .await
            .unwrap_err();
        assert!(matches!(err, GatehouseError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let (categories, entities) = registries();
        register_compute(&categories).await;
        let location = entities.create(vm(2), "user").await.unwrap();
        let path = location.strip_prefix(BASE).unwrap().to_string();

        entities.delete_by_path(&path).await.unwrap();
        let err = entities.get_by_path(&path).await.unwrap_err();
        assert!(matches!(err, GatehouseError::NotFound));
    }

    #[tokio::test]
    async fn test_list_by_path_spans_owners() {
        let (categories, entities) = registries();
        register_compute(&categories).await;
        entities.create(vm(1), "alice").await.unwrap();
        entities.create(vm(2), "bob").await.unwrap();

        let all = entities.list_by_path("/compute/").await.unwrap();
        assert_eq!(all.len(), 2);

        let alices = entities.list_by_path("/alice/compute/").await.unwrap();
        assert_eq!(alices.len(), 1);
        assert_eq!(alices[0].creator, "alice");
    }

    #[tokio::test]
    async fn test_list_filtered() {
        let (categories, entities) = registries();
        register_compute(&categories).await;
        entities.create(vm(1), "user").await.unwrap();
        entities.create(vm(2), "user").await.unwrap();

        let filter = json!({"kind": COMPUTE}).as_object().unwrap().clone();
        assert_eq!(entities.list_filtered(&filter).await.unwrap().len(), 2);

        let filter = json!({"kind": "http://x#other"})
            .as_object()
            .unwrap()
            .clone();
        assert!(entities.list_filtered(&filter).await.unwrap().is_empty());

        // The empty filter matches everything.
        assert_eq!(entities.list_filtered(&Map::new()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_trigger_action_checks_applicability() {
        let (categories, entities) = registries();
        register_compute(&categories).await;
        let location = entities.create(vm(2), "user").await.unwrap();
        let path = location.strip_prefix(BASE).unwrap().to_string();

        entities
            .trigger_action(START, &path, &Map::new())
            .await
            .unwrap();

        // The bare term works too.
        entities
            .trigger_action("start", &path, &Map::new())
            .await
            .unwrap();

        let err = entities
            .trigger_action("http://x/action#reboot", &path, &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GatehouseError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_trigger_action_on_unknown_entity_is_not_found() {
        let (_, entities) = registries();
        let err = entities
            .trigger_action(START, "/user/compute/nope", &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GatehouseError::NotFound));
    }
}
