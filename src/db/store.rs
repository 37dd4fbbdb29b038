//! The document store contract
//!
//! Five collections, one per document type. Mutations carry the revision
//! the caller read; a stale revision fails with `Conflict` rather than
//! silently overwriting. Either the full document is written or nothing
//! is.

use async_trait::async_trait;

use crate::model::{CategoryClass, StoredDocument};
use crate::types::Result;

/// The five document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Kinds,
    Mixins,
    Actions,
    Resources,
    Links,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Kinds,
        Collection::Mixins,
        Collection::Actions,
        Collection::Resources,
        Collection::Links,
    ];

    /// The two collections entities live in.
    pub const ENTITIES: [Collection; 2] = [Collection::Resources, Collection::Links];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Kinds => "kinds",
            Self::Mixins => "mixins",
            Self::Actions => "actions",
            Self::Resources => "resources",
            Self::Links => "links",
        }
    }
}

impl From<CategoryClass> for Collection {
    fn from(class: CategoryClass) -> Self {
        match class {
            CategoryClass::Kind => Self::Kinds,
            CategoryClass::Mixin => Self::Mixins,
            CategoryClass::Action => Self::Actions,
        }
    }
}

/// Generic document store with optimistic concurrency.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by store id.
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<StoredDocument>>;

    /// Insert a new document. Fails with `Conflict` if the id is taken.
    async fn insert(&self, collection: Collection, doc: StoredDocument) -> Result<()>;

    /// Replace an existing document. The document's revision must match
    /// the stored one; the store bumps it on success.
    async fn replace(&self, collection: Collection, doc: StoredDocument) -> Result<()>;

    /// Remove a document, guarded by the revision the caller read.
    async fn remove(&self, collection: Collection, id: &str, rev: i64) -> Result<()>;

    /// Every document in the collection, in collection order.
    async fn all(&self, collection: Collection) -> Result<Vec<StoredDocument>>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<()>;
}
