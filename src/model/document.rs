//! Stored Document: the persistence envelope
//!
//! Wraps any canonical category or entity description with identity,
//! creator, timestamp and location metadata. The `_id`/`_rev` pair belongs
//! to the store; the registries never interpret `_rev` beyond passing it
//! back on mutation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::category::CategoryClass;

/// Variant tag of the wrapped description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocType {
    Kind,
    Mixin,
    Action,
    Resource,
    Link,
}

impl From<CategoryClass> for DocType {
    fn from(class: CategoryClass) -> Self {
        match class {
            CategoryClass::Kind => Self::Kind,
            CategoryClass::Mixin => Self::Mixin,
            CategoryClass::Action => Self::Action,
        }
    }
}

/// Persistence envelope for one category or entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Store document id (the generator-issued unique id).
    #[serde(rename = "_id")]
    pub id: String,

    /// Optimistic-concurrency revision token, owned by the store.
    #[serde(rename = "_rev")]
    pub rev: i64,

    /// Category identity rendering, or the entity's unique id.
    #[serde(rename = "OCCI_ID")]
    pub occi_id: String,

    /// Caller identifier extracted from the request credential.
    #[serde(rename = "Creator")]
    pub creator: String,

    #[serde(rename = "CreationDate")]
    pub creation_date: String,

    /// Canonical URI of the described category or entity.
    #[serde(rename = "Location")]
    pub location: String,

    /// The canonical description body.
    #[serde(rename = "Description")]
    pub description: Value,

    #[serde(rename = "Type")]
    pub doc_type: DocType,
}

impl StoredDocument {
    pub fn new(
        id: String,
        occi_id: String,
        creator: String,
        location: String,
        description: Value,
        doc_type: DocType,
    ) -> Self {
        Self {
            id,
            rev: 1,
            occi_id,
            creator,
            creation_date: chrono::Utc::now().to_rfc3339(),
            location,
            description,
            doc_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_field_names() {
        let doc = StoredDocument::new(
            "uuid-1".into(),
            "http://x#compute".into(),
            "user".into(),
            "http://localhost:8090/-/kind/user/compute/uuid-1".into(),
            json!({"term": "compute"}),
            DocType::Kind,
        );
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["_id"], "uuid-1");
        assert_eq!(value["_rev"], 1);
        assert_eq!(value["OCCI_ID"], "http://x#compute");
        assert_eq!(value["Creator"], "user");
        assert_eq!(value["Type"], "Kind");
        assert!(value["CreationDate"].is_string());
    }
}
