//! Entity model: resources and links
//!
//! Entities reference categories by identity only; the registry verifies
//! those references at write time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::document::DocType;
use crate::types::{GatehouseError, Result};

/// Fields shared by resources and links.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityBody {
    /// Rendered identity of the kind this entity conforms to.
    pub kind: String,
    /// Rendered identities of attached mixins.
    pub mixins: Vec<String>,
    pub title: Option<String>,
    pub attributes: Map<String, Value>,
}

/// Canonical entity document.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Resource(EntityBody),
    Link {
        body: EntityBody,
        source: String,
        target: String,
    },
}

/// Wire shape of an entity description.
///
/// A link is recognized by the presence of both `source` and `target`;
/// one without the other is a malformed shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawEntity {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mixins: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl Entity {
    pub fn body(&self) -> &EntityBody {
        match self {
            Self::Resource(b) => b,
            Self::Link { body, .. } => body,
        }
    }

    pub fn kind(&self) -> &str {
        &self.body().kind
    }

    pub fn doc_type(&self) -> DocType {
        match self {
            Self::Resource(_) => DocType::Resource,
            Self::Link { .. } => DocType::Link,
        }
    }

    pub fn from_raw(raw: RawEntity) -> std::result::Result<Self, String> {
        if raw.kind.is_empty() {
            return Err("entity kind must not be empty".into());
        }
        let body = EntityBody {
            kind: raw.kind,
            mixins: raw.mixins,
            title: raw.title,
            attributes: raw.attributes,
        };
        match (raw.source, raw.target) {
            (None, None) => Ok(Self::Resource(body)),
            (Some(source), Some(target)) => Ok(Self::Link {
                body,
                source,
                target,
            }),
            _ => Err("a link needs both source and target".into()),
        }
    }

    pub fn to_raw(&self) -> RawEntity {
        match self {
            Self::Resource(body) => RawEntity {
                kind: body.kind.clone(),
                mixins: body.mixins.clone(),
                title: body.title.clone(),
                attributes: body.attributes.clone(),
                source: None,
                target: None,
            },
            Self::Link {
                body,
                source,
                target,
            } => RawEntity {
                kind: body.kind.clone(),
                mixins: body.mixins.clone(),
                title: body.title.clone(),
                attributes: body.attributes.clone(),
                source: Some(source.clone()),
                target: Some(target.clone()),
            },
        }
    }

    /// Canonical JSON value, as persisted in a Stored Document.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.to_raw())?)
    }

    /// Rebuild the canonical variant from a persisted JSON value.
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw: RawEntity = serde_json::from_value(value.clone())
            .map_err(|e| GatehouseError::Internal(format!("stored entity is malformed: {}", e)))?;
        Self::from_raw(raw).map_err(GatehouseError::Internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_from_raw() {
        let raw = RawEntity {
            kind: "http://x#compute".into(),
            ..Default::default()
        };
        let entity = Entity::from_raw(raw).unwrap();
        assert_eq!(entity.doc_type(), DocType::Resource);
        assert_eq!(entity.kind(), "http://x#compute");
    }

    #[test]
    fn test_link_needs_both_ends() {
        let raw = RawEntity {
            kind: "http://x#networkinterface".into(),
            source: Some("/u1/compute/1".into()),
            ..Default::default()
        };
        assert!(Entity::from_raw(raw).is_err());
    }

    #[test]
    fn test_link_round_trip() {
        let raw = RawEntity {
            kind: "http://x#networkinterface".into(),
            source: Some("/u1/compute/1".into()),
            target: Some("/u1/network/2".into()),
            ..Default::default()
        };
        let entity = Entity::from_raw(raw).unwrap();
        assert_eq!(entity.doc_type(), DocType::Link);
        let value = entity.to_value().unwrap();
        assert_eq!(Entity::from_value(&value).unwrap(), entity);
    }

    #[test]
    fn test_empty_kind_rejected() {
        assert!(Entity::from_raw(RawEntity::default()).is_err());
    }
}
