//! Structured JSON encoding (`application/occi+json`)
//!
//! Decoding is a direct parse into the canonical shape; no semantic
//! validation happens here (that is the registry's job), but unknown
//! shapes are rejected at this boundary.

use serde_json::{Map, Value};

use crate::model::{Category, Entity, RawCategory, RawEntity};
use crate::types::{GatehouseError, Result};

pub fn decode_category(body: &str) -> Result<Category> {
    let raw: RawCategory = serde_json::from_str(body)
        .map_err(|e| GatehouseError::NotAcceptable(format!("undecodable category: {}", e)))?;
    Category::from_raw(raw).map_err(GatehouseError::NotAcceptable)
}

pub fn decode_entity(body: &str) -> Result<Entity> {
    let raw: RawEntity = serde_json::from_str(body)
        .map_err(|e| GatehouseError::NotAcceptable(format!("undecodable entity: {}", e)))?;
    Entity::from_raw(raw).map_err(GatehouseError::NotAcceptable)
}

pub fn decode_attributes(body: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| GatehouseError::NotAcceptable(format!("undecodable document: {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(GatehouseError::NotAcceptable(
            "expected a JSON object".into(),
        )),
    }
}

pub fn encode_category(category: &Category) -> Result<String> {
    Ok(serde_json::to_string(&category.to_raw())?)
}

pub fn encode_entity(entity: &Entity) -> Result<String> {
    Ok(serde_json::to_string(&entity.to_raw())?)
}

/// Collections encode as an ordered JSON array of canonical documents.
pub fn encode_collection(descriptions: &[Value]) -> Result<String> {
    Ok(serde_json::to_string(descriptions)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_round_trip() {
        let body = json!({
            "term": "compute",
            "scheme": "http://schemas.ogf.org/occi/infrastructure#",
            "class": "kind",
            "title": "Compute Resource",
            "location": "/compute/",
            "attributes": ["occi.compute.cores", "occi.compute.memory"],
            "actions": ["http://schemas.ogf.org/occi/infrastructure/compute/action#start"],
            "related": ["http://schemas.ogf.org/occi/core#resource"]
        })
        .to_string();

        let decoded = decode_category(&body).unwrap();
        let encoded = encode_category(&decoded).unwrap();
        assert_eq!(decode_category(&encoded).unwrap(), decoded);
    }

    #[test]
    fn test_entity_round_trip() {
        let body = json!({
            "kind": "http://schemas.ogf.org/occi/infrastructure#compute",
            "mixins": ["http://example.org/template#small"],
            "title": "my vm",
            "attributes": {"occi.compute.cores": 2, "occi.compute.hostname": "vm0"}
        })
        .to_string();

        let decoded = decode_entity(&body).unwrap();
        let encoded = encode_entity(&decoded).unwrap();
        assert_eq!(decode_entity(&encoded).unwrap(), decoded);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let body = json!({
            "term": "compute",
            "scheme": "http://x#",
            "class": "kind",
            "color": "blue"
        })
        .to_string();
        let err = decode_category(&body).unwrap_err();
        assert!(matches!(err, GatehouseError::NotAcceptable(_)));
    }

    #[test]
    fn test_non_object_attributes_rejected() {
        assert!(decode_attributes("[1,2]").is_err());
        assert!(decode_attributes("\"text\"").is_err());
        assert!(decode_attributes("{\"title\": \"vm\"}").is_ok());
    }
}
