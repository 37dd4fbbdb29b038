//! Description codec: wire encodings to and from canonical documents
//!
//! Three encodings are recognized: the compact header/text form
//! (`text/occi`, `text/plain`), the structured JSON form
//! (`application/occi+json`) and the plain URI listing (`text/uri-list`).
//! Anything else is rejected with `UnsupportedMediaType` before any body
//! parsing; a body that decodes to no usable canonical document is
//! `NotAcceptable`. The codec is pure: it never touches storage.

pub mod occi_json;
pub mod occi_text;
pub mod uri_list;

use serde_json::{Map, Value};

use crate::model::{Category, Entity};
use crate::types::{GatehouseError, Result};

/// Wire encodings understood by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// `text/occi`: compact header/text encoding.
    OcciText,
    /// `text/plain`: same line grammar as `text/occi`.
    Plain,
    /// `application/occi+json`: structured JSON encoding.
    OcciJson,
    /// `text/uri-list`: plain URI listing for collection membership.
    UriList,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OcciText => "text/occi",
            Self::Plain => "text/plain",
            Self::OcciJson => "application/occi+json",
            Self::UriList => "text/uri-list",
        }
    }

    /// Detect the request encoding from a Content-Type header value.
    pub fn from_content_type(header: Option<&str>) -> Result<Self> {
        let raw = header.unwrap_or("").trim();
        // Parameters (charset etc.) do not take part in detection.
        let essence = raw.split(';').next().unwrap_or("").trim();
        match essence {
            "text/occi" => Ok(Self::OcciText),
            "text/plain" => Ok(Self::Plain),
            "application/occi+json" => Ok(Self::OcciJson),
            "text/uri-list" => Ok(Self::UriList),
            "" => Err(GatehouseError::UnsupportedMediaType("<none>".into())),
            other => Err(GatehouseError::UnsupportedMediaType(other.to_string())),
        }
    }

    /// Choose the response encoding from an Accept header value.
    ///
    /// Unknown or absent preferences fall back to the JSON form, the way
    /// the server always answered clients that did not care.
    pub fn from_accept(header: Option<&str>) -> Self {
        let raw = header.unwrap_or("");
        if raw.contains("text/occi") {
            Self::OcciText
        } else if raw.contains("text/uri-list") {
            Self::UriList
        } else if raw.contains("text/plain") {
            Self::Plain
        } else {
            Self::OcciJson
        }
    }
}

fn reject_empty(body: &str) -> Result<()> {
    if body.trim().is_empty() {
        return Err(GatehouseError::NotAcceptable("empty request body".into()));
    }
    Ok(())
}

/// Decode a category description from the request body.
pub fn decode_category(media: MediaType, body: &str) -> Result<Category> {
    reject_empty(body)?;
    match media {
        MediaType::OcciJson => occi_json::decode_category(body),
        MediaType::OcciText | MediaType::Plain => occi_text::decode_category(body),
        MediaType::UriList => Err(GatehouseError::NotAcceptable(
            "a URI list cannot carry a category description".into(),
        )),
    }
}

/// Decode an entity description from the request body.
pub fn decode_entity(media: MediaType, body: &str) -> Result<Entity> {
    reject_empty(body)?;
    match media {
        MediaType::OcciJson => occi_json::decode_entity(body),
        MediaType::OcciText | MediaType::Plain => occi_text::decode_entity(body),
        MediaType::UriList => Err(GatehouseError::NotAcceptable(
            "a URI list cannot carry an entity description".into(),
        )),
    }
}

/// Decode a flat key/value document: a partial-update patch or a filter.
pub fn decode_attributes(media: MediaType, body: &str) -> Result<Map<String, Value>> {
    reject_empty(body)?;
    match media {
        MediaType::OcciJson => occi_json::decode_attributes(body),
        MediaType::OcciText | MediaType::Plain => occi_text::decode_attributes(body),
        MediaType::UriList => Err(GatehouseError::NotAcceptable(
            "a URI list cannot carry attributes".into(),
        )),
    }
}

/// Decode a collection-membership body: one URI per line.
pub fn decode_locations(media: MediaType, body: &str) -> Result<Vec<String>> {
    reject_empty(body)?;
    match media {
        MediaType::UriList => uri_list::decode(body),
        _ => Err(GatehouseError::NotAcceptable(format!(
            "{} cannot carry a URI list",
            media.as_str()
        ))),
    }
}

/// Encode a single category description.
pub fn encode_category(media: MediaType, category: &Category) -> Result<String> {
    match media {
        MediaType::OcciJson => occi_json::encode_category(category),
        MediaType::OcciText | MediaType::Plain => Ok(occi_text::encode_category(category)),
        MediaType::UriList => Err(GatehouseError::NotAcceptable(
            "a category description has no URI-list form".into(),
        )),
    }
}

/// Encode a single entity description.
pub fn encode_entity(media: MediaType, entity: &Entity) -> Result<String> {
    match media {
        MediaType::OcciJson => occi_json::encode_entity(entity),
        MediaType::OcciText | MediaType::Plain => occi_text::encode_entity(entity),
        MediaType::UriList => Err(GatehouseError::NotAcceptable(
            "an entity description has no URI-list form".into(),
        )),
    }
}

/// Encode an ordered sequence of stored category descriptions.
pub fn encode_category_collection(media: MediaType, descriptions: &[Value]) -> Result<String> {
    match media {
        MediaType::OcciJson => occi_json::encode_collection(descriptions),
        MediaType::OcciText | MediaType::Plain => {
            let mut blocks = Vec::with_capacity(descriptions.len());
            for value in descriptions {
                let category = Category::from_value(value)?;
                blocks.push(occi_text::encode_category(&category));
            }
            Ok(blocks.join("\n\n"))
        }
        MediaType::UriList => Err(GatehouseError::NotAcceptable(
            "category descriptions have no URI-list form".into(),
        )),
    }
}

/// Encode an ordered sequence of stored entity descriptions.
pub fn encode_entity_collection(media: MediaType, descriptions: &[Value]) -> Result<String> {
    match media {
        MediaType::OcciJson => occi_json::encode_collection(descriptions),
        MediaType::OcciText | MediaType::Plain => {
            let mut blocks = Vec::with_capacity(descriptions.len());
            for value in descriptions {
                let entity = Entity::from_value(value)?;
                blocks.push(occi_text::encode_entity(&entity)?);
            }
            Ok(blocks.join("\n\n"))
        }
        MediaType::UriList => Err(GatehouseError::NotAcceptable(
            "use the location listing for URI-list responses".into(),
        )),
    }
}

/// Encode a listing of canonical URIs.
pub fn encode_locations(media: MediaType, locations: &[String]) -> Result<String> {
    match media {
        MediaType::UriList => Ok(uri_list::encode(locations)),
        MediaType::OcciText | MediaType::Plain => Ok(locations
            .iter()
            .map(|loc| format!("X-OCCI-Location: {}", loc))
            .collect::<Vec<_>>()
            .join("\n")),
        MediaType::OcciJson => Ok(serde_json::to_string(locations)?),
    }
}

/// Encode the body of an "OK, and location returned" response.
pub fn encode_created(media: MediaType, location: &str) -> String {
    match media {
        MediaType::OcciJson => serde_json::json!({ "Location": location }).to_string(),
        MediaType::OcciText | MediaType::Plain => format!("X-OCCI-Location: {}", location),
        MediaType::UriList => location.to_string(),
    }
}
