//! HTTP routes for Gatehouse
//!
//! Each handler is a per-verb dispatcher: decode the request into
//! canonical form, hand it to a registry, encode the outcome into the
//! caller's preferred wire form. Failures short-circuit to a plain-text
//! response.

pub mod category;
pub mod collection;
pub mod entity;
pub mod health;

pub use category::{handle_category_request, query_interface};
pub use collection::handle_collection_request;
pub use entity::handle_entity_request;
pub use health::{health_check, readiness_check, version_info};

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::http::request::Parts;
use hyper::Request;

use crate::codec::MediaType;
use crate::types::{GatehouseError, Result};

/// Split a request into its parts and a UTF-8 body.
pub(crate) async fn read_body(req: Request<Incoming>) -> Result<(Parts, String)> {
    let (parts, body) = req.into_parts();
    let bytes = body
        .collect()
        .await
        .map_err(|e| GatehouseError::Internal(format!("failed to read request body: {}", e)))?
        .to_bytes();
    let text = String::from_utf8(bytes.to_vec())
        .map_err(|_| GatehouseError::NotAcceptable("request body is not UTF-8".into()))?;
    Ok((parts, text))
}

/// Request encoding, from the Content-Type header.
pub(crate) fn content_media(parts: &Parts) -> Result<MediaType> {
    let header = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    MediaType::from_content_type(header)
}

/// Response encoding, from the Accept header.
pub(crate) fn accept_media(parts: &Parts) -> MediaType {
    let header = parts
        .headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok());
    MediaType::from_accept(header)
}

/// The `action` query parameter, when present.
pub(crate) fn action_param(query: Option<&str>) -> Option<String> {
    query?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == "action" && !value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_param() {
        assert_eq!(action_param(Some("action=start")), Some("start".into()));
        assert_eq!(action_param(Some("foo=1&action=stop")), Some("stop".into()));
        assert_eq!(action_param(Some("foo=1")), None);
        assert_eq!(action_param(Some("action=")), None);
        assert_eq!(action_param(None), None);
    }
}
