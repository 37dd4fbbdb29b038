//! Caller identity extraction
//!
//! Credential verification belongs to the transport; this layer only
//! extracts the caller identifier from a standard Basic credential:
//! base64-decode, then take the portion before the first colon.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hyper::header::AUTHORIZATION;
use hyper::HeaderMap;

use crate::types::{GatehouseError, Result};

pub fn creator_from_headers(headers: &HeaderMap) -> Result<String> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| GatehouseError::Unauthorized("missing Authorization header".into()))?
        .to_str()
        .map_err(|_| GatehouseError::Unauthorized("unreadable Authorization header".into()))?;

    let encoded = header
        .strip_prefix("Basic ")
        .ok_or_else(|| GatehouseError::Unauthorized("expected a Basic credential".into()))?;

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| GatehouseError::Unauthorized("undecodable credential".into()))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| GatehouseError::Unauthorized("credential is not UTF-8".into()))?;

    let user_id = decoded.split(':').next().unwrap_or("");
    if user_id.is_empty() {
        return Err(GatehouseError::Unauthorized(
            "credential carries no user id".into(),
        ));
    }
    Ok(user_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extracts_portion_before_first_colon() {
        // "user1:secret:with:colons"
        let headers = headers_with("Basic dXNlcjE6c2VjcmV0OndpdGg6Y29sb25z");
        assert_eq!(creator_from_headers(&headers).unwrap(), "user1");
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        let err = creator_from_headers(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, GatehouseError::Unauthorized(_)));
    }

    #[test]
    fn test_garbage_credential_is_unauthorized() {
        let err = creator_from_headers(&headers_with("Basic !!!")).unwrap_err();
        assert!(matches!(err, GatehouseError::Unauthorized(_)));
    }

    #[test]
    fn test_non_basic_scheme_is_unauthorized() {
        let err = creator_from_headers(&headers_with("Bearer token")).unwrap_err();
        assert!(matches!(err, GatehouseError::Unauthorized(_)));
    }
}
