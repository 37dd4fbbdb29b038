//! Entity collection paths: listing, filtering and creation
//!
//! A collection path ends with `/`: the root `/`, a kind location such
//! as `/compute/`, or an owner-scoped `/user/compute/`.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::Value;

use crate::auth;
use crate::codec::{self, MediaType};
use crate::model::StoredDocument;
use crate::routes::{accept_media, content_media, read_body};
use crate::server::http::{created_response, error_response, respond};
use crate::server::AppState;
use crate::types::{GatehouseError, Result};

pub async fn handle_collection_request(
    state: Arc<AppState>,
    req: Request<Incoming>,
    path: String,
) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let result = match method {
        Method::GET => list_entities(state, req, &path).await,
        Method::POST => create_entity(state, req).await,
        _ => Err(GatehouseError::MethodNotAllowed),
    };
    result.unwrap_or_else(error_response)
}

/// GET with an empty body lists the collection; a body is a filter.
async fn list_entities(
    state: Arc<AppState>,
    req: Request<Incoming>,
    path: &str,
) -> Result<Response<Full<Bytes>>> {
    let (parts, body) = read_body(req).await?;
    let accept = accept_media(&parts);

    let docs = if body.trim().is_empty() {
        state.entities.list_by_path(path).await?
    } else {
        let media = content_media(&parts)?;
        let filter = codec::decode_attributes(media, &body)?;
        state.entities.list_filtered(&filter).await?
    };

    encode_listing(accept, &docs)
}

fn encode_listing(accept: MediaType, docs: &[StoredDocument]) -> Result<Response<Full<Bytes>>> {
    let body = if accept == MediaType::UriList {
        let locations: Vec<String> = docs.iter().map(|d| d.location.clone()).collect();
        codec::encode_locations(accept, &locations)?
    } else {
        let descriptions: Vec<Value> = docs.iter().map(|d| d.description.clone()).collect();
        codec::encode_entity_collection(accept, &descriptions)?
    };
    Ok(respond(StatusCode::OK, accept.as_str(), body))
}

async fn create_entity(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>> {
    let (parts, body) = read_body(req).await?;
    let media = content_media(&parts)?;
    let accept = accept_media(&parts);
    let creator = auth::creator_from_headers(&parts.headers)?;

    let entity = codec::decode_entity(media, &body)?;
    let location = state.entities.create(entity, &creator).await?;
    Ok(created_response(accept, &location))
}
