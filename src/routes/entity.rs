//! Single-entity paths: fetch, create/replace, partial update, action
//! trigger and delete

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};

use crate::auth;
use crate::codec;
use crate::model::Entity;
use crate::routes::{accept_media, action_param, content_media, read_body};
use crate::server::http::{created_response, error_response, respond};
use crate::server::AppState;
use crate::types::{GatehouseError, Result};

pub async fn handle_entity_request(
    state: Arc<AppState>,
    req: Request<Incoming>,
    path: String,
) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let result = match method {
        Method::GET => get_entity(state, req, &path).await,
        Method::PUT => put_entity(state, req, &path).await,
        Method::POST => post_entity(state, req, &path).await,
        Method::DELETE => delete_entity(state, &path).await,
        _ => Err(GatehouseError::MethodNotAllowed),
    };
    result.unwrap_or_else(error_response)
}

async fn get_entity(
    state: Arc<AppState>,
    req: Request<Incoming>,
    path: &str,
) -> Result<Response<Full<Bytes>>> {
    let (parts, _) = read_body(req).await?;
    let accept = accept_media(&parts);

    let description = state.entities.get_by_path(path).await?;
    let entity = Entity::from_value(&description)?;
    let body = codec::encode_entity(accept, &entity)?;
    Ok(respond(StatusCode::OK, accept.as_str(), body))
}

/// PUT: full update, or creation under a caller-chosen URL.
async fn put_entity(
    state: Arc<AppState>,
    req: Request<Incoming>,
    path: &str,
) -> Result<Response<Full<Bytes>>> {
    let (parts, body) = read_body(req).await?;
    let media = content_media(&parts)?;
    let accept = accept_media(&parts);
    let creator = auth::creator_from_headers(&parts.headers)?;

    let entity = codec::decode_entity(media, &body)?;
    let location = state.entities.update_full(entity, &creator, path).await?;
    Ok(created_response(accept, &location))
}

/// POST: partial update, or an action trigger when `?action=` is present.
async fn post_entity(
    state: Arc<AppState>,
    req: Request<Incoming>,
    path: &str,
) -> Result<Response<Full<Bytes>>> {
    let triggered_action = action_param(req.uri().query());
    let (parts, body) = read_body(req).await?;
    let media = content_media(&parts)?;
    let accept = accept_media(&parts);

    let attributes = codec::decode_attributes(media, &body)?;

    match triggered_action {
        Some(action) => {
            state
                .entities
                .trigger_action(&action, path, &attributes)
                .await?;
            Ok(respond(
                StatusCode::ACCEPTED,
                "text/plain",
                format!("Action {} has been forwarded for {}", action, path),
            ))
        }
        None => {
            let location = state.entities.update_partial(&attributes, path).await?;
            Ok(created_response(accept, &location))
        }
    }
}

async fn delete_entity(state: Arc<AppState>, path: &str) -> Result<Response<Full<Bytes>>> {
    state.entities.delete_by_path(path).await?;
    Ok(respond(
        StatusCode::OK,
        "text/plain",
        "The resource has been successfully deleted".to_string(),
    ))
}
