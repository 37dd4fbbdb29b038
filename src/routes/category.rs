//! Category interface: the `/-/kind/`, `/-/mixin/` and `/-/action/` paths

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::Value;

use crate::auth;
use crate::codec::{self, MediaType};
use crate::model::{CategoryClass, StoredDocument};
use crate::routes::{accept_media, content_media, read_body};
use crate::server::http::{error_response, respond};
use crate::server::AppState;
use crate::types::{GatehouseError, Result};

pub async fn handle_category_request(
    state: Arc<AppState>,
    class: CategoryClass,
    req: Request<Incoming>,
) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let result = match method {
        Method::GET => list_categories(state, class, req).await,
        Method::POST => create_category(state, class, req).await,
        Method::DELETE => delete_category(state, class, req).await,
        _ => Err(GatehouseError::MethodNotAllowed),
    };
    result.unwrap_or_else(error_response)
}

/// GET `/-/`: every registered category across the three classes.
pub async fn query_interface(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Response<Full<Bytes>> {
    let (parts, _) = match read_body(req).await {
        Ok(split) => split,
        Err(err) => return error_response(err),
    };
    let accept = accept_media(&parts);
    let result = async {
        let docs = state.categories.list_everything().await?;
        encode_listing(accept, &docs)
    }
    .await;
    result.unwrap_or_else(error_response)
}

async fn list_categories(
    state: Arc<AppState>,
    class: CategoryClass,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>> {
    let (parts, _) = read_body(req).await?;
    let accept = accept_media(&parts);
    let docs = state.categories.list_all(class).await?;
    encode_listing(accept, &docs)
}

fn encode_listing(accept: MediaType, docs: &[StoredDocument]) -> Result<Response<Full<Bytes>>> {
    let body = if accept == MediaType::UriList {
        let locations: Vec<String> = docs.iter().map(|d| d.location.clone()).collect();
        codec::encode_locations(accept, &locations)?
    } else {
        let descriptions: Vec<Value> = docs.iter().map(|d| d.description.clone()).collect();
        codec::encode_category_collection(accept, &descriptions)?
    };
    Ok(respond(StatusCode::OK, accept.as_str(), body))
}

async fn create_category(
    state: Arc<AppState>,
    class: CategoryClass,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>> {
    let (parts, body) = read_body(req).await?;
    let media = content_media(&parts)?;
    let creator = auth::creator_from_headers(&parts.headers)?;

    let category = codec::decode_category(media, &body)?;
    if category.class() != class {
        return Err(GatehouseError::BadRequest(format!(
            "expected a {} description, got a {}",
            class,
            category.class()
        )));
    }

    let location = state.categories.create(category, &creator).await?;
    Ok(respond(
        StatusCode::OK,
        "text/plain",
        format!(
            "A new {} has been successfully added to the database: {}",
            class, location
        ),
    ))
}

async fn delete_category(
    state: Arc<AppState>,
    class: CategoryClass,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>> {
    let (parts, body) = read_body(req).await?;
    let media = content_media(&parts)?;

    // Category identities carry a full scheme URL and cannot ride in a
    // path segment; the description in the body names the target.
    let category = codec::decode_category(media, &body)?;
    if category.class() != class {
        return Err(GatehouseError::BadRequest(format!(
            "expected a {} description, got a {}",
            class,
            category.class()
        )));
    }

    state
        .categories
        .delete_by_identity(class, &category.id())
        .await?;
    Ok(respond(
        StatusCode::OK,
        "text/plain",
        format!("The {} has been successfully deleted", class),
    ))
}
