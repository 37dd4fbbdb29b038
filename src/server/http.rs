//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. One task per
//! accepted connection; routing is a single match on (method, path).

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::codec::MediaType;
use crate::config::Args;
use crate::db::DocumentStore;
use crate::idgen::IdGenerator;
use crate::model::CategoryClass;
use crate::registry::{CategoryRegistry, EntityRegistry};
use crate::routes;
use crate::types::GatehouseError;

/// Response server header, the way the source stamped its responses.
const SERVER_HEADER: &str = concat!("gatehouse/", env!("CARGO_PKG_VERSION"), " (linux) OCCI/1.1");

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub store: Arc<dyn DocumentStore>,
    pub categories: CategoryRegistry,
    pub entities: EntityRegistry,
    pub started_at: Instant,
}

impl AppState {
    /// Wire the registries to the injected store and id generator.
    pub fn new(args: Args, store: Arc<dyn DocumentStore>, idgen: Arc<dyn IdGenerator>) -> Self {
        let base_url = args.base_url();
        let categories =
            CategoryRegistry::new(Arc::clone(&store), Arc::clone(&idgen), base_url.clone());
        let entities = EntityRegistry::new(Arc::clone(&store), idgen, base_url);
        Self {
            args,
            store,
            categories,
            entities,
            started_at: Instant::now(),
        }
    }
}

/// Run the HTTP server until the process is stopped.
pub async fn run(state: Arc<AppState>) -> crate::types::Result<()> {
    let listener = TcpListener::bind(state.args.listen)
        .await
        .map_err(|e| GatehouseError::Config(format!("failed to bind {}: {}", state.args.listen, e)))?;

    info!("Gatehouse listening on {}", state.args.listen);
    info!("Category interface at /-/kind/, /-/mixin/, /-/action/");

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        // Liveness probe - returns 200 while the gateway is running
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(&state),

        // Readiness probe - returns 200 only if the store answers
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            routes::readiness_check(&state).await
        }

        // Version info for deployment verification
        (Method::GET, "/version") => routes::version_info(),

        // CORS preflight
        (Method::OPTIONS, _) => preflight_response(),

        // Query interface: every registered category
        (Method::GET, "/-") | (Method::GET, "/-/") => {
            routes::query_interface(Arc::clone(&state), req).await
        }
        (_, "/-") | (_, "/-/") => error_response(GatehouseError::MethodNotAllowed),

        // Category interface, one path per class
        (_, p) if p == "/-/kind" || p.starts_with("/-/kind/") => {
            routes::handle_category_request(Arc::clone(&state), CategoryClass::Kind, req).await
        }
        (_, p) if p == "/-/mixin" || p.starts_with("/-/mixin/") => {
            routes::handle_category_request(Arc::clone(&state), CategoryClass::Mixin, req).await
        }
        (_, p) if p == "/-/action" || p.starts_with("/-/action/") => {
            routes::handle_category_request(Arc::clone(&state), CategoryClass::Action, req).await
        }
        (_, p) if p.starts_with("/-/") => not_found_response(p),

        // Entity space: trailing slash marks a collection path
        (_, p) if p.ends_with('/') => {
            routes::handle_collection_request(Arc::clone(&state), req, path.clone()).await
        }
        _ => routes::handle_entity_request(Arc::clone(&state), req, path.clone()).await,
    };

    Ok(response)
}

/// Build a response carrying the gateway's Server header.
pub(crate) fn respond(
    status: StatusCode,
    content_type: &str,
    body: String,
) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Server", SERVER_HEADER)
        .header("Content-Type", content_type)
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// "OK, and location returned": 200 plus a Location header.
pub(crate) fn created_response(accept: MediaType, location: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Server", SERVER_HEADER)
        .header("Content-Type", accept.as_str())
        .header("Location", location)
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(crate::codec::encode_created(
            accept, location,
        ))))
        .unwrap()
}

/// Registry and adapter failures answer as plain text.
pub(crate) fn error_response(err: GatehouseError) -> Response<Full<Bytes>> {
    let (status, body) = err.into_status_code_and_body();
    respond(status, "text/plain", body)
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Server", SERVER_HEADER)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        )
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    respond(
        StatusCode::NOT_FOUND,
        "text/plain",
        format!("Resource not found: {}", path),
    )
}
