//! Gatehouse - HTTP gateway for OCCI-style cloud resource descriptions
//!
//! Gatehouse exposes a cloud-resource description model (categories and
//! entities) over HTTP, backed by a document store.
//!
//! ## Components
//!
//! - **Codec**: wire encodings (text, JSON, URI list) to one canonical form
//! - **Locator**: deterministic identity and location construction
//! - **Matcher**: filter matching, relation checks, partial-update merge
//! - **Registries**: category and entity CRUD with integrity invariants
//! - **Routes/Server**: per-verb dispatchers behind a hyper http1 loop

pub mod auth;
pub mod codec;
pub mod config;
pub mod db;
pub mod idgen;
pub mod locator;
pub mod matching;
pub mod model;
pub mod registry;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{GatehouseError, Result};
