//! Canonical document model
//!
//! The format-independent in-memory representation of categories and
//! entities, plus the persistence envelope wrapping them. Every wire
//! encoding converges on these types; the registries never see raw bodies.

pub mod category;
pub mod document;
pub mod entity;

pub use category::{Category, CategoryBody, CategoryClass, CategoryId, RawCategory};
pub use document::{DocType, StoredDocument};
pub use entity::{Entity, EntityBody, RawEntity};
