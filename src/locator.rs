//! Location and identity construction
//!
//! Deterministic, referentially transparent builders for category
//! identities and canonical URIs. No hidden state: everything is a pure
//! function of its inputs.

use crate::model::{CategoryClass, CategoryId};

/// Derive a category's identity key from its (scheme, term) pair.
///
/// The rendering concatenates the two; uniqueness comparison stays on the
/// structured pair.
pub fn category_identity(scheme: &str, term: &str) -> CategoryId {
    CategoryId::new(scheme, term)
}

/// Canonical URI of a registered category:
/// `<base>/-/<class>/<creator><path_segment><unique_id>`.
///
/// `path_segment` is expected in normalized `/seg/` form.
pub fn category_location(
    base: &str,
    class: CategoryClass,
    creator: &str,
    path_segment: &str,
    unique_id: &str,
) -> String {
    format!(
        "{}/-/{}/{}{}{}",
        base,
        class.as_str(),
        creator,
        path_segment,
        unique_id
    )
}

/// Canonical URI of an entity instance:
/// `<base>/<owner_id><kind_path_segment><unique_id>`.
pub fn entity_location(base: &str, owner_id: &str, kind_segment: &str, unique_id: &str) -> String {
    format!("{}/{}{}{}", base, owner_id, kind_segment, unique_id)
}
