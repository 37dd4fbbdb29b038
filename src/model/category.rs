//! Category model: kinds, mixins and actions
//!
//! A category is a closed tagged variant, not a class hierarchy. Its
//! identity is the (scheme, term) pair; the wire rendering of that identity
//! is the concatenation `scheme + term`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{GatehouseError, Result};

/// The three category classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryClass {
    Kind,
    Mixin,
    Action,
}

impl CategoryClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kind => "kind",
            Self::Mixin => "mixin",
            Self::Action => "action",
        }
    }
}

impl fmt::Display for CategoryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured category identity key.
///
/// Uniqueness comparison happens on the (scheme, term) pair, which keeps the
/// key injective even when the concatenated rendering would collide
/// (`scheme="ab", term="c"` vs `scheme="a", term="bc"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId {
    pub scheme: String,
    pub term: String,
}

impl CategoryId {
    pub fn new(scheme: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            term: term.into(),
        }
    }

    /// The wire/storage rendering: plain concatenation of scheme and term.
    pub fn rendered(&self) -> String {
        format!("{}{}", self.scheme, self.term)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.scheme, self.term)
    }
}

/// Fields shared by every category class.
///
/// `actions` and `related` are only meaningful on kinds and mixins; an
/// action description carrying either is rejected when the raw form is
/// promoted to a [`Category`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryBody {
    pub term: String,
    pub scheme: String,
    pub title: Option<String>,
    pub location: Option<String>,
    pub attributes: Vec<String>,
    pub actions: Vec<String>,
    pub related: Vec<String>,
}

/// Canonical category document.
#[derive(Debug, Clone, PartialEq)]
pub enum Category {
    Kind(CategoryBody),
    Mixin(CategoryBody),
    Action(CategoryBody),
}

/// Wire shape of a category description.
///
/// Unknown keys are rejected here, at the adapter boundary, so malformed
/// shapes never reach the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCategory {
    pub term: String,
    pub scheme: String,
    pub class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
}

impl Category {
    pub fn class(&self) -> CategoryClass {
        match self {
            Self::Kind(_) => CategoryClass::Kind,
            Self::Mixin(_) => CategoryClass::Mixin,
            Self::Action(_) => CategoryClass::Action,
        }
    }

    pub fn body(&self) -> &CategoryBody {
        match self {
            Self::Kind(b) | Self::Mixin(b) | Self::Action(b) => b,
        }
    }

    /// Structured identity key of this category.
    pub fn id(&self) -> CategoryId {
        let body = self.body();
        CategoryId::new(body.scheme.clone(), body.term.clone())
    }

    /// Path segment used when building locations. Falls back to `/<term>/`
    /// when the description carries no location.
    pub fn path_segment(&self) -> String {
        let body = self.body();
        match &body.location {
            Some(loc) if !loc.is_empty() => normalize_segment(loc),
            _ => format!("/{}/", body.term),
        }
    }

    /// Promote a raw wire shape to the canonical tagged variant.
    pub fn from_raw(raw: RawCategory) -> std::result::Result<Self, String> {
        if raw.term.is_empty() {
            return Err("category term must not be empty".into());
        }
        if raw.scheme.is_empty() {
            return Err("category scheme must not be empty".into());
        }
        let body = CategoryBody {
            term: raw.term,
            scheme: raw.scheme,
            title: raw.title,
            location: raw.location,
            attributes: raw.attributes,
            actions: raw.actions,
            related: raw.related,
        };
        match raw.class.as_str() {
            "kind" => Ok(Self::Kind(body)),
            "mixin" => Ok(Self::Mixin(body)),
            "action" => {
                if !body.actions.is_empty() || !body.related.is_empty() {
                    return Err("an action category cannot declare actions or related".into());
                }
                Ok(Self::Action(body))
            }
            other => Err(format!("{} is not a category class", other)),
        }
    }

    pub fn to_raw(&self) -> RawCategory {
        let body = self.body().clone();
        RawCategory {
            term: body.term,
            scheme: body.scheme,
            class: self.class().as_str().to_string(),
            title: body.title,
            location: body.location,
            attributes: body.attributes,
            actions: body.actions,
            related: body.related,
        }
    }

    /// Canonical JSON value, as persisted in a Stored Document.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.to_raw())?)
    }

    /// Rebuild the canonical variant from a persisted JSON value.
    pub fn from_value(value: &Value) -> Result<Self> {
        let raw: RawCategory = serde_json::from_value(value.clone())
            .map_err(|e| GatehouseError::Internal(format!("stored category is malformed: {}", e)))?;
        Self::from_raw(raw).map_err(GatehouseError::Internal)
    }
}

/// Force a leading and trailing slash onto a location path segment.
pub fn normalize_segment(segment: &str) -> String {
    let trimmed = segment.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compute_raw() -> RawCategory {
        RawCategory {
            term: "compute".into(),
            scheme: "http://schemas.ogf.org/occi/infrastructure#".into(),
            class: "kind".into(),
            title: Some("Compute Resource".into()),
            location: Some("/compute/".into()),
            attributes: vec!["occi.compute.cores".into()],
            actions: vec!["http://schemas.ogf.org/occi/infrastructure/compute/action#start".into()],
            related: vec!["http://schemas.ogf.org/occi/core#resource".into()],
        }
    }

    #[test]
    fn test_identity_pair_is_injective() {
        let a = CategoryId::new("ab", "c");
        let b = CategoryId::new("a", "bc");
        assert_eq!(a.rendered(), b.rendered());
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_raw_kind() {
        let cat = Category::from_raw(compute_raw()).unwrap();
        assert_eq!(cat.class(), CategoryClass::Kind);
        assert_eq!(
            cat.id().rendered(),
            "http://schemas.ogf.org/occi/infrastructure#compute"
        );
        assert_eq!(cat.path_segment(), "/compute/");
    }

    #[test]
    fn test_action_rejects_relations() {
        let mut raw = compute_raw();
        raw.class = "action".into();
        assert!(Category::from_raw(raw).is_err());
    }

    #[test]
    fn test_unknown_class_rejected() {
        let mut raw = compute_raw();
        raw.class = "blueprint".into();
        assert!(Category::from_raw(raw).is_err());
    }

    #[test]
    fn test_path_segment_defaults_to_term() {
        let mut raw = compute_raw();
        raw.location = None;
        let cat = Category::from_raw(raw).unwrap();
        assert_eq!(cat.path_segment(), "/compute/");
    }

    #[test]
    fn test_value_round_trip() {
        let cat = Category::from_raw(compute_raw()).unwrap();
        let value = cat.to_value().unwrap();
        assert_eq!(Category::from_value(&value).unwrap(), cat);
    }

    #[test]
    fn test_normalize_segment() {
        assert_eq!(normalize_segment("compute"), "/compute/");
        assert_eq!(normalize_segment("/compute/"), "/compute/");
        assert_eq!(normalize_segment("compute/"), "/compute/");
    }
}
