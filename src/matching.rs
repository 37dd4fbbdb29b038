//! Filter matching, relation checks and partial-update merging
//!
//! These operate on canonical JSON objects so the same machinery serves
//! categories and entities.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;

/// Why a partial update was rejected. Any rejection aborts the whole merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeRejection {
    /// The patch tried to change an immutable field.
    ImmutableKey(String),
    /// The patch named a key the stored description does not have.
    UnknownKey(String),
}

impl std::fmt::Display for MergeRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ImmutableKey(key) => write!(f, "{} is forbidden to change", key),
            Self::UnknownKey(key) => write!(f, "{} could not be found", key),
        }
    }
}

/// Subset-match predicate: true iff every key of `filter` is present in
/// `description` with an equal value. The empty filter matches everything.
pub fn matches(description: &Map<String, Value>, filter: &Map<String, Value>) -> bool {
    for (key, expected) in filter {
        match description.get(key) {
            Some(actual) if actual == expected => {}
            Some(_) => return false,
            None => {
                debug!("filter description: {} could not be found", key);
                return false;
            }
        }
    }
    true
}

/// Every related identity must already be registered. Vacuously true when
/// the set is empty.
pub fn relations_exist(related: &[String], known_category_ids: &HashSet<String>) -> bool {
    related.iter().all(|id| known_category_ids.contains(id))
}

/// Same policy as [`relations_exist`], for declared actions.
pub fn actions_exist(actions: &[String], known_action_ids: &HashSet<String>) -> bool {
    actions.iter().all(|id| known_action_ids.contains(id))
}

/// All-or-nothing partial update.
///
/// A single validation pass walks every patch key first; only if all keys
/// resolve is the merged document produced. Immutable keys may appear in
/// the patch as long as their value is unchanged.
pub fn merge_description(
    old: &Map<String, Value>,
    patch: &Map<String, Value>,
    immutable: &[&str],
) -> Result<Map<String, Value>, MergeRejection> {
    for (key, value) in patch {
        if immutable.contains(&key.as_str()) {
            if old.get(key) != Some(value) {
                debug!("update description: {} is forbidden to change", key);
                return Err(MergeRejection::ImmutableKey(key.clone()));
            }
        } else if !old.contains_key(key) {
            debug!("update description: {} could not be found", key);
            return Err(MergeRejection::UnknownKey(key.clone()));
        }
    }

    let mut merged = old.clone();
    for (key, value) in patch {
        merged.insert(key.clone(), value.clone());
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let desc = obj(json!({"term": "compute", "title": "vm"}));
        assert!(matches(&desc, &Map::new()));
    }

    #[test]
    fn test_filter_value_mismatch() {
        let desc = obj(json!({"term": "compute"}));
        let filter = obj(json!({"term": "network"}));
        assert!(!matches(&desc, &filter));
    }

    #[test]
    fn test_filter_missing_key() {
        let desc = obj(json!({"term": "compute"}));
        let filter = obj(json!({"scheme": "http://x#"}));
        assert!(!matches(&desc, &filter));
    }

    #[test]
    fn test_filter_subset_match() {
        let desc = obj(json!({"term": "compute", "scheme": "http://x#", "title": "vm"}));
        let filter = obj(json!({"term": "compute", "scheme": "http://x#"}));
        assert!(matches(&desc, &filter));
    }

    #[test]
    fn test_relations_vacuously_true() {
        assert!(relations_exist(&[], &HashSet::new()));
    }

    #[test]
    fn test_relations_missing_id() {
        let known: HashSet<String> = ["http://x#resource".to_string()].into_iter().collect();
        assert!(relations_exist(&["http://x#resource".to_string()], &known));
        assert!(!relations_exist(&["http://x#storage".to_string()], &known));
    }

    #[test]
    fn test_merge_updates_known_key() {
        let old = obj(json!({"term": "compute", "title": "old"}));
        let patch = obj(json!({"title": "new"}));
        let merged = merge_description(&old, &patch, &["term", "scheme", "location"]).unwrap();
        assert_eq!(merged["title"], "new");
        assert_eq!(merged["term"], "compute");
    }

    #[test]
    fn test_merge_rejects_immutable_change() {
        let old = obj(json!({"term": "compute", "title": "old"}));
        let patch = obj(json!({"term": "network"}));
        let err = merge_description(&old, &patch, &["term", "scheme", "location"]).unwrap_err();
        assert_eq!(err, MergeRejection::ImmutableKey("term".into()));
    }

    #[test]
    fn test_merge_allows_unchanged_immutable() {
        let old = obj(json!({"term": "compute", "title": "old"}));
        let patch = obj(json!({"term": "compute", "title": "new"}));
        let merged = merge_description(&old, &patch, &["term"]).unwrap();
        assert_eq!(merged["title"], "new");
    }

    #[test]
    fn test_merge_rejects_unknown_key() {
        let old = obj(json!({"term": "compute"}));
        let patch = obj(json!({"color": "blue"}));
        let err = merge_description(&old, &patch, &[]).unwrap_err();
        assert_eq!(err, MergeRejection::UnknownKey("color".into()));
    }

    #[test]
    fn test_rejection_leaves_nothing_merged() {
        // The failing key comes after a mergeable one; the old map must be
        // untouched either way since merge returns a fresh copy.
        let old = obj(json!({"term": "compute", "title": "old"}));
        let patch = obj(json!({"title": "new", "color": "blue"}));
        assert!(merge_description(&old, &patch, &[]).is_err());
        assert_eq!(old["title"], "old");
    }
}
