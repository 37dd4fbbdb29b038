//! Compact header/text encoding (`text/occi`, `text/plain`)
//!
//! Line-oriented grammar: `Category:` lines carry category definitions and
//! kind/mixin references, `X-OCCI-Attribute:` lines carry flat key/value
//! pairs. The translation targets the same canonical shape as the JSON
//! form; a body that yields no usable document is rejected whole: never a
//! partially populated document.

use serde_json::{Map, Value};

use crate::model::{Category, Entity, RawCategory, RawEntity};
use crate::types::{GatehouseError, Result};

const TITLE_ATTR: &str = "occi.core.title";
const SOURCE_ATTR: &str = "occi.core.source";
const TARGET_ATTR: &str = "occi.core.target";

/// One parsed `Category:` line: the leading term plus its parameters.
struct CategoryLine {
    term: String,
    params: Vec<(String, String)>,
}

impl CategoryLine {
    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn not_acceptable(msg: impl Into<String>) -> GatehouseError {
    GatehouseError::NotAcceptable(msg.into())
}

fn parse_category_line(rest: &str) -> Result<CategoryLine> {
    let mut parts = rest.split(';');
    let term = parts
        .next()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| not_acceptable("category line without a term"))?
        .to_string();

    let mut params = Vec::new();
    for part in parts {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| not_acceptable(format!("malformed category parameter: {}", part)))?;
        params.push((key.trim().to_string(), unquote(value.trim()).to_string()));
    }
    Ok(CategoryLine { term, params })
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn split_list(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

/// Split a rendered category identity back into (scheme, term).
///
/// Schemes conventionally end with `#` or `/`; identities without either
/// separator are outside this encoding's expressible subset.
fn split_identity(id: &str) -> Result<(String, String)> {
    if let Some(pos) = id.rfind('#') {
        return Ok((id[..=pos].to_string(), id[pos + 1..].to_string()));
    }
    if let Some(pos) = id.rfind('/') {
        return Ok((id[..=pos].to_string(), id[pos + 1..].to_string()));
    }
    Err(not_acceptable(format!(
        "{} is not expressible as a category reference",
        id
    )))
}

fn encode_attr_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        other => other.to_string(),
    }
}

fn decode_attr_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        return Value::String(trimmed[1..trimmed.len() - 1].to_string());
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

fn parse_attribute_line(rest: &str) -> Result<(String, Value)> {
    let (name, value) = rest
        .split_once('=')
        .ok_or_else(|| not_acceptable(format!("malformed attribute: {}", rest)))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(not_acceptable("attribute without a name"));
    }
    Ok((name.to_string(), decode_attr_value(value)))
}

/// Decode a full category definition (the `/-/` interface payload).
pub fn decode_category(body: &str) -> Result<Category> {
    let mut category_line = None;
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("Category:") {
            if category_line.is_some() {
                return Err(not_acceptable("expected a single category definition"));
            }
            category_line = Some(parse_category_line(rest)?);
        } else {
            return Err(not_acceptable(format!("unexpected line: {}", line)));
        }
    }
    let line = category_line.ok_or_else(|| not_acceptable("no category definition found"))?;

    let mut raw = RawCategory {
        term: line.term.clone(),
        ..Default::default()
    };
    for (key, value) in &line.params {
        match key.as_str() {
            "scheme" => raw.scheme = value.clone(),
            "class" => raw.class = value.clone(),
            "title" => raw.title = Some(value.clone()),
            "location" => raw.location = Some(value.clone()),
            "attributes" => raw.attributes = split_list(value),
            "actions" => raw.actions = split_list(value),
            "rel" => raw.related = split_list(value),
            other => {
                return Err(not_acceptable(format!(
                    "{} is not a category parameter",
                    other
                )))
            }
        }
    }
    Category::from_raw(raw).map_err(not_acceptable)
}

pub fn encode_category(category: &Category) -> String {
    let raw = category.to_raw();
    let mut line = format!(
        "Category: {}; scheme=\"{}\"; class=\"{}\"",
        raw.term, raw.scheme, raw.class
    );
    if let Some(title) = &raw.title {
        line.push_str(&format!("; title=\"{}\"", title));
    }
    if let Some(location) = &raw.location {
        line.push_str(&format!("; location=\"{}\"", location));
    }
    if !raw.attributes.is_empty() {
        line.push_str(&format!("; attributes=\"{}\"", raw.attributes.join(" ")));
    }
    if !raw.actions.is_empty() {
        line.push_str(&format!("; actions=\"{}\"", raw.actions.join(" ")));
    }
    if !raw.related.is_empty() {
        line.push_str(&format!("; rel=\"{}\"", raw.related.join(" ")));
    }
    line
}

/// Decode an entity instance: one kind reference, optional mixin
/// references, flat attributes.
pub fn decode_entity(body: &str) -> Result<Entity> {
    let mut kind = None;
    let mut mixins = Vec::new();
    let mut title = None;
    let mut source = None;
    let mut target = None;
    let mut attributes = Map::new();

    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("Category:") {
            let parsed = parse_category_line(rest)?;
            let scheme = parsed
                .param("scheme")
                .ok_or_else(|| not_acceptable("category reference without a scheme"))?;
            let rendered = format!("{}{}", scheme, parsed.term);
            match parsed.param("class") {
                Some("kind") | None => {
                    if kind.is_some() {
                        return Err(not_acceptable("an entity has exactly one kind"));
                    }
                    kind = Some(rendered);
                }
                Some("mixin") => mixins.push(rendered),
                Some(other) => {
                    return Err(not_acceptable(format!(
                        "{} is not a class an entity can reference",
                        other
                    )))
                }
            }
        } else if let Some(rest) = line.strip_prefix("X-OCCI-Attribute:") {
            let (name, value) = parse_attribute_line(rest)?;
            if name == TITLE_ATTR || name == SOURCE_ATTR || name == TARGET_ATTR {
                let Value::String(s) = value else {
                    return Err(not_acceptable(format!("{} must be a string", name)));
                };
                if name == TITLE_ATTR {
                    title = Some(s);
                } else if name == SOURCE_ATTR {
                    source = Some(s);
                } else {
                    target = Some(s);
                }
            } else {
                attributes.insert(name, value);
            }
        } else {
            return Err(not_acceptable(format!("unexpected line: {}", line)));
        }
    }

    let raw = RawEntity {
        kind: kind.ok_or_else(|| not_acceptable("entity without a kind reference"))?,
        mixins,
        title,
        attributes,
        source,
        target,
    };
    Entity::from_raw(raw).map_err(not_acceptable)
}

pub fn encode_entity(entity: &Entity) -> Result<String> {
    let raw = entity.to_raw();
    let mut lines = Vec::new();

    let (scheme, term) = split_identity(&raw.kind)?;
    lines.push(format!(
        "Category: {}; scheme=\"{}\"; class=\"kind\"",
        term, scheme
    ));
    for mixin in &raw.mixins {
        let (scheme, term) = split_identity(mixin)?;
        lines.push(format!(
            "Category: {}; scheme=\"{}\"; class=\"mixin\"",
            term, scheme
        ));
    }
    if let Some(title) = &raw.title {
        lines.push(format!("X-OCCI-Attribute: {}=\"{}\"", TITLE_ATTR, title));
    }
    if let Some(source) = &raw.source {
        lines.push(format!("X-OCCI-Attribute: {}=\"{}\"", SOURCE_ATTR, source));
    }
    if let Some(target) = &raw.target {
        lines.push(format!("X-OCCI-Attribute: {}=\"{}\"", TARGET_ATTR, target));
    }
    for (name, value) in &raw.attributes {
        lines.push(format!(
            "X-OCCI-Attribute: {}={}",
            name,
            encode_attr_value(value)
        ));
    }
    Ok(lines.join("\n"))
}

/// Decode a flat key/value document (partial-update patch or filter).
pub fn decode_attributes(body: &str) -> Result<Map<String, Value>> {
    let mut attributes = Map::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let rest = line
            .strip_prefix("X-OCCI-Attribute:")
            .ok_or_else(|| not_acceptable(format!("unexpected line: {}", line)))?;
        let (name, value) = parse_attribute_line(rest)?;
        attributes.insert(name, value);
    }
    if attributes.is_empty() {
        return Err(not_acceptable("no attributes found in body"));
    }
    Ok(attributes)
}
