//! JSON:API response decoding.
//!
//! Resources arrive as `{"type", "id", "attributes", "relationships"}`,
//! either wrapped in a `{"data": ...}` document or bare. Ids may be strings
//! or numbers. Coordinates live in `attributes` and default to zero.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::api::ApiError;
use crate::model::{Attributes, GameObject, ObjectId, Relationships, World};

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(ObjectId),
    Text(String),
}

impl WireId {
    fn resolve(&self) -> Result<ObjectId, ApiError> {
        match self {
            Self::Number(id) => Ok(*id),
            Self::Text(text) => text.parse().map_err(|_| ApiError::Parse(format!("invalid id `{text}`"))),
        }
    }
}

#[derive(Deserialize)]
struct Identifier {
    id: WireId,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Linkage {
    One(Identifier),
    Many(Vec<Identifier>),
}

#[derive(Deserialize)]
struct Relationship {
    #[serde(default)]
    data: Option<Linkage>,
}

#[derive(Deserialize)]
struct Resource {
    id: WireId,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    attributes: Map<String, Value>,
    #[serde(default)]
    relationships: HashMap<String, Relationship>,
}

// =============================================================================
// DECODING
// =============================================================================

/// Decode a list of game objects.
///
/// # Errors
///
/// Returns [`ApiError::Parse`] for malformed JSON or resources.
pub fn parse_objects(text: &str) -> Result<Vec<GameObject>, ApiError> {
    let resources: Vec<Resource> = decode(text)?;
    resources.into_iter().map(into_object).collect()
}

/// Decode a single game object.
///
/// # Errors
///
/// Returns [`ApiError::Parse`] for malformed JSON or resources.
pub fn parse_object(text: &str) -> Result<GameObject, ApiError> {
    into_object(decode(text)?)
}

/// Decode the world list.
///
/// # Errors
///
/// Returns [`ApiError::Parse`] for malformed JSON or resources.
pub fn parse_worlds(text: &str) -> Result<Vec<World>, ApiError> {
    let resources: Vec<Resource> = decode(text)?;
    resources
        .into_iter()
        .map(|resource| {
            let name = resource.attributes.get("name").and_then(Value::as_str).unwrap_or_default().to_owned();
            Ok(World { id: resource.id.resolve()?, name })
        })
        .collect()
}

/// Decode an image list: a JSON array of names, or an object keyed by name.
///
/// # Errors
///
/// Returns [`ApiError::Parse`] for anything else.
pub fn parse_images(text: &str) -> Result<Vec<String>, ApiError> {
    match serde_json::from_str::<Value>(text).map_err(|e| ApiError::Parse(e.to_string()))? {
        Value::Array(items) => Ok(items.into_iter().filter_map(|item| item.as_str().map(str::to_owned)).collect()),
        Value::Object(map) => Ok(map.into_iter().map(|(name, _)| name).collect()),
        other => Err(ApiError::Parse(format!("unexpected image list: {other}"))),
    }
}

/// Action payloads are passed through untouched; an empty body reads as null.
///
/// # Errors
///
/// Returns [`ApiError::Parse`] for malformed JSON.
pub fn parse_payload(text: &str) -> Result<Value, ApiError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Parse `text`, unwrapping a top-level `data` member when present.
fn decode<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let mut value: Value = serde_json::from_str(text).map_err(|e| ApiError::Parse(e.to_string()))?;
    if let Some(data) = value.as_object_mut().and_then(|doc| doc.remove("data")) {
        value = data;
    }
    serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))
}

fn into_object(resource: Resource) -> Result<GameObject, ApiError> {
    let id = resource.id.resolve()?;
    let mut fields = resource.attributes;
    let latitude = fields.remove("latitude").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let longitude = fields.remove("longitude").and_then(|v| v.as_f64()).unwrap_or(0.0);

    let mut attributes: Attributes =
        serde_json::from_value(Value::Object(fields)).map_err(|e| ApiError::Parse(format!("object {id}: {e}")))?;
    if attributes.kind.is_none() {
        attributes.kind = resource.kind;
    }

    let mut relationships = Relationships::default();
    for (name, relationship) in resource.relationships {
        match (name.as_str(), relationship.data) {
            ("world", Some(Linkage::One(world))) => relationships.world = Some(world.id.resolve()?),
            ("inventory", Some(Linkage::Many(items))) => {
                relationships.inventory = items.iter().map(|item| item.id.resolve()).collect::<Result<_, _>>()?;
            }
            _ => {}
        }
    }

    Ok(GameObject { id, latitude, longitude, attributes, relationships })
}

#[cfg(test)]
#[path = "wire_test.rs"]
mod tests;
