//! Import of draft-ish JSON Schema documents (`type`/`properties`/`items`).
//!
//! Only the structural part matters here: objects keep their property order,
//! arrays keep a static length when `minItems == maxItems`, nullable wrappers
//! collapse, and scalar types of every kind become leaves.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{QueryError, Result};
use crate::schema::Shape;

pub fn shape_from_json_schema(doc: &Value) -> Result<Shape> {
    convert(doc, "")
}

fn convert(node: &Value, at: &str) -> Result<Shape> {
    let map = match node {
        Value::Object(map) => map,
        Value::Bool(true) => return Ok(Shape::Leaf),
        _ => return Err(invalid(at, "expected a schema object")),
    };

    if let Some(target) = map.get("$ref") {
        let target = target.as_str().ok_or_else(|| invalid(at, "`$ref` must be a string"))?;
        let name = target.rsplit('/').next().unwrap_or(target);
        return Ok(Shape::reference(name));
    }
    for key in ["oneOf", "anyOf"] {
        if let Some(arms) = map.get(key) {
            return convert_union(arms, &format!("{at}/{key}"));
        }
    }

    match map.get("type") {
        Some(Value::String(ty)) => convert_typed(ty, map, at),
        Some(Value::Array(types)) => {
            let non_null = types
                .iter()
                .filter_map(Value::as_str)
                .filter(|ty| *ty != "null")
                .collect::<Vec<_>>();
            match non_null.as_slice() {
                [] => Ok(Shape::Leaf),
                [ty] => convert_typed(ty, map, at),
                many if many.iter().any(|ty| is_structural(ty)) => {
                    Err(invalid(at, "a union containing objects or arrays cannot be selected"))
                }
                _ => Ok(Shape::Leaf),
            }
        }
        Some(_) => Err(invalid(at, "`type` must be a string or a list of strings")),
        None if map.contains_key("properties") => convert_typed("object", map, at),
        None if map.contains_key("items") => convert_typed("array", map, at),
        None => Ok(Shape::Leaf),
    }
}

fn convert_typed(ty: &str, map: &Map<String, Value>, at: &str) -> Result<Shape> {
    match ty {
        "object" => {
            let mut fields = IndexMap::new();
            match map.get("properties") {
                None => {}
                Some(Value::Object(props)) => {
                    for (name, prop) in props {
                        let child = format!("{at}/properties/{}", escape_pointer(name));
                        fields.insert(name.clone(), convert(prop, &child)?);
                    }
                }
                Some(_) => return Err(invalid(at, "`properties` must be an object")),
            }
            Ok(Shape::Object { fields })
        }
        "array" => {
            if map.contains_key("prefixItems") {
                return Err(invalid(at, "tuple arrays (`prefixItems`) cannot be selected"));
            }
            let items = map
                .get("items")
                .ok_or_else(|| invalid(at, "array without `items`"))?;
            let item = convert(items, &format!("{at}/items"))?;
            let min = map.get("minItems").and_then(Value::as_u64);
            let max = map.get("maxItems").and_then(Value::as_u64);
            let len = match (min, max) {
                (Some(min), Some(max)) if min == max => Some(
                    u32::try_from(min).map_err(|_| invalid(at, format!("array length {min} is too large")))?,
                ),
                _ => None,
            };
            Ok(Shape::Array { item: Box::new(item), len })
        }
        _ => Ok(Shape::Leaf),
    }
}

// X ∪ null → X; scalar unions → leaf
fn convert_union(arms: &Value, at: &str) -> Result<Shape> {
    let arms = arms
        .as_array()
        .ok_or_else(|| invalid(at, "expected a list of schemas"))?;
    let mut shapes = Vec::new();
    for (i, arm) in arms.iter().enumerate() {
        if is_null_schema(arm) {
            continue;
        }
        shapes.push(convert(arm, &format!("{at}/{i}"))?);
    }
    match shapes.len() {
        0 => Ok(Shape::Leaf),
        1 => Ok(shapes.remove(0)),
        _ if shapes.iter().all(|s| matches!(s, Shape::Leaf)) => Ok(Shape::Leaf),
        _ => Err(invalid(at, "a union containing objects or arrays cannot be selected")),
    }
}

fn is_null_schema(node: &Value) -> bool {
    node.get("type").and_then(Value::as_str) == Some("null")
}

fn is_structural(ty: &str) -> bool {
    matches!(ty, "object" | "array")
}

fn escape_pointer(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}

fn invalid(at: &str, reason: impl Into<String>) -> QueryError {
    QueryError::invalid_schema(if at.is_empty() { "/" } else { at }, reason)
}
