//! Runtime shape descriptions. Nothing here is mutated once registered.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::builder::Builder;
use crate::error::{QueryError, Result, ShapeKind};
use crate::{json_schema, path_de};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Selectable value with no further structure.
    Leaf,
    /// Pointer to another schema, selected as an opaque leaf.
    Reference { target: String },
    Object {
        fields: IndexMap<String, Shape>, // declaration order is selection order
    },
    Array {
        item: Box<Shape>,
        /// Statically known length; `None` defers bounds checks to execution.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        len: Option<u32>,
    },
}

/// Document formats a shape can be read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaFormat {
    /// Serde form of [`Shape`].
    #[default]
    Native,
    /// Draft-ish JSON Schema, see [`json_schema`].
    JsonSchema,
}

/// Named root shapes a query can be declared against.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, Shape>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Shape {
    pub fn leaf() -> Self {
        Shape::Leaf
    }

    pub fn reference(target: impl Into<String>) -> Self {
        Shape::Reference { target: target.into() }
    }

    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Shape)>,
    {
        Shape::Object {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn array(item: Shape) -> Self {
        Shape::Array { item: Box::new(item), len: None }
    }

    pub fn fixed_array(item: Shape, len: u32) -> Self {
        Shape::Array { item: Box::new(item), len: Some(len) }
    }

    pub fn parse(src: &str, format: SchemaFormat) -> Result<Self> {
        match format {
            SchemaFormat::Native => path_de::from_str_with_path(src),
            SchemaFormat::JsonSchema => {
                let doc: serde_json::Value = path_de::from_str_with_path(src)?;
                json_schema::shape_from_json_schema(&doc)
            }
        }
    }

    /// Same as [`Shape::parse`], for raw file contents.
    pub fn parse_bytes(bytes: &[u8], format: SchemaFormat) -> Result<Self> {
        match format {
            SchemaFormat::Native => path_de::from_slice_with_path(bytes),
            SchemaFormat::JsonSchema => {
                let doc: serde_json::Value = path_de::from_slice_with_path(bytes)?;
                json_schema::shape_from_json_schema(&doc)
            }
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Leaf => ShapeKind::Leaf,
            Shape::Reference { .. } => ShapeKind::Reference,
            Shape::Object { .. } => ShapeKind::Object,
            Shape::Array { .. } => ShapeKind::Array,
        }
    }

    /// Check the shape is one a builder can mirror.
    pub fn validate(&self) -> Result<()> {
        self.validate_at("")
    }

    fn validate_at(&self, at: &str) -> Result<()> {
        match self {
            Shape::Leaf => Ok(()),
            Shape::Reference { target } => {
                if target.is_empty() {
                    return Err(QueryError::invalid_schema(display_at(at), "reference without a target"));
                }
                Ok(())
            }
            Shape::Object { fields } => {
                for (name, shape) in fields {
                    if name.is_empty() {
                        return Err(QueryError::invalid_schema(display_at(at), "empty field name"));
                    }
                    if name.contains(['.', '[', ']']) {
                        return Err(QueryError::invalid_schema(
                            display_at(at),
                            format!("field name `{name}` contains a path delimiter"),
                        ));
                    }
                    shape.validate_at(&join(at, name))?;
                }
                Ok(())
            }
            Shape::Array { item, .. } => {
                if let Shape::Array { .. } = item.as_ref() {
                    return Err(QueryError::invalid_schema(
                        display_at(at),
                        "arrays of arrays cannot be selected",
                    ));
                }
                item.validate_at(&format!("{at}[*]"))
            }
        }
    }

    /// Every selectable leaf as a path template, e.g. `a.b[*].c`.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_leaf_paths("", &mut out);
        out
    }

    fn collect_leaf_paths(&self, at: &str, out: &mut Vec<String>) {
        match self {
            Shape::Leaf | Shape::Reference { .. } => out.push(at.to_owned()),
            Shape::Object { fields } => {
                for (name, shape) in fields {
                    shape.collect_leaf_paths(&join(at, name), out);
                }
            }
            Shape::Array { item, .. } => item.collect_leaf_paths(&format!("{at}[*]"), out),
        }
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a root shape. Roots must be objects and names
    /// are unique.
    pub fn register(&mut self, name: impl Into<String>, shape: Shape) -> Result<()> {
        let name = name.into();
        if self.schemas.contains_key(&name) {
            return Err(QueryError::invalid_schema(name, "a schema with this name is already registered"));
        }
        if shape.kind() != ShapeKind::Object {
            return Err(QueryError::invalid_schema(
                name,
                format!("root must be an object, found {}", shape.kind()),
            ));
        }
        shape.validate()?;
        tracing::debug!(schema = %name, leaves = shape.leaf_paths().len(), "registered schema");
        self.schemas.insert(name, shape);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Shape> {
        self.schemas.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Root builder for a registered schema.
    pub fn builder(&self, name: &str) -> Result<Builder<'_>> {
        let shape = self
            .get(name)
            .ok_or_else(|| QueryError::UnknownSchema(name.to_owned()))?;
        Builder::root(shape)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn join(at: &str, name: &str) -> String {
    if at.is_empty() { name.to_owned() } else { format!("{at}.{name}") }
}

fn display_at(at: &str) -> String {
    if at.is_empty() { "<root>".to_owned() } else { at.to_owned() }
}
