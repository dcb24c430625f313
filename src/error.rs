//! Declaration-time errors.
//!
//! Every error is local to the call that produced it; builders and array
//! selectors stay usable afterwards.
use std::fmt;

use thiserror::Error;

use crate::index::IndexError;
use crate::selection::FieldPath;

pub type Result<T, E = QueryError> = std::result::Result<T, E>;

/// Structural kind of a schema node, as reported in shape errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Leaf,
    Reference,
    Object,
    Array,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unknown schema `{0}`")]
    UnknownSchema(String),

    #[error("invalid schema at `{at}`: {reason}")]
    InvalidSchema { at: String, reason: String },

    #[error("`{path}` has no field `{field}`")]
    UnknownField { path: FieldPath, field: String },

    #[error("`{path}` is {found}, not {expected}")]
    Shape {
        path: FieldPath,
        expected: ShapeKind,
        found: ShapeKind,
    },

    #[error("`{path}`: {source}")]
    Index {
        path: FieldPath,
        #[source]
        source: IndexError,
    },

    #[error("cannot parse selector `{expr}`: {reason}")]
    Syntax { expr: String, reason: String },
}

impl QueryError {
    pub(crate) fn invalid_schema(at: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::InvalidSchema { at: at.into(), reason: reason.into() }
    }

    pub(crate) fn syntax(expr: &str, reason: impl Into<String>) -> Self {
        QueryError::Syntax { expr: expr.to_owned(), reason: reason.into() }
    }

    /// Path of the field the error is about, when there is one.
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            QueryError::UnknownField { path, .. }
            | QueryError::Shape { path, .. }
            | QueryError::Index { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShapeKind::Leaf => "a leaf",
            ShapeKind::Reference => "a reference",
            ShapeKind::Object => "an object",
            ShapeKind::Array => "an array",
        })
    }
}
