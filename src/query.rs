//! Composition of selection declarations.
//!
//! ```
//! use shape_query::{SchemaRegistry, Shape, query};
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register("Root", Shape::object([
//!     ("d", Shape::object([("e1", Shape::leaf()), ("e2", Shape::leaf())])),
//! ])).unwrap();
//!
//! let q = shape_query::prepare_query(&registry, "Root", |a| {
//!     Ok(vec![query(a.object("d")?, |d| Ok(vec![d.leaf("e1")?, d.leaf("e2")?]))?])
//! }).unwrap();
//! assert_eq!(q.len(), 2);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::array::{ArraySelector, Element};
use crate::builder::Builder;
use crate::error::Result;
use crate::schema::SchemaRegistry;
use crate::selection::Selection;

/// Values a selection callback may return: one list, or a list of lists.
///
/// Builders, array selectors and elements count as a single selection of the
/// whole structure they stand for.
pub trait IntoSelections {
    fn into_selections(self) -> Vec<Selection>;
}

/// A finished declaration, in declared order. Duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    schema: String,
    selections: Vec<Selection>,
}

/// Run `callback` on `scope` and flatten its result by exactly one level.
///
/// `scope` is usually a [`Builder`], but any navigation value works. Nothing
/// is deduplicated.
pub fn query<S, R, F>(scope: S, callback: F) -> Result<Vec<Selection>>
where
    F: FnOnce(S) -> Result<R>,
    R: IntoSelections,
{
    Ok(callback(scope)?.into_selections())
}

/// Declare a query against a registered schema.
pub fn prepare_query<'s, R, F>(registry: &'s SchemaRegistry, schema: &str, callback: F) -> Result<Query>
where
    F: FnOnce(Builder<'s>) -> Result<R>,
    R: IntoSelections,
{
    let root = registry.builder(schema)?;
    let selections = query(root, callback)?;
    tracing::debug!(schema, selections = selections.len(), "prepared query");
    Ok(Query { schema: schema.to_owned(), selections })
}

impl Query {
    pub fn new(schema: impl Into<String>, selections: Vec<Selection>) -> Self {
        Self { schema: schema.into(), selections }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Selection> {
        self.selections.iter()
    }
}

impl IntoIterator for Query {
    type Item = Selection;
    type IntoIter = std::vec::IntoIter<Selection>;

    fn into_iter(self) -> Self::IntoIter {
        self.selections.into_iter()
    }
}

impl<'q> IntoIterator for &'q Query {
    type Item = &'q Selection;
    type IntoIter = std::slice::Iter<'q, Selection>;

    fn into_iter(self) -> Self::IntoIter {
        self.selections.iter()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for selection in &self.selections {
            writeln!(f, "{}: {selection}", self.schema)?;
        }
        Ok(())
    }
}

impl IntoSelections for Selection {
    fn into_selections(self) -> Vec<Selection> {
        vec![self]
    }
}

impl IntoSelections for Vec<Selection> {
    fn into_selections(self) -> Vec<Selection> {
        self
    }
}

impl IntoSelections for Vec<Vec<Selection>> {
    fn into_selections(self) -> Vec<Selection> {
        self.into_iter().flatten().collect()
    }
}

impl<const N: usize> IntoSelections for [Selection; N] {
    fn into_selections(self) -> Vec<Selection> {
        self.into()
    }
}

impl<const N: usize> IntoSelections for [Vec<Selection>; N] {
    fn into_selections(self) -> Vec<Selection> {
        self.into_iter().flatten().collect()
    }
}

impl IntoSelections for Builder<'_> {
    fn into_selections(self) -> Vec<Selection> {
        vec![self.selected()]
    }
}

impl IntoSelections for ArraySelector<'_> {
    fn into_selections(self) -> Vec<Selection> {
        vec![self.selected()]
    }
}

impl IntoSelections for Element<'_> {
    fn into_selections(self) -> Vec<Selection> {
        vec![self.selected()]
    }
}
