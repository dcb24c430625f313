//! Selector handles: the values a query declaration produces.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::index::Slice;

/// One step of a path: a field name and, for array fields, the chosen elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice: Option<Slice>,
}

/// Structural path from the query root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<Segment>);

/// A selected leaf, reference or whole sub-structure, together with every
/// array slice on its way.
///
/// Pure value data. Selecting the same target twice produces two equal handles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    path: FieldPath,
    /// Target schema of a reference leaf; reference leaves are never expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    /// The path ends on an object (or object elements), selected as a whole.
    #[serde(default, skip_serializing_if = "is_false")]
    structure: bool,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Field names only, from the root down.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.field.as_str())
    }

    pub fn child(&self, field: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment { field: field.to_owned(), slice: None });
        Self(segments)
    }

    /// Attach `slice` to the last segment.
    pub(crate) fn sliced(mut self, slice: Slice) -> Self {
        if let Some(last) = self.0.last_mut() {
            last.slice = Some(slice);
        }
        self
    }
}

impl Selection {
    pub(crate) fn new(path: FieldPath, reference: Option<String>) -> Self {
        Self { path, reference, structure: false }
    }

    pub(crate) fn structure(path: FieldPath) -> Self {
        Self { path, reference: None, structure: true }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Field names from the root, e.g. `["a", "b", "c"]`.
    pub fn fields(&self) -> Vec<&str> {
        self.path.names().collect()
    }

    /// Slices along the path, paired with the depth of the array segment.
    pub fn slices(&self) -> impl Iterator<Item = (usize, &Slice)> {
        self.path
            .segments()
            .iter()
            .enumerate()
            .filter_map(|(depth, s)| s.slice.as_ref().map(|slice| (depth, slice)))
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// Whether everything below the path is selected rather than a single leaf.
    pub fn is_structure(&self) -> bool {
        self.structure
    }

    pub fn is_deferred(&self) -> bool {
        self.slices().any(|(_, slice)| slice.is_deferred())
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.field)?;
        if let Some(slice) = &self.slice {
            write!(f, "[{slice}]")?;
        }
        Ok(())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Position;

    #[test]
    fn display_uses_dotted_syntax() {
        let path = FieldPath::root()
            .child("a")
            .child("b")
            .sliced(Slice::Single { index: Position::End(1) })
            .child("d");
        assert_eq!(path.to_string(), "a.b[-1].d");
        assert_eq!(FieldPath::root().to_string(), "<root>");
    }

    #[test]
    fn slices_report_their_depth() {
        let path = FieldPath::root().child("xs").sliced(Slice::All).child("y");
        let selection = Selection::new(path, None);
        let slices: Vec<_> = selection.slices().collect();
        assert_eq!(slices, vec![(0, &Slice::All)]);
        assert_eq!(selection.fields(), vec!["xs", "y"]);
        assert!(!selection.is_deferred());
    }

    #[test]
    fn serializes_as_segment_list() {
        let path = FieldPath::root().child("xs").sliced(Slice::Single { index: Position::Start(0) });
        let json = serde_json::to_value(Selection::new(path, None)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "path": [{ "field": "xs", "slice": { "kind": "single", "index": 0 } }] })
        );
    }

    #[test]
    fn structures_are_tagged_in_the_output() {
        let path = FieldPath::root().child("rows").sliced(Slice::All);
        let selection = Selection::structure(path);
        assert!(selection.is_structure());
        let json = serde_json::to_value(&selection).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "path": [{ "field": "rows", "slice": { "kind": "all" } }], "structure": true })
        );
        assert_eq!(serde_json::from_value::<Selection>(json).unwrap(), selection);
    }
}
