//! Element selection on array fields.
//!
//! Every operation resolves its indices eagerly, tags the array segment of the
//! path with the resulting [`Slice`] and returns an [`Element`]. Calls are
//! independent of each other: selecting `first()` and `range(1, 3)` from the
//! same selector is fine.

use crate::builder::Builder;
use crate::error::{QueryError, Result, ShapeKind};
use crate::index::{self, IndexError, Slice};
use crate::schema::Shape;
use crate::selection::{FieldPath, Selection};

#[derive(Debug, Clone)]
pub struct ArraySelector<'s> {
    item: &'s Shape,
    len: Option<u32>,
    path: FieldPath,
}

/// Chosen elements of an array: directly selected when the elements are
/// leaves, otherwise a builder that continues one level deeper.
#[derive(Debug, Clone)]
pub enum Element<'s> {
    Leaf(Selection),
    Object(Builder<'s>),
}

impl<'s> ArraySelector<'s> {
    pub(crate) fn new(item: &'s Shape, len: Option<u32>, path: FieldPath) -> Self {
        Self { item, len, path }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Statically known length, if any.
    pub fn len(&self) -> Option<u32> {
        self.len
    }

    pub fn all(&self) -> Element<'s> {
        self.element(Slice::All)
    }

    /// Every element, selected whole. Same as `all().selected()`.
    pub fn selected(&self) -> Selection {
        self.all().selected()
    }

    pub fn first(&self) -> Result<Element<'s>> {
        self.index(0)
    }

    pub fn last(&self) -> Result<Element<'s>> {
        self.index(-1)
    }

    pub fn index(&self, index: i64) -> Result<Element<'s>> {
        let index = index::resolve(index, self.len).map_err(|e| self.index_error(e))?;
        Ok(self.element(Slice::Single { index }))
    }

    /// Inclusive on both ends.
    pub fn range(&self, start: i64, end: i64) -> Result<Element<'s>> {
        let span = index::resolve_range(start, end, self.len).map_err(|e| self.index_error(e))?;
        Ok(self.element(Slice::Range { span }))
    }

    pub fn indices(&self, indices: &[i64]) -> Result<Element<'s>> {
        let indices = index::resolve_indices(indices, self.len).map_err(|e| self.index_error(e))?;
        Ok(self.element(Slice::IndexSet { indices }))
    }

    pub fn ranges(&self, ranges: &[(i64, i64)]) -> Result<Element<'s>> {
        let ranges = index::resolve_ranges(ranges, self.len).map_err(|e| self.index_error(e))?;
        Ok(self.element(Slice::RangeSet { ranges }))
    }

    fn element(&self, slice: Slice) -> Element<'s> {
        tracing::trace!(path = %self.path, %slice, "resolved array slice");
        let path = self.path.clone().sliced(slice);
        match self.item {
            Shape::Leaf => Element::Leaf(Selection::new(path, None)),
            Shape::Reference { target } => Element::Leaf(Selection::new(path, Some(target.clone()))),
            Shape::Object { fields } => Element::Object(Builder::scoped(fields, path)),
            // ruled out by Shape::validate
            Shape::Array { .. } => unreachable!("arrays of arrays are rejected at registration"),
        }
    }

    fn index_error(&self, source: IndexError) -> QueryError {
        QueryError::Index { path: self.path.clone(), source }
    }
}

impl<'s> Element<'s> {
    pub fn path(&self) -> &FieldPath {
        match self {
            Element::Leaf(selection) => selection.path(),
            Element::Object(builder) => builder.path(),
        }
    }

    /// The chosen elements as a selection: the leaves themselves, or the
    /// object elements as a structure.
    pub fn selected(self) -> Selection {
        match self {
            Element::Leaf(selection) => selection,
            Element::Object(builder) => builder.selected(),
        }
    }

    /// The element builder, for arrays of objects.
    pub fn into_object(self) -> Result<Builder<'s>> {
        match self {
            Element::Object(builder) => Ok(builder),
            Element::Leaf(selection) => Err(QueryError::Shape {
                path: selection.path().clone(),
                expected: ShapeKind::Object,
                found: if selection.reference().is_some() { ShapeKind::Reference } else { ShapeKind::Leaf },
            }),
        }
    }

    pub fn leaf(self, name: &str) -> Result<Selection> {
        self.into_object()?.leaf(name)
    }

    pub fn object(self, name: &str) -> Result<Builder<'s>> {
        self.into_object()?.object(name)
    }

    pub fn array(self, name: &str) -> Result<ArraySelector<'s>> {
        self.into_object()?.array(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Position, Span};

    fn shape() -> Shape {
        Shape::object([
            ("xs", Shape::fixed_array(Shape::leaf(), 5)),
            ("ys", Shape::array(Shape::leaf())),
            ("rows", Shape::array(Shape::object([("c", Shape::leaf())]))),
        ])
    }

    fn slice_of(selection: &Selection) -> Slice {
        selection.slices().next().map(|(_, s)| s.clone()).unwrap()
    }

    #[test]
    fn first_and_last_are_index_aliases() {
        let shape = shape();
        let xs = Builder::new(&shape).unwrap().array("xs").unwrap();
        assert_eq!(xs.first().unwrap().selected(), xs.index(0).unwrap().selected());
        assert_eq!(xs.last().unwrap().selected(), xs.index(4).unwrap().selected());
        assert_eq!(xs.last().unwrap().selected(), xs.index(-1).unwrap().selected());
    }

    #[test]
    fn unknown_length_defers_bounds() {
        let shape = shape();
        let ys = Builder::new(&shape).unwrap().array("ys").unwrap();
        let last = ys.last().unwrap().selected();
        assert_eq!(slice_of(&last), Slice::Single { index: Position::End(1) });
        assert!(last.is_deferred());
        assert!(ys.index(-100).is_ok());
    }

    #[test]
    fn known_length_checks_bounds_eagerly() {
        let shape = shape();
        let xs = Builder::new(&shape).unwrap().array("xs").unwrap();
        let err = xs.index(-100).unwrap_err();
        assert_eq!(err.to_string(), "`xs`: index -100 is out of bounds for length 5");
        let err = xs.range(3, 1).unwrap_err();
        assert!(matches!(err, QueryError::Index { source: IndexError::Inverted { .. }, .. }));
        // the selector is unaffected
        assert!(xs.range(1, 3).is_ok());
    }

    #[test]
    fn same_selector_serves_independent_calls() {
        let shape = shape();
        let xs = Builder::new(&shape).unwrap().array("xs").unwrap();
        let first = xs.first().unwrap().selected();
        let middle = xs.range(1, 3).unwrap().selected();
        assert_eq!(first.to_string(), "xs[0]");
        assert_eq!(middle.to_string(), "xs[1..3]");
        assert_eq!(
            slice_of(&middle),
            Slice::Range { span: Span { start: Position::Start(1), end: Position::Start(3) } }
        );
    }

    #[test]
    fn object_elements_continue_through_a_builder() {
        let shape = shape();
        let rows = Builder::new(&shape).unwrap().array("rows").unwrap();
        let c = rows.all().leaf("c").unwrap();
        assert_eq!(c.fields(), vec!["rows", "c"]);
        assert_eq!(c.to_string(), "rows[*].c");
        assert!(!c.is_structure());
    }

    #[test]
    fn object_elements_can_be_selected_whole() {
        let shape = shape();
        let rows = Builder::new(&shape).unwrap().array("rows").unwrap();
        let first = rows.first().unwrap().selected();
        assert!(first.is_structure());
        assert_eq!(first.to_string(), "rows[0]");
        assert_eq!(slice_of(&first), Slice::Single { index: Position::Start(0) });
        let every = rows.selected();
        assert!(every.is_structure());
        assert_eq!(every, rows.all().selected());
        assert_eq!(every.to_string(), "rows[*]");

        let xs = Builder::new(&shape).unwrap().array("xs").unwrap();
        assert!(!xs.selected().is_structure());
        assert_eq!(xs.selected().to_string(), "xs[*]");
    }
}
