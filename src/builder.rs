//! Schema-mirroring navigation.
//!
//! A [`Builder`] is a read-only view of one object shape plus the path that
//! led to it. Each field is exposed as a [`Node`]: a selected leaf, a nested
//! builder, or an [`ArraySelector`]. Builders borrow the schema and own only
//! their path, so any number of independent traversals can run at once.

use indexmap::IndexMap;

use crate::array::ArraySelector;
use crate::error::{QueryError, Result, ShapeKind};
use crate::schema::Shape;
use crate::selection::{FieldPath, Selection};

#[derive(Debug, Clone)]
pub struct Builder<'s> {
    fields: &'s IndexMap<String, Shape>,
    path: FieldPath,
}

/// What a field resolves to.
#[derive(Debug, Clone)]
pub enum Node<'s> {
    Leaf(Selection),
    Object(Builder<'s>),
    Array(ArraySelector<'s>),
}

impl<'s> Builder<'s> {
    /// Root builder over an object shape. The shape is validated first.
    pub fn new(shape: &'s Shape) -> Result<Self> {
        shape.validate()?;
        Self::root(shape)
    }

    /// Root builder over a shape that already passed validation.
    pub(crate) fn root(shape: &'s Shape) -> Result<Self> {
        match shape {
            Shape::Object { fields } => Ok(Self::scoped(fields, FieldPath::root())),
            other => Err(QueryError::Shape {
                path: FieldPath::root(),
                expected: ShapeKind::Object,
                found: other.kind(),
            }),
        }
    }

    pub(crate) fn scoped(fields: &'s IndexMap<String, Shape>, path: FieldPath) -> Self {
        Self { fields, path }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// The whole object at this path, selected as a structure.
    pub fn selected(&self) -> Selection {
        Selection::structure(self.path.clone())
    }

    /// Declared field names, in order.
    pub fn field_names(&self) -> impl Iterator<Item = &'s str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn field(&self, name: &str) -> Result<Node<'s>> {
        let shape = self.fields.get(name).ok_or_else(|| QueryError::UnknownField {
            path: self.path.clone(),
            field: name.to_owned(),
        })?;
        let path = self.path.child(name);
        Ok(match shape {
            Shape::Leaf => Node::Leaf(Selection::new(path, None)),
            Shape::Reference { target } => Node::Leaf(Selection::new(path, Some(target.clone()))),
            Shape::Object { fields } => Node::Object(Builder::scoped(fields, path)),
            Shape::Array { item, len } => Node::Array(ArraySelector::new(item, *len, path)),
        })
    }

    /// Select a leaf or reference field.
    pub fn leaf(&self, name: &str) -> Result<Selection> {
        self.field(name)?.into_leaf()
    }

    /// Descend into a nested object field.
    pub fn object(&self, name: &str) -> Result<Builder<'s>> {
        self.field(name)?.into_object()
    }

    /// Array selector for an array field.
    pub fn array(&self, name: &str) -> Result<ArraySelector<'s>> {
        self.field(name)?.into_array()
    }
}

impl<'s> Node<'s> {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Node::Leaf(selection) if selection.reference().is_some() => ShapeKind::Reference,
            Node::Leaf(_) => ShapeKind::Leaf,
            Node::Object(_) => ShapeKind::Object,
            Node::Array(_) => ShapeKind::Array,
        }
    }

    pub fn path(&self) -> &FieldPath {
        match self {
            Node::Leaf(selection) => selection.path(),
            Node::Object(builder) => builder.path(),
            Node::Array(array) => array.path(),
        }
    }

    /// Whatever the field holds: the leaf itself, or the whole object or array.
    pub fn selected(self) -> Selection {
        match self {
            Node::Leaf(selection) => selection,
            Node::Object(builder) => builder.selected(),
            Node::Array(array) => array.selected(),
        }
    }

    pub fn into_leaf(self) -> Result<Selection> {
        match self {
            Node::Leaf(selection) => Ok(selection),
            other => Err(other.mismatch(ShapeKind::Leaf)),
        }
    }

    pub fn into_object(self) -> Result<Builder<'s>> {
        match self {
            Node::Object(builder) => Ok(builder),
            other => Err(other.mismatch(ShapeKind::Object)),
        }
    }

    pub fn into_array(self) -> Result<ArraySelector<'s>> {
        match self {
            Node::Array(array) => Ok(array),
            other => Err(other.mismatch(ShapeKind::Array)),
        }
    }

    fn mismatch(&self, expected: ShapeKind) -> QueryError {
        QueryError::Shape {
            path: self.path().clone(),
            expected,
            found: self.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> Shape {
        Shape::object([
            ("name", Shape::leaf()),
            ("owner", Shape::reference("User")),
            ("meta", Shape::object([("created", Shape::leaf())])),
            ("tags", Shape::array(Shape::leaf())),
        ])
    }

    #[test]
    fn nested_builders_prefix_their_path() {
        let shape = shape();
        let root = Builder::new(&shape).unwrap();
        let created = root.object("meta").unwrap().leaf("created").unwrap();
        assert_eq!(created.fields(), vec!["meta", "created"]);
        assert_eq!(root.field_names().collect::<Vec<_>>(), vec!["name", "owner", "meta", "tags"]);
    }

    #[test]
    fn references_are_opaque_leaves() {
        let shape = shape();
        let root = Builder::new(&shape).unwrap();
        let owner = root.leaf("owner").unwrap();
        assert_eq!(owner.reference(), Some("User"));
        let err = root.object("owner").unwrap_err();
        assert_eq!(
            err,
            QueryError::Shape {
                path: FieldPath::root().child("owner"),
                expected: ShapeKind::Object,
                found: ShapeKind::Reference,
            }
        );
    }

    #[test]
    fn shape_errors_name_the_field() {
        let shape = shape();
        let root = Builder::new(&shape).unwrap();
        let err = root.array("name").unwrap_err();
        assert_eq!(err.to_string(), "`name` is a leaf, not an array");
        let err = root.leaf("tags").unwrap_err();
        assert_eq!(err.to_string(), "`tags` is an array, not a leaf");
        let err = root.object("meta").unwrap().leaf("missing").unwrap_err();
        assert_eq!(err.to_string(), "`meta` has no field `missing`");
        // the builder is still usable after an error
        assert!(root.leaf("name").is_ok());
    }

    #[test]
    fn objects_can_be_selected_whole() {
        let shape = shape();
        let root = Builder::new(&shape).unwrap();
        let meta = root.object("meta").unwrap().selected();
        assert!(meta.is_structure());
        assert_eq!(meta.to_string(), "meta");
        assert_eq!(root.field("meta").unwrap().selected(), meta);
        let tags = root.field("tags").unwrap().selected();
        assert!(!tags.is_structure());
        assert_eq!(tags.to_string(), "tags[*]");
        assert!(!root.field("name").unwrap().selected().is_structure());
    }

    #[test]
    fn non_object_roots_are_rejected() {
        let leaf = Shape::leaf();
        assert!(matches!(
            Builder::new(&leaf),
            Err(QueryError::Shape { found: ShapeKind::Leaf, .. })
        ));
    }
}
