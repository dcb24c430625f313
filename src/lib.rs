//! Declarative path selection over nested shapes.
//!
//! Register a [`Shape`], walk it with a [`Builder`] (objects), an
//! [`ArraySelector`] (arrays) and leaf accessors, and collect the resulting
//! [`Selection`]s into a [`Query`]. The query is plain data: which leaves were
//! chosen and, per array on the way, which elements. Running it against real
//! data is up to the consumer.
//!
//! ```
//! use shape_query::{SchemaRegistry, Shape, prepare_query};
//!
//! let mut registry = SchemaRegistry::new();
//! registry.register("Doc", Shape::object([
//!     ("a", Shape::object([
//!         ("b", Shape::array(Shape::object([("c", Shape::leaf()), ("d", Shape::leaf())]))),
//!     ])),
//! ])).unwrap();
//!
//! let q = prepare_query(&registry, "Doc", |doc| {
//!     let b = doc.object("a")?.array("b")?;
//!     Ok(vec![b.first()?.leaf("c")?, b.last()?.leaf("d")?])
//! }).unwrap();
//! assert_eq!(q.to_string(), "Doc: a.b[0].c\nDoc: a.b[-1].d\n");
//! ```

pub mod array;
pub mod builder;
pub mod error;
pub mod expr;
pub mod index;
pub mod json_schema;
pub mod path_de;
pub mod query;
pub mod schema;
pub mod selection;

pub use array::{ArraySelector, Element};
pub use builder::{Builder, Node};
pub use error::{QueryError, Result, ShapeKind};
pub use index::{IndexError, Position, Slice, Span};
pub use query::{IntoSelections, Query, prepare_query, query};
pub use schema::{SchemaFormat, SchemaRegistry, Shape};
pub use selection::{FieldPath, Segment, Selection};
