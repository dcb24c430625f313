//! Textual selector expressions.
//!
//! The grammar mirrors builder navigation:
//!
//! ```text
//! a.b[first].c     a.b[last].d     tags[*]      xs[3]     xs[-1]
//! xs[1..3]         xs[0,-1,0]      xs[0..1,-2..-1]
//! ```
//!
//! Ranges are inclusive on both ends. Evaluation goes through [`Builder`] and
//! [`ArraySelector`], so shape and index errors are the same as for code.
//! A selector may stop at an object (`a`), at object elements (`a.b[0]`) or
//! at a whole array (`xs`, same as `xs[*]`); those select the structure.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::array::{ArraySelector, Element};
use crate::builder::{Builder, Node};
use crate::error::{QueryError, Result};
use crate::selection::Selection;

static SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<field>[^.\[\]]+)(?:\[(?P<slice>[^\]]*)\])?").expect("segment pattern compiles")
});

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceExpr {
    All,
    First,
    Last,
    Index(i64),
    Range(i64, i64),
    Indices(Vec<i64>),
    Ranges(Vec<(i64, i64)>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentExpr {
    pub field: String,
    pub slice: Option<SliceExpr>,
}

/// A parsed selector such as `a.b[-1].d`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorExpr {
    source: String,
    segments: Vec<SegmentExpr>,
}

// ————————————————————————————————————————————————————————————————————————————
// PARSING
// ————————————————————————————————————————————————————————————————————————————

impl FromStr for SelectorExpr {
    type Err = QueryError;

    fn from_str(src: &str) -> Result<Self> {
        let source = src.trim();
        if source.is_empty() {
            return Err(QueryError::syntax(src, "empty selector"));
        }
        let mut segments = Vec::new();
        let mut rest = source;
        loop {
            let caps = SEGMENT
                .captures(rest)
                .ok_or_else(|| QueryError::syntax(source, format!("expected a field name at `{rest}`")))?;
            let end = caps.get(0).map_or(0, |m| m.end());
            let slice = caps
                .name("slice")
                .map(|m| parse_slice(source, m.as_str()))
                .transpose()?;
            segments.push(SegmentExpr { field: caps["field"].to_owned(), slice });

            rest = &rest[end..];
            if rest.is_empty() {
                break;
            }
            rest = rest
                .strip_prefix('.')
                .ok_or_else(|| QueryError::syntax(source, format!("unexpected `{rest}`")))?;
            if rest.is_empty() {
                return Err(QueryError::syntax(source, "trailing `.`"));
            }
        }
        Ok(SelectorExpr { source: source.to_owned(), segments })
    }
}

fn parse_slice(source: &str, body: &str) -> Result<SliceExpr> {
    enum Item {
        Index(i64),
        Range(i64, i64),
    }

    let body = body.trim();
    match body {
        "" => return Err(QueryError::syntax(source, "empty `[]`")),
        "*" => return Ok(SliceExpr::All),
        "first" => return Ok(SliceExpr::First),
        "last" => return Ok(SliceExpr::Last),
        _ => {}
    }

    let int = |s: &str| {
        s.trim()
            .parse::<i64>()
            .map_err(|_| QueryError::syntax(source, format!("`{}` is not an integer", s.trim())))
    };
    let items = body
        .split(',')
        .map(|item| -> Result<Item> {
            match item.split_once("..") {
                Some((start, end)) => Ok(Item::Range(int(start)?, int(end)?)),
                None => Ok(Item::Index(int(item)?)),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let indices = items
        .iter()
        .filter_map(|item| match item {
            Item::Index(i) => Some(*i),
            Item::Range(..) => None,
        })
        .collect::<Vec<_>>();
    let ranges = items
        .iter()
        .filter_map(|item| match item {
            Item::Range(start, end) => Some((*start, *end)),
            Item::Index(_) => None,
        })
        .collect::<Vec<_>>();

    match (indices.len(), ranges.len()) {
        (1, 0) => Ok(SliceExpr::Index(indices[0])),
        (0, 1) => Ok(SliceExpr::Range(ranges[0].0, ranges[0].1)),
        (_, 0) => Ok(SliceExpr::Indices(indices)),
        (0, _) => Ok(SliceExpr::Ranges(ranges)),
        _ => Err(QueryError::syntax(source, "cannot mix indices and ranges in one `[]`")),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// EVALUATION
// ————————————————————————————————————————————————————————————————————————————

impl SliceExpr {
    pub fn apply<'s>(&self, array: &ArraySelector<'s>) -> Result<Element<'s>> {
        match self {
            SliceExpr::All => Ok(array.all()),
            SliceExpr::First => array.first(),
            SliceExpr::Last => array.last(),
            SliceExpr::Index(i) => array.index(*i),
            SliceExpr::Range(start, end) => array.range(*start, *end),
            SliceExpr::Indices(indices) => array.indices(indices),
            SliceExpr::Ranges(ranges) => array.ranges(ranges),
        }
    }
}

impl SelectorExpr {
    pub fn segments(&self) -> &[SegmentExpr] {
        &self.segments
    }

    /// Walk `root` along this expression and select whatever the final
    /// segment lands on.
    pub fn select(&self, root: &Builder<'_>) -> Result<Selection> {
        let Some((last, parents)) = self.segments.split_last() else {
            return Err(QueryError::syntax(&self.source, "empty selector"));
        };
        let mut scope = root.clone();
        for segment in parents {
            scope = self.step(&scope, segment)?.into_object()?;
        }
        match &last.slice {
            Some(slice) => Ok(slice.apply(&scope.array(&last.field)?)?.selected()),
            None => Ok(scope.field(&last.field)?.selected()),
        }
    }

    fn step<'s>(&self, scope: &Builder<'s>, segment: &SegmentExpr) -> Result<Element<'s>> {
        match &segment.slice {
            Some(slice) => slice.apply(&scope.array(&segment.field)?),
            None => match scope.field(&segment.field)? {
                Node::Leaf(selection) => Ok(Element::Leaf(selection)),
                Node::Object(builder) => Ok(Element::Object(builder)),
                Node::Array(array) => Err(QueryError::syntax(
                    &self.source,
                    format!("array `{}` needs an element selector such as `[*]`", array.path()),
                )),
            },
        }
    }
}

/// Parse and evaluate in one go.
pub fn select(root: &Builder<'_>, src: &str) -> Result<Selection> {
    src.parse::<SelectorExpr>()?.select(root)
}

impl fmt::Display for SelectorExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShapeKind;
    use crate::schema::Shape;

    fn shape() -> Shape {
        Shape::object([
            (
                "a",
                Shape::object([(
                    "b",
                    Shape::array(Shape::object([("c", Shape::leaf()), ("d", Shape::leaf())])),
                )]),
            ),
            ("xs", Shape::fixed_array(Shape::leaf(), 5)),
        ])
    }

    fn slice(src: &str) -> Option<SliceExpr> {
        let expr: SelectorExpr = src.parse().unwrap();
        expr.segments()[0].slice.clone()
    }

    #[test]
    fn parses_every_slice_form() {
        assert_eq!(slice("xs"), None);
        assert_eq!(slice("xs[*]"), Some(SliceExpr::All));
        assert_eq!(slice("xs[ last ]"), Some(SliceExpr::Last));
        assert_eq!(slice("xs[-2]"), Some(SliceExpr::Index(-2)));
        assert_eq!(slice("xs[1..3]"), Some(SliceExpr::Range(1, 3)));
        assert_eq!(slice("xs[0,-1,0]"), Some(SliceExpr::Indices(vec![0, -1, 0])));
        assert_eq!(slice("xs[0..1, -2..-1]"), Some(SliceExpr::Ranges(vec![(0, 1), (-2, -1)])));
    }

    #[test]
    fn rejects_malformed_selectors() {
        for bad in ["", "a.", ".a", "a..b", "xs[]", "xs[1,2..3]", "xs[x]", "xs[1]c"] {
            assert!(
                matches!(bad.parse::<SelectorExpr>(), Err(QueryError::Syntax { .. })),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn evaluates_through_the_builder() {
        let shape = shape();
        let root = Builder::new(&shape).unwrap();
        let c = select(&root, "a.b[first].c").unwrap();
        assert_eq!(c.to_string(), "a.b[0].c");
        let d = select(&root, "a.b[last].d").unwrap();
        assert_eq!(d.to_string(), "a.b[-1].d");
        let xs = select(&root, "xs[-2..-1]").unwrap();
        assert_eq!(xs.to_string(), "xs[3..4]");
    }

    #[test]
    fn selectors_may_end_on_a_structure() {
        let shape = shape();
        let root = Builder::new(&shape).unwrap();
        let element = select(&root, "a.b[0]").unwrap();
        assert!(element.is_structure());
        assert_eq!(element.to_string(), "a.b[0]");
        let object = select(&root, "a").unwrap();
        assert!(object.is_structure());
        assert_eq!(object, root.object("a").unwrap().selected());
        let whole = select(&root, "a.b").unwrap();
        assert_eq!(whole, select(&root, "a.b[*]").unwrap());
        assert!(whole.is_structure());
        let xs = select(&root, "xs").unwrap();
        assert!(!xs.is_structure());
        assert_eq!(xs.to_string(), "xs[*]");
    }

    #[test]
    fn shape_and_index_errors_pass_through() {
        let shape = shape();
        let root = Builder::new(&shape).unwrap();
        assert!(matches!(select(&root, "a.b.c"), Err(QueryError::Syntax { .. })));
        assert!(matches!(
            select(&root, "a.b[0].c[1]"),
            Err(QueryError::Shape { expected: ShapeKind::Array, found: ShapeKind::Leaf, .. })
        ));
        assert!(matches!(select(&root, "xs[3..1]"), Err(QueryError::Index { .. })));
        assert!(matches!(select(&root, "a[0].b"), Err(QueryError::Shape { .. })));
        assert!(matches!(select(&root, "a.zz"), Err(QueryError::UnknownField { .. })));
    }
}
