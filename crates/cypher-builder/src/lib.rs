//! Composable Cypher clause model.
//!
//! Queries are built as trees of [`Clause`], [`Expr`] and [`Predicate`]
//! values over opaque [`Variable`] and [`Param`] identities. Nothing has a
//! name until render time, when an [`Environment`] allocates collision-free
//! names in the order clauses introduce them.
//!
//! ## Usage
//!
//! ```rust
//! use cypher_builder::{render, Clause, Match, Node, Param, Pattern, Predicate, Return};
//!
//! let movie = Node::new(["Movie"]);
//! let query = Clause::concat([
//!     Clause::from(
//!         Match::new(Pattern::new(&movie))
//!             .and_where(Predicate::eq(movie.property("title"), Param::new("Up"))),
//!     ),
//!     Return::new().column(movie.variable()).into(),
//! ]);
//!
//! let rendered = render(&query).unwrap();
//! assert_eq!(
//!     rendered.cypher,
//!     "MATCH (this0:Movie)\nWHERE this0.title = $param0\nRETURN this0"
//! );
//! ```

pub mod apoc;
pub mod clause;
pub mod compose;
pub mod environment;
pub mod error;
pub mod escape;
pub mod expr;
pub mod pattern;
pub mod predicate;
pub mod raw;
pub mod render;
pub mod variable;

// Re-exports
pub use clause::{
    Call, CallProcedure, Clause, Create, Delete, Match, Merge, Order, ProjectionColumn, Return,
    SetClause, Unwind, With,
};
pub use compose::{filter_selection, plan_selection, Selection, SelectionPlan};
pub use environment::Environment;
pub use error::{BuildError, BuildResult, RenderError, RenderResult};
pub use expr::{Case, Expr, Function, ListComprehension, MapExpr, MapProjection, ProjectionEntry};
pub use pattern::Pattern;
pub use predicate::{ComparisonOp, Predicate, Quantifier};
pub use raw::RawFragment;
pub use render::{CypherRenderer, QueryRenderer, RenderOptions, RenderedQuery, ToCypher};
pub use variable::{Direction, Node, Param, Relationship, Variable};

/// Render a clause with default options and no pre-bound variables
pub fn render(clause: &Clause) -> RenderResult<RenderedQuery> {
    CypherRenderer::default().render(clause)
}
