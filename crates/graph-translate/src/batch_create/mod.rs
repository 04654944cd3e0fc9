//! Batch create.
//!
//! Create input arrives as a list of records, each possibly nesting more
//! creates under relationship fields. [`input_ast::parse_create_input`]
//! merges the records into one tree of the shapes they share, and
//! [`unwind_create::UnwindCreateVisitor`] compiles that tree into one
//! `UNWIND`-driven pipeline with a `CALL` per nesting level. The number of
//! emitted clauses depends on the shape of the input, never on how many
//! records it holds.

pub mod input_ast;
pub mod relationship_validation;
pub mod unwind_create;

pub use input_ast::{parse_create_input, CreateAst, InputNode, NestedCreateAst, ParsedCreateInput};
pub use relationship_validation::relationship_validation;
pub use unwind_create::{ScopeDefinition, UnwindCreateEnvironment, UnwindCreateVisitor};

use crate::error::Result;

/// Compiles one kind of input tree node.
pub trait Visitor {
    fn visit_create(&mut self, create: &CreateAst) -> Result<()>;

    fn visit_nested_create(&mut self, nested: &NestedCreateAst) -> Result<()>;
}
