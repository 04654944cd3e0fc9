//! Query AST and batch-create compilation to Cypher
//!
//! This crate turns request-shaped operation trees into parameterized
//! Cypher built with `cypher-builder`.
//!
//! ## Features
//!
//! - **Query AST**: read, connection, aggregate, create, update and delete
//!   operations with fields, filters, authorization rules, sort and
//!   pagination
//! - **Aggregate filters**: `count`/`min`/`max`/`avg`/`sum` conditions over
//!   related nodes and edges, compiled to correlated subqueries
//! - **Batch create**: nested create input compiled into one `UNWIND`
//!   pipeline whose size follows the input shape, not the record count
//!
//! ## Usage
//!
//! ```rust,ignore
//! use graph_translate::{translate, ConcreteEntity, ReadOperation, Schema, TranslateConfig};
//!
//! let schema = Schema::from_json(metadata)?;
//! let movie = schema.entity("Movie")?.clone();
//! let result = translate(ReadOperation::new(movie), schema, TranslateConfig::default())?;
//!
//! println!("{}", result.cypher);
//! ```

pub mod aggregate_where;
pub mod ast;
pub mod batch_create;
pub mod callback;
pub mod config;
pub mod context;
pub mod cursor;
pub mod error;
pub mod schema;
pub mod write;

// Re-exports
pub use aggregate_where::aggregate_where_subquery;
pub use ast::fields::Field;
pub use ast::filters::{
    parse_connection_where, parse_where, AuthorizationFilters, AuthorizationMode, Filter,
};
pub use ast::operations::{
    AggregateOperation, AggregationField, ConnectionReadOperation, CreateOperation,
    DeleteOperation, Operation, ReadOperation, UpdateOperation,
};
pub use ast::pagination::Pagination;
pub use ast::sort::{ConnectionSort, Sort};
pub use ast::{QueryAst, TranslationResult};
pub use batch_create::{parse_create_input, UnwindCreateVisitor};
pub use callback::PendingCallback;
pub use config::TranslateConfig;
pub use context::QueryAstContext;
pub use error::{ErrorKind, Result, TranslateError};
pub use schema::{
    Attribute, AttributeType, Cardinality, ConcreteEntity, RelationshipDirection,
    RelationshipField, RelationshipProperties, Schema, WriteOperation,
};

use std::sync::Arc;

/// Translate one operation tree against `schema`
pub fn translate(
    operation: impl Into<Operation>,
    schema: impl Into<Arc<Schema>>,
    config: TranslateConfig,
) -> Result<TranslationResult> {
    QueryAst::new(operation.into()).build(schema.into(), config)
}
