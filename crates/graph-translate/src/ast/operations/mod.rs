//! Operations.
//!
//! Each operation compiles to a list of clauses plus the expression its
//! owner projects. Top-level operations run against the root node held by
//! the context; nested ones hop from the context target over a relationship
//! and are wrapped in a `CALL` by the field that owns them.

mod aggregate;
mod connection;
mod create;
mod delete;
mod read;
mod update;

pub use aggregate::{AggregateOperation, AggregationField};
pub use connection::ConnectionReadOperation;
pub use create::CreateOperation;
pub use delete::DeleteOperation;
pub use read::ReadOperation;
pub use update::UpdateOperation;

use super::fields::Field;
use super::filters::{filter_predicates, filter_subqueries, AuthorizationFilters, Filter};
use super::QueryAstNode;
use crate::context::QueryAstContext;
use crate::error::{Result, TranslateError};
use crate::schema::{ConcreteEntity, RelationshipField};
use cypher_builder::{
    Clause, Expr, MapProjection, Match, Node, Pattern, Predicate, Relationship, Variable, With,
};

/// Output of [`Operation::transpile`].
#[derive(Debug, Clone)]
pub struct OperationTranspileResult {
    pub clauses: Vec<Clause>,
    /// Expression the owner reads the result from
    pub projection: Expr,
}

#[derive(Debug, Clone)]
pub enum Operation {
    Read(ReadOperation),
    Connection(ConnectionReadOperation),
    Aggregate(AggregateOperation),
    Create(CreateOperation),
    Update(UpdateOperation),
    Delete(DeleteOperation),
}

impl Operation {
    pub fn transpile(
        &self,
        ctx: &QueryAstContext,
        return_variable: &Variable,
    ) -> Result<OperationTranspileResult> {
        match self {
            Operation::Read(op) => op.transpile(ctx, return_variable),
            Operation::Connection(op) => op.transpile(ctx, return_variable),
            Operation::Aggregate(op) => op.transpile(ctx, return_variable),
            Operation::Create(op) => op.transpile(ctx, return_variable),
            Operation::Update(op) => op.transpile(ctx, return_variable),
            Operation::Delete(op) => op.transpile(ctx, return_variable),
        }
    }

    /// Entity the operation reads or writes
    pub fn target(&self) -> &ConcreteEntity {
        match self {
            Operation::Read(op) => &op.target,
            Operation::Connection(op) => &op.target,
            Operation::Aggregate(op) => &op.target,
            Operation::Create(op) => &op.target,
            Operation::Update(op) => &op.target,
            Operation::Delete(op) => &op.target,
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Operation::Create(_) | Operation::Update(_) | Operation::Delete(_)
        )
    }
}

macro_rules! operation_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operation {
                fn from(op: $ty) -> Self {
                    Operation::$variant(op)
                }
            }
        )*
    };
}

operation_from! {
    Read => ReadOperation,
    Connection => ConnectionReadOperation,
    Aggregate => AggregateOperation,
    Create => CreateOperation,
    Update => UpdateOperation,
    Delete => DeleteOperation,
}

// ============================================================================
// Shared building blocks
// ============================================================================

/// Pattern and nested context for one hop from the context target
struct Hop {
    node: Node,
    relationship: Relationship,
    pattern: Pattern,
    ctx: QueryAstContext,
}

fn hop(
    ctx: &QueryAstContext,
    relationship: &RelationshipField,
    target: &ConcreteEntity,
    directed: bool,
) -> Result<Hop> {
    let parent = ctx.target()?;
    if relationship.rel_type.is_empty() {
        return Err(TranslateError::EmptyRelationshipType(relationship.name.clone()));
    }

    let node = Node::new(target.labels());
    let rel = Relationship::new().with_type(relationship.rel_type.clone());
    let pattern = Pattern::new(parent).without_labels().related(
        &rel,
        relationship.cypher_direction(directed),
        &node,
    );
    let nested = ctx.push(&node, &rel);

    Ok(Hop {
        node,
        relationship: rel,
        pattern,
        ctx: nested,
    })
}

/// Selection hooks of every child, in order
fn child_selection(
    ctx: &QueryAstContext,
    fields: &[Field],
    filters: &[Filter],
    auth_filters: &[AuthorizationFilters],
) -> Result<Vec<Clause>> {
    let mut clauses = Vec::new();
    for field in fields {
        clauses.extend(field.selection(ctx)?);
    }
    for filter in filters {
        clauses.extend(filter.selection(ctx)?);
    }
    for auth in auth_filters {
        clauses.extend(auth.selection(ctx)?);
    }
    Ok(clauses)
}

/// Subqueries and combined predicate of user and authorization filters
struct FilterParts {
    subqueries: Vec<Clause>,
    predicate: Option<Predicate>,
}

fn filter_parts(
    ctx: &QueryAstContext,
    filters: &[Filter],
    auth_filters: &[AuthorizationFilters],
) -> Result<FilterParts> {
    let mut subqueries = filter_subqueries(filters, ctx)?;
    let mut predicates = filter_predicates(filters, ctx)?;
    for auth in auth_filters {
        subqueries.extend(auth.subqueries(ctx)?);
        predicates.extend(auth.predicate(ctx)?);
    }
    Ok(FilterParts {
        subqueries,
        predicate: Predicate::and(predicates),
    })
}

/// Match `pattern`, then apply filters with the minimal number of clauses
fn filtered_match(
    ctx: &QueryAstContext,
    pattern: Pattern,
    fields: &[Field],
    filters: &[Filter],
    auth_filters: &[AuthorizationFilters],
) -> Result<Clause> {
    let plan = cypher_builder::plan_selection(
        Match::new(pattern),
        child_selection(ctx, fields, filters, auth_filters)?,
    );
    let parts = filter_parts(ctx, filters, auth_filters)?;
    let filtered = cypher_builder::filter_selection(plan.selection, parts.subqueries, parts.predicate);
    Ok(Clause::concat([plan.pre_selection, Some(filtered)]))
}

/// Subqueries of all fields, in order
fn field_subqueries(ctx: &QueryAstContext, fields: &[Field]) -> Result<Vec<Clause>> {
    let mut clauses = Vec::new();
    for field in fields {
        clauses.extend(field.subqueries(ctx)?);
    }
    Ok(clauses)
}

fn map_projection(fields: &[Field], target: &Variable) -> MapProjection {
    let mut projection = MapProjection::new(target);
    for field in fields {
        projection.push(field.projection_entry(target));
    }
    projection
}

/// Rules checked after a write: `WITH node` followed by their validation
fn validate_after_write(
    ctx: &QueryAstContext,
    node: &Node,
    auth_filters: &[AuthorizationFilters],
) -> Result<Option<Clause>> {
    let mut validations = Vec::new();
    for auth in auth_filters {
        validations.extend(auth.selection(ctx)?);
        validations.extend(auth.subqueries(ctx)?);
    }
    if validations.is_empty() {
        return Ok(None);
    }

    let mut clauses = vec![Clause::from(With::new().column(node))];
    clauses.extend(validations);
    Ok(Some(Clause::concat(clauses)))
}
