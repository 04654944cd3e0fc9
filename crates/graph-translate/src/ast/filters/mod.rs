//! Filters.
//!
//! A filter yields one predicate over the current context target. Filters
//! that need values computed first (aggregation counts, permission checks)
//! also contribute subqueries through [`QueryAstNode::subqueries`]; the
//! owning operation places those before the predicate.

mod aggregation;
mod authorization;
mod logical;
pub mod parse;
mod property;
mod relationship;

pub use aggregation::AggregationFilter;
pub use authorization::{validate_call, AuthorizationFilters, AuthorizationMode};
pub use logical::{LogicalFilter, LogicalOperator};
pub use parse::{parse_connection_where, parse_where};
pub use property::{AttachedTo, FilterOperator, PropertyFilter};
pub use relationship::RelationshipFilter;

use crate::ast::QueryAstNode;
use crate::context::QueryAstContext;
use crate::error::Result;
use cypher_builder::{Clause, Predicate};

#[derive(Debug, Clone)]
pub enum Filter {
    Property(PropertyFilter),
    Logical(LogicalFilter),
    Aggregation(AggregationFilter),
    Relationship(RelationshipFilter),
}

impl Filter {
    pub fn predicate(&self, ctx: &QueryAstContext) -> Result<Predicate> {
        match self {
            Filter::Property(filter) => filter.predicate(ctx),
            Filter::Logical(filter) => filter.predicate(ctx),
            Filter::Aggregation(filter) => Ok(filter.predicate()),
            Filter::Relationship(filter) => filter.predicate(ctx),
        }
    }
}

impl QueryAstNode for Filter {
    fn selection(&self, ctx: &QueryAstContext) -> Result<Vec<Clause>> {
        match self {
            Filter::Property(_) | Filter::Aggregation(_) => Ok(Vec::new()),
            Filter::Logical(filter) => filter.selection(ctx),
            Filter::Relationship(filter) => filter.selection(ctx),
        }
    }

    fn subqueries(&self, ctx: &QueryAstContext) -> Result<Vec<Clause>> {
        match self {
            Filter::Property(_) => Ok(Vec::new()),
            Filter::Logical(filter) => filter.subqueries(ctx),
            Filter::Aggregation(filter) => filter.subqueries(ctx),
            Filter::Relationship(filter) => filter.subqueries(ctx),
        }
    }
}

impl From<PropertyFilter> for Filter {
    fn from(filter: PropertyFilter) -> Self {
        Filter::Property(filter)
    }
}

impl From<LogicalFilter> for Filter {
    fn from(filter: LogicalFilter) -> Self {
        Filter::Logical(filter)
    }
}

impl From<AggregationFilter> for Filter {
    fn from(filter: AggregationFilter) -> Self {
        Filter::Aggregation(filter)
    }
}

impl From<RelationshipFilter> for Filter {
    fn from(filter: RelationshipFilter) -> Self {
        Filter::Relationship(filter)
    }
}

/// Subqueries of all `filters`, in order
pub fn filter_subqueries(filters: &[Filter], ctx: &QueryAstContext) -> Result<Vec<Clause>> {
    let mut clauses = Vec::new();
    for filter in filters {
        clauses.extend(filter.subqueries(ctx)?);
    }
    Ok(clauses)
}

/// Predicates of all `filters`, in order
pub fn filter_predicates(filters: &[Filter], ctx: &QueryAstContext) -> Result<Vec<Predicate>> {
    filters.iter().map(|filter| filter.predicate(ctx)).collect()
}
