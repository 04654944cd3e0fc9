use crate::aggregate_where::aggregate_where_subquery;
use crate::context::QueryAstContext;
use crate::error::Result;
use crate::schema::RelationshipField;
use cypher_builder::{Clause, Expr, Predicate, Variable};
use serde_json::Value;

/// `<relationship>_AGGREGATE` filter.
///
/// The aggregate is computed by a subquery; the predicate only checks its
/// boolean outcome.
#[derive(Debug, Clone)]
pub struct AggregationFilter {
    pub relationship: RelationshipField,
    pub input: Value,
    result: Variable,
}

impl AggregationFilter {
    pub fn new(relationship: RelationshipField, input: Value) -> Self {
        Self {
            relationship,
            input,
            result: Variable::new(),
        }
    }

    pub fn predicate(&self) -> Predicate {
        Predicate::eq(&self.result, Expr::literal(true))
    }

    pub fn subqueries(&self, ctx: &QueryAstContext) -> Result<Vec<Clause>> {
        Ok(vec![aggregate_where_subquery(
            ctx,
            &self.relationship,
            &self.input,
            &self.result,
        )?])
    }
}
