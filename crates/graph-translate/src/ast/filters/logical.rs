use super::{filter_predicates, filter_subqueries, Filter};
use crate::ast::QueryAstNode;
use crate::context::QueryAstContext;
use crate::error::Result;
use cypher_builder::{Clause, Predicate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
    Not,
}

impl LogicalOperator {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "AND" => Some(LogicalOperator::And),
            "OR" => Some(LogicalOperator::Or),
            "NOT" => Some(LogicalOperator::Not),
            _ => None,
        }
    }
}

/// Combine child filters with AND, OR or NOT.
///
/// Without children the filter is vacuously true, so an empty combinator
/// never removes the enclosing conjunction.
#[derive(Debug, Clone)]
pub struct LogicalFilter {
    pub operator: LogicalOperator,
    pub children: Vec<Filter>,
}

impl LogicalFilter {
    pub fn new(operator: LogicalOperator, children: Vec<Filter>) -> Self {
        Self { operator, children }
    }

    pub fn predicate(&self, ctx: &QueryAstContext) -> Result<Predicate> {
        let predicates = filter_predicates(&self.children, ctx)?;
        let combined = match self.operator {
            LogicalOperator::And => Predicate::and(predicates),
            LogicalOperator::Or => Predicate::or(predicates),
            LogicalOperator::Not => Predicate::and(predicates).map(Predicate::not),
        };
        Ok(combined.unwrap_or_else(Predicate::truthy))
    }

    pub fn selection(&self, ctx: &QueryAstContext) -> Result<Vec<Clause>> {
        let mut clauses = Vec::new();
        for child in &self.children {
            clauses.extend(child.selection(ctx)?);
        }
        Ok(clauses)
    }

    pub fn subqueries(&self, ctx: &QueryAstContext) -> Result<Vec<Clause>> {
        filter_subqueries(&self.children, ctx)
    }
}
