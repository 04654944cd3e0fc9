use super::{filter_predicates, filter_subqueries, Filter};
use crate::ast::QueryAstNode;
use crate::context::QueryAstContext;
use crate::error::Result;
use cypher_builder::{CallProcedure, Clause, Expr, Predicate};
use serde_json::json;

/// How authorization rules apply to matched elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationMode {
    /// Silently exclude elements the rules reject
    #[default]
    Where,
    /// Fail the query when any element is rejected
    Validate,
}

/// Authorization rules already resolved to filters.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationFilters {
    pub mode: AuthorizationMode,
    pub filters: Vec<Filter>,
}

impl AuthorizationFilters {
    pub fn new(mode: AuthorizationMode, filters: Vec<Filter>) -> Self {
        Self { mode, filters }
    }

    /// Predicate ANDed with user filters; validation rules contribute none
    pub fn predicate(&self, ctx: &QueryAstContext) -> Result<Option<Predicate>> {
        match self.mode {
            AuthorizationMode::Where => Ok(Predicate::and(filter_predicates(&self.filters, ctx)?)),
            AuthorizationMode::Validate => Ok(None),
        }
    }

    pub fn selection(&self, ctx: &QueryAstContext) -> Result<Vec<Clause>> {
        let mut clauses = Vec::new();
        for filter in &self.filters {
            clauses.extend(filter.selection(ctx)?);
        }
        Ok(clauses)
    }

    /// Subqueries of the rules, followed by the validation call in
    /// validate mode
    pub fn subqueries(&self, ctx: &QueryAstContext) -> Result<Vec<Clause>> {
        let mut clauses = filter_subqueries(&self.filters, ctx)?;
        if self.mode == AuthorizationMode::Validate {
            if let Some(predicate) = Predicate::and(filter_predicates(&self.filters, ctx)?) {
                clauses.push(validate_call(predicate, &ctx.config().forbidden_message));
            }
        }
        Ok(clauses)
    }
}

/// `CALL apoc.util.validate(NOT (p), "<message>", [0])`
pub fn validate_call(predicate: Predicate, message: &str) -> Clause {
    CallProcedure::new(
        "apoc.util.validate",
        [
            Predicate::not(predicate).into(),
            Expr::literal(message),
            Expr::literal(json!([0])),
        ],
    )
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::filters::{FilterOperator, PropertyFilter};
    use crate::config::TranslateConfig;
    use crate::schema::{Attribute, AttributeType, Schema};
    use cypher_builder::{Environment, Node, ToCypher};
    use std::sync::Arc;

    fn context() -> QueryAstContext {
        QueryAstContext::new(Arc::new(Schema::new()), TranslateConfig::default())
            .with_target(&Node::named("this", ["User"]))
    }

    fn owner_rule() -> Filter {
        PropertyFilter::new(
            Attribute::new("id", AttributeType::Id),
            FilterOperator::Eq,
            json!("user-id"),
        )
        .into()
    }

    #[test]
    fn test_where_mode_contributes_predicate() {
        let ctx = context();
        let auth = AuthorizationFilters::new(AuthorizationMode::Where, vec![owner_rule()]);

        let predicate = auth.predicate(&ctx).unwrap().unwrap();
        let mut env = Environment::default();
        assert_eq!(predicate.to_cypher(&mut env).unwrap(), "this.id = $param0");
        assert!(auth.subqueries(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_validate_mode_emits_validation_call() {
        let ctx = context();
        let auth = AuthorizationFilters::new(AuthorizationMode::Validate, vec![owner_rule()]);

        assert!(auth.predicate(&ctx).unwrap().is_none());
        let subqueries = auth.subqueries(&ctx).unwrap();
        let mut env = Environment::default();
        assert_eq!(
            Clause::concat(subqueries).to_cypher(&mut env).unwrap(),
            r#"CALL apoc.util.validate(NOT (this.id = $param0), "@neo4j/graphql/FORBIDDEN", [0])"#
        );
    }

    #[test]
    fn test_empty_rules_contribute_nothing() {
        let ctx = context();
        let auth = AuthorizationFilters::new(AuthorizationMode::Validate, Vec::new());
        assert!(auth.subqueries(&ctx).unwrap().is_empty());
        assert!(AuthorizationFilters::default().predicate(&ctx).unwrap().is_none());
    }
}
