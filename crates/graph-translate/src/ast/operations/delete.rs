use super::{filtered_match, OperationTranspileResult};
use crate::ast::filters::{AuthorizationFilters, Filter};
use crate::context::QueryAstContext;
use crate::error::Result;
use crate::schema::ConcreteEntity;
use cypher_builder::{Delete, Expr, Pattern, Variable};
use tracing::debug;

/// `MATCH` the target, then `DETACH DELETE` it.
#[derive(Debug, Clone)]
pub struct DeleteOperation {
    pub target: ConcreteEntity,
    pub filters: Vec<Filter>,
    pub auth_filters: Vec<AuthorizationFilters>,
}

impl DeleteOperation {
    pub fn new(target: ConcreteEntity) -> Self {
        Self {
            target,
            filters: Vec::new(),
            auth_filters: Vec::new(),
        }
    }

    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_auth_filters(mut self, auth_filters: AuthorizationFilters) -> Self {
        self.auth_filters.push(auth_filters);
        self
    }

    /// Deletes return nothing; the projection is `null`
    pub fn transpile(
        &self,
        ctx: &QueryAstContext,
        _return_variable: &Variable,
    ) -> Result<OperationTranspileResult> {
        let node = ctx.target()?;
        debug!(entity = %self.target.name, "transpiling delete");

        let selection = filtered_match(
            ctx,
            Pattern::new(node),
            &[],
            &self.filters,
            &self.auth_filters,
        )?;

        Ok(OperationTranspileResult {
            clauses: vec![selection, Delete::new([node.variable()]).detach().into()],
            projection: Expr::null(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::filters::{parse_where, AuthorizationMode};
    use crate::config::TranslateConfig;
    use crate::schema::{Attribute, AttributeType, Schema};
    use cypher_builder::{Clause, Environment, Node, ToCypher};
    use insta::assert_snapshot;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_delete_with_where_and_authorization() {
        let movie = ConcreteEntity::new("Movie")
            .with_attribute(Attribute::new("title", AttributeType::String))
            .with_attribute(Attribute::new("owner", AttributeType::Id));
        let schema = Schema::new().with_entity(movie.clone());

        let filters = parse_where(&schema, &movie, &json!({ "title": "Up" })).unwrap();
        let auth = parse_where(&schema, &movie, &json!({ "owner": "u1" })).unwrap();
        let op = DeleteOperation::new(movie)
            .with_filters(filters)
            .with_auth_filters(AuthorizationFilters::new(AuthorizationMode::Where, auth));

        let ctx = QueryAstContext::new(Arc::new(schema), TranslateConfig::default())
            .with_target(&Node::named("this", ["Movie"]));
        let transpiled = op.transpile(&ctx, &Variable::named("data")).unwrap();
        let mut env = Environment::default();
        let cypher = Clause::concat(transpiled.clauses).to_cypher(&mut env).unwrap();

        assert_snapshot!(cypher, @r"
        MATCH (this:Movie)
        WHERE (this.title = $param0 AND this.owner = $param1)
        DETACH DELETE this
        ");
    }
}
