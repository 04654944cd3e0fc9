use super::{field_subqueries, filtered_match, map_projection, validate_after_write, OperationTranspileResult};
use crate::ast::fields::Field;
use crate::ast::filters::{AuthorizationFilters, Filter};
use crate::context::QueryAstContext;
use crate::error::Result;
use crate::schema::{ConcreteEntity, WriteOperation};
use crate::write::{generated_values, set_properties};
use cypher_builder::expr::collect;
use cypher_builder::{Clause, Param, Pattern, Return, SetClause, Variable};
use serde_json::{Map, Value};
use tracing::debug;

/// Set properties on every matched node.
///
/// ```text
/// MATCH (this:User)
/// WHERE this.id = $param0
/// SET this.name = $param1, this.updatedAt = datetime()
/// WITH this
/// CALL apoc.util.validate(...)
/// RETURN collect(DISTINCT this { .id }) AS data
/// ```
#[derive(Debug, Clone)]
pub struct UpdateOperation {
    pub target: ConcreteEntity,
    /// Property values keyed by field name
    pub input: Map<String, Value>,
    pub fields: Vec<Field>,
    pub filters: Vec<Filter>,
    /// Rules applied when matching
    pub auth_filters: Vec<AuthorizationFilters>,
    /// Rules checked against the updated node
    pub validate_after: Vec<AuthorizationFilters>,
}

impl UpdateOperation {
    pub fn new(target: ConcreteEntity, input: Map<String, Value>) -> Self {
        Self {
            target,
            input,
            fields: Vec::new(),
            filters: Vec::new(),
            auth_filters: Vec::new(),
            validate_after: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_auth_filters(mut self, auth_filters: AuthorizationFilters) -> Self {
        self.auth_filters.push(auth_filters);
        self
    }

    pub fn with_validate_after(mut self, auth_filters: AuthorizationFilters) -> Self {
        self.validate_after.push(auth_filters);
        self
    }

    pub fn transpile(
        &self,
        ctx: &QueryAstContext,
        return_variable: &Variable,
    ) -> Result<OperationTranspileResult> {
        let node = ctx.target()?;
        let this = node.variable();
        debug!(
            entity = %self.target.name,
            keys = self.input.len(),
            "transpiling update"
        );

        let selection = filtered_match(
            ctx,
            Pattern::new(node),
            &[],
            &self.filters,
            &self.auth_filters,
        )?;

        let mut items = set_properties(
            &self.target,
            this,
            self.input.keys().map(String::as_str),
            |key| Param::new(self.input[key].clone()).into(),
        )?;
        items.extend(generated_values(ctx, &self.target, this, WriteOperation::Update));

        let mut set = SetClause::new();
        for (target, value) in items {
            set = set.set(target, value);
        }

        let mut clauses = vec![selection];
        if !set.is_empty() {
            clauses.push(set.into());
        }
        clauses.extend(validate_after_write(ctx, node, &self.validate_after)?);
        clauses.extend(field_subqueries(ctx, &self.fields)?);

        let projection = map_projection(&self.fields, this);
        clauses.push(Clause::from(
            Return::new().column((collect(projection).distinct(), return_variable)),
        ));

        Ok(OperationTranspileResult {
            clauses,
            projection: return_variable.into(),
        })
    }
}
