use super::{field_subqueries, filtered_match, hop, map_projection, OperationTranspileResult};
use crate::ast::fields::Field;
use crate::ast::filters::{AuthorizationFilters, Filter};
use crate::ast::pagination::Pagination;
use crate::ast::sort::Sort;
use crate::context::QueryAstContext;
use crate::error::Result;
use crate::schema::{ConcreteEntity, RelationshipField};
use cypher_builder::expr::{collect, head};
use cypher_builder::{Clause, Expr, Pattern, Return, Variable, With};
use tracing::debug;

/// Read the target entity, at the top level or over a relationship.
#[derive(Debug, Clone)]
pub struct ReadOperation {
    pub target: ConcreteEntity,
    pub relationship: Option<RelationshipField>,
    pub directed: bool,
    pub fields: Vec<Field>,
    pub filters: Vec<Filter>,
    pub auth_filters: Vec<AuthorizationFilters>,
    pub pagination: Option<Pagination>,
    pub sort: Vec<Sort>,
}

impl ReadOperation {
    pub fn new(target: ConcreteEntity) -> Self {
        Self {
            target,
            relationship: None,
            directed: true,
            fields: Vec::new(),
            filters: Vec::new(),
            auth_filters: Vec::new(),
            pagination: None,
            sort: Vec::new(),
        }
    }

    /// Read of `target` reached from the context target over `relationship`
    pub fn nested(relationship: RelationshipField, target: ConcreteEntity) -> Self {
        Self {
            relationship: Some(relationship),
            ..Self::new(target)
        }
    }

    pub fn undirected(mut self) -> Self {
        self.directed = false;
        self
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

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn with_sort(mut self, sort: Vec<Sort>) -> Self {
        self.sort = sort;
        self
    }

    pub fn transpile(
        &self,
        ctx: &QueryAstContext,
        return_variable: &Variable,
    ) -> Result<OperationTranspileResult> {
        match &self.relationship {
            Some(relationship) => self.transpile_nested(ctx, relationship, return_variable),
            None => self.transpile_top_level(ctx, return_variable),
        }
    }

    /// ```text
    /// MATCH (this:Movie)
    /// WHERE ...
    /// CALL { ... }
    /// RETURN this { .title, actors: var0 } AS this
    /// ```
    fn transpile_top_level(
        &self,
        ctx: &QueryAstContext,
        return_variable: &Variable,
    ) -> Result<OperationTranspileResult> {
        let node = ctx.target()?;
        debug!(entity = %self.target.name, "transpiling read");

        let selection = filtered_match(
            ctx,
            Pattern::new(node),
            &self.fields,
            &self.filters,
            &self.auth_filters,
        )?;
        let projection = map_projection(&self.fields, node.variable());

        let mut clauses = vec![selection];
        clauses.extend(self.sort_and_paginate(node.variable()));
        clauses.extend(field_subqueries(ctx, &self.fields)?);
        clauses.push(
            Return::new()
                .column((projection, return_variable))
                .into(),
        );

        Ok(OperationTranspileResult {
            clauses,
            projection: return_variable.into(),
        })
    }

    /// ```text
    /// MATCH (this)<-[this0:ACTED_IN]-(this1:Actor)
    /// WITH this1 { .name } AS this1
    /// RETURN collect(this1) AS var2
    /// ```
    fn transpile_nested(
        &self,
        ctx: &QueryAstContext,
        relationship: &RelationshipField,
        return_variable: &Variable,
    ) -> Result<OperationTranspileResult> {
        let hop = hop(ctx, relationship, &self.target, self.directed)?;
        debug!(
            entity = %self.target.name,
            relationship = %relationship.name,
            "transpiling nested read"
        );

        let selection = filtered_match(
            &hop.ctx,
            hop.pattern,
            &self.fields,
            &self.filters,
            &self.auth_filters,
        )?;
        let node = hop.node.variable();
        let projection = map_projection(&self.fields, node);
        let collected: Expr = if relationship.is_list() {
            collect(node).into()
        } else {
            head(collect(node)).into()
        };

        let mut clauses = vec![selection];
        clauses.extend(self.sort_and_paginate(node));
        clauses.extend(field_subqueries(&hop.ctx, &self.fields)?);
        clauses.push(With::new().column((projection, node)).into());
        clauses.push(Return::new().column((collected, return_variable)).into());

        Ok(OperationTranspileResult {
            clauses,
            projection: return_variable.into(),
        })
    }

    /// `WITH * ORDER BY ... SKIP ... LIMIT ...` when requested
    fn sort_and_paginate(&self, node: &Variable) -> Option<Clause> {
        let pagination = self.pagination.unwrap_or_default();
        if self.sort.is_empty() && pagination.is_empty() {
            return None;
        }

        let mut with = With::star();
        for sort in &self.sort {
            let (expr, order) = sort.sort_field(node);
            with = with.order_by(expr, order);
        }
        let field = pagination.pagination_field();
        if let Some(skip) = field.skip {
            with = with.skip(skip);
        }
        if let Some(limit) = field.limit {
            with = with.limit(limit);
        }
        Some(with.into())
    }
}
