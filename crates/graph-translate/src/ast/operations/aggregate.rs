use super::{filtered_match, hop, OperationTranspileResult};
use crate::ast::filters::{AuthorizationFilters, Filter};
use crate::context::QueryAstContext;
use crate::error::{Result, TranslateError};
use crate::schema::{Attribute, AttributeType, ConcreteEntity, RelationshipField};
use cypher_builder::expr::{avg, collect, count, head, last, max, min, size, sum};
use cypher_builder::{Call, Clause, Expr, MapExpr, Order, Pattern, Return, Variable, With};
use tracing::debug;

/// One requested aggregate value.
#[derive(Debug, Clone)]
pub enum AggregationField {
    /// Number of matched nodes
    Count { alias: String },
    /// Min/max/average/sum, longest/shortest or min/max depending on the
    /// attribute type
    Attribute { alias: String, attribute: Attribute },
}

impl AggregationField {
    pub fn count(alias: impl Into<String>) -> Self {
        AggregationField::Count {
            alias: alias.into(),
        }
    }

    pub fn attribute(attribute: &Attribute) -> Self {
        AggregationField::Attribute {
            alias: attribute.name.clone(),
            attribute: attribute.clone(),
        }
    }

    pub fn alias(&self) -> &str {
        match self {
            AggregationField::Count { alias } | AggregationField::Attribute { alias, .. } => alias,
        }
    }

    /// Clauses ending in `RETURN <value> AS result`, after the selection
    fn aggregate(&self, node: &Variable, result: &Variable) -> Result<Vec<Clause>> {
        match self {
            AggregationField::Count { .. } => {
                Ok(vec![Return::new().column((count(node), result)).into()])
            }
            AggregationField::Attribute { attribute, .. } => {
                attribute_aggregate(attribute, node, result)
            }
        }
    }
}

fn attribute_aggregate(
    attribute: &Attribute,
    node: &Variable,
    result: &Variable,
) -> Result<Vec<Clause>> {
    let property = node.property(attribute.db_name());

    let value = match attribute.attribute_type {
        t if t.is_numeric() => MapExpr::new()
            .with("min", min(property.clone()))
            .with("max", max(property.clone()))
            .with("average", avg(property.clone()))
            .with("sum", sum(property)),
        AttributeType::String | AttributeType::Id => {
            let list = Variable::new();
            return Ok(vec![
                With::new()
                    .column(node)
                    .order_by(size(property.clone()), Order::Desc)
                    .into(),
                With::new().column((collect(property), &list)).into(),
                Return::new()
                    .column((
                        MapExpr::new()
                            .with("longest", head(&list))
                            .with("shortest", last(&list)),
                        result,
                    ))
                    .into(),
            ]);
        }
        AttributeType::DateTime
        | AttributeType::Date
        | AttributeType::Time
        | AttributeType::LocalTime
        | AttributeType::LocalDateTime
        | AttributeType::Duration => MapExpr::new()
            .with("min", min(property.clone()))
            .with("max", max(property)),
        other => {
            return Err(TranslateError::Configuration(format!(
                "attribute '{}' of type {other:?} cannot be aggregated",
                attribute.name
            )))
        }
    };

    Ok(vec![Return::new().column((value, result)).into()])
}

/// Aggregates over the target entity, one subquery per field.
///
/// ```text
/// CALL {
///     MATCH (this:Movie)
///     RETURN count(this) AS var0
/// }
/// RETURN { count: var0 } AS this
/// ```
#[derive(Debug, Clone)]
pub struct AggregateOperation {
    pub target: ConcreteEntity,
    pub relationship: Option<RelationshipField>,
    pub directed: bool,
    pub fields: Vec<AggregationField>,
    pub filters: Vec<Filter>,
    pub auth_filters: Vec<AuthorizationFilters>,
}

impl AggregateOperation {
    pub fn new(target: ConcreteEntity) -> Self {
        Self {
            target,
            relationship: None,
            directed: true,
            fields: Vec::new(),
            filters: Vec::new(),
            auth_filters: Vec::new(),
        }
    }

    /// Aggregate over nodes reached from the context target
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

    pub fn with_fields(mut self, fields: Vec<AggregationField>) -> Self {
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

    pub fn transpile(
        &self,
        ctx: &QueryAstContext,
        return_variable: &Variable,
    ) -> Result<OperationTranspileResult> {
        debug!(
            entity = %self.target.name,
            fields = self.fields.len(),
            "transpiling aggregate"
        );

        let (pattern, node, inner_ctx, parent) = match &self.relationship {
            Some(relationship) => {
                let hop = hop(ctx, relationship, &self.target, self.directed)?;
                let parent = ctx.target()?.variable().clone();
                (hop.pattern, hop.node, hop.ctx, Some(parent))
            }
            None => {
                let node = ctx.target()?.clone();
                (Pattern::new(&node), node, ctx.clone(), None)
            }
        };

        let mut clauses = Vec::with_capacity(self.fields.len() + 1);
        let mut projection = MapExpr::new();

        for field in &self.fields {
            let result = Variable::new();
            let selection = filtered_match(
                &inner_ctx,
                pattern.clone(),
                &[],
                &self.filters,
                &self.auth_filters,
            )?;

            let mut body = vec![selection];
            body.extend(field.aggregate(node.variable(), &result)?);

            let call = Call::new(Clause::concat(body));
            let call = match &parent {
                Some(parent) => call.import_with([parent]),
                None => call,
            };
            clauses.push(Clause::from(call));
            projection.set(field.alias(), &result);
        }

        clauses.push(
            Return::new()
                .column((Expr::from(projection), return_variable))
                .into(),
        );

        Ok(OperationTranspileResult {
            clauses,
            projection: return_variable.into(),
        })
    }
}
