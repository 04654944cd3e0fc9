//! Aggregate-where translation.
//!
//! An aggregate filter such as `{ count_GT: 2, node: { name_AVERAGE_LT: 5 } }`
//! becomes a correlated subquery that matches the relationship from the
//! current target and returns one boolean:
//!
//! ```text
//! CALL {
//!     WITH this
//!     MATCH (this)<-[this0:ACTED_IN]-(this1:Actor)
//!     RETURN (count(this1) > $param0 AND avg(size(this1.name)) < $param1) AS var2
//! }
//! ```
//!
//! The caller filters on `var2 = true` after the subquery.

use crate::context::QueryAstContext;
use crate::error::{Result, TranslateError};
use crate::schema::{AttributeSource, AttributeType, RelationshipField};
use cypher_builder::expr::{avg, collect, count, max, min, size, sum};
use cypher_builder::{
    Call, Clause, ComparisonOp, Expr, Function, Match, Node, Param, Pattern, Predicate,
    Relationship, Return, Variable,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::trace;

// ============================================================================
// Key grammar
// ============================================================================

/// `<field>[_<aggregation>][_LENGTH][_<comparison>]`
static AGGREGATION_FIELD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<field>[_A-Za-z][_0-9A-Za-z]*?)(?:_(?P<aggregation>AVERAGE|SHORTEST|LONGEST|MIN|MAX|SUM))?(?:_LENGTH)?(?:_(?P<comparison>EQUAL|GTE|GT|LTE|LT))?$",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Aggregation {
    Average,
    Min,
    Max,
    Sum,
}

impl Aggregation {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "AVERAGE" => Some(Aggregation::Average),
            "MIN" | "SHORTEST" => Some(Aggregation::Min),
            "MAX" | "LONGEST" => Some(Aggregation::Max),
            "SUM" => Some(Aggregation::Sum),
            _ => None,
        }
    }

    fn apply(self, expr: impl Into<Expr>) -> Function {
        match self {
            Aggregation::Average => avg(expr),
            Aggregation::Min => min(expr),
            Aggregation::Max => max(expr),
            Aggregation::Sum => sum(expr),
        }
    }
}

fn comparison_from_suffix(suffix: Option<&str>) -> ComparisonOp {
    match suffix {
        Some("LT") => ComparisonOp::Lt,
        Some("LTE") => ComparisonOp::Lte,
        Some("GT") => ComparisonOp::Gt,
        Some("GTE") => ComparisonOp::Gte,
        _ => ComparisonOp::Eq,
    }
}

fn count_comparison(key: &str) -> Option<ComparisonOp> {
    match key {
        "count" => Some(ComparisonOp::Eq),
        "count_LT" => Some(ComparisonOp::Lt),
        "count_LTE" => Some(ComparisonOp::Lte),
        "count_GT" => Some(ComparisonOp::Gt),
        "count_GTE" => Some(ComparisonOp::Gte),
        _ => None,
    }
}

// ============================================================================
// Translation
// ============================================================================

/// Subquery computing `input` over `relationship` from the context target,
/// returning the outcome as `result`
pub fn aggregate_where_subquery(
    ctx: &QueryAstContext,
    relationship: &RelationshipField,
    input: &Value,
    result: &Variable,
) -> Result<Clause> {
    let parent = ctx.target()?;
    let schema = ctx.schema();
    let target_entity = schema.entity(&relationship.target)?;

    let node = Node::new(target_entity.labels());
    let rel = Relationship::new().with_type(relationship.rel_type.clone());
    let pattern = Pattern::new(parent)
        .without_labels()
        .related(&rel, relationship.cypher_direction(true), &node);

    let scope = AggregateScope {
        ctx,
        relationship,
        node: &node,
        rel: &rel,
    };
    let predicate = scope.aggregate_where(as_object(input)?)?;

    let body = Clause::concat([
        Clause::from(Match::new(pattern)),
        Return::new().column((predicate, result)).into(),
    ]);
    Ok(Call::new(body).import_with([parent.variable()]).into())
}

struct AggregateScope<'a> {
    ctx: &'a QueryAstContext,
    relationship: &'a RelationshipField,
    node: &'a Node,
    rel: &'a Relationship,
}

impl AggregateScope<'_> {
    fn aggregate_where(&self, input: &Map<String, Value>) -> Result<Predicate> {
        let mut predicates = Vec::new();
        for (key, value) in input {
            if let Some(op) = count_comparison(key) {
                predicates.push(Predicate::compare(
                    op,
                    count(self.node),
                    Param::new(value.clone()),
                ));
            } else if key == "node" {
                let entity = self.ctx.schema().entity(&self.relationship.target)?;
                predicates.push(self.entity_where(entity, self.node.variable(), as_object(value)?)?);
            } else if key == "edge" {
                let properties = self
                    .ctx
                    .schema()
                    .edge_properties(self.relationship)?
                    .ok_or_else(|| {
                        TranslateError::Configuration(format!(
                            "edge aggregation on relationship '{}' without properties",
                            self.relationship.name
                        ))
                    })?;
                predicates.push(self.entity_where(properties, self.rel.variable(), as_object(value)?)?);
            } else if is_logical(key) {
                let children = logical_children(key, value)?
                    .into_iter()
                    .map(|child| self.aggregate_where(child))
                    .collect::<Result<Vec<_>>>()?;
                predicates.push(combine_logical(key, children));
            } else {
                return Err(TranslateError::UnknownField {
                    entity: format!("{}Aggregate", self.relationship.name),
                    field: key.clone(),
                });
            }
        }
        Ok(Predicate::and(predicates).unwrap_or_else(Predicate::truthy))
    }

    fn entity_where(
        &self,
        source: &dyn AttributeSource,
        target: &Variable,
        input: &Map<String, Value>,
    ) -> Result<Predicate> {
        let mut predicates = Vec::new();
        for (key, value) in input {
            if is_logical(key) {
                let children = logical_children(key, value)?
                    .into_iter()
                    .map(|child| self.entity_where(source, target, child))
                    .collect::<Result<Vec<_>>>()?;
                predicates.push(combine_logical(key, children));
            } else {
                predicates.push(entity_operation(source, target, key, value)?);
            }
        }
        Ok(Predicate::and(predicates).unwrap_or_else(Predicate::truthy))
    }
}

/// One `<field>_<aggregation>_<comparison>` key over the matched elements
fn entity_operation(
    source: &dyn AttributeSource,
    target: &Variable,
    key: &str,
    value: &Value,
) -> Result<Predicate> {
    let captures = AGGREGATION_FIELD_REGEX
        .captures(key)
        .ok_or_else(|| unknown_field(source, key))?;
    let field = captures.name("field").map(|m| m.as_str()).unwrap_or(key);

    let attribute = match source.attribute(field) {
        Some(attribute) => attribute,
        None => return Err(unsupported_or_unknown(source, key)),
    };
    let comparison_suffix = captures.name("comparison").map(|m| m.as_str());
    let op = comparison_from_suffix(comparison_suffix);
    let param = Param::new(value.clone());
    let property = target.property(attribute.db_name());
    let is_string = attribute.attribute_type == AttributeType::String;

    trace!(key, field, "aggregate where key");

    if let Some(aggregation) = captures.name("aggregation") {
        let aggregation = Aggregation::from_suffix(aggregation.as_str()).ok_or_else(|| {
            TranslateError::UnsupportedOperator {
                key: key.to_string(),
                operator: aggregation.as_str().to_string(),
            }
        })?;
        let aggregated = if is_string {
            aggregation.apply(size(property))
        } else {
            aggregation.apply(property)
        };
        return Ok(Predicate::compare(op, aggregated, param));
    }

    // At least one related element satisfies the comparison. Strings compare
    // by length only under an explicit ordering suffix; a bare key is the
    // same equality on the value as `_EQUAL`.
    let item = Variable::new();
    let collected = if is_string && comparison_suffix.is_some_and(|s| s != "EQUAL") {
        collect(size(property))
    } else {
        collect(property)
    };
    Ok(Predicate::any(
        &item,
        collected,
        Predicate::compare(op, &item, param),
    ))
}

/// Error for a key whose field is unknown.
///
/// A key that starts with a known field followed by an unrecognised suffix
/// is reported as an unsupported operator rather than a missing field.
fn unsupported_or_unknown(source: &dyn AttributeSource, key: &str) -> TranslateError {
    for (index, _) in key.match_indices('_') {
        let (field, rest) = (&key[..index], &key[index + 1..]);
        if source.attribute(field).is_some() && !rest.is_empty() {
            return TranslateError::UnsupportedOperator {
                key: key.to_string(),
                operator: rest.to_string(),
            };
        }
    }
    unknown_field(source, key)
}

fn unknown_field(source: &dyn AttributeSource, key: &str) -> TranslateError {
    TranslateError::UnknownField {
        entity: source.source_name().to_string(),
        field: key.to_string(),
    }
}

// ============================================================================
// Input helpers
// ============================================================================

fn is_logical(key: &str) -> bool {
    matches!(key, "AND" | "OR" | "NOT")
}

/// Empty combinators are vacuously true
fn combine_logical(key: &str, children: Vec<Predicate>) -> Predicate {
    let combined = match key {
        "OR" => Predicate::or(children),
        "NOT" => Predicate::and(children).map(Predicate::not),
        _ => Predicate::and(children),
    };
    combined.unwrap_or_else(Predicate::truthy)
}

/// Children of a logical key: a list of objects, or a single object
fn logical_children<'v>(key: &str, value: &'v Value) -> Result<Vec<&'v Map<String, Value>>> {
    match value {
        Value::Array(items) => items.iter().map(as_object).collect(),
        Value::Object(map) => Ok(vec![map]),
        _ => Err(TranslateError::InvalidInput(format!(
            "'{key}' expects an object or a list of objects"
        ))),
    }
}

fn as_object(value: &Value) -> Result<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| TranslateError::InvalidInput(format!("expected an object, got {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslateConfig;
    use crate::schema::{
        Attribute, ConcreteEntity, RelationshipDirection, RelationshipProperties, Schema,
    };
    use cypher_builder::{Environment, ToCypher};
    use insta::assert_snapshot;
    use serde_json::json;
    use std::sync::Arc;

    fn actors() -> RelationshipField {
        RelationshipField::new("actors", "ACTED_IN", RelationshipDirection::In, "Actor")
            .with_properties("ActedIn")
    }

    fn schema() -> Schema {
        Schema::new()
            .with_entity(
                ConcreteEntity::new("Movie").with_relationship(actors()),
            )
            .with_entity(
                ConcreteEntity::new("Actor")
                    .with_attribute(Attribute::new("name", AttributeType::String))
                    .with_attribute(Attribute::new("age", AttributeType::Int)),
            )
            .with_relationship_properties(
                RelationshipProperties::new("ActedIn")
                    .with_attribute(Attribute::new("screenTime", AttributeType::Int)),
            )
    }

    fn translate(relationship: RelationshipField, input: Value) -> Result<String> {
        let ctx = QueryAstContext::new(Arc::new(schema()), TranslateConfig::default())
            .with_target(&Node::named("this", ["Movie"]));
        let result = Variable::new();
        let clause = aggregate_where_subquery(&ctx, &relationship, &input, &result)?;
        let mut env = Environment::default();
        Ok(clause.to_cypher(&mut env)?)
    }

    #[test]
    fn test_count_gt() {
        let cypher = translate(actors(), json!({ "count_GT": 2 })).unwrap();
        assert_snapshot!(cypher, @r"
        CALL {
            WITH this
            MATCH (this)<-[this0:ACTED_IN]-(this1:Actor)
            RETURN count(this1) > $param0 AS var2
        }
        ");
    }

    #[test]
    fn test_string_average_uses_length() {
        let cypher = translate(actors(), json!({ "node": { "name_AVERAGE_LT": 5 } })).unwrap();
        assert!(cypher.contains("RETURN avg(size(this1.name)) < $param0 AS var2"));
    }

    #[test]
    fn test_numeric_aggregation_uses_value() {
        let cypher = translate(actors(), json!({ "node": { "age_MAX_GTE": 40 } })).unwrap();
        assert!(cypher.contains("RETURN max(this1.age) >= $param0 AS var2"));
    }

    #[test]
    fn test_plain_comparison_is_existential() {
        let cypher = translate(actors(), json!({ "node": { "name_GT": 3 } })).unwrap();
        assert!(cypher.contains("any(var2 IN collect(size(this1.name)) WHERE var2 > $param0)"));

        let cypher = translate(actors(), json!({ "node": { "name_EQUAL": "Keanu" } })).unwrap();
        assert!(cypher.contains("any(var2 IN collect(this1.name) WHERE var2 = $param0)"));
    }

    #[test]
    fn test_bare_string_key_compares_value() {
        let bare = translate(actors(), json!({ "node": { "name": "Keanu" } })).unwrap();
        let equal = translate(actors(), json!({ "node": { "name_EQUAL": "Keanu" } })).unwrap();
        assert_eq!(bare, equal);
        assert!(!bare.contains("size("));
    }

    #[test]
    fn test_edge_aggregation() {
        let cypher = translate(actors(), json!({ "edge": { "screenTime_SUM_GT": 100 } })).unwrap();
        assert!(cypher.contains("RETURN sum(this0.screenTime) > $param0 AS var2"));
    }

    #[test]
    fn test_edge_without_properties_is_configuration_error() {
        let plain = RelationshipField::new("actors", "ACTED_IN", RelationshipDirection::In, "Actor");
        let error = translate(plain, json!({ "edge": { "screenTime_SUM_GT": 1 } })).unwrap_err();
        assert!(matches!(error, TranslateError::Configuration(_)));
    }

    #[test]
    fn test_unsupported_operator() {
        let error = translate(actors(), json!({ "node": { "name_MEDIAN_LT": 1 } })).unwrap_err();
        assert_eq!(
            error,
            TranslateError::UnsupportedOperator {
                key: "name_MEDIAN_LT".to_string(),
                operator: "MEDIAN_LT".to_string(),
            }
        );
    }

    #[test]
    fn test_logical_combinators() {
        let cypher = translate(actors(), json!({ "OR": [{ "count": 1 }, { "count_LTE": 0 }] }))
            .unwrap();
        assert!(cypher.contains("RETURN (count(this1) = $param0 OR count(this1) <= $param1) AS var2"));

        let cypher = translate(actors(), json!({ "NOT": { "count": 1 } })).unwrap();
        assert!(cypher.contains("RETURN NOT (count(this1) = $param0) AS var2"));
    }

    #[test]
    fn test_empty_combinator_is_true() {
        let cypher = translate(actors(), json!({ "AND": [] })).unwrap();
        assert!(cypher.contains("RETURN true AS var2"));
    }
}
