//! Where-input parsing.
//!
//! Keys follow `<field>[_NOT][_<operator>]`, plus the logical keys `AND`,
//! `OR` and `NOT`, `<relationship>_AGGREGATE` for aggregate filters and
//! `<relationship>` for a where-input on the node across a single
//! relationship.
//! Connection where-inputs nest node and edge filters under `node` and
//! `edge`.

use super::{
    AggregationFilter, AttachedTo, Filter, FilterOperator, LogicalFilter, LogicalOperator,
    PropertyFilter, RelationshipFilter,
};
use crate::error::{Result, TranslateError};
use crate::schema::{AttributeSource, ConcreteEntity, RelationshipField, Schema};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::trace;

static WHERE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<field>[_A-Za-z][_0-9A-Za-z]*?)(?:_(?P<not>NOT))?(?:_(?P<operator>INCLUDES|IN|LTE|LT|GTE|GT|CONTAINS|STARTS_WITH|ENDS_WITH|MATCHES))?$",
    )
    .unwrap()
});

const AGGREGATE_SUFFIX: &str = "_AGGREGATE";

/// Filters for a where-input on `entity`
pub fn parse_where(schema: &Schema, entity: &ConcreteEntity, input: &Value) -> Result<Vec<Filter>> {
    WhereParser {
        schema,
        source: entity,
        entity: Some(entity),
        attached_to: AttachedTo::Node,
    }
    .parse(as_object(input)?)
}

/// Filters for a connection where-input over `relationship`
pub fn parse_connection_where(
    schema: &Schema,
    relationship: &RelationshipField,
    input: &Value,
) -> Result<Vec<Filter>> {
    let mut filters = Vec::new();
    for (key, value) in as_object(input)? {
        match key.as_str() {
            "node" => {
                let entity = schema.entity(&relationship.target)?;
                filters.extend(parse_where(schema, entity, value)?);
            }
            "edge" => {
                let properties = schema.edge_properties(relationship)?.ok_or_else(|| {
                    TranslateError::Configuration(format!(
                        "edge filter on relationship '{}' without properties",
                        relationship.name
                    ))
                })?;
                let parser = WhereParser {
                    schema,
                    source: properties,
                    entity: None,
                    attached_to: AttachedTo::Relationship,
                };
                filters.extend(parser.parse(as_object(value)?)?);
            }
            other => match LogicalOperator::from_key(other) {
                Some(operator) => {
                    let mut children = Vec::new();
                    for child in logical_children(other, value)? {
                        children.extend(parse_connection_where(schema, relationship, child)?);
                    }
                    filters.push(LogicalFilter::new(operator, children).into());
                }
                None => {
                    return Err(TranslateError::UnknownField {
                        entity: format!("{}Connection", relationship.name),
                        field: other.to_string(),
                    })
                }
            },
        }
    }
    Ok(filters)
}

struct WhereParser<'a> {
    schema: &'a Schema,
    source: &'a dyn AttributeSource,
    /// Owning entity, when relationship keys are allowed
    entity: Option<&'a ConcreteEntity>,
    attached_to: AttachedTo,
}

impl WhereParser<'_> {
    fn parse(&self, input: &Map<String, Value>) -> Result<Vec<Filter>> {
        input
            .iter()
            .map(|(key, value)| self.parse_key(key, value))
            .collect()
    }

    fn parse_key(&self, key: &str, value: &Value) -> Result<Filter> {
        if let Some(operator) = LogicalOperator::from_key(key) {
            let mut children = Vec::new();
            for child in logical_children(key, value)? {
                children.extend(self.parse(as_object(child)?)?);
            }
            return Ok(LogicalFilter::new(operator, children).into());
        }

        if let Some(name) = key.strip_suffix(AGGREGATE_SUFFIX) {
            let relationship = self
                .entity
                .and_then(|entity| entity.relationship(name))
                .ok_or_else(|| self.unknown(key))?;
            self.schema.entity(&relationship.target)?;
            return Ok(AggregationFilter::new(relationship.clone(), value.clone()).into());
        }

        if let Some(relationship) = self.entity.and_then(|entity| entity.relationship(key)) {
            return self.relationship_filter(relationship, value);
        }

        let captures = WHERE_REGEX.captures(key).ok_or_else(|| self.unknown(key))?;
        let field = captures.name("field").map_or(key, |m| m.as_str());
        let attribute = self.source.require_attribute(field)?;

        let operator = match captures.name("operator") {
            Some(suffix) => FilterOperator::from_suffix(suffix.as_str()).ok_or_else(|| {
                TranslateError::UnsupportedOperator {
                    key: key.to_string(),
                    operator: suffix.as_str().to_string(),
                }
            })?,
            None => FilterOperator::Eq,
        };
        trace!(key, field, ?operator, "where key");

        let mut filter = PropertyFilter::new(attribute.clone(), operator, value.clone())
            .attached_to(self.attached_to);
        if captures.name("not").is_some() {
            filter = filter.negated();
        }
        Ok(filter.into())
    }

    fn relationship_filter(&self, relationship: &RelationshipField, value: &Value) -> Result<Filter> {
        if relationship.is_list() {
            return Err(TranslateError::InvalidInput(format!(
                "'{}' is a list relationship; filter it with '{}{}'",
                relationship.name, relationship.name, AGGREGATE_SUFFIX
            )));
        }

        let target = self.schema.entity(&relationship.target)?;
        let children = match value {
            Value::Null => None,
            input => Some(parse_where(self.schema, target, input)?),
        };
        Ok(RelationshipFilter::new(relationship.clone(), target, children).into())
    }

    fn unknown(&self, key: &str) -> TranslateError {
        TranslateError::UnknownField {
            entity: self.source.source_name().to_string(),
            field: key.to_string(),
        }
    }
}

/// `AND`/`OR` take a list of inputs, `NOT` a single one
fn logical_children<'v>(key: &str, value: &'v Value) -> Result<Vec<&'v Value>> {
    match value {
        Value::Array(items) => Ok(items.iter().collect()),
        Value::Object(_) => Ok(vec![value]),
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
