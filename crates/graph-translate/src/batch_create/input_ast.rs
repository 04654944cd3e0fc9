//! Input tree for batch creates.
//!
//! ```json
//! [
//!   { "title": "Up", "actors": { "create": [{ "node": { "name": "Ed" }, "edge": { "role": "Carl" } }] } },
//!   { "title": "Cars" }
//! ]
//! ```
//!
//! The tree holds the union of the keys of every record at each level.
//! Records that lack a key read `null` for it when unwound.

use super::Visitor;
use crate::error::{Result, TranslateError};
use crate::schema::{AttributeSource, ConcreteEntity, RelationshipField, RelationshipProperties, Schema};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::trace;

const CREATE_KEY: &str = "create";

/// Root of a create input tree.
#[derive(Debug, Clone)]
pub struct CreateAst {
    pub id: usize,
    pub entity: ConcreteEntity,
    /// Attribute keys present in any record
    pub node_properties: Vec<String>,
    pub children: Vec<NestedCreateAst>,
}

/// Nodes created under a relationship field of their parent.
#[derive(Debug, Clone)]
pub struct NestedCreateAst {
    pub id: usize,
    pub entity: ConcreteEntity,
    pub relationship: Option<RelationshipField>,
    /// Key under the parent input that holds the `create` list
    pub relationship_property_path: String,
    pub node_properties: Vec<String>,
    pub edge_properties: Vec<String>,
    pub edge: Option<RelationshipProperties>,
    pub children: Vec<NestedCreateAst>,
}

/// A node of the input tree.
#[derive(Debug, Clone, Copy)]
pub enum InputNode<'a> {
    Create(&'a CreateAst),
    NestedCreate(&'a NestedCreateAst),
}

impl InputNode<'_> {
    pub fn accept<V: Visitor>(&self, visitor: &mut V) -> Result<()> {
        match self {
            InputNode::Create(create) => visitor.visit_create(create),
            InputNode::NestedCreate(nested) => visitor.visit_nested_create(nested),
        }
    }

    pub fn id(&self) -> usize {
        match self {
            InputNode::Create(create) => create.id,
            InputNode::NestedCreate(nested) => nested.id,
        }
    }
}

/// Input tree plus the records, normalized for unwinding.
#[derive(Debug, Clone)]
pub struct ParsedCreateInput {
    pub ast: CreateAst,
    /// Records with every nested `create` turned into a list
    pub records: Vec<Value>,
}

/// Build the input tree for creating `records` of `entity`
pub fn parse_create_input(
    schema: &Schema,
    entity: &ConcreteEntity,
    records: &[Value],
) -> Result<ParsedCreateInput> {
    let mut normalized = Vec::with_capacity(records.len());
    for record in records {
        let mut record = as_object(record)?.clone();
        normalize(schema, entity, &mut record)?;
        normalized.push(Value::Object(record));
    }

    let mut parser = InputParser { schema, next_id: 0 };
    let id = parser.next_id();
    let maps: Vec<&Map<String, Value>> = normalized.iter().filter_map(Value::as_object).collect();
    let (node_properties, children) = parser.level(entity, &maps)?;

    Ok(ParsedCreateInput {
        ast: CreateAst {
            id,
            entity: entity.clone(),
            node_properties,
            children,
        },
        records: normalized,
    })
}

struct InputParser<'a> {
    schema: &'a Schema,
    next_id: usize,
}

impl InputParser<'_> {
    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Attribute keys and nested creates shared by `inputs` of `entity`
    fn level(
        &mut self,
        entity: &ConcreteEntity,
        inputs: &[&Map<String, Value>],
    ) -> Result<(Vec<String>, Vec<NestedCreateAst>)> {
        let keys: BTreeSet<&str> = inputs
            .iter()
            .flat_map(|input| input.keys().map(String::as_str))
            .collect();

        let mut properties = Vec::new();
        let mut children = Vec::new();
        for key in keys {
            if entity.attribute(key).is_some() {
                properties.push(key.to_string());
            } else if let Some(relationship) = entity.relationship(key) {
                children.push(self.nested(relationship, inputs)?);
            } else {
                return Err(TranslateError::UnknownField {
                    entity: entity.name.clone(),
                    field: key.to_string(),
                });
            }
        }
        Ok((properties, children))
    }

    fn nested(
        &mut self,
        relationship: &RelationshipField,
        inputs: &[&Map<String, Value>],
    ) -> Result<NestedCreateAst> {
        let id = self.next_id();
        let schema = self.schema;
        let target = schema.entity(&relationship.target)?;
        let edge = schema.edge_properties(relationship)?;

        let mut nodes = Vec::new();
        let mut edge_keys = BTreeSet::new();
        for input in inputs {
            let Some(items) = input
                .get(&relationship.name)
                .and_then(|v| v.get(CREATE_KEY))
                .and_then(Value::as_array)
            else {
                continue;
            };
            for item in items {
                if let Some(node) = item.get("node").and_then(Value::as_object) {
                    nodes.push(node);
                }
                if let Some(edge) = item.get("edge").and_then(Value::as_object) {
                    edge_keys.extend(edge.keys().cloned());
                }
            }
        }

        let edge_properties: Vec<String> = edge_keys.into_iter().collect();
        match edge {
            Some(edge) => {
                for key in &edge_properties {
                    edge.require_attribute(key)?;
                }
            }
            None if !edge_properties.is_empty() => {
                return Err(TranslateError::Configuration(format!(
                    "edge input on relationship '{}' without properties",
                    relationship.name
                )))
            }
            None => {}
        }

        let (node_properties, children) = self.level(target, &nodes)?;
        trace!(
            id,
            relationship = %relationship.name,
            records = nodes.len(),
            "nested create input"
        );

        Ok(NestedCreateAst {
            id,
            entity: target.clone(),
            relationship: Some(relationship.clone()),
            relationship_property_path: relationship.name.clone(),
            node_properties,
            edge_properties,
            edge: edge.cloned(),
            children,
        })
    }
}

/// Turn single nested `create` objects into lists, recursively
fn normalize(schema: &Schema, entity: &ConcreteEntity, record: &mut Map<String, Value>) -> Result<()> {
    for relationship in &entity.relationships {
        let Some(value) = record.get_mut(&relationship.name) else {
            continue;
        };
        let operations = value.as_object_mut().ok_or_else(|| {
            TranslateError::InvalidInput(format!(
                "'{}' expects an object with a 'create' key",
                relationship.name
            ))
        })?;
        if let Some(other) = operations.keys().find(|k| k.as_str() != CREATE_KEY) {
            return Err(TranslateError::InvalidInput(format!(
                "unsupported operation '{other}' on '{}' in a create",
                relationship.name
            )));
        }

        let Some(create) = operations.get_mut(CREATE_KEY) else {
            continue;
        };
        if create.is_object() {
            *create = Value::Array(vec![create.take()]);
        }

        let target = schema.entity(&relationship.target)?;
        if let Value::Array(items) = create {
            for item in items {
                if let Some(node) = item.get_mut("node").and_then(Value::as_object_mut) {
                    normalize(schema, target, node)?;
                }
            }
        }
    }
    Ok(())
}

fn as_object(value: &Value) -> Result<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| TranslateError::InvalidInput(format!("expected an object, got {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeType, RelationshipDirection};
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new()
            .with_entity(
                ConcreteEntity::new("Movie")
                    .with_attribute(Attribute::new("title", AttributeType::String))
                    .with_attribute(Attribute::new("released", AttributeType::Int))
                    .with_relationship(
                        RelationshipField::new("actors", "ACTED_IN", RelationshipDirection::In, "Actor")
                            .with_properties("ActedIn"),
                    ),
            )
            .with_entity(
                ConcreteEntity::new("Actor")
                    .with_attribute(Attribute::new("name", AttributeType::String)),
            )
            .with_relationship_properties(
                RelationshipProperties::new("ActedIn")
                    .with_attribute(Attribute::new("role", AttributeType::String)),
            )
    }

    fn parse(records: Value) -> Result<ParsedCreateInput> {
        let schema = schema();
        let movie = schema.entity("Movie").unwrap().clone();
        let records = records.as_array().cloned().unwrap();
        parse_create_input(&schema, &movie, &records)
    }

    #[test]
    fn test_keys_are_merged_across_records() {
        let parsed = parse(json!([
            { "title": "Up" },
            { "released": 2009, "actors": { "create": [{ "node": { "name": "Ed" }, "edge": { "role": "Carl" } }] } }
        ]))
        .unwrap();

        assert_eq!(parsed.ast.id, 0);
        assert_eq!(parsed.ast.node_properties, vec!["released", "title"]);
        assert_eq!(parsed.ast.children.len(), 1);

        let actors = &parsed.ast.children[0];
        assert_eq!(actors.id, 1);
        assert_eq!(actors.relationship_property_path, "actors");
        assert_eq!(actors.node_properties, vec!["name"]);
        assert_eq!(actors.edge_properties, vec!["role"]);
    }

    #[test]
    fn test_single_create_is_normalized_to_list() {
        let parsed = parse(json!([
            { "title": "Up", "actors": { "create": { "node": { "name": "Ed" } } } }
        ]))
        .unwrap();

        assert_eq!(
            parsed.records[0]["actors"]["create"],
            json!([{ "node": { "name": "Ed" } }])
        );
        assert_eq!(parsed.ast.children[0].node_properties, vec!["name"]);
    }

    #[test]
    fn test_tree_shape_is_independent_of_record_count() {
        let one = parse(json!([{ "title": "a" }])).unwrap();
        let many = parse(json!([{ "title": "a" }, { "title": "b" }, { "title": "c" }])).unwrap();

        assert_eq!(one.ast.node_properties, many.ast.node_properties);
        assert_eq!(one.ast.children.len(), many.ast.children.len());
        assert_eq!(many.records.len(), 3);
    }

    #[test]
    fn test_unknown_key() {
        let error = parse(json!([{ "rating": 5 }])).unwrap_err();
        assert_eq!(
            error,
            TranslateError::UnknownField {
                entity: "Movie".to_string(),
                field: "rating".to_string(),
            }
        );
    }

    #[test]
    fn test_connect_is_rejected() {
        let error = parse(json!([{ "actors": { "connect": [] } }])).unwrap_err();
        assert!(matches!(error, TranslateError::InvalidInput(_)));
    }
}
