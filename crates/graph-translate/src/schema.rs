//! Schema metadata consumed by translation.
//!
//! The surrounding system parses and validates type definitions; this
//! module only describes the result: entities with their labels, attributes
//! and relationship fields. Everything is `Deserialize` so the metadata can
//! be handed over as JSON.

use crate::error::{Result, TranslateError};
use cypher_builder::Direction;
use serde::{Deserialize, Serialize};

/// Scalar kind of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeType {
    #[serde(rename = "ID")]
    Id,
    String,
    Int,
    Float,
    BigInt,
    Boolean,
    DateTime,
    Date,
    Time,
    LocalTime,
    LocalDateTime,
    Duration,
    Point,
    CartesianPoint,
}

impl AttributeType {
    pub fn is_spatial(&self) -> bool {
        matches!(self, AttributeType::Point | AttributeType::CartesianPoint)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AttributeType::Int | AttributeType::Float | AttributeType::BigInt
        )
    }
}

/// Write operations that can stamp or populate an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WriteOperation {
    Create,
    Update,
}

/// Attribute whose value is computed by a caller-side callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulatedBy {
    pub callback: String,
    #[serde(default = "all_write_operations")]
    pub operations: Vec<WriteOperation>,
}

fn all_write_operations() -> Vec<WriteOperation> {
    vec![WriteOperation::Create, WriteOperation::Update]
}

/// Attribute computed by a custom Cypher statement.
///
/// The statement sees the owning element as `this` and must return its value
/// under `column_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCypher {
    pub statement: String,
    pub column_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    /// Stored property name when it differs from `name`
    #[serde(default)]
    pub db_name: Option<String>,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub autogenerate: bool,
    #[serde(default)]
    pub timestamps: Vec<WriteOperation>,
    #[serde(default)]
    pub populated_by: Option<PopulatedBy>,
    #[serde(default)]
    pub custom_cypher: Option<CustomCypher>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            db_name: None,
            attribute_type,
            list: false,
            autogenerate: false,
            timestamps: Vec::new(),
            populated_by: None,
            custom_cypher: None,
        }
    }

    pub fn with_db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }

    pub fn list(mut self) -> Self {
        self.list = true;
        self
    }

    pub fn autogenerate(mut self) -> Self {
        self.autogenerate = true;
        self
    }

    pub fn timestamp(mut self, operations: &[WriteOperation]) -> Self {
        self.timestamps = operations.to_vec();
        self
    }

    pub fn populated_by(mut self, callback: impl Into<String>, operations: &[WriteOperation]) -> Self {
        self.populated_by = Some(PopulatedBy {
            callback: callback.into(),
            operations: operations.to_vec(),
        });
        self
    }

    pub fn custom_cypher(mut self, statement: impl Into<String>, column_name: impl Into<String>) -> Self {
        self.custom_cypher = Some(CustomCypher {
            statement: statement.into(),
            column_name: column_name.into(),
        });
        self
    }

    /// Property name in the database
    pub fn db_name(&self) -> &str {
        self.db_name.as_deref().unwrap_or(&self.name)
    }

    /// Whether the attribute is stamped with the current time on `operation`
    pub fn is_timestamped_on(&self, operation: WriteOperation) -> bool {
        matches!(
            self.attribute_type,
            AttributeType::DateTime | AttributeType::Time
        ) && self.timestamps.contains(&operation)
    }

    /// Callback name if the attribute is populated on `operation`
    pub fn callback_on(&self, operation: WriteOperation) -> Option<&str> {
        self.populated_by
            .as_ref()
            .filter(|p| p.operations.contains(&operation))
            .map(|p| p.callback.as_str())
    }
}

/// Direction of a relationship as declared on the schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelationshipDirection {
    In,
    Out,
}

/// How many related elements a relationship field admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    #[default]
    List,
    /// Exactly one
    Required,
    /// At most one
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipField {
    pub name: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub direction: RelationshipDirection,
    /// Name of the related entity
    pub target: String,
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Name of the edge properties definition, if the relationship has one
    #[serde(default)]
    pub properties: Option<String>,
}

impl RelationshipField {
    pub fn new(
        name: impl Into<String>,
        rel_type: impl Into<String>,
        direction: RelationshipDirection,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            rel_type: rel_type.into(),
            direction,
            target: target.into(),
            cardinality: Cardinality::List,
            properties: None,
        }
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn with_properties(mut self, properties: impl Into<String>) -> Self {
        self.properties = Some(properties.into());
        self
    }

    /// Pattern direction reading from the owning entity to the target
    pub fn cypher_direction(&self, directed: bool) -> Direction {
        if !directed {
            return Direction::Undirected;
        }
        match self.direction {
            RelationshipDirection::Out => Direction::Outgoing,
            RelationshipDirection::In => Direction::Incoming,
        }
    }

    pub fn is_list(&self) -> bool {
        self.cardinality == Cardinality::List
    }
}

/// Anything that owns attributes: entities and edge property definitions.
pub trait AttributeSource {
    fn source_name(&self) -> &str;

    fn attributes(&self) -> &[Attribute];

    fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes().iter().find(|a| a.name == name)
    }

    /// Look up an attribute, failing with [`TranslateError::UnknownField`]
    fn require_attribute(&self, name: &str) -> Result<&Attribute> {
        self.attribute(name)
            .ok_or_else(|| TranslateError::UnknownField {
                entity: self.source_name().to_string(),
                field: name.to_string(),
            })
    }
}

/// A node type with labels, attributes and relationship fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcreteEntity {
    pub name: String,
    /// Labels; the entity name when empty
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub relationships: Vec<RelationshipField>,
}

impl ConcreteEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Vec::new(),
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_relationship(mut self, relationship: RelationshipField) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn labels(&self) -> Vec<String> {
        if self.labels.is_empty() {
            vec![self.name.clone()]
        } else {
            self.labels.clone()
        }
    }

    pub fn relationship(&self, name: &str) -> Option<&RelationshipField> {
        self.relationships.iter().find(|r| r.name == name)
    }
}

impl AttributeSource for ConcreteEntity {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

/// Attributes stored on a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipProperties {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl RelationshipProperties {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

impl AttributeSource for RelationshipProperties {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

/// All entities and edge property definitions known to translation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub entities: Vec<ConcreteEntity>,
    #[serde(default)]
    pub relationship_properties: Vec<RelationshipProperties>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: ConcreteEntity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_relationship_properties(mut self, properties: RelationshipProperties) -> Self {
        self.relationship_properties.push(properties);
        self
    }

    pub fn entity(&self, name: &str) -> Result<&ConcreteEntity> {
        self.entities
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| TranslateError::UnknownEntity(name.to_string()))
    }

    /// Edge properties of `relationship`, if it declares any
    pub fn edge_properties(
        &self,
        relationship: &RelationshipField,
    ) -> Result<Option<&RelationshipProperties>> {
        match &relationship.properties {
            Some(name) => self
                .relationship_properties
                .iter()
                .find(|p| &p.name == name)
                .map(Some)
                .ok_or_else(|| TranslateError::UnknownEntity(name.clone())),
            None => Ok(None),
        }
    }

    /// Parse schema metadata from JSON
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| TranslateError::Configuration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_from_json() {
        let schema = Schema::from_json(json!({
            "entities": [{
                "name": "Movie",
                "attributes": [
                    { "name": "title", "type": "String" },
                    { "name": "id", "type": "ID", "autogenerate": true },
                    { "name": "createdAt", "type": "DateTime", "timestamps": ["CREATE"] }
                ],
                "relationships": [
                    { "name": "actors", "type": "ACTED_IN", "direction": "IN",
                      "target": "Actor", "properties": "ActedIn" }
                ]
            }],
            "relationship_properties": [
                { "name": "ActedIn", "attributes": [{ "name": "screenTime", "type": "Int" }] }
            ]
        }))
        .unwrap();

        let movie = schema.entity("Movie").unwrap();
        assert_eq!(movie.labels(), vec!["Movie".to_string()]);
        assert!(movie.require_attribute("id").unwrap().autogenerate);
        assert!(movie
            .require_attribute("createdAt")
            .unwrap()
            .is_timestamped_on(WriteOperation::Create));

        let actors = movie.relationship("actors").unwrap();
        assert_eq!(actors.cardinality, Cardinality::List);
        let edge = schema.edge_properties(actors).unwrap().unwrap();
        assert!(edge.attribute("screenTime").is_some());
    }

    #[test]
    fn test_unknown_lookups() {
        let schema = Schema::new().with_entity(ConcreteEntity::new("Movie"));

        assert!(matches!(
            schema.entity("Actor"),
            Err(TranslateError::UnknownEntity(_))
        ));
        assert!(matches!(
            schema.entity("Movie").unwrap().require_attribute("title"),
            Err(TranslateError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_cypher_direction() {
        let rel = RelationshipField::new("actors", "ACTED_IN", RelationshipDirection::In, "Actor");

        assert_eq!(rel.cypher_direction(true), Direction::Incoming);
        assert_eq!(rel.cypher_direction(false), Direction::Undirected);
    }

    #[test]
    fn test_db_name_falls_back_to_name() {
        let plain = Attribute::new("title", AttributeType::String);
        let mapped = Attribute::new("title", AttributeType::String).with_db_name("movieTitle");

        assert_eq!(plain.db_name(), "title");
        assert_eq!(mapped.db_name(), "movieTitle");
    }
}
