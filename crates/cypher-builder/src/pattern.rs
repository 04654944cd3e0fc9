//! Graph patterns: `(a:Label)-[r:TYPE]->(b)`.

use crate::environment::Environment;
use crate::error::{BuildError, BuildResult, RenderResult};
use crate::escape::escape_identifier;
use crate::render::ToCypher;
use crate::variable::{Direction, Node, Relationship};

#[derive(Debug, Clone)]
struct PatternNode {
    node: Node,
    labels: bool,
    variable: bool,
}

impl PatternNode {
    fn new(node: &Node) -> Self {
        Self {
            node: node.clone(),
            labels: true,
            variable: true,
        }
    }
}

#[derive(Debug, Clone)]
struct PatternRelationship {
    relationship: Relationship,
    direction: Direction,
    variable: bool,
}

/// An ordered chain of nodes connected by relationships.
#[derive(Debug, Clone)]
pub struct Pattern {
    start: PatternNode,
    hops: Vec<(PatternRelationship, PatternNode)>,
}

impl Pattern {
    /// Start a pattern at `node`
    pub fn new(node: &Node) -> Self {
        Self {
            start: PatternNode::new(node),
            hops: Vec::new(),
        }
    }

    /// Build `(source)-[r]->(target)` from a relationship's own endpoints.
    ///
    /// Endpoints render without labels since they are bound elsewhere.
    pub fn from_relationship(relationship: &Relationship) -> BuildResult<Self> {
        let (source, target) = match (relationship.source(), relationship.target()) {
            (Some(source), Some(target)) => (source, target),
            _ => {
                return Err(BuildError::InvalidClause(
                    "relationship pattern requires both endpoints".to_string(),
                ))
            }
        };
        Ok(Pattern::new(source)
            .without_labels()
            .related(relationship, relationship.direction(), target)
            .without_labels())
    }

    /// Append a hop to `to` through `relationship`
    pub fn related(mut self, relationship: &Relationship, direction: Direction, to: &Node) -> Self {
        self.hops.push((
            PatternRelationship {
                relationship: relationship.clone(),
                direction,
                variable: true,
            },
            PatternNode::new(to),
        ));
        self
    }

    /// Omit the labels of the most recently added node
    pub fn without_labels(mut self) -> Self {
        self.last_node().labels = false;
        self
    }

    /// Omit the variable of the most recently added node: `(:Label)`
    pub fn without_variable(mut self) -> Self {
        self.last_node().variable = false;
        self
    }

    /// Omit the variable of the most recently added relationship: `-[:TYPE]->`
    pub fn without_relationship_variable(mut self) -> Self {
        if let Some((rel, _)) = self.hops.last_mut() {
            rel.variable = false;
        }
        self
    }

    fn last_node(&mut self) -> &mut PatternNode {
        match self.hops.last_mut() {
            Some((_, node)) => node,
            None => &mut self.start,
        }
    }
}

impl ToCypher for Pattern {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        let mut out = render_node(&self.start, env)?;
        for (rel, node) in &self.hops {
            out.push_str(&render_relationship(rel, env)?);
            out.push_str(&render_node(node, env)?);
        }
        Ok(out)
    }
}

fn render_node(element: &PatternNode, env: &mut Environment) -> RenderResult<String> {
    let mut out = String::from("(");
    if element.variable {
        out.push_str(&env.declare(element.node.variable())?);
    }
    if element.labels {
        for label in element.node.labels() {
            out.push(':');
            out.push_str(&escape_identifier(label));
        }
    }
    out.push(')');
    Ok(out)
}

fn render_relationship(
    element: &PatternRelationship,
    env: &mut Environment,
) -> RenderResult<String> {
    let mut inner = String::new();
    if element.variable {
        inner.push_str(&env.declare(element.relationship.variable())?);
    }
    if let Some(rel_type) = element.relationship.rel_type() {
        inner.push(':');
        inner.push_str(&escape_identifier(rel_type));
    }
    Ok(match element.direction {
        Direction::Outgoing => format!("-[{inner}]->"),
        Direction::Incoming => format!("<-[{inner}]-"),
        Direction::Undirected => format!("-[{inner}]-"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(pattern: &Pattern) -> String {
        let mut env = Environment::default();
        pattern.to_cypher(&mut env).unwrap()
    }

    #[test]
    fn test_single_node() {
        let node = Node::new(["Movie"]);
        assert_eq!(render(&Pattern::new(&node)), "(this0:Movie)");
    }

    #[test]
    fn test_one_hop_without_source_labels() {
        let this = Node::named("this", ["Movie"]);
        let actor = Node::new(["Actor"]);
        let rel = Relationship::new().with_type("ACTED_IN");

        let pattern = Pattern::new(&this)
            .without_labels()
            .related(&rel, Direction::Incoming, &actor);

        assert_eq!(render(&pattern), "(this)<-[this0:ACTED_IN]-(this1:Actor)");
    }

    #[test]
    fn test_anonymous_target() {
        let this = Node::named("this", ["Post"]);
        let user = Node::new(["User"]);
        let rel = Relationship::new().with_type("HAS_POST");

        let pattern = Pattern::new(&this)
            .without_labels()
            .related(&rel, Direction::Incoming, &user)
            .without_variable();

        assert_eq!(render(&pattern), "(this)<-[this0:HAS_POST]-(:User)");
    }

    #[test]
    fn test_from_relationship_requires_endpoints() {
        let rel = Relationship::new().with_type("KNOWS");
        assert!(matches!(
            Pattern::from_relationship(&rel),
            Err(BuildError::InvalidClause(_))
        ));
    }

    #[test]
    fn test_from_reversed_relationship() {
        let child = Node::named("child", ["Post"]);
        let parent = Node::named("parent", ["User"]);
        let rel = Relationship::new()
            .with_type("HAS_POST")
            .between(&child, &parent)
            .reverse();

        let pattern = Pattern::from_relationship(&rel).unwrap();
        assert_eq!(render(&pattern), "(child)<-[this0:HAS_POST]-(parent)");
    }
}
