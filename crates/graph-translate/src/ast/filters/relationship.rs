use super::{filter_predicates, filter_subqueries, Filter};
use crate::ast::QueryAstNode;
use crate::context::QueryAstContext;
use crate::error::Result;
use crate::schema::{ConcreteEntity, RelationshipField};
use cypher_builder::{Clause, Match, Node, Pattern, Predicate, Relationship};

/// Filter on the node across a single (non-list) relationship.
///
/// The related node is bound by an `OPTIONAL MATCH` placed ahead of the
/// owning selection, and the child filters read from it:
///
/// ```text
/// MATCH (this:Movie)
/// OPTIONAL MATCH (this)<-[:DIRECTED]-(this0:Person)
/// WITH *
/// WHERE this0.name = $param0
/// ```
///
/// A `null` input matches elements without a related node.
#[derive(Debug, Clone)]
pub struct RelationshipFilter {
    pub relationship: RelationshipField,
    /// `None` for a `null` input
    pub children: Option<Vec<Filter>>,
    node: Node,
    edge: Relationship,
}

impl RelationshipFilter {
    pub fn new(
        relationship: RelationshipField,
        target: &ConcreteEntity,
        children: Option<Vec<Filter>>,
    ) -> Self {
        let edge = Relationship::new().with_type(relationship.rel_type.clone());
        Self {
            relationship,
            children,
            node: Node::new(target.labels()),
            edge,
        }
    }

    pub fn predicate(&self, ctx: &QueryAstContext) -> Result<Predicate> {
        match &self.children {
            None => Ok(Predicate::is_null(&self.node)),
            Some(children) => {
                let predicates = filter_predicates(children, &self.nested(ctx))?;
                Ok(Predicate::and(predicates).unwrap_or_else(Predicate::truthy))
            }
        }
    }

    fn nested(&self, ctx: &QueryAstContext) -> QueryAstContext {
        ctx.push(&self.node, &self.edge)
    }

    fn children(&self) -> &[Filter] {
        self.children.as_deref().unwrap_or(&[])
    }
}

impl QueryAstNode for RelationshipFilter {
    fn selection(&self, ctx: &QueryAstContext) -> Result<Vec<Clause>> {
        let pattern = Pattern::new(ctx.target()?)
            .without_labels()
            .related(&self.edge, self.relationship.cypher_direction(true), &self.node)
            .without_relationship_variable();

        let nested = self.nested(ctx);
        let mut clauses = vec![Clause::from(Match::new(pattern).optional())];
        for child in self.children() {
            clauses.extend(child.selection(&nested)?);
        }
        Ok(clauses)
    }

    fn subqueries(&self, ctx: &QueryAstContext) -> Result<Vec<Clause>> {
        filter_subqueries(self.children(), &self.nested(ctx))
    }
}
