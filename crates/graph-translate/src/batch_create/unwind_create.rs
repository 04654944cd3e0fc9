//! Unwind-create compiler.
//!
//! The root create runs once per unwound record:
//!
//! ```text
//! CALL {
//!     WITH create_var0
//!     CREATE (this1:Movie)
//!     SET this1.title = create_var0.title
//!     WITH this1, create_var0
//!     CALL {
//!         WITH this1, create_var0
//!         UNWIND create_var0.actors.create AS var2
//!         WITH var2.node AS var3, var2.edge AS var4, this1
//!         CREATE (this5:Actor)
//!         SET this5.name = var3.name
//!         MERGE (this5)-[this6:ACTED_IN]->(this1)
//!         SET this6.role = var4.role
//!         RETURN collect(NULL) AS var7
//!     }
//!     RETURN this1
//! }
//! ```
//!
//! Each nested level unwinds the `create` list of its parent input, so the
//! clause count follows the depth of the input tree.

use super::input_ast::{CreateAst, InputNode, NestedCreateAst};
use super::relationship_validation::relationship_validation;
use super::Visitor;
use crate::context::QueryAstContext;
use crate::error::{Result, TranslateError};
use crate::schema::{AttributeSource, RelationshipDirection, WriteOperation};
use crate::write::{generated_values, set_properties};
use cypher_builder::expr::collect;
use cypher_builder::{
    Call, Clause, Create, Expr, Merge, Node, Pattern, Relationship, Return, Unwind, Variable, With,
};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Variables a nested create reads from, filled in by its parent.
#[derive(Debug, Clone)]
pub struct ScopeDefinition {
    /// Input record the `create` list is read from
    pub unwind_var: Variable,
    /// Node the created nodes are attached to
    pub parent: Node,
    /// Compiled clause, once the nested create is visited
    pub clause: Option<Clause>,
}

/// Scopes keyed by input tree node id.
pub type UnwindCreateEnvironment = HashMap<usize, ScopeDefinition>;

pub struct UnwindCreateVisitor<'a> {
    ctx: &'a QueryAstContext,
    unwind_var: Variable,
    root: Option<Node>,
    clause: Option<Clause>,
    environment: UnwindCreateEnvironment,
}

impl<'a> UnwindCreateVisitor<'a> {
    /// Visitor reading root records from `unwind_var`
    pub fn new(ctx: &'a QueryAstContext, unwind_var: &Variable) -> Self {
        Self {
            ctx,
            unwind_var: unwind_var.clone(),
            root: None,
            clause: None,
            environment: UnwindCreateEnvironment::new(),
        }
    }

    /// Root node and compiled clause; both `None` if nothing was visited
    pub fn build(self) -> (Option<Node>, Option<Clause>) {
        (self.root, self.clause)
    }

    /// Register scopes for `children`, visit them and take their clauses
    fn visit_children(
        &mut self,
        children: &[NestedCreateAst],
        unwind_var: &Variable,
        parent: &Node,
    ) -> Result<Vec<Clause>> {
        let mut clauses = Vec::with_capacity(children.len());
        for child in children {
            self.environment.insert(
                child.id,
                ScopeDefinition {
                    unwind_var: unwind_var.clone(),
                    parent: parent.clone(),
                    clause: None,
                },
            );
            InputNode::NestedCreate(child).accept(self)?;
            clauses.extend(
                self.environment
                    .get_mut(&child.id)
                    .and_then(|scope| scope.clause.take()),
            );
        }
        Ok(clauses)
    }
}

impl Visitor for UnwindCreateVisitor<'_> {
    fn visit_create(&mut self, create: &CreateAst) -> Result<()> {
        let entity = &create.entity;
        let node = Node::new(entity.labels());
        debug!(entity = %entity.name, children = create.children.len(), "compiling batch create");

        let unwind_var = self.unwind_var.clone();
        let mut items = set_properties(
            entity,
            node.variable(),
            create.node_properties.iter().map(String::as_str),
            |key| unwind_var.property(key),
        )?;
        items.extend(generated_values(self.ctx, entity, node.variable(), WriteOperation::Create));

        let mut create_clause = Create::new(Pattern::new(&node));
        for (target, value) in items {
            create_clause = create_clause.set(target, value);
        }

        let nested = self.visit_children(&create.children, &unwind_var, &node)?;
        let validation = relationship_validation(self.ctx, entity, &node)?;

        let body = Clause::concat(
            std::iter::once(Some(Clause::from(create_clause)))
                .chain(nested.into_iter().map(Some))
                .chain([validation, Some(Return::new().column(&node).into())]),
        );

        self.clause = Some(Call::new(body).import_with([&unwind_var]).into());
        self.root = Some(node);
        Ok(())
    }

    fn visit_nested_create(&mut self, nested: &NestedCreateAst) -> Result<()> {
        let scope = self.environment.get(&nested.id).ok_or_else(|| {
            TranslateError::MissingParent(format!("no scope for input node {}", nested.id))
        })?;
        let parent = scope.parent.clone();
        let unwind_var = scope.unwind_var.clone();

        let relationship = nested.relationship.as_ref().ok_or_else(|| {
            TranslateError::MissingParent(format!(
                "'{}' has no relationship to its parent",
                nested.relationship_property_path
            ))
        })?;
        if relationship.rel_type.is_empty() {
            return Err(TranslateError::EmptyRelationshipType(relationship.name.clone()));
        }
        trace!(
            id = nested.id,
            relationship = %relationship.name,
            "compiling nested create"
        );

        let create_var = Variable::new();
        let unwind = Unwind::new(
            unwind_var
                .property(nested.relationship_property_path.clone())
                .property("create"),
            &create_var,
        );

        let node = Node::new(nested.entity.labels());
        let node_var = Variable::new();
        let edge_var = Variable::new();
        let with_create = With::new()
            .column((create_var.property("node"), &node_var))
            .column((create_var.property("edge"), &edge_var))
            .column(&parent);

        let mut node_items = set_properties(
            &nested.entity,
            node.variable(),
            nested.node_properties.iter().map(String::as_str),
            |key| node_var.property(key),
        )?;
        node_items.extend(generated_values(
            self.ctx,
            &nested.entity,
            node.variable(),
            WriteOperation::Create,
        ));
        let mut create_clause = Create::new(Pattern::new(&node));
        for (target, value) in node_items {
            create_clause = create_clause.set(target, value);
        }

        let mut rel = Relationship::new()
            .with_type(relationship.rel_type.clone())
            .between(&node, &parent);
        if relationship.direction == RelationshipDirection::Out {
            rel = rel.reverse();
        }
        let mut merge = Merge::relationship(&rel)?;
        if let Some(edge) = nested.edge.as_ref().filter(|_| !nested.edge_properties.is_empty()) {
            let mut edge_items = set_properties(
                edge,
                rel.variable(),
                nested.edge_properties.iter().map(String::as_str),
                |key| edge_var.property(key),
            )?;
            edge_items.extend(generated_values(
                self.ctx,
                edge,
                rel.variable(),
                WriteOperation::Create,
            ));
            for (target, value) in edge_items {
                merge = merge.set(target, value);
            }
        }

        let children = self.visit_children(&nested.children, &node_var, &node)?;
        let validation = relationship_validation(self.ctx, &nested.entity, &node)?;

        let body = Clause::concat(
            [
                Some(Clause::from(unwind)),
                Some(with_create.into()),
                Some(create_clause.into()),
                Some(merge.into()),
            ]
            .into_iter()
            .chain(children.into_iter().map(Some))
            .chain([
                validation,
                Some(
                    Return::new()
                        .column((collect(Expr::null()), &Variable::new()))
                        .into(),
                ),
            ]),
        );

        let clause = Clause::concat([
            Clause::from(With::new().column(&parent).column(&unwind_var)),
            Call::new(body)
                .import_with([parent.variable(), &unwind_var])
                .into(),
        ]);

        if let Some(scope) = self.environment.get_mut(&nested.id) {
            scope.clause = Some(clause);
        }
        Ok(())
    }
}
