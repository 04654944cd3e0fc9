//! Cardinality checks for single relationships of created nodes.

use crate::ast::filters::validate_call;
use crate::context::QueryAstContext;
use crate::error::{Result, TranslateError};
use crate::schema::{Cardinality, ConcreteEntity};
use cypher_builder::expr::count;
use cypher_builder::{
    Call, Clause, Expr, Match, Node, Pattern, Predicate, Relationship, Return, Variable, With,
};
use tracing::trace;

/// `WITH node` followed by one check per non-list relationship of `entity`.
///
/// ```text
/// WITH this0
/// CALL {
///     WITH this0
///     MATCH (this0)<-[this1:DIRECTED]-(:Person)
///     WITH count(this1) AS var2
///     CALL apoc.util.validate(NOT (var2 = 1), "@neo4j/graphql/RELATIONSHIP-REQUIREDMovie.director required exactly once", [0])
///     RETURN var2 AS var3
/// }
/// ```
///
/// `None` when the entity has no single relationships or the checks are
/// turned off.
pub fn relationship_validation(
    ctx: &QueryAstContext,
    entity: &ConcreteEntity,
    node: &Node,
) -> Result<Option<Clause>> {
    let config = ctx.config();
    if !config.emit_relationship_validation {
        return Ok(None);
    }

    let mut checks = Vec::new();
    for field in entity.relationships.iter().filter(|r| !r.is_list()) {
        if field.rel_type.is_empty() {
            return Err(TranslateError::EmptyRelationshipType(field.name.clone()));
        }
        let target = ctx.schema().entity(&field.target)?;
        let other = Node::new(target.labels());
        let rel = Relationship::new().with_type(field.rel_type.clone());
        let total = Variable::new();

        let (predicate, requirement) = match field.cardinality {
            Cardinality::Required => (
                Predicate::eq(&total, Expr::literal(1)),
                "required exactly once",
            ),
            _ => (
                Predicate::lte(&total, Expr::literal(1)),
                "must not have more than one",
            ),
        };
        let message = format!(
            "{}{}.{} {}",
            config.relationship_required_prefix, entity.name, field.name, requirement
        );
        trace!(entity = %entity.name, field = %field.name, "relationship validation");

        let pattern = Pattern::new(node)
            .without_labels()
            .related(&rel, field.cypher_direction(true), &other)
            .without_variable();
        let body = Clause::concat([
            Clause::from(Match::new(pattern)),
            With::new().column((count(rel.variable()), &total)).into(),
            validate_call(predicate, &message),
            Return::new().column((&total, &Variable::new())).into(),
        ]);
        checks.push(Clause::from(Call::new(body).import_with([node.variable()])));
    }

    if checks.is_empty() {
        return Ok(None);
    }

    let mut clauses = vec![Clause::from(With::new().column(node))];
    clauses.extend(checks);
    Ok(Some(Clause::concat(clauses)))
}
