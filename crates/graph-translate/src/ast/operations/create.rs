use super::{field_subqueries, map_projection, validate_after_write, OperationTranspileResult};
use crate::ast::fields::Field;
use crate::ast::filters::AuthorizationFilters;
use crate::batch_create::{parse_create_input, InputNode, UnwindCreateVisitor};
use crate::context::QueryAstContext;
use crate::error::{Result, TranslateError};
use crate::schema::ConcreteEntity;
use cypher_builder::expr::collect;
use cypher_builder::{Clause, Param, Return, Unwind, Variable};
use serde_json::Value;
use tracing::debug;

/// Create every input record in one batch.
///
/// ```text
/// UNWIND $create_param0 AS create_var1
/// CALL { ... RETURN this2 }
/// RETURN collect(this2 { .title }) AS data
/// ```
#[derive(Debug, Clone)]
pub struct CreateOperation {
    pub target: ConcreteEntity,
    pub records: Vec<Value>,
    pub fields: Vec<Field>,
    /// Rules checked against each created node
    pub validate_after: Vec<AuthorizationFilters>,
}

impl CreateOperation {
    pub fn new(target: ConcreteEntity, records: Vec<Value>) -> Self {
        Self {
            target,
            records,
            fields: Vec::new(),
            validate_after: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_validate_after(mut self, auth_filters: AuthorizationFilters) -> Self {
        self.validate_after.push(auth_filters);
        self
    }

    pub fn transpile(
        &self,
        ctx: &QueryAstContext,
        return_variable: &Variable,
    ) -> Result<OperationTranspileResult> {
        let config = ctx.config();
        let parsed = parse_create_input(ctx.schema(), &self.target, &self.records)?;
        debug!(
            entity = %self.target.name,
            records = parsed.records.len(),
            "transpiling create"
        );

        let input = Param::with_hint(Value::Array(parsed.records), config.unwind_param_prefix.clone());
        let unwind_var = Variable::with_hint(config.unwind_variable_prefix.clone());

        let mut visitor = UnwindCreateVisitor::new(ctx, &unwind_var);
        InputNode::Create(&parsed.ast).accept(&mut visitor)?;
        let (root, create) = visitor.build();
        let (root, create) = root.zip(create).ok_or(TranslateError::MissingContext("created root node"))?;

        let root_ctx = ctx.with_target(&root);
        let mut clauses = vec![Clause::from(Unwind::new(input, &unwind_var)), create];
        clauses.extend(validate_after_write(&root_ctx, &root, &self.validate_after)?);
        clauses.extend(field_subqueries(&root_ctx, &self.fields)?);

        let projection = map_projection(&self.fields, root.variable());
        clauses.push(
            Return::new()
                .column((collect(projection), return_variable))
                .into(),
        );

        Ok(OperationTranspileResult {
            clauses,
            projection: return_variable.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::filters::{AuthorizationMode, FilterOperator, PropertyFilter};
    use crate::config::TranslateConfig;
    use crate::schema::{Attribute, AttributeType, Schema, WriteOperation};
    use cypher_builder::{Environment, ToCypher};
    use insta::assert_snapshot;
    use serde_json::json;
    use std::sync::Arc;

    fn user() -> ConcreteEntity {
        ConcreteEntity::new("User")
            .with_attribute(Attribute::new("id", AttributeType::Id))
            .with_attribute(
                Attribute::new("createdAt", AttributeType::DateTime)
                    .timestamp(&[WriteOperation::Create]),
            )
    }

    fn render(op: &CreateOperation) -> (String, Environment) {
        let ctx = QueryAstContext::new(
            Arc::new(Schema::new().with_entity(user())),
            TranslateConfig::default(),
        );
        let transpiled = op.transpile(&ctx, &Variable::named("data")).unwrap();
        let mut env = Environment::default();
        let cypher = Clause::concat(transpiled.clauses).to_cypher(&mut env).unwrap();
        (cypher, env)
    }

    #[test]
    fn test_create_with_bind_validation() {
        let entity = user();
        let id = entity.attributes[0].clone();
        let op = CreateOperation::new(entity, vec![json!({ "id": "u1" }), json!({ "id": "u2" })])
            .with_fields(vec![Field::attribute(&id)])
            .with_validate_after(AuthorizationFilters::new(
                AuthorizationMode::Validate,
                vec![PropertyFilter::new(id.clone(), FilterOperator::Eq, json!("u1")).into()],
            ));

        let (cypher, env) = render(&op);
        assert_snapshot!(cypher, @r#"
        UNWIND $create_param0 AS create_var0
        CALL {
            WITH create_var0
            CREATE (this1:User)
            SET this1.id = create_var0.id, this1.createdAt = datetime()
            RETURN this1
        }
        WITH this1
        CALL apoc.util.validate(NOT (this1.id = $param1), "@neo4j/graphql/FORBIDDEN", [0])
        RETURN collect(this1 { .id }) AS data
        "#);
        assert_eq!(
            env.params()["create_param0"],
            json!([{ "id": "u1" }, { "id": "u2" }])
        );
    }
}
