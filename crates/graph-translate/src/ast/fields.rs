//! Projected fields.
//!
//! A field contributes one entry to the projection of its owning operation.
//! Attribute fields read a property (formatting temporal and spatial
//! values), custom Cypher fields and nested operations compute their value
//! in a subquery first.

use super::operations::Operation;
use super::QueryAstNode;
use crate::context::QueryAstContext;
use crate::error::Result;
use crate::schema::{Attribute, AttributeType, CustomCypher};
use cypher_builder::expr::{collect, head, to_string};
use cypher_builder::{
    Call, Case, Clause, Expr, Function, ListComprehension, MapExpr, Predicate, ProjectionEntry,
    RawFragment, Return, Unwind, Variable, With,
};

#[derive(Debug, Clone)]
pub enum Field {
    Attribute(AttributeField),
    Cypher(CypherField),
    Operation(OperationField),
}

#[derive(Debug, Clone)]
pub struct AttributeField {
    pub alias: String,
    pub attribute: Attribute,
}

/// Attribute computed by a custom statement.
#[derive(Debug, Clone)]
pub struct CypherField {
    pub alias: String,
    pub custom: CustomCypher,
    pub list: bool,
    result: Variable,
}

/// Nested read, connection or aggregate under an alias.
#[derive(Debug, Clone)]
pub struct OperationField {
    pub alias: String,
    pub operation: Box<Operation>,
    result: Variable,
}

impl Field {
    /// Field for `attribute` under its own name
    pub fn attribute(attribute: &Attribute) -> Self {
        Self::aliased(attribute.name.clone(), attribute)
    }

    pub fn aliased(alias: impl Into<String>, attribute: &Attribute) -> Self {
        let alias = alias.into();
        match &attribute.custom_cypher {
            Some(custom) => Field::Cypher(CypherField {
                alias,
                custom: custom.clone(),
                list: attribute.list,
                result: Variable::new(),
            }),
            None => Field::Attribute(AttributeField {
                alias,
                attribute: attribute.clone(),
            }),
        }
    }

    pub fn operation(alias: impl Into<String>, operation: Operation) -> Self {
        Field::Operation(OperationField {
            alias: alias.into(),
            operation: Box::new(operation),
            result: Variable::new(),
        })
    }

    pub fn alias(&self) -> &str {
        match self {
            Field::Attribute(field) => &field.alias,
            Field::Cypher(field) => &field.alias,
            Field::Operation(field) => &field.alias,
        }
    }

    /// Entry in a map projection over `target`
    pub fn projection_entry(&self, target: &Variable) -> ProjectionEntry {
        match self {
            Field::Attribute(field) => field.projection_entry(target),
            Field::Cypher(field) => ProjectionEntry::Keyed(field.alias.clone(), (&field.result).into()),
            Field::Operation(field) => {
                ProjectionEntry::Keyed(field.alias.clone(), (&field.result).into())
            }
        }
    }

    /// Key and value in a literal map over `target`
    pub fn projection_value(&self, target: &Variable) -> (String, Expr) {
        match self.projection_entry(target) {
            ProjectionEntry::Shorthand(key) => {
                let value = target.property(key.clone());
                (key, value)
            }
            ProjectionEntry::Keyed(key, value) => (key, value),
        }
    }
}

impl AttributeField {
    fn projection_entry(&self, target: &Variable) -> ProjectionEntry {
        let db_name = self.attribute.db_name();
        let property = target.property(db_name);

        match self.attribute.attribute_type {
            AttributeType::Point | AttributeType::CartesianPoint => {
                ProjectionEntry::Keyed(self.alias.clone(), self.point_projection(property))
            }
            AttributeType::DateTime => {
                ProjectionEntry::Keyed(self.alias.clone(), self.datetime_projection(property))
            }
            _ if self.alias == db_name => ProjectionEntry::Shorthand(self.alias.clone()),
            _ => ProjectionEntry::Keyed(self.alias.clone(), property),
        }
    }

    /// `{ point: p, crs: p.crs }`, null-safe for single values
    fn point_projection(&self, property: Expr) -> Expr {
        let as_map = |p: Expr| {
            MapExpr::new()
                .with("point", p.clone())
                .with("crs", p.property("crs"))
        };
        if self.attribute.list {
            let item = Variable::new();
            ListComprehension::new(&item, property)
                .map(as_map((&item).into()))
                .into()
        } else {
            Case::new()
                .when(Predicate::is_not_null(property.clone()), as_map(property))
                .otherwise(Expr::null())
                .into()
        }
    }

    fn datetime_projection(&self, property: Expr) -> Expr {
        if self.attribute.list {
            let item = Variable::new();
            ListComprehension::new(&item, property)
                .map(format_datetime((&item).into()))
                .into()
        } else {
            format_datetime(property).into()
        }
    }
}

fn format_datetime(value: Expr) -> Function {
    Function::new(
        "apoc.date.convertFormat",
        [
            to_string(value).into(),
            Expr::literal("iso_zoned_date_time"),
            Expr::literal("iso_offset_date_time"),
        ],
    )
}

impl CypherField {
    /// ```text
    /// CALL {
    ///     WITH this
    ///     CALL {
    ///         WITH this
    ///         WITH this AS this
    ///         <statement>
    ///     }
    ///     UNWIND <column> AS var0
    ///     RETURN head(collect(var0)) AS var1
    /// }
    /// ```
    fn subquery(&self, ctx: &QueryAstContext) -> Result<Clause> {
        let target = ctx.target()?.variable();
        let this = Variable::named("this");
        let column = Variable::named(self.custom.column_name.clone());
        let item = Variable::new();

        let statement = Clause::concat([
            Clause::from(With::new().column((target, &this))),
            Clause::Raw(RawFragment::text(self.custom.statement.clone())),
        ]);
        let collected = if self.list {
            Expr::from(collect(&item))
        } else {
            head(collect(&item)).into()
        };

        let body = Clause::concat([
            Clause::from(Call::new(statement).import_with([target])),
            Unwind::new(&column, &item).into(),
            Return::new().column((collected, &self.result)).into(),
        ]);
        Ok(Call::new(body).import_with([target]).into())
    }
}

impl QueryAstNode for Field {
    fn subqueries(&self, ctx: &QueryAstContext) -> Result<Vec<Clause>> {
        match self {
            Field::Attribute(_) => Ok(Vec::new()),
            Field::Cypher(field) => Ok(vec![field.subquery(ctx)?]),
            Field::Operation(field) => {
                let target = ctx.target()?.variable();
                let transpiled = field.operation.transpile(ctx, &field.result)?;
                let body = Clause::concat(transpiled.clauses);
                Ok(vec![Call::new(body).import_with([target]).into()])
            }
        }
    }
}
