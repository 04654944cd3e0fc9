//! Property assignments shared by create and update.

use crate::context::QueryAstContext;
use crate::schema::{Attribute, AttributeSource, AttributeType, WriteOperation};
use cypher_builder::expr::{datetime, point, random_uuid, time};
use cypher_builder::{Expr, ListComprehension, Variable};

/// Value written for `attribute`, converting spatial input to points
pub fn set_value(attribute: &Attribute, value: Expr) -> Expr {
    if !attribute.attribute_type.is_spatial() {
        return value;
    }
    if attribute.list {
        let item = Variable::new();
        ListComprehension::new(&item, value).map(point(&item)).into()
    } else {
        point(value).into()
    }
}

/// `target.db_name = value` pairs for every input key
pub fn set_properties<'a, S, I, F>(
    source: &S,
    target: &Variable,
    keys: I,
    mut value_of: F,
) -> crate::error::Result<Vec<(Expr, Expr)>>
where
    S: AttributeSource + ?Sized,
    I: IntoIterator<Item = &'a str>,
    F: FnMut(&str) -> Expr,
{
    let mut items = Vec::new();
    for key in keys {
        let attribute = source.require_attribute(key)?;
        items.push((
            target.property(attribute.db_name()),
            set_value(attribute, value_of(key)),
        ));
    }
    Ok(items)
}

/// Assignments the schema generates on `operation`: timestamps, random ids
/// and callback placeholders
pub fn generated_values<S>(
    ctx: &QueryAstContext,
    source: &S,
    target: &Variable,
    operation: WriteOperation,
) -> Vec<(Expr, Expr)>
where
    S: AttributeSource + ?Sized,
{
    let attributes = source.attributes();
    let mut items = Vec::new();

    for attribute in attributes.iter().filter(|a| a.is_timestamped_on(operation)) {
        let now = match attribute.attribute_type {
            AttributeType::Time => time(),
            _ => datetime(),
        };
        items.push((target.property(attribute.db_name()), now.into()));
    }

    if operation == WriteOperation::Create {
        for attribute in attributes.iter().filter(|a| a.autogenerate) {
            items.push((target.property(attribute.db_name()), random_uuid().into()));
        }
    }

    for attribute in attributes {
        if let Some(callback) = attribute.callback_on(operation) {
            let placeholder = ctx.callback_placeholder(callback, &attribute.name, operation);
            items.push((target.property(attribute.db_name()), placeholder));
        }
    }

    items
}
