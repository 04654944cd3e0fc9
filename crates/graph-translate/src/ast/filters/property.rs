use crate::context::QueryAstContext;
use crate::error::Result;
use crate::schema::Attribute;
use cypher_builder::expr::point;
use cypher_builder::{Expr, ListComprehension, Param, Predicate, Variable};
use serde_json::Value;

/// Comparison selected by a where-input key suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Property value is one of the given values
    In,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
    /// List property contains the given value
    Includes,
}

impl FilterOperator {
    /// Operator for a where-input suffix such as `LT` or `STARTS_WITH`
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "LT" => FilterOperator::Lt,
            "LTE" => FilterOperator::Lte,
            "GT" => FilterOperator::Gt,
            "GTE" => FilterOperator::Gte,
            "IN" => FilterOperator::In,
            "CONTAINS" => FilterOperator::Contains,
            "STARTS_WITH" => FilterOperator::StartsWith,
            "ENDS_WITH" => FilterOperator::EndsWith,
            "MATCHES" => FilterOperator::Matches,
            "INCLUDES" => FilterOperator::Includes,
            _ => return None,
        })
    }
}

/// Which element of the context a property filter reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachedTo {
    #[default]
    Node,
    Relationship,
}

/// Compare one attribute against a parameter.
#[derive(Debug, Clone)]
pub struct PropertyFilter {
    pub attribute: Attribute,
    pub operator: FilterOperator,
    pub value: Value,
    pub negated: bool,
    pub attached_to: AttachedTo,
}

impl PropertyFilter {
    pub fn new(attribute: Attribute, operator: FilterOperator, value: Value) -> Self {
        Self {
            attribute,
            operator,
            value,
            negated: false,
            attached_to: AttachedTo::Node,
        }
    }

    pub fn negated(mut self) -> Self {
        self.negated = true;
        self
    }

    pub fn attached_to(mut self, attached_to: AttachedTo) -> Self {
        self.attached_to = attached_to;
        self
    }

    pub fn predicate(&self, ctx: &QueryAstContext) -> Result<Predicate> {
        let property = match self.attached_to {
            AttachedTo::Node => ctx.target()?.property(self.attribute.db_name()),
            AttachedTo::Relationship => ctx.relationship()?.property(self.attribute.db_name()),
        };

        if self.value.is_null() && self.operator == FilterOperator::Eq {
            return Ok(if self.negated {
                Predicate::is_not_null(property)
            } else {
                Predicate::is_null(property)
            });
        }

        let predicate = self.comparison(property);
        Ok(if self.negated {
            Predicate::not(predicate)
        } else {
            predicate
        })
    }

    fn comparison(&self, property: Expr) -> Predicate {
        let param = Param::new(self.value.clone());
        let spatial = self.attribute.attribute_type.is_spatial();

        match self.operator {
            FilterOperator::Eq => Predicate::eq(property, self.value_expr(param)),
            FilterOperator::Lt => Predicate::lt(property, self.value_expr(param)),
            FilterOperator::Lte => Predicate::lte(property, self.value_expr(param)),
            FilterOperator::Gt => Predicate::gt(property, self.value_expr(param)),
            FilterOperator::Gte => Predicate::gte(property, self.value_expr(param)),
            FilterOperator::In if spatial => {
                let item = Variable::new();
                let points = ListComprehension::new(&item, param).map(point(&item));
                Predicate::is_in(property, points)
            }
            FilterOperator::In => Predicate::is_in(property, param),
            FilterOperator::Includes if spatial => Predicate::is_in(point(param), property),
            FilterOperator::Includes => Predicate::is_in(param, property),
            FilterOperator::Contains => Predicate::contains(property, param),
            FilterOperator::StartsWith => Predicate::starts_with(property, param),
            FilterOperator::EndsWith => Predicate::ends_with(property, param),
            FilterOperator::Matches => Predicate::matches(property, param),
        }
    }

    /// Parameter as compared against the stored value
    fn value_expr(&self, param: Param) -> Expr {
        crate::write::set_value(&self.attribute, param.into())
    }
}
