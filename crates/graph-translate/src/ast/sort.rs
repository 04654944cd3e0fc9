//! Sort keys.

use crate::schema::Attribute;
use cypher_builder::{Expr, Order};
use tracing::warn;

/// Order by one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub attribute: Attribute,
    pub direction: Order,
}

impl Sort {
    pub fn new(attribute: Attribute, direction: Order) -> Self {
        Self {
            attribute,
            direction,
        }
    }

    /// Sort key over the stored property of `target`
    pub fn sort_field(&self, target: impl Into<Expr>) -> (Expr, Order) {
        (target.into().property(self.attribute.db_name()), self.direction)
    }
}

/// Sort over a connection, by node or edge attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionSort {
    pub node: Vec<Sort>,
    pub edge: Vec<Sort>,
}

impl ConnectionSort {
    /// Build from one `{ node?: [...], edge?: [...] }` entry of a sort list
    pub fn new(node: Vec<Sort>, edge: Vec<Sort>) -> Self {
        if node.is_empty() && edge.is_empty() {
            warn!("connection sort entry has neither node nor edge keys");
        }
        Self { node, edge }
    }

    pub fn is_empty(&self) -> bool {
        self.node.is_empty() && self.edge.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeType;
    use cypher_builder::{Environment, ToCypher, Variable};
    use tracing_test::traced_test;

    #[test]
    fn test_sort_field_uses_db_name() {
        let sort = Sort::new(
            Attribute::new("title", AttributeType::String).with_db_name("movieTitle"),
            Order::Desc,
        );
        let this = Variable::named("this");
        let mut env = Environment::default();

        let (stored, order) = sort.sort_field(&this);
        assert_eq!(stored.to_cypher(&mut env).unwrap(), "this.movieTitle");
        assert_eq!(order, Order::Desc);
    }

    #[traced_test]
    #[test]
    fn test_empty_connection_sort_warns() {
        let sort = ConnectionSort::new(Vec::new(), Vec::new());
        assert!(sort.is_empty());
        assert!(logs_contain("neither node nor edge"));
    }
}
