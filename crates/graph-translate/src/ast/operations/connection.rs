use super::{child_selection, field_subqueries, filter_parts, hop, OperationTranspileResult};
use crate::ast::fields::Field;
use crate::ast::filters::{AuthorizationFilters, Filter};
use crate::ast::pagination::{Pagination, PaginationField};
use crate::ast::sort::{ConnectionSort, Sort};
use crate::context::QueryAstContext;
use crate::error::Result;
use crate::schema::{ConcreteEntity, RelationshipField};
use cypher_builder::expr::{collect, element_id, size};
use cypher_builder::{
    filter_selection, plan_selection, Call, Clause, Expr, MapExpr, Match, Order, Return, Unwind,
    Variable, With,
};
use tracing::debug;

/// Paginated edges of one relationship hop, with a total count.
///
/// ```text
/// MATCH (this)<-[this0:ACTED_IN]-(this1:Actor)
/// WITH { screenTime: this0.screenTime, node: { name: this1.name } } AS edge
/// WITH collect(edge) AS edges
/// WITH edges, size(edges) AS totalCount
/// CALL { WITH edges UNWIND edges AS edge ... RETURN collect(edge) AS var2 }
/// WITH var2 AS edges, totalCount
/// RETURN { edges: edges, totalCount: totalCount } AS var3
/// ```
///
/// `totalCount` counts every matching edge, before skip and limit.
#[derive(Debug, Clone)]
pub struct ConnectionReadOperation {
    pub relationship: RelationshipField,
    pub target: ConcreteEntity,
    pub directed: bool,
    pub node_fields: Vec<Field>,
    pub edge_fields: Vec<Field>,
    pub filters: Vec<Filter>,
    pub auth_filters: Vec<AuthorizationFilters>,
    pub pagination: Option<Pagination>,
    pub sort: Vec<ConnectionSort>,
}

impl ConnectionReadOperation {
    pub fn new(relationship: RelationshipField, target: ConcreteEntity) -> Self {
        Self {
            relationship,
            target,
            directed: true,
            node_fields: Vec::new(),
            edge_fields: Vec::new(),
            filters: Vec::new(),
            auth_filters: Vec::new(),
            pagination: None,
            sort: Vec::new(),
        }
    }

    pub fn undirected(mut self) -> Self {
        self.directed = false;
        self
    }

    pub fn with_node_fields(mut self, fields: Vec<Field>) -> Self {
        self.node_fields = fields;
        self
    }

    pub fn with_edge_fields(mut self, fields: Vec<Field>) -> Self {
        self.edge_fields = fields;
        self
    }

    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_auth_filters(mut self, auth_filters: AuthorizationFilters) -> Self {
        self.auth_filters.push(auth_filters);
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn add_sort(mut self, sort: ConnectionSort) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn transpile(
        &self,
        ctx: &QueryAstContext,
        return_variable: &Variable,
    ) -> Result<OperationTranspileResult> {
        let hop = hop(ctx, &self.relationship, &self.target, self.directed)?;
        let node = hop.node.variable();
        let rel = hop.relationship.variable();
        debug!(
            entity = %self.target.name,
            relationship = %self.relationship.name,
            "transpiling connection"
        );

        let mut children = self.node_fields.clone();
        children.extend(self.edge_fields.iter().cloned());
        let plan = plan_selection(
            Match::new(hop.pattern),
            child_selection(&hop.ctx, &children, &self.filters, &self.auth_filters)?,
        );
        let parts = filter_parts(&hop.ctx, &self.filters, &self.auth_filters)?;
        let selection = filter_selection(plan.selection, parts.subqueries, parts.predicate);

        let extra_order = if self.sort.is_empty() {
            None
        } else {
            let mut with = With::new().column(rel).column(node);
            for (expr, order) in self.sort_fields(node, rel) {
                with = with.order_by(expr, order);
            }
            Some(Clause::from(with))
        };

        let node_subqueries = field_subqueries(&hop.ctx, &self.node_fields)?;

        let mut node_map = MapExpr::new();
        for field in &self.node_fields {
            let (key, value) = field.projection_value(node);
            node_map.set(key, value);
        }
        if node_map.is_empty() {
            node_map.set("__resolveType", Expr::literal(self.target.name.clone()));
            node_map.set("__id", element_id(node));
        }

        let mut edge_map = MapExpr::new();
        for field in &self.edge_fields {
            let (key, value) = field.projection_value(rel);
            edge_map.set(key, value);
        }

        let edge = Variable::named("edge");
        let mut projected_sort = Vec::new();
        for sort in &self.sort {
            for s in &sort.node {
                let key = projected_sort_key(&self.node_fields, s, &mut node_map, node);
                projected_sort.push((edge.property("node").property(key), s.direction));
            }
            for s in &sort.edge {
                let key = projected_sort_key(&self.edge_fields, s, &mut edge_map, rel);
                projected_sort.push((edge.property(key), s.direction));
            }
        }
        edge_map.set("node", node_map);

        let edges = Variable::named("edges");
        let total_count = Variable::named("totalCount");

        let projection = Clause::concat([
            Clause::from(With::new().column((edge_map, &edge))),
            With::new().column((collect(&edge), &edges)).into(),
            With::new()
                .column(&edges)
                .column((size(&edges), &total_count))
                .into(),
        ]);

        let pagination = if self.pagination.is_some() || !self.sort.is_empty() {
            let field = self.pagination.unwrap_or_default().pagination_field();
            Some(pagination_subquery(
                &edge,
                &edges,
                &total_count,
                projected_sort,
                field,
            ))
        } else {
            None
        };

        let result = Return::new().column((
            MapExpr::new()
                .with("edges", &edges)
                .with("totalCount", &total_count),
            return_variable,
        ));

        let clause = Clause::concat(
            [
                plan.pre_selection,
                Some(selection),
                extra_order,
            ]
            .into_iter()
            .chain(node_subqueries.into_iter().map(Some))
            .chain([Some(projection), pagination, Some(result.into())]),
        );

        Ok(OperationTranspileResult {
            clauses: vec![clause],
            projection: return_variable.into(),
        })
    }

    /// Stored node and edge properties in the order the caller listed them
    fn sort_fields(&self, node: &Variable, edge: &Variable) -> Vec<(Expr, Order)> {
        self.sort
            .iter()
            .flat_map(|sort| {
                let nodes = sort.node.iter().map(|s| s.sort_field(node));
                let edges = sort.edge.iter().map(|s| s.sort_field(edge));
                nodes.chain(edges).collect::<Vec<_>>()
            })
            .collect()
    }
}

/// Key `sort` reads from a projected map.
///
/// A field projecting the sorted attribute supplies its alias. Otherwise the
/// attribute is added to the map under its own name.
fn projected_sort_key(
    fields: &[Field],
    sort: &Sort,
    map: &mut MapExpr,
    target: &Variable,
) -> String {
    let projected = fields.iter().find_map(|field| match field {
        Field::Attribute(f) if f.attribute.name == sort.attribute.name => Some(f.alias.clone()),
        _ => None,
    });
    projected.unwrap_or_else(|| {
        let key = sort.attribute.name.clone();
        if !map.contains_key(&key) {
            map.set(key.clone(), target.property(sort.attribute.db_name()));
        }
        key
    })
}

/// Sort, skip and limit over the collected edges
fn pagination_subquery(
    edge: &Variable,
    edges: &Variable,
    total_count: &Variable,
    sort: Vec<(Expr, Order)>,
    field: PaginationField,
) -> Clause {
    let mut with = With::new().column(edge);
    for (expr, order) in sort {
        with = with.order_by(expr, order);
    }
    if let Some(skip) = field.skip {
        with = with.skip(skip);
    }
    if let Some(limit) = field.limit {
        with = with.limit(limit);
    }

    let paginated = Variable::new();
    let body = Clause::concat([
        Clause::from(Unwind::new(edges, edge)),
        with.into(),
        Return::new().column((collect(edge), &paginated)).into(),
    ]);

    Clause::concat([
        Clause::from(Call::new(body).import_with([edges])),
        With::new()
            .column((&paginated, edges))
            .column(total_count)
            .into(),
    ])
}
