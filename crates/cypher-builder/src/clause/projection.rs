//! `WITH` and `RETURN` projections.

use crate::environment::Environment;
use crate::error::RenderResult;
use crate::expr::Expr;
use crate::predicate::Predicate;
use crate::render::ToCypher;
use crate::variable::{Node, Variable};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// One projected column: `expr [AS alias]`.
#[derive(Debug, Clone)]
pub struct ProjectionColumn {
    pub expr: Expr,
    pub alias: Option<Variable>,
}

impl ProjectionColumn {
    pub fn new(expr: impl Into<Expr>) -> Self {
        Self {
            expr: expr.into(),
            alias: None,
        }
    }

    pub fn aliased(expr: impl Into<Expr>, alias: &Variable) -> Self {
        Self {
            expr: expr.into(),
            alias: Some(alias.clone()),
        }
    }

    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        let expr = self.expr.to_cypher(env)?;
        match &self.alias {
            Some(alias) => {
                if matches!(&self.expr, Expr::Variable(v) if v == alias) {
                    return Ok(expr);
                }
                let alias = env.declare(alias)?;
                if alias == expr {
                    Ok(expr)
                } else {
                    Ok(format!("{expr} AS {alias}"))
                }
            }
            None => Ok(expr),
        }
    }
}

impl From<&Variable> for ProjectionColumn {
    fn from(variable: &Variable) -> Self {
        ProjectionColumn::new(variable)
    }
}

impl From<Variable> for ProjectionColumn {
    fn from(variable: Variable) -> Self {
        ProjectionColumn::new(variable)
    }
}

impl From<&Node> for ProjectionColumn {
    fn from(node: &Node) -> Self {
        ProjectionColumn::new(node)
    }
}

impl<E: Into<Expr>> From<(E, Variable)> for ProjectionColumn {
    fn from((expr, alias): (E, Variable)) -> Self {
        ProjectionColumn::aliased(expr, &alias)
    }
}

impl<E: Into<Expr>> From<(E, &Variable)> for ProjectionColumn {
    fn from((expr, alias): (E, &Variable)) -> Self {
        ProjectionColumn::aliased(expr, alias)
    }
}

/// Body shared by `WITH` and `RETURN`.
#[derive(Debug, Clone, Default)]
struct Projection {
    star: bool,
    distinct: bool,
    columns: Vec<ProjectionColumn>,
    order_by: Vec<(Expr, Order)>,
    skip: Option<Expr>,
    limit: Option<Expr>,
}

impl Projection {
    fn render(&self, keyword: &str, env: &mut Environment) -> RenderResult<String> {
        let mut items = Vec::with_capacity(self.columns.len() + 1);
        if self.star {
            items.push("*".to_string());
        }
        for column in &self.columns {
            items.push(column.to_cypher(env)?);
        }

        let distinct = if self.distinct { "DISTINCT " } else { "" };
        let mut out = format!("{} {}{}", keyword, distinct, items.join(", "));

        if !self.order_by.is_empty() {
            let mut keys = Vec::with_capacity(self.order_by.len());
            for (expr, order) in &self.order_by {
                keys.push(format!("{} {}", expr.to_cypher(env)?, order.as_str()));
            }
            out.push_str(&format!("\nORDER BY {}", keys.join(", ")));
        }
        if let Some(skip) = &self.skip {
            out.push_str(&format!("\nSKIP {}", skip.to_cypher(env)?));
        }
        if let Some(limit) = &self.limit {
            out.push_str(&format!("\nLIMIT {}", limit.to_cypher(env)?));
        }
        Ok(out)
    }
}

macro_rules! projection_builders {
    () => {
        /// Add one column
        pub fn column(mut self, column: impl Into<ProjectionColumn>) -> Self {
            self.projection.columns.push(column.into());
            self
        }

        /// Add several columns
        pub fn columns<I, C>(mut self, columns: I) -> Self
        where
            I: IntoIterator<Item = C>,
            C: Into<ProjectionColumn>,
        {
            self.projection
                .columns
                .extend(columns.into_iter().map(Into::into));
            self
        }

        pub fn distinct(mut self) -> Self {
            self.projection.distinct = true;
            self
        }

        pub fn order_by(mut self, expr: impl Into<Expr>, order: Order) -> Self {
            self.projection.order_by.push((expr.into(), order));
            self
        }

        pub fn skip(mut self, skip: impl Into<Expr>) -> Self {
            self.projection.skip = Some(skip.into());
            self
        }

        pub fn limit(mut self, limit: impl Into<Expr>) -> Self {
            self.projection.limit = Some(limit.into());
            self
        }

        /// Whether the projection carries `*`
        pub fn is_star(&self) -> bool {
            self.projection.star
        }
    };
}

/// `WITH [DISTINCT] columns [ORDER BY] [SKIP] [LIMIT] [WHERE]`
#[derive(Debug, Clone, Default)]
pub struct With {
    projection: Projection,
    predicate: Option<Predicate>,
}

impl With {
    /// Empty projection; add columns before rendering
    pub fn new() -> Self {
        Self::default()
    }

    /// `WITH *`
    pub fn star() -> Self {
        let mut with = Self::default();
        with.projection.star = true;
        with
    }

    projection_builders!();

    /// Conjoin `predicate` with any existing `WHERE`
    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.predicate = match self.predicate.take() {
            Some(existing) => Predicate::and([existing, predicate]),
            None => Some(predicate),
        };
        self
    }
}

impl ToCypher for With {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        let mut out = self.projection.render("WITH", env)?;
        if let Some(predicate) = &self.predicate {
            out.push_str(&format!("\nWHERE {}", predicate.to_cypher(env)?));
        }
        Ok(out)
    }
}

/// `RETURN [DISTINCT] columns [ORDER BY] [SKIP] [LIMIT]`
#[derive(Debug, Clone, Default)]
pub struct Return {
    projection: Projection,
}

impl Return {
    pub fn new() -> Self {
        Self::default()
    }

    /// `RETURN *`
    pub fn star() -> Self {
        let mut ret = Self::default();
        ret.projection.star = true;
        ret
    }

    projection_builders!();
}

impl ToCypher for Return {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        self.projection.render("RETURN", env)
    }
}
