//! `MATCH` and `UNWIND`.

use crate::clause::render_set_items;
use crate::environment::Environment;
use crate::error::RenderResult;
use crate::expr::Expr;
use crate::pattern::Pattern;
use crate::predicate::Predicate;
use crate::render::ToCypher;
use crate::variable::Variable;

/// `[OPTIONAL] MATCH pattern [WHERE predicate] [SET ...]`
#[derive(Debug, Clone)]
pub struct Match {
    pattern: Pattern,
    optional: bool,
    predicate: Option<Predicate>,
    set: Vec<(Expr, Expr)>,
}

impl Match {
    pub fn new(pattern: Pattern) -> Self {
        Self {
            pattern,
            optional: false,
            predicate: None,
            set: Vec::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Conjoin `predicate` with any existing `WHERE`
    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.predicate = match self.predicate.take() {
            Some(existing) => Predicate::and([existing, predicate]),
            None => Some(predicate),
        };
        self
    }

    pub fn set(mut self, target: impl Into<Expr>, value: impl Into<Expr>) -> Self {
        self.set.push((target.into(), value.into()));
        self
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }
}

impl ToCypher for Match {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        let keyword = if self.optional { "OPTIONAL MATCH" } else { "MATCH" };
        let mut out = format!("{} {}", keyword, self.pattern.to_cypher(env)?);
        if let Some(predicate) = &self.predicate {
            out.push_str(&format!("\nWHERE {}", predicate.to_cypher(env)?));
        }
        if let Some(set) = render_set_items(&self.set, env)? {
            out.push('\n');
            out.push_str(&set);
        }
        Ok(out)
    }
}

/// `UNWIND expr AS variable`
#[derive(Debug, Clone)]
pub struct Unwind {
    expr: Expr,
    variable: Variable,
}

impl Unwind {
    pub fn new(expr: impl Into<Expr>, variable: &Variable) -> Self {
        Self {
            expr: expr.into(),
            variable: variable.clone(),
        }
    }
}

impl ToCypher for Unwind {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        let expr = self.expr.to_cypher(env)?;
        let variable = env.declare(&self.variable)?;
        Ok(format!("UNWIND {expr} AS {variable}"))
    }
}
