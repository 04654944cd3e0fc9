//! Boolean predicates.

use crate::environment::Environment;
use crate::error::RenderResult;
use crate::expr::Expr;
use crate::raw::RawFragment;
use crate::render::ToCypher;
use crate::variable::Variable;

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::Lte => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Gte => ">=",
            ComparisonOp::In => "IN",
            ComparisonOp::Contains => "CONTAINS",
            ComparisonOp::StartsWith => "STARTS WITH",
            ComparisonOp::EndsWith => "ENDS WITH",
            ComparisonOp::Matches => "=~",
        }
    }
}

/// List quantifiers: `any(x IN list WHERE p)` and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Any,
    All,
    None,
    Single,
}

impl Quantifier {
    fn as_str(&self) -> &'static str {
        match self {
            Quantifier::Any => "any",
            Quantifier::All => "all",
            Quantifier::None => "none",
            Quantifier::Single => "single",
        }
    }
}

/// A boolean-valued expression tree.
#[derive(Debug, Clone)]
pub enum Predicate {
    Comparison {
        op: ComparisonOp,
        lhs: Expr,
        rhs: Expr,
    },
    IsNull(Expr),
    IsNotNull(Expr),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    Quantified {
        quantifier: Quantifier,
        variable: Variable,
        list: Expr,
        predicate: Box<Predicate>,
    },
    /// A boolean literal
    Literal(bool),
    /// Any expression used in boolean position
    Expr(Expr),
    Raw(RawFragment),
}

macro_rules! comparison {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $name(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
                Predicate::compare(ComparisonOp::$op, lhs, rhs)
            }
        )*
    };
}

impl Predicate {
    pub fn compare(op: ComparisonOp, lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Predicate::Comparison {
            op,
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    comparison! {
        eq => Eq,
        ne => Ne,
        lt => Lt,
        lte => Lte,
        gt => Gt,
        gte => Gte,
        is_in => In,
        contains => Contains,
        starts_with => StartsWith,
        ends_with => EndsWith,
        matches => Matches,
    }

    pub fn is_null(expr: impl Into<Expr>) -> Self {
        Predicate::IsNull(expr.into())
    }

    pub fn is_not_null(expr: impl Into<Expr>) -> Self {
        Predicate::IsNotNull(expr.into())
    }

    /// Vacuously true predicate
    pub fn truthy() -> Self {
        Predicate::Literal(true)
    }

    /// Conjunction of the given predicates.
    ///
    /// Returns `None` for an empty input and the predicate itself for a
    /// single one, so callers never emit `()` or redundant parentheses.
    pub fn and<I>(predicates: I) -> Option<Self>
    where
        I: IntoIterator<Item = Predicate>,
    {
        Self::combine(predicates, Predicate::And)
    }

    /// Disjunction of the given predicates (see [`Predicate::and`])
    pub fn or<I>(predicates: I) -> Option<Self>
    where
        I: IntoIterator<Item = Predicate>,
    {
        Self::combine(predicates, Predicate::Or)
    }

    pub fn not(predicate: Predicate) -> Self {
        Predicate::Not(Box::new(predicate))
    }

    pub fn any(variable: &Variable, list: impl Into<Expr>, predicate: Predicate) -> Self {
        Self::quantified(Quantifier::Any, variable, list, predicate)
    }

    pub fn all(variable: &Variable, list: impl Into<Expr>, predicate: Predicate) -> Self {
        Self::quantified(Quantifier::All, variable, list, predicate)
    }

    pub fn quantified(
        quantifier: Quantifier,
        variable: &Variable,
        list: impl Into<Expr>,
        predicate: Predicate,
    ) -> Self {
        Predicate::Quantified {
            quantifier,
            variable: variable.clone(),
            list: list.into(),
            predicate: Box::new(predicate),
        }
    }

    fn combine<I, F>(predicates: I, wrap: F) -> Option<Self>
    where
        I: IntoIterator<Item = Predicate>,
        F: FnOnce(Vec<Predicate>) -> Predicate,
    {
        let mut predicates: Vec<_> = predicates.into_iter().collect();
        match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(wrap(predicates)),
        }
    }
}

impl From<Expr> for Predicate {
    fn from(expr: Expr) -> Self {
        Predicate::Expr(expr)
    }
}

impl From<RawFragment> for Predicate {
    fn from(raw: RawFragment) -> Self {
        Predicate::Raw(raw)
    }
}

impl ToCypher for Predicate {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        match self {
            Predicate::Comparison { op, lhs, rhs } => Ok(format!(
                "{} {} {}",
                lhs.to_cypher(env)?,
                op.as_str(),
                rhs.to_cypher(env)?
            )),
            Predicate::IsNull(expr) => Ok(format!("{} IS NULL", expr.to_cypher(env)?)),
            Predicate::IsNotNull(expr) => Ok(format!("{} IS NOT NULL", expr.to_cypher(env)?)),
            Predicate::And(items) => render_junction(items, "AND", env),
            Predicate::Or(items) => render_junction(items, "OR", env),
            Predicate::Not(inner) => Ok(format!("NOT ({})", inner.to_cypher(env)?)),
            Predicate::Quantified {
                quantifier,
                variable,
                list,
                predicate,
            } => {
                let list = list.to_cypher(env)?;
                let variable = env.declare(variable)?;
                Ok(format!(
                    "{}({} IN {} WHERE {})",
                    quantifier.as_str(),
                    variable,
                    list,
                    predicate.to_cypher(env)?
                ))
            }
            Predicate::Literal(value) => Ok(value.to_string()),
            Predicate::Expr(expr) => expr.to_cypher(env),
            Predicate::Raw(raw) => raw.to_cypher(env),
        }
    }
}

fn render_junction(
    items: &[Predicate],
    keyword: &str,
    env: &mut Environment,
) -> RenderResult<String> {
    match items {
        [] => Ok("true".to_string()),
        [single] => single.to_cypher(env),
        _ => {
            let rendered = items
                .iter()
                .map(|item| item.to_cypher(env))
                .collect::<RenderResult<Vec<_>>>()?;
            Ok(format!("({})", rendered.join(&format!(" {keyword} "))))
        }
    }
}
