//! Clause model.
//!
//! A [`Clause`] is one statement of a query, or a [`Clause::Composite`]
//! sequence of them. Composites render their non-empty members joined by
//! newlines, so optional pieces can be concatenated without special casing.

mod call;
mod projection;
mod reading;
mod writing;

pub use call::{Call, CallProcedure};
pub use projection::{Order, ProjectionColumn, Return, With};
pub use reading::{Match, Unwind};
pub use writing::{Create, Delete, Merge, SetClause};

use crate::environment::Environment;
use crate::error::RenderResult;
use crate::expr::Expr;
use crate::raw::RawFragment;
use crate::render::ToCypher;

/// A single statement or an ordered sequence of statements.
#[derive(Debug, Clone)]
pub enum Clause {
    Match(Match),
    Create(Create),
    Merge(Merge),
    Unwind(Unwind),
    With(With),
    Call(Call),
    CallProcedure(CallProcedure),
    Return(Return),
    Set(SetClause),
    Delete(Delete),
    Raw(RawFragment),
    Composite(Vec<Clause>),
}

impl Clause {
    /// Concatenate clauses in order, skipping absent and empty members.
    ///
    /// Nested composites are flattened.
    pub fn concat<I, C>(clauses: I) -> Clause
    where
        I: IntoIterator<Item = C>,
        C: Into<Option<Clause>>,
    {
        let mut members = Vec::new();
        for clause in clauses.into_iter().filter_map(Into::into) {
            match clause {
                Clause::Composite(inner) => members.extend(inner),
                other => members.push(other),
            }
        }
        Clause::Composite(members)
    }

    /// Append a clause, turning `self` into a composite if necessary
    pub fn then(self, next: impl Into<Clause>) -> Clause {
        Clause::concat([self, next.into()])
    }

    /// Whether this clause renders to nothing
    pub fn is_empty(&self) -> bool {
        match self {
            Clause::Composite(members) => members.iter().all(Clause::is_empty),
            _ => false,
        }
    }
}

impl Default for Clause {
    fn default() -> Self {
        Clause::Composite(Vec::new())
    }
}

impl ToCypher for Clause {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        match self {
            Clause::Match(clause) => clause.to_cypher(env),
            Clause::Create(clause) => clause.to_cypher(env),
            Clause::Merge(clause) => clause.to_cypher(env),
            Clause::Unwind(clause) => clause.to_cypher(env),
            Clause::With(clause) => clause.to_cypher(env),
            Clause::Call(clause) => clause.to_cypher(env),
            Clause::CallProcedure(clause) => clause.to_cypher(env),
            Clause::Return(clause) => clause.to_cypher(env),
            Clause::Set(clause) => clause.to_cypher(env),
            Clause::Delete(clause) => clause.to_cypher(env),
            Clause::Raw(raw) => raw.to_cypher(env),
            Clause::Composite(members) => {
                let mut parts = Vec::with_capacity(members.len());
                for member in members {
                    let text = member.to_cypher(env)?;
                    if !text.is_empty() {
                        parts.push(text);
                    }
                }
                Ok(parts.join("\n"))
            }
        }
    }
}

macro_rules! clause_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Clause {
                fn from(clause: $ty) -> Self {
                    Clause::$variant(clause)
                }
            }
        )*
    };
}

clause_from! {
    Match(Match),
    Create(Create),
    Merge(Merge),
    Unwind(Unwind),
    With(With),
    Call(Call),
    CallProcedure(CallProcedure),
    Return(Return),
    Set(SetClause),
    Delete(Delete),
    Raw(RawFragment),
}

impl From<Vec<Clause>> for Clause {
    fn from(clauses: Vec<Clause>) -> Self {
        Clause::concat(clauses)
    }
}

/// Render `SET a = x, b = y` items
pub(crate) fn render_set_items(
    items: &[(Expr, Expr)],
    env: &mut Environment,
) -> RenderResult<Option<String>> {
    if items.is_empty() {
        return Ok(None);
    }
    let mut parts = Vec::with_capacity(items.len());
    for (target, value) in items {
        parts.push(format!("{} = {}", target.to_cypher(env)?, value.to_cypher(env)?));
    }
    Ok(Some(format!("SET {}", parts.join(", "))))
}
