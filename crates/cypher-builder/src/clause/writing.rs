//! Write clauses: `CREATE`, `MERGE`, `SET`, `DELETE`.

use crate::clause::render_set_items;
use crate::environment::Environment;
use crate::error::{BuildError, BuildResult, RenderResult};
use crate::expr::{render_list, Expr};
use crate::pattern::Pattern;
use crate::render::ToCypher;
use crate::variable::Relationship;

/// `CREATE patterns [SET ...]`
#[derive(Debug, Clone)]
pub struct Create {
    patterns: Vec<Pattern>,
    set: Vec<(Expr, Expr)>,
}

impl Create {
    pub fn new(pattern: Pattern) -> Self {
        Self {
            patterns: vec![pattern],
            set: Vec::new(),
        }
    }

    /// Create several patterns in one clause; at least one is required
    pub fn from_patterns(patterns: Vec<Pattern>) -> BuildResult<Self> {
        if patterns.is_empty() {
            return Err(BuildError::InvalidClause(
                "CREATE requires at least one pattern".to_string(),
            ));
        }
        Ok(Self {
            patterns,
            set: Vec::new(),
        })
    }

    pub fn set(mut self, target: impl Into<Expr>, value: impl Into<Expr>) -> Self {
        self.set.push((target.into(), value.into()));
        self
    }
}

impl ToCypher for Create {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        let mut patterns = Vec::with_capacity(self.patterns.len());
        for pattern in &self.patterns {
            patterns.push(pattern.to_cypher(env)?);
        }
        let mut out = format!("CREATE {}", patterns.join(", "));
        if let Some(set) = render_set_items(&self.set, env)? {
            out.push('\n');
            out.push_str(&set);
        }
        Ok(out)
    }
}

/// `MERGE pattern [SET ...]`
#[derive(Debug, Clone)]
pub struct Merge {
    pattern: Pattern,
    set: Vec<(Expr, Expr)>,
}

impl Merge {
    pub fn new(pattern: Pattern) -> Self {
        Self {
            pattern,
            set: Vec::new(),
        }
    }

    /// Merge a relationship between its own endpoints.
    ///
    /// Fails if the relationship has no source or target.
    pub fn relationship(relationship: &Relationship) -> BuildResult<Self> {
        Ok(Self::new(Pattern::from_relationship(relationship)?))
    }

    pub fn set(mut self, target: impl Into<Expr>, value: impl Into<Expr>) -> Self {
        self.set.push((target.into(), value.into()));
        self
    }
}

impl ToCypher for Merge {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        let mut out = format!("MERGE {}", self.pattern.to_cypher(env)?);
        if let Some(set) = render_set_items(&self.set, env)? {
            out.push('\n');
            out.push_str(&set);
        }
        Ok(out)
    }
}

/// Standalone `SET a = x, b = y`
#[derive(Debug, Clone, Default)]
pub struct SetClause {
    items: Vec<(Expr, Expr)>,
}

impl SetClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, target: impl Into<Expr>, value: impl Into<Expr>) -> Self {
        self.items.push((target.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ToCypher for SetClause {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        Ok(render_set_items(&self.items, env)?.unwrap_or_default())
    }
}

/// `[DETACH] DELETE targets`
#[derive(Debug, Clone)]
pub struct Delete {
    targets: Vec<Expr>,
    detach: bool,
}

impl Delete {
    pub fn new<I>(targets: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            detach: false,
        }
    }

    pub fn detach(mut self) -> Self {
        self.detach = true;
        self
    }
}

impl ToCypher for Delete {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        let keyword = if self.detach { "DETACH DELETE" } else { "DELETE" };
        Ok(format!("{} {}", keyword, render_list(&self.targets, env)?))
    }
}
