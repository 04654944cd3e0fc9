//! Variable identities.
//!
//! Every variable is an opaque identity: two variables are equal only if
//! they are the same instance (or clones of it). Names are never chosen here;
//! the [`Environment`](crate::Environment) assigns them at render time.

use crate::expr::Expr;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

const VARIABLE_PREFIX: &str = "var";
const ENTITY_PREFIX: &str = "this";
const PARAM_PREFIX: &str = "param";

#[derive(Debug)]
struct VariableInner {
    prefix: Cow<'static, str>,
    name: Option<String>,
}

/// A query variable identified by instance, not by value.
#[derive(Clone)]
pub struct Variable(Arc<VariableInner>);

impl Variable {
    /// Create a fresh anonymous variable (rendered as `var<N>`)
    pub fn new() -> Self {
        Self::with_hint(VARIABLE_PREFIX)
    }

    /// Create a fresh anonymous variable whose generated name starts with `hint`
    pub fn with_hint(hint: impl Into<Cow<'static, str>>) -> Self {
        Self(Arc::new(VariableInner {
            prefix: hint.into(),
            name: None,
        }))
    }

    /// Create a variable rendered verbatim as `name`.
    ///
    /// Named variables are treated as bound by an enclosing query and are
    /// never renamed.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self(Arc::new(VariableInner {
            prefix: Cow::Owned(name.clone()),
            name: Some(name),
        }))
    }

    /// Fixed name, if this is a named variable
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// Prefix used when generating a name
    pub fn prefix(&self) -> &str {
        &self.0.prefix
    }

    /// Property access on this variable
    pub fn property(&self, key: impl Into<String>) -> Expr {
        Expr::from(self).property(key)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl Default for Variable {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&Variable> for Variable {
    fn from(variable: &Variable) -> Self {
        variable.clone()
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.name {
            Some(name) => write!(f, "Variable({name})"),
            None => write!(f, "Variable({}#{:x})", self.0.prefix, self.addr()),
        }
    }
}

// ============================================================================
// Nodes and relationships
// ============================================================================

/// A node variable with its labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    variable: Variable,
    labels: Vec<String>,
}

impl Node {
    /// Create an anonymous node with the given labels
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variable: Variable::with_hint(ENTITY_PREFIX),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a node rendered verbatim as `name`
    pub fn named<I, S>(name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variable: Variable::named(name),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Property access on this node
    pub fn property(&self, key: impl Into<String>) -> Expr {
        self.variable.property(key)
    }
}

/// Direction of a relationship hop as written left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// `(a)-[r]->(b)`
    #[default]
    Outgoing,
    /// `(a)<-[r]-(b)`
    Incoming,
    /// `(a)-[r]-(b)`
    Undirected,
}

impl Direction {
    /// Swap the arrow while keeping endpoints in place
    pub fn reversed(self) -> Self {
        match self {
            Direction::Outgoing => Direction::Incoming,
            Direction::Incoming => Direction::Outgoing,
            Direction::Undirected => Direction::Undirected,
        }
    }
}

/// A relationship variable with an optional type and optional endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relationship {
    variable: Variable,
    rel_type: Option<String>,
    source: Option<Node>,
    target: Option<Node>,
    direction: Direction,
}

impl Relationship {
    /// Create an anonymous, untyped relationship
    pub fn new() -> Self {
        Self {
            variable: Variable::with_hint(ENTITY_PREFIX),
            rel_type: None,
            source: None,
            target: None,
            direction: Direction::Outgoing,
        }
    }

    /// Set the relationship type
    pub fn with_type(mut self, rel_type: impl Into<String>) -> Self {
        self.rel_type = Some(rel_type.into());
        self
    }

    /// Attach endpoints; rendered as `(source)-[r]->(target)` unless reversed
    pub fn between(mut self, source: &Node, target: &Node) -> Self {
        self.source = Some(source.clone());
        self.target = Some(target.clone());
        self
    }

    /// Flip the arrow so the pattern reads `(source)<-[r]-(target)`
    pub fn reverse(mut self) -> Self {
        self.direction = self.direction.reversed();
        self
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn rel_type(&self) -> Option<&str> {
        self.rel_type.as_deref()
    }

    pub fn source(&self) -> Option<&Node> {
        self.source.as_ref()
    }

    pub fn target(&self) -> Option<&Node> {
        self.target.as_ref()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Property access on this relationship
    pub fn property(&self, key: impl Into<String>) -> Expr {
        self.variable.property(key)
    }
}

impl Default for Relationship {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Parameters
// ============================================================================

#[derive(Debug)]
struct ParamInner {
    value: Value,
    prefix: Cow<'static, str>,
    name: Option<String>,
}

/// A bound query parameter.
///
/// Like [`Variable`], parameters are compared by identity. The renderer
/// collects their values into the parameter map under generated names.
#[derive(Clone)]
pub struct Param(Arc<ParamInner>);

impl Param {
    /// Create a parameter with a generated name (`param<N>`)
    pub fn new(value: impl Into<Value>) -> Self {
        Self::with_hint(value, PARAM_PREFIX)
    }

    /// Create a parameter whose generated name starts with `hint`
    pub fn with_hint(value: impl Into<Value>, hint: impl Into<Cow<'static, str>>) -> Self {
        Self(Arc::new(ParamInner {
            value: value.into(),
            prefix: hint.into(),
            name: None,
        }))
    }

    /// Create a parameter rendered verbatim as `$name`
    pub fn named(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        Self(Arc::new(ParamInner {
            value: value.into(),
            prefix: Cow::Owned(name.clone()),
            name: Some(name),
        }))
    }

    pub fn value(&self) -> &Value {
        &self.0.value
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    pub fn prefix(&self) -> &str {
        &self.0.prefix
    }

    /// Property access on this parameter (`$param.key`)
    pub fn property(&self, key: impl Into<String>) -> Expr {
        Expr::Param(self.clone()).property(key)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Param {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Param {}

impl Hash for Param {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Param({}: {})", self.0.prefix, self.0.value)
    }
}
