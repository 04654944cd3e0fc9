//! Value expressions.

use crate::environment::Environment;
use crate::error::RenderResult;
use crate::escape::{escape_identifier, quote_string};
use crate::predicate::Predicate;
use crate::raw::RawFragment;
use crate::render::ToCypher;
use crate::variable::{Node, Param, Relationship, Variable};
use serde_json::Value;

/// A value-typed expression tree.
#[derive(Debug, Clone)]
pub enum Expr {
    Variable(Variable),
    Property(Box<Expr>, String),
    Literal(Value),
    Param(Param),
    Function(Function),
    Map(MapExpr),
    MapProjection(MapProjection),
    List(Vec<Expr>),
    ListComprehension(Box<ListComprehension>),
    Case(Box<Case>),
    Predicate(Box<Predicate>),
    Raw(RawFragment),
}

impl Expr {
    /// String, number, boolean, list or map literal rendered inline
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// `NULL`
    pub fn null() -> Self {
        Expr::Literal(Value::Null)
    }

    /// Property access: `self.key`
    pub fn property(self, key: impl Into<String>) -> Self {
        Expr::Property(Box::new(self), key.into())
    }
}

impl From<Variable> for Expr {
    fn from(variable: Variable) -> Self {
        Expr::Variable(variable)
    }
}

impl From<&Variable> for Expr {
    fn from(variable: &Variable) -> Self {
        Expr::Variable(variable.clone())
    }
}

impl From<&Node> for Expr {
    fn from(node: &Node) -> Self {
        Expr::Variable(node.variable().clone())
    }
}

impl From<Node> for Expr {
    fn from(node: Node) -> Self {
        Expr::from(&node)
    }
}

impl From<&Relationship> for Expr {
    fn from(rel: &Relationship) -> Self {
        Expr::Variable(rel.variable().clone())
    }
}

impl From<Param> for Expr {
    fn from(param: Param) -> Self {
        Expr::Param(param)
    }
}

impl From<Function> for Expr {
    fn from(function: Function) -> Self {
        Expr::Function(function)
    }
}

impl From<MapExpr> for Expr {
    fn from(map: MapExpr) -> Self {
        Expr::Map(map)
    }
}

impl From<MapProjection> for Expr {
    fn from(projection: MapProjection) -> Self {
        Expr::MapProjection(projection)
    }
}

impl From<ListComprehension> for Expr {
    fn from(comprehension: ListComprehension) -> Self {
        Expr::ListComprehension(Box::new(comprehension))
    }
}

impl From<Case> for Expr {
    fn from(case: Case) -> Self {
        Expr::Case(Box::new(case))
    }
}

impl From<Predicate> for Expr {
    fn from(predicate: Predicate) -> Self {
        Expr::Predicate(Box::new(predicate))
    }
}

impl From<RawFragment> for Expr {
    fn from(raw: RawFragment) -> Self {
        Expr::Raw(raw)
    }
}

impl ToCypher for Expr {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        match self {
            Expr::Variable(variable) => env.resolve(variable),
            Expr::Property(base, key) => Ok(format!(
                "{}.{}",
                base.to_cypher(env)?,
                escape_identifier(key)
            )),
            Expr::Literal(value) => Ok(render_literal(value)),
            Expr::Param(param) => Ok(format!("${}", env.param(param)?)),
            Expr::Function(function) => function.to_cypher(env),
            Expr::Map(map) => map.to_cypher(env),
            Expr::MapProjection(projection) => projection.to_cypher(env),
            Expr::List(items) => Ok(format!("[{}]", render_list(items, env)?)),
            Expr::ListComprehension(comprehension) => comprehension.to_cypher(env),
            Expr::Case(case) => case.to_cypher(env),
            Expr::Predicate(predicate) => predicate.to_cypher(env),
            Expr::Raw(raw) => raw.to_cypher(env),
        }
    }
}

pub(crate) fn render_list(items: &[Expr], env: &mut Environment) -> RenderResult<String> {
    let rendered = items
        .iter()
        .map(|item| item.to_cypher(env))
        .collect::<RenderResult<Vec<_>>>()?;
    Ok(rendered.join(", "))
}

fn render_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote_string(s),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(render_literal).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(entries) if entries.is_empty() => "{}".to_string(),
        Value::Object(entries) => format!(
            "{{ {} }}",
            entries
                .iter()
                .map(|(k, v)| format!("{}: {}", escape_identifier(k), render_literal(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

// ============================================================================
// Functions
// ============================================================================

/// A function application: `name(args)`.
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    args: Vec<Expr>,
    distinct: bool,
}

impl Function {
    pub fn new<I>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = Expr>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().collect(),
            distinct: false,
        }
    }

    /// Render as `name(DISTINCT args)`
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ToCypher for Function {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        let args = render_list(&self.args, env)?;
        let distinct = if self.distinct { "DISTINCT " } else { "" };
        Ok(format!("{}({}{})", self.name, distinct, args))
    }
}

pub fn count(expr: impl Into<Expr>) -> Function {
    Function::new("count", [expr.into()])
}

pub fn collect(expr: impl Into<Expr>) -> Function {
    Function::new("collect", [expr.into()])
}

pub fn size(expr: impl Into<Expr>) -> Function {
    Function::new("size", [expr.into()])
}

pub fn avg(expr: impl Into<Expr>) -> Function {
    Function::new("avg", [expr.into()])
}

pub fn min(expr: impl Into<Expr>) -> Function {
    Function::new("min", [expr.into()])
}

pub fn max(expr: impl Into<Expr>) -> Function {
    Function::new("max", [expr.into()])
}

pub fn sum(expr: impl Into<Expr>) -> Function {
    Function::new("sum", [expr.into()])
}

pub fn head(expr: impl Into<Expr>) -> Function {
    Function::new("head", [expr.into()])
}

pub fn last(expr: impl Into<Expr>) -> Function {
    Function::new("last", [expr.into()])
}

pub fn to_string(expr: impl Into<Expr>) -> Function {
    Function::new("toString", [expr.into()])
}

pub fn point(expr: impl Into<Expr>) -> Function {
    Function::new("point", [expr.into()])
}

pub fn element_id(expr: impl Into<Expr>) -> Function {
    Function::new("elementId", [expr.into()])
}

pub fn datetime() -> Function {
    Function::new("datetime", [])
}

pub fn time() -> Function {
    Function::new("time", [])
}

pub fn random_uuid() -> Function {
    Function::new("randomUUID", [])
}

// ============================================================================
// Maps and projections
// ============================================================================

/// An ordered map literal: `{ key: expr, ... }`.
#[derive(Debug, Clone, Default)]
pub struct MapExpr {
    entries: Vec<(String, Expr)>,
}

impl MapExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry, keeping first-insertion order
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Expr>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder form of [`MapExpr::set`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.set(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ToCypher for MapExpr {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        if self.entries.is_empty() {
            return Ok("{}".to_string());
        }
        let mut parts = Vec::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            parts.push(format!("{}: {}", escape_identifier(key), value.to_cypher(env)?));
        }
        Ok(format!("{{ {} }}", parts.join(", ")))
    }
}

/// A map projection entry.
#[derive(Debug, Clone)]
pub enum ProjectionEntry {
    /// `.key`
    Shorthand(String),
    /// `key: expr`
    Keyed(String, Expr),
}

/// Map projection over a variable: `n { .a, b: expr }`.
#[derive(Debug, Clone)]
pub struct MapProjection {
    variable: Variable,
    entries: Vec<ProjectionEntry>,
}

impl MapProjection {
    pub fn new(variable: &Variable) -> Self {
        Self {
            variable: variable.clone(),
            entries: Vec::new(),
        }
    }

    pub fn shorthand(mut self, key: impl Into<String>) -> Self {
        self.entries.push(ProjectionEntry::Shorthand(key.into()));
        self
    }

    pub fn entry(mut self, key: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.entries
            .push(ProjectionEntry::Keyed(key.into(), value.into()));
        self
    }

    pub fn push(&mut self, entry: ProjectionEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ToCypher for MapProjection {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        let base = env.resolve(&self.variable)?;
        if self.entries.is_empty() {
            return Ok(format!("{base} {{ }}"));
        }
        let mut parts = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            parts.push(match entry {
                ProjectionEntry::Shorthand(key) => format!(".{}", escape_identifier(key)),
                ProjectionEntry::Keyed(key, value) => {
                    format!("{}: {}", escape_identifier(key), value.to_cypher(env)?)
                }
            });
        }
        Ok(format!("{} {{ {} }}", base, parts.join(", ")))
    }
}

// ============================================================================
// Comprehensions and CASE
// ============================================================================

/// `[var IN list WHERE predicate | map]`
#[derive(Debug, Clone)]
pub struct ListComprehension {
    variable: Variable,
    list: Expr,
    predicate: Option<Predicate>,
    map: Option<Expr>,
}

impl ListComprehension {
    pub fn new(variable: &Variable, list: impl Into<Expr>) -> Self {
        Self {
            variable: variable.clone(),
            list: list.into(),
            predicate: None,
            map: None,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn map(mut self, map: impl Into<Expr>) -> Self {
        self.map = Some(map.into());
        self
    }
}

impl ToCypher for ListComprehension {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        let list = self.list.to_cypher(env)?;
        let variable = env.declare(&self.variable)?;
        let mut out = format!("[{variable} IN {list}");
        if let Some(predicate) = &self.predicate {
            out.push_str(&format!(" WHERE {}", predicate.to_cypher(env)?));
        }
        if let Some(map) = &self.map {
            out.push_str(&format!(" | {}", map.to_cypher(env)?));
        }
        out.push(']');
        Ok(out)
    }
}

/// Generic `CASE WHEN ... THEN ... ELSE ... END`
#[derive(Debug, Clone, Default)]
pub struct Case {
    branches: Vec<(Predicate, Expr)>,
    otherwise: Option<Expr>,
}

impl Case {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn when(mut self, predicate: Predicate, then: impl Into<Expr>) -> Self {
        self.branches.push((predicate, then.into()));
        self
    }

    pub fn otherwise(mut self, value: impl Into<Expr>) -> Self {
        self.otherwise = Some(value.into());
        self
    }
}

impl ToCypher for Case {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        let mut out = String::from("CASE");
        for (predicate, then) in &self.branches {
            out.push_str(&format!(
                " WHEN {} THEN {}",
                predicate.to_cypher(env)?,
                then.to_cypher(env)?
            ));
        }
        if let Some(otherwise) = &self.otherwise {
            out.push_str(&format!(" ELSE {}", otherwise.to_cypher(env)?));
        }
        out.push_str(" END");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(expr: impl Into<Expr>) -> String {
        let mut env = Environment::default();
        expr.into().to_cypher(&mut env).unwrap()
    }

    #[test]
    fn test_literals() {
        assert_eq!(render(Expr::literal("Movie")), "\"Movie\"");
        assert_eq!(render(Expr::null()), "NULL");
        assert_eq!(render(Expr::literal(json!([1, true]))), "[1, true]");
        assert_eq!(render(Expr::literal(json!({"a": 1}))), "{ a: 1 }");
    }

    #[test]
    fn test_function_with_named_variable() {
        let edges = Variable::named("edges");
        assert_eq!(render(size(&edges)), "size(edges)");
        assert_eq!(render(count(&edges).distinct()), "count(DISTINCT edges)");
    }

    #[test]
    fn test_nested_property_access() {
        let edge = Variable::named("edge");
        assert_eq!(render(edge.property("node").property("title")), "edge.node.title");
    }

    #[test]
    fn test_map_keeps_insertion_order() {
        let map = MapExpr::new()
            .with("edges", &Variable::named("edges"))
            .with("totalCount", &Variable::named("totalCount"));
        assert_eq!(render(map), "{ edges: edges, totalCount: totalCount }");
        assert_eq!(render(MapExpr::new()), "{}");
    }

    #[test]
    fn test_map_projection() {
        let this = Variable::named("this");
        let projection = MapProjection::new(&this)
            .shorthand("title")
            .entry("released", this.property("year"));
        assert_eq!(render(projection), "this { .title, released: this.year }");
    }

    #[test]
    fn test_list_comprehension_declares_its_variable() {
        let v = Variable::new();
        let input = Variable::named("input");
        let comprehension = ListComprehension::new(&v, input.property("points")).map(point(&v));
        assert_eq!(render(comprehension), "[var0 IN input.points | point(var0)]");
    }
}
