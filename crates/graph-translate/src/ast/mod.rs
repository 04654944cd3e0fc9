//! Query AST.
//!
//! An operation tree mirrors the shape of an incoming request: each
//! [`Operation`] holds fields, filters, authorization filters, pagination
//! and sort, and compiles itself into clauses of the `cypher-builder` model.
//! [`QueryAst`] is the entry point that roots the tree and renders it.

pub mod fields;
pub mod filters;
pub mod operations;
pub mod pagination;
pub mod sort;

use crate::callback::PendingCallback;
use crate::config::TranslateConfig;
use crate::context::QueryAstContext;
use crate::error::Result;
use crate::schema::Schema;
use cypher_builder::{Clause, CypherRenderer, Node, QueryRenderer, Variable};
use operations::Operation;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Hooks every AST child exposes to the operation that owns it.
pub trait QueryAstNode {
    /// Clauses that must run before the owning operation's main selection
    fn selection(&self, _ctx: &QueryAstContext) -> Result<Vec<Clause>> {
        Ok(Vec::new())
    }

    /// Subqueries that compute values this node refers to
    fn subqueries(&self, _ctx: &QueryAstContext) -> Result<Vec<Clause>> {
        Ok(Vec::new())
    }
}

/// Output of a full translation.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    pub cypher: String,
    pub params: HashMap<String, Value>,
    /// Callbacks whose values the caller binds under the callback parameter
    pub callbacks: Vec<PendingCallback>,
}

/// Root of an operation tree.
#[derive(Debug, Clone)]
pub struct QueryAst {
    operation: Operation,
}

impl QueryAst {
    pub fn new(operation: Operation) -> Self {
        Self { operation }
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Compile the tree into one clause.
    ///
    /// Top-level operations match their target as the configured root
    /// variable. A connection has no parent to hop from, so it is compiled
    /// without a target and fails with a missing-context error.
    pub fn transpile(&self, ctx: &QueryAstContext) -> Result<Clause> {
        let config = ctx.config();
        let ctx = match &self.operation {
            Operation::Connection(_) => ctx.clone(),
            operation => {
                let root = Node::named(config.root_variable.clone(), operation.target().labels());
                ctx.with_target(&root)
            }
        };

        let return_variable = if self.operation.is_mutation() {
            Variable::named(config.result_variable.clone())
        } else {
            Variable::named(config.root_variable.clone())
        };

        let transpiled = self.operation.transpile(&ctx, &return_variable)?;
        Ok(Clause::concat(transpiled.clauses))
    }

    /// Compile and render with a fresh context
    pub fn build(&self, schema: Arc<Schema>, config: TranslateConfig) -> Result<TranslationResult> {
        let renderer = CypherRenderer::new(config.render.clone());
        let ctx = QueryAstContext::new(schema, config);

        let clause = self.transpile(&ctx)?;
        let rendered = renderer.render(&clause)?;
        let callbacks = ctx.take_callbacks().into_pending();

        debug!(cypher = %rendered.cypher, "translated query");
        info!(
            entity = %self.operation.target().name,
            params = rendered.params.len(),
            callbacks = callbacks.len(),
            "query translation complete"
        );

        Ok(TranslationResult {
            cypher: rendered.cypher,
            params: rendered.params,
            callbacks,
        })
    }
}
