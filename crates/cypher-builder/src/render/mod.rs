//! Rendering of clause trees to query text.
//!
//! Every element of the model implements [`ToCypher`], which writes its text
//! while allocating names in a shared [`Environment`]. A [`QueryRenderer`]
//! drives one full pass over a [`Clause`] and returns the text together with
//! the collected parameters.

mod cypher;

pub use cypher::CypherRenderer;

use crate::clause::Clause;
use crate::environment::Environment;
use crate::error::RenderResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Render an element to query text within an environment.
pub trait ToCypher {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String>;
}

/// Formatting knobs for rendered text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Indentation for the body of `CALL { ... }` subqueries
    pub indent: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
        }
    }
}

/// Output from rendering
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    /// The generated query text
    pub cypher: String,
    /// Parameters to bind to the query
    pub params: HashMap<String, Value>,
}

/// Trait for rendering a clause tree to a query.
pub trait QueryRenderer: Send + Sync {
    /// Unique name for this renderer
    fn name(&self) -> &str;

    /// Render the clause to a query string with parameters
    fn render(&self, clause: &Clause) -> RenderResult<RenderedQuery>;
}
