//! Error types for clause construction and rendering.

use thiserror::Error;

/// Errors raised while constructing clauses.
///
/// These are detected eagerly so that a structurally invalid clause never
/// reaches the renderer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The clause is missing a structural element it cannot render without
    #[error("Invalid clause: {0}")]
    InvalidClause(String),
}

/// Errors raised while rendering a clause tree to query text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A generated variable was referenced before any clause introduced it
    #[error("Unbound reference to variable with prefix '{prefix}'")]
    UnboundReference { prefix: String },

    /// A named variable reuses a name already generated for another variable
    #[error("Variable name '{name}' is already generated for another variable")]
    NameCollision { name: String },

    /// Two different values were bound under the same parameter name
    #[error("Parameter '{name}' is already bound to a different value")]
    ParamCollision { name: String },

    /// A raw fragment failed to produce its text
    #[error("Raw fragment failed: {0}")]
    Fragment(String),
}

/// Result type for clause construction
pub type BuildResult<T> = Result<T, BuildError>;

/// Result type for rendering
pub type RenderResult<T> = Result<T, RenderError>;
