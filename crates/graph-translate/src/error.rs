//! Error types for query translation

use cypher_builder::{BuildError, RenderError};
use thiserror::Error;

/// Translation error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// An operation ran without the target it needs in the query context
    #[error("Missing context: {0}")]
    MissingContext(&'static str),

    /// A nested create node has no parent scope or relationship
    #[error("Nested created nodes should belong to a parent: {0}")]
    MissingParent(String),

    /// A relationship field declares an empty type
    #[error("Relationship field '{0}' has an empty type")]
    EmptyRelationshipType(String),

    /// Schema does not support the requested filter or operation
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Aggregation or comparison operator that is not recognised
    #[error("Unsupported operator '{operator}' in '{key}'")]
    UnsupportedOperator { key: String, operator: String },

    /// Entity name not present in the schema
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// Input key that matches no attribute or relationship
    #[error("Unknown field '{field}' on '{entity}'")]
    UnknownField { entity: String, field: String },

    /// Input value of the wrong shape
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Structurally invalid clause
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Failure while rendering the clause tree
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Broad class of a [`TranslateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bug in the caller that built the AST
    Defect,
    /// Schema does not allow the request
    Configuration,
    /// Malformed request input
    Input,
    /// Rendering failed
    Render,
}

impl TranslateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslateError::MissingContext(_)
            | TranslateError::MissingParent(_)
            | TranslateError::EmptyRelationshipType(_)
            | TranslateError::Build(_) => ErrorKind::Defect,
            TranslateError::Configuration(_) | TranslateError::UnsupportedOperator { .. } => {
                ErrorKind::Configuration
            }
            TranslateError::UnknownEntity(_)
            | TranslateError::UnknownField { .. }
            | TranslateError::InvalidInput(_) => ErrorKind::Input,
            TranslateError::Render(_) => ErrorKind::Render,
        }
    }
}

/// Result type for translation
pub type Result<T> = std::result::Result<T, TranslateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(TranslateError::MissingContext("target").kind(), ErrorKind::Defect);
        assert_eq!(
            TranslateError::Configuration("edge".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            TranslateError::from(RenderError::Fragment("x".into())).kind(),
            ErrorKind::Render
        );
        assert_eq!(
            TranslateError::from(BuildError::InvalidClause("x".into())).kind(),
            ErrorKind::Defect
        );
    }
}
