//! Translation configuration
//!
//! Names and messages baked into generated queries. Every field has a
//! default, so a TOML file only needs the keys it overrides.

use crate::error::{Result, TranslateError};
use cypher_builder::RenderOptions;
use serde::{Deserialize, Serialize};

/// Translation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Name of the top-level matched variable
    pub root_variable: String,
    /// Name the mutation result is returned under
    pub result_variable: String,
    /// Name prefix of the batch-create input parameter
    pub unwind_param_prefix: String,
    /// Name prefix of the batch-create row variable
    pub unwind_variable_prefix: String,
    /// Message raised by failed authorization validation
    pub forbidden_message: String,
    /// Prefix of relationship cardinality violation messages
    pub relationship_required_prefix: String,
    /// Parameter holding values resolved by populated-by callbacks
    pub callback_param: String,
    /// Emit cardinality checks for non-list relationships on create
    pub emit_relationship_validation: bool,
    pub render: RenderOptions,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            root_variable: "this".to_string(),
            result_variable: "data".to_string(),
            unwind_param_prefix: "create_param".to_string(),
            unwind_variable_prefix: "create_var".to_string(),
            forbidden_message: "@neo4j/graphql/FORBIDDEN".to_string(),
            relationship_required_prefix: "@neo4j/graphql/RELATIONSHIP-REQUIRED".to_string(),
            callback_param: "resolvedCallbacks".to_string(),
            emit_relationship_validation: true,
            render: RenderOptions::default(),
        }
    }
}

impl TranslateConfig {
    /// Load from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| TranslateError::Configuration(e.to_string()))
    }

    /// Serialize to TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| TranslateError::Configuration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = TranslateConfig::from_toml_str("").unwrap();
        assert_eq!(config, TranslateConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = TranslateConfig::from_toml_str(
            r#"
            root_variable = "n"
            emit_relationship_validation = false

            [render]
            indent = "  "
            "#,
        )
        .unwrap();

        assert_eq!(config.root_variable, "n");
        assert!(!config.emit_relationship_validation);
        assert_eq!(config.render.indent, "  ");
        assert_eq!(config.forbidden_message, "@neo4j/graphql/FORBIDDEN");
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = TranslateConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(TranslateConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let err = TranslateConfig::from_toml_str("root_variable = 3").unwrap_err();
        assert!(matches!(err, TranslateError::Configuration(_)));
    }
}
