//! Query AST context.
//!
//! A [`QueryAstContext`] records the current target node and relationship
//! while operations descend through relationship hops. Contexts are
//! immutable; [`QueryAstContext::push`] returns a child for the next hop.
//! The schema, configuration and callback bucket are shared by every
//! context of one translation.

use crate::callback::CallbackBucket;
use crate::config::TranslateConfig;
use crate::error::{Result, TranslateError};
use crate::schema::{Schema, WriteOperation};
use cypher_builder::{Expr, Node, Param, Relationship};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

/// State shared by all contexts of one translation.
#[derive(Debug)]
struct TranslationEnv {
    schema: Arc<Schema>,
    config: TranslateConfig,
    callbacks: Mutex<CallbackBucket>,
}

#[derive(Debug, Clone)]
pub struct QueryAstContext {
    target: Option<Node>,
    relationship: Option<Relationship>,
    source: Option<Node>,
    env: Arc<TranslationEnv>,
}

impl QueryAstContext {
    /// Root context with no target
    pub fn new(schema: Arc<Schema>, config: TranslateConfig) -> Self {
        Self {
            target: None,
            relationship: None,
            source: None,
            env: Arc::new(TranslationEnv {
                schema,
                config,
                callbacks: Mutex::new(CallbackBucket::new()),
            }),
        }
    }

    /// Same shared state, with `target` as the current node
    pub fn with_target(&self, target: &Node) -> Self {
        Self {
            target: Some(target.clone()),
            relationship: None,
            source: None,
            env: Arc::clone(&self.env),
        }
    }

    /// Child context for one relationship hop from the current target
    pub fn push(&self, target: &Node, relationship: &Relationship) -> Self {
        Self {
            target: Some(target.clone()),
            relationship: Some(relationship.clone()),
            source: self.target.clone(),
            env: Arc::clone(&self.env),
        }
    }

    pub fn target(&self) -> Result<&Node> {
        self.target
            .as_ref()
            .ok_or(TranslateError::MissingContext("target node"))
    }

    pub fn relationship(&self) -> Result<&Relationship> {
        self.relationship
            .as_ref()
            .ok_or(TranslateError::MissingContext("relationship"))
    }

    pub fn source(&self) -> Option<&Node> {
        self.source.as_ref()
    }

    pub fn schema(&self) -> &Schema {
        &self.env.schema
    }

    pub fn config(&self) -> &TranslateConfig {
        &self.env.config
    }

    /// Register a callback and return the placeholder its value is read from
    pub fn callback_placeholder(
        &self,
        callback: &str,
        attribute: &str,
        operation: WriteOperation,
    ) -> Expr {
        let key = self.env.callbacks.lock().add(callback, attribute, operation);
        Param::named(self.config().callback_param.clone(), json!({})).property(key)
    }

    /// Take the callbacks registered so far
    pub fn take_callbacks(&self) -> CallbackBucket {
        std::mem::take(&mut *self.env.callbacks.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cypher_builder::{Environment, ToCypher};

    fn context() -> QueryAstContext {
        QueryAstContext::new(Arc::new(Schema::new()), TranslateConfig::default())
    }

    #[test]
    fn test_missing_target() {
        assert_eq!(
            context().target().unwrap_err(),
            TranslateError::MissingContext("target node")
        );
    }

    #[test]
    fn test_push_keeps_parent_unchanged() {
        let root = Node::named("this", ["Movie"]);
        let actor = Node::new(["Actor"]);
        let rel = Relationship::new().with_type("ACTED_IN");

        let parent = context().with_target(&root);
        let child = parent.push(&actor, &rel);

        assert_eq!(parent.target().unwrap(), &root);
        assert!(parent.relationship().is_err());
        assert_eq!(child.target().unwrap(), &actor);
        assert_eq!(child.source(), Some(&root));
        assert_eq!(child.relationship().unwrap(), &rel);
    }

    #[test]
    fn test_callback_placeholder_is_shared_across_contexts() {
        let root = Node::named("this", ["Movie"]);
        let parent = context().with_target(&root);
        let child = parent.push(&Node::new(["Actor"]), &Relationship::new());

        let expr = child.callback_placeholder("slugify", "slug", WriteOperation::Update);
        let mut env = Environment::default();
        assert_eq!(expr.to_cypher(&mut env).unwrap(), "$resolvedCallbacks.slugify0");

        let bucket = parent.take_callbacks();
        assert_eq!(bucket.pending().len(), 1);
        assert!(parent.take_callbacks().is_empty());
    }
}
