//! Raw query fragments.
//!
//! A raw fragment produces its text at render time from the live
//! [`Environment`], so it can reference variables by their final names and
//! bind parameters of its own.

use crate::environment::Environment;
use crate::error::RenderResult;
use crate::render::ToCypher;
use std::fmt;
use std::sync::Arc;

type FragmentFn = dyn Fn(&mut Environment) -> RenderResult<String> + Send + Sync;

/// Text produced by a closure at render time.
#[derive(Clone)]
pub struct RawFragment(Arc<FragmentFn>);

impl RawFragment {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&mut Environment) -> RenderResult<String> + Send + Sync + 'static,
    {
        Self(Arc::new(render))
    }

    /// Fragment with fixed text
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Ok(text.clone()))
    }
}

impl ToCypher for RawFragment {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        (self.0)(env)
    }
}

impl fmt::Debug for RawFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawFragment(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::Variable;

    #[test]
    fn test_fragment_sees_resolved_names() {
        let node = Variable::with_hint("this");
        let captured = node.clone();
        let fragment = RawFragment::new(move |env| Ok(format!("WITH {}", env.resolve(&captured)?)));

        let mut env = Environment::default();
        env.declare(&node).unwrap();
        assert_eq!(fragment.to_cypher(&mut env).unwrap(), "WITH this0");
    }

    #[test]
    fn test_text_fragment() {
        let mut env = Environment::default();
        let fragment = RawFragment::text("MATCH (n) RETURN n");
        assert_eq!(fragment.to_cypher(&mut env).unwrap(), "MATCH (n) RETURN n");
    }
}
