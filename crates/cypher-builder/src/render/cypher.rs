//! Cypher query renderer.

use crate::clause::Clause;
use crate::environment::Environment;
use crate::error::RenderResult;
use crate::render::{QueryRenderer, RenderOptions, RenderedQuery, ToCypher};
use crate::variable::Variable;
use tracing::debug;

/// Renders a clause tree in a fresh [`Environment`].
///
/// Variables listed in `bound` are treated as introduced by an enclosing
/// query, so they may be referenced without a binding clause.
#[derive(Debug, Clone, Default)]
pub struct CypherRenderer {
    pub options: RenderOptions,
    pub bound: Vec<Variable>,
}

impl CypherRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            bound: Vec::new(),
        }
    }

    /// Treat `variables` as already bound
    pub fn with_bound<I>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = Variable>,
    {
        self.bound.extend(variables);
        self
    }
}

impl QueryRenderer for CypherRenderer {
    fn name(&self) -> &str {
        "cypher"
    }

    fn render(&self, clause: &Clause) -> RenderResult<RenderedQuery> {
        let mut env = Environment::new(self.options.clone()).with_bound(self.bound.iter().cloned());
        let cypher = clause.to_cypher(&mut env)?;
        let params = env.into_params();

        debug!(
            bytes = cypher.len(),
            params = params.len(),
            "rendered cypher query"
        );

        Ok(RenderedQuery { cypher, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::{Match, Return};
    use crate::error::RenderError;
    use crate::pattern::Pattern;
    use crate::predicate::Predicate;
    use crate::variable::{Node, Param};

    #[test]
    fn test_render_collects_params() {
        let movie = Node::new(["Movie"]);
        let query = Clause::concat([
            Clause::from(
                Match::new(Pattern::new(&movie))
                    .and_where(Predicate::eq(movie.property("title"), Param::new("Matrix"))),
            ),
            Return::new().column(movie.variable()).into(),
        ]);

        let rendered = CypherRenderer::default().render(&query).unwrap();

        assert_eq!(
            rendered.cypher,
            "MATCH (this0:Movie)\nWHERE this0.title = $param0\nRETURN this0"
        );
        assert_eq!(rendered.params["param0"], "Matrix");
    }

    #[test]
    fn test_render_is_repeatable() {
        let movie = Node::new(["Movie"]);
        let query = Clause::concat([
            Clause::from(Match::new(Pattern::new(&movie))),
            Return::new().column(movie.variable()).into(),
        ]);
        let renderer = CypherRenderer::default();

        assert_eq!(renderer.render(&query), renderer.render(&query));
    }

    #[test]
    fn test_bound_variables_need_no_binding_clause() {
        let outer = Variable::new();
        let query: Clause = Return::new().column(&outer).into();

        assert!(matches!(
            CypherRenderer::default().render(&query),
            Err(RenderError::UnboundReference { .. })
        ));

        let rendered = CypherRenderer::default()
            .with_bound([outer])
            .render(&query)
            .unwrap();
        assert_eq!(rendered.cypher, "RETURN var0");
    }
}
