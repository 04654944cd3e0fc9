//! APOC procedure helpers.

use crate::clause::Clause;
use crate::escape::{escape_identifier, escape_string_contents};
use crate::expr::Expr;
use crate::raw::RawFragment;
use crate::render::ToCypher;

/// Wrap a clause in `apoc.cypher.runFirstColumnMany("<query>", { params })`.
///
/// The inner clause renders in the caller's environment, so its parameters
/// land in the outer parameter map. `params` maps names visible inside the
/// wrapped query to outer variable names.
pub fn run_first_column_many(clause: Clause, params: Vec<(String, String)>) -> Expr {
    Expr::Raw(RawFragment::new(move |env| {
        let inner = clause.to_cypher(env)?;
        let entries = params
            .iter()
            .map(|(key, value)| format!("{}: {}", escape_identifier(key), value))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!(
            "apoc.cypher.runFirstColumnMany(\"{}\", {{ {} }})",
            escape_string_contents(&inner),
            entries
        ))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Environment;

    fn render(expr: &Expr) -> String {
        let mut env = Environment::default();
        let text = expr.to_cypher(&mut env).unwrap();
        assert!(env.params().is_empty());
        text
    }

    #[test]
    fn test_wraps_and_escapes_query() {
        let expr = run_first_column_many(
            RawFragment::text(r#"MATCH(n) RETURN n, "Hello""#).into(),
            Vec::new(),
        );
        assert_eq!(
            render(&expr),
            r#"apoc.cypher.runFirstColumnMany("MATCH(n) RETURN n, \"Hello\"", {  })"#
        );
    }

    #[test]
    fn test_extra_params() {
        let expr = run_first_column_many(
            RawFragment::text("MATCH(n) RETURN n").into(),
            vec![("auth".to_string(), "auth".to_string())],
        );
        assert_eq!(
            render(&expr),
            r#"apoc.cypher.runFirstColumnMany("MATCH(n) RETURN n", { auth: auth })"#
        );
    }

    #[test]
    fn test_double_wrap() {
        let first = run_first_column_many(
            RawFragment::text(r#"MATCH(n) RETURN n, "Hello""#).into(),
            Vec::new(),
        );
        let inner = match first {
            Expr::Raw(raw) => Clause::Raw(raw),
            other => panic!("unexpected expression {other:?}"),
        };
        let expr = run_first_column_many(inner, Vec::new());

        assert_eq!(
            render(&expr),
            r#"apoc.cypher.runFirstColumnMany("apoc.cypher.runFirstColumnMany(\"MATCH(n) RETURN n, \\\"Hello\\\"\", {  })", {  })"#
        );
    }
}
