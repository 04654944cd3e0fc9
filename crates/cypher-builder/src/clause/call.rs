//! Subqueries and procedure calls.

use crate::clause::Clause;
use crate::environment::Environment;
use crate::error::RenderResult;
use crate::expr::{render_list, Expr};
use crate::render::ToCypher;
use crate::variable::Variable;

/// `CALL { WITH imports body }`
#[derive(Debug, Clone)]
pub struct Call {
    body: Box<Clause>,
    imports: Vec<Variable>,
}

impl Call {
    pub fn new(body: impl Into<Clause>) -> Self {
        Self {
            body: Box::new(body.into()),
            imports: Vec::new(),
        }
    }

    /// Import outer variables into the subquery scope
    pub fn import_with<I, V>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Variable>,
    {
        self.imports.extend(variables.into_iter().map(Into::into));
        self
    }

    pub fn imports(&self) -> &[Variable] {
        &self.imports
    }
}

impl ToCypher for Call {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        let mut lines = Vec::new();
        if !self.imports.is_empty() {
            let mut names = Vec::with_capacity(self.imports.len());
            for variable in &self.imports {
                names.push(env.resolve(variable)?);
            }
            lines.push(format!("WITH {}", names.join(", ")));
        }

        let body = self.body.to_cypher(env)?;
        lines.extend(body.lines().map(str::to_string));

        let indent = env.options().indent.clone();
        let mut out = String::from("CALL {");
        for line in lines {
            out.push('\n');
            out.push_str(&indent);
            out.push_str(&line);
        }
        out.push_str("\n}");
        Ok(out)
    }
}

/// `CALL procedure(args)`
#[derive(Debug, Clone)]
pub struct CallProcedure {
    name: String,
    args: Vec<Expr>,
}

impl CallProcedure {
    pub fn new<I>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = Expr>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }
}

impl ToCypher for CallProcedure {
    fn to_cypher(&self, env: &mut Environment) -> RenderResult<String> {
        Ok(format!("CALL {}({})", self.name, render_list(&self.args, env)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::Return;
    use crate::expr::count;
    use crate::predicate::Predicate;
    use crate::render::RenderOptions;

    #[test]
    fn test_call_indents_body() {
        let mut env = Environment::default();
        let this = Variable::named("this");
        let total = Variable::new();
        let call = Call::new(Return::new().column((count(&this), &total))).import_with([&this]);

        assert_eq!(
            call.to_cypher(&mut env).unwrap(),
            "CALL {\n    WITH this\n    RETURN count(this) AS var0\n}"
        );
    }

    #[test]
    fn test_call_uses_configured_indent() {
        let mut env = Environment::new(RenderOptions {
            indent: "  ".to_string(),
        });
        let call = Call::new(Return::star());
        assert_eq!(call.to_cypher(&mut env).unwrap(), "CALL {\n  RETURN *\n}");
    }

    #[test]
    fn test_call_procedure() {
        let mut env = Environment::default();
        let count = Variable::named("c");
        let validate = CallProcedure::new(
            "apoc.util.validate",
            [
                Predicate::not(Predicate::eq(&count, Expr::literal(1))).into(),
                Expr::literal("required"),
                Expr::literal(serde_json::json!([0])),
            ],
        );

        assert_eq!(
            validate.to_cypher(&mut env).unwrap(),
            "CALL apoc.util.validate(NOT (c = 1), \"required\", [0])"
        );
    }
}
