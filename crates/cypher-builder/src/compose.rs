//! Boundaries between the main selection and its subqueries.
//!
//! Translated queries are assembled from a selection (the `MATCH` or `WITH`
//! that introduces the target), subqueries that compute values for it, and a
//! predicate. Where the predicate attaches depends on whether subqueries sit
//! between the selection and the filter; these helpers decide that in one
//! place.

use crate::clause::{Clause, Match, With};
use crate::predicate::Predicate;

/// The clause that introduces the target of an operation.
#[derive(Debug, Clone)]
pub enum Selection {
    Match(Match),
    With(With),
}

impl Selection {
    /// Conjoin `predicate` with the selection's own `WHERE`
    pub fn and_where(self, predicate: Predicate) -> Self {
        match self {
            Selection::Match(clause) => Selection::Match(clause.and_where(predicate)),
            Selection::With(clause) => Selection::With(clause.and_where(predicate)),
        }
    }

    pub fn into_clause(self) -> Clause {
        match self {
            Selection::Match(clause) => clause.into(),
            Selection::With(clause) => clause.into(),
        }
    }
}

impl From<Match> for Selection {
    fn from(clause: Match) -> Self {
        Selection::Match(clause)
    }
}

impl From<With> for Selection {
    fn from(clause: With) -> Self {
        Selection::With(clause)
    }
}

/// Result of [`plan_selection`].
#[derive(Debug, Clone)]
pub struct SelectionPlan {
    /// Clauses to emit before the selection, if any
    pub pre_selection: Option<Clause>,
    pub selection: Selection,
}

/// Decide how the main `MATCH` and clauses that must follow it are ordered.
///
/// Without extra clauses the `MATCH` is the selection itself. Otherwise the
/// `MATCH` and the extra clauses come first and the selection becomes
/// `WITH *`, so a later predicate can see everything they bound.
pub fn plan_selection(main: Match, extra: Vec<Clause>) -> SelectionPlan {
    let extra: Vec<Clause> = extra.into_iter().filter(|c| !c.is_empty()).collect();
    if extra.is_empty() {
        return SelectionPlan {
            pre_selection: None,
            selection: Selection::Match(main),
        };
    }

    let mut pre = vec![Clause::from(main)];
    pre.extend(extra);
    SelectionPlan {
        pre_selection: Some(Clause::concat(pre)),
        selection: Selection::With(With::star()),
    }
}

/// Attach `predicate` to a selection, after any subqueries it depends on.
///
/// With no subqueries the predicate goes on the selection's own `WHERE`.
/// Otherwise the selection is emitted, then the subqueries, then
/// `WITH * WHERE predicate`.
pub fn filter_selection(
    selection: Selection,
    subqueries: Vec<Clause>,
    predicate: Option<Predicate>,
) -> Clause {
    let subqueries: Vec<Clause> = subqueries.into_iter().filter(|c| !c.is_empty()).collect();
    if subqueries.is_empty() {
        return match predicate {
            Some(predicate) => selection.and_where(predicate).into_clause(),
            None => selection.into_clause(),
        };
    }

    let mut clauses = vec![selection.into_clause()];
    clauses.extend(subqueries);
    if let Some(predicate) = predicate {
        clauses.push(With::star().and_where(predicate).into());
    }
    Clause::concat(clauses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::{Call, Return};
    use crate::environment::Environment;
    use crate::expr::{count, Expr};
    use crate::pattern::Pattern;
    use crate::render::ToCypher;
    use crate::variable::{Node, Variable};

    fn render(clause: &Clause) -> String {
        let mut env = Environment::default();
        clause.to_cypher(&mut env).unwrap()
    }

    #[test]
    fn test_plan_without_extras_keeps_match() {
        let this = Node::named("this", ["Movie"]);
        let plan = plan_selection(Match::new(Pattern::new(&this)), Vec::new());

        assert!(plan.pre_selection.is_none());
        assert!(matches!(plan.selection, Selection::Match(_)));
    }

    #[test]
    fn test_plan_with_extras_switches_to_with_star() {
        let this = Node::named("this", ["Movie"]);
        let extra: Clause = With::new().column(this.variable()).into();
        let plan = plan_selection(Match::new(Pattern::new(&this)), vec![extra]);

        assert_eq!(
            render(plan.pre_selection.as_ref().unwrap()),
            "MATCH (this:Movie)\nWITH this"
        );
        assert!(matches!(plan.selection, Selection::With(_)));
    }

    #[test]
    fn test_filter_without_subqueries_uses_selection_where() {
        let this = Node::named("this", ["Movie"]);
        let clause = filter_selection(
            Match::new(Pattern::new(&this)).into(),
            Vec::new(),
            Some(Predicate::eq(this.property("title"), Expr::literal("Up"))),
        );

        assert_eq!(render(&clause), "MATCH (this:Movie)\nWHERE this.title = \"Up\"");
    }

    #[test]
    fn test_filter_after_subqueries() {
        let this = Node::named("this", ["Movie"]);
        let result = Variable::new();
        let subquery = Call::new(Return::new().column((count(&this), &result)))
            .import_with([this.variable()]);

        let clause = filter_selection(
            Match::new(Pattern::new(&this)).into(),
            vec![subquery.into()],
            Some(Predicate::eq(&result, Expr::literal(true))),
        );

        assert_eq!(
            render(&clause),
            "MATCH (this:Movie)\nCALL {\n    WITH this\n    RETURN count(this) AS var0\n}\nWITH *\nWHERE var0 = true"
        );
    }
}
