use crate::{
    error::{ClauseError, Error, ValidationError},
    syntax,
    value::SqlValue,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum State {
    #[default]
    Empty,
    Complete,
    /// Ends with `AND`/`OR`, waiting for the next predicate.
    Chained,
}

/// Accumulated WHERE condition.
///
/// Predicates and conjunctions must alternate: a predicate after a complete
/// condition needs an explicit `and()`/`or()` first, and a trailing
/// conjunction makes the clause unrenderable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereClause {
    sql: String,
    state: State,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.state == State::Empty
    }

    pub fn is_complete(&self) -> bool {
        self.state == State::Complete
    }

    pub fn push_predicate(&mut self, predicate: &str) -> Result<(), ClauseError> {
        match self.state {
            State::Complete => Err(ClauseError::MissingConjunction),
            State::Empty | State::Chained => {
                self.sql.push_str(predicate);
                self.state = State::Complete;
                Ok(())
            }
        }
    }

    fn push_conjunction(&mut self, conjunction: &str) -> Result<(), ClauseError> {
        match self.state {
            State::Empty => Err(ClauseError::NothingToJoin),
            State::Chained => Err(ClauseError::DanglingConjunction),
            State::Complete => {
                self.sql.push(' ');
                self.sql.push_str(conjunction);
                self.sql.push(' ');
                self.state = State::Chained;
                Ok(())
            }
        }
    }

    pub fn and(&mut self) -> Result<(), ClauseError> {
        self.push_conjunction("AND")
    }

    pub fn or(&mut self) -> Result<(), ClauseError> {
        self.push_conjunction("OR")
    }

    /// ` WHERE ...`, or an empty string when no predicate was added.
    pub fn render(&self) -> Result<String, ClauseError> {
        match self.state {
            State::Empty => Ok(String::new()),
            State::Complete => Ok(format!(" WHERE {}", self.sql)),
            State::Chained => Err(ClauseError::DanglingConjunction),
        }
    }

    /// Like [`render`](Self::render) but an empty clause is an error.
    pub fn render_required(&self) -> Result<String, ClauseError> {
        match self.state {
            State::Empty => Err(ClauseError::MissingWhere),
            _ => self.render(),
        }
    }
}

fn comparison(column: &str, operator: &str, value: SqlValue) -> Result<String, ValidationError> {
    syntax::check_column_name(column)?;
    if value.is_null() {
        match operator {
            "=" => return Ok(format!("{} IS NULL", column)),
            "!=" => return Ok(format!("{} IS NOT NULL", column)),
            _ => {}
        }
    }
    Ok(format!("{} {} {}", column, operator, value.to_literal()?))
}

/// WHERE predicates shared by `Select`, `Update` and `Delete`.
///
/// Every method validates the column and the literal(s) before touching the
/// clause, and fails on a predicate that is not preceded by `and()`/`or()`.
pub trait Filter: Sized {
    fn where_clause_mut(&mut self) -> &mut WhereClause;

    #[doc(hidden)]
    fn push_predicate(mut self, predicate: Result<String, ValidationError>) -> Result<Self, Error> {
        let predicate = predicate?;
        self.where_clause_mut().push_predicate(&predicate)?;
        Ok(self)
    }

    fn where_equals(self, column: &str, value: impl Into<SqlValue>) -> Result<Self, Error> {
        self.push_predicate(comparison(column, "=", value.into()))
    }

    fn where_not_equal(self, column: &str, value: impl Into<SqlValue>) -> Result<Self, Error> {
        self.push_predicate(comparison(column, "!=", value.into()))
    }

    fn where_greater_than(self, column: &str, value: impl Into<SqlValue>) -> Result<Self, Error> {
        self.push_predicate(comparison(column, ">", value.into()))
    }

    fn where_greater_or_equal(self, column: &str, value: impl Into<SqlValue>) -> Result<Self, Error> {
        self.push_predicate(comparison(column, ">=", value.into()))
    }

    fn where_less_than(self, column: &str, value: impl Into<SqlValue>) -> Result<Self, Error> {
        self.push_predicate(comparison(column, "<", value.into()))
    }

    fn where_less_or_equal(self, column: &str, value: impl Into<SqlValue>) -> Result<Self, Error> {
        self.push_predicate(comparison(column, "<=", value.into()))
    }

    fn where_between(self, column: &str, low: impl Into<SqlValue>, high: impl Into<SqlValue>) -> Result<Self, Error> {
        let predicate = syntax::check_column_name(column).and_then(|_| {
            Ok(format!("{} BETWEEN {} AND {}", column, low.into().to_literal()?, high.into().to_literal()?))
        });
        self.push_predicate(predicate)
    }

    /// `column LIKE 'pattern'`; wildcards are part of `pattern`.
    fn where_like(self, column: &str, pattern: &str) -> Result<Self, Error> {
        self.push_predicate(comparison(column, "LIKE", SqlValue::from(pattern)))
    }

    fn where_in<I, V>(self, column: &str, values: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let predicate = syntax::check_column_name(column).and_then(|_| {
            let literals = values.into_iter().map(|v| v.into().to_literal()).collect::<Result<Vec<_>, _>>()?;
            if literals.is_empty() {
                return Err(ValidationError::EmptyInList(column.to_string()));
            }
            Ok(format!("{} IN ({})", column, literals.join(", ")))
        });
        self.push_predicate(predicate)
    }

    fn and(mut self) -> Result<Self, Error> {
        self.where_clause_mut().and()?;
        Ok(self)
    }

    fn or(mut self) -> Result<Self, Error> {
        self.where_clause_mut().or()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine() {
        let mut clause = WhereClause::new();
        assert_eq!(clause.render().unwrap(), "");
        assert_eq!(clause.and(), Err(ClauseError::NothingToJoin));
        assert_eq!(clause.render_required(), Err(ClauseError::MissingWhere));

        clause.push_predicate("a = 1").unwrap();
        assert_eq!(clause.push_predicate("b = 2"), Err(ClauseError::MissingConjunction));

        clause.or().unwrap();
        assert_eq!(clause.or(), Err(ClauseError::DanglingConjunction));
        assert_eq!(clause.render(), Err(ClauseError::DanglingConjunction));

        clause.push_predicate("b = 2").unwrap();
        assert!(clause.is_complete());
        assert_eq!(clause.render().unwrap(), " WHERE a = 1 OR b = 2");
    }

    #[test]
    fn comparisons_render_literals() {
        assert_eq!(comparison("a", "=", 1.into()).unwrap(), "a = 1");
        assert_eq!(comparison("a", "=", "x".into()).unwrap(), "a = 'x'");
        assert_eq!(comparison("a", "=", SqlValue::Null).unwrap(), "a IS NULL");
        assert_eq!(comparison("a", "!=", SqlValue::Null).unwrap(), "a IS NOT NULL");
        assert!(comparison("a b", "=", 1.into()).is_err());
        assert!(comparison("a", "=", "x' OR '1".into()).is_err());
    }
}
