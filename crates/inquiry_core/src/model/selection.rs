//! Filter predicate with positional arguments.

use rusqlite::types::Value;

/// SQL `WHERE` fragment plus the values bound to its `?` placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    clause: Option<String>,
    args: Vec<Value>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a selection from one clause and its arguments.
    pub fn from_clause<V: Into<Value>>(
        clause: impl Into<String>,
        args: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::new().and(clause, args)
    }

    /// ANDs `clause` onto the current predicate.
    ///
    /// Blank clauses are ignored together with their arguments.
    pub fn and<V: Into<Value>>(
        mut self,
        clause: impl Into<String>,
        args: impl IntoIterator<Item = V>,
    ) -> Self {
        let clause = clause.into();
        let clause = clause.trim();
        if clause.is_empty() {
            return self;
        }

        self.clause = Some(match self.clause.take() {
            Some(existing) => format!("({existing}) AND ({clause})"),
            None => clause.to_string(),
        });
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn clause(&self) -> Option<&str> {
        self.clause.as_deref()
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn is_empty(&self) -> bool {
        self.clause.is_none()
    }
}
