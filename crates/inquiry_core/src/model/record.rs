//! Row-type mapping contract.
//!
//! # Responsibility
//! - Declare the table schema a row type persists into.
//! - Convert row types to and from `ContentValues`.
//!
//! # Invariants
//! - At most one column should be `auto_increment`, and it must be an
//!   INTEGER primary key for SQLite to honor it.
//! - Unset generated keys (NULL or `<= 0`) are never written; SQLite assigns them.

use crate::model::values::ContentValues;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RecordResult<T> = Result<T, RecordError>;

/// Error raised while decoding a row into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    MissingColumn(String),
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },
    /// Value is well-typed but outside what the record accepts.
    InvalidValue { column: String, message: String },
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingColumn(column) => write!(f, "column `{column}` missing from row"),
            Self::TypeMismatch {
                column,
                expected,
                found,
            } => write!(f, "column `{column}` expected {expected}, found {found}"),
            Self::InvalidValue { column, message } => {
                write!(f, "column `{column}` has invalid value: {message}")
            }
        }
    }
}

impl Error for RecordError {}

/// SQLite storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Blob,
}

/// One column of a record schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnType,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub not_null: bool,
}

impl Column {
    pub fn new(name: &'static str, kind: ColumnType) -> Self {
        Self {
            name,
            kind,
            primary_key: false,
            auto_increment: false,
            not_null: false,
        }
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub fn real(name: &'static str) -> Self {
        Self::new(name, ColumnType::Real)
    }

    pub fn text(name: &'static str) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub fn blob(name: &'static str) -> Self {
        Self::new(name, ColumnType::Blob)
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    fn is_generated_key(&self) -> bool {
        self.primary_key && self.auto_increment
    }
}

/// A row type that can be stored in a table or exchanged with a provider.
///
/// ```ignore
/// struct Person { id: i64, name: String }
///
/// impl Record for Person {
///     fn columns() -> Vec<Column> {
///         vec![Column::integer("_id").primary_key().auto_increment(), Column::text("name")]
///     }
///     fn to_values(&self) -> ContentValues {
///         ContentValues::new().with("_id", self.id).with("name", self.name.clone())
///     }
///     fn from_values(values: &ContentValues) -> RecordResult<Self> {
///         Ok(Self { id: values.get_i64("_id")?, name: values.get_text("name")? })
///     }
/// }
/// ```
pub trait Record: Sized {
    fn columns() -> Vec<Column>;
    fn to_values(&self) -> ContentValues;
    fn from_values(values: &ContentValues) -> RecordResult<Self>;
}

/// Values of `row` that should be written, minus unset generated keys.
pub(crate) fn writable_values<T: Record>(row: &T) -> ContentValues {
    let mut values = row.to_values();
    for column in T::columns().iter().filter(|column| column.is_generated_key()) {
        let unset = match values.get(column.name) {
            None | Some(Value::Null) => true,
            Some(Value::Integer(id)) => *id <= 0,
            Some(_) => false,
        };
        if unset {
            values.remove(column.name);
        }
    }
    values
}
