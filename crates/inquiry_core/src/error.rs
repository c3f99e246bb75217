//! Crate-level error for instance lifecycle and query execution.

use crate::db::DbError;
use crate::model::record::RecordError;
use crate::provider::ProviderError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type InquiryResult<T> = Result<T, InquiryError>;

#[derive(Debug)]
pub enum InquiryError {
    /// Context name was blank.
    InvalidContext(String),
    /// Database versions start at 1.
    InvalidDatabaseVersion(u32),
    /// No persisted instance under this name.
    InstanceNotFound(String),
    /// Instance state was cleared by `destroy_instance`.
    InstanceDestroyed,
    /// Write query ran without rows; carries the operation name.
    MissingValues(&'static str),
    /// Serial handler is not accepting work.
    Dispatch(String),
    Db(DbError),
    Record(RecordError),
    Provider(ProviderError),
}

impl Display for InquiryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidContext(value) => write!(f, "invalid context name `{value}`"),
            Self::InvalidDatabaseVersion(version) => {
                write!(f, "database version must be >= 1, got {version}")
            }
            Self::InstanceNotFound(name) => write!(
                f,
                "no persisted instance found for {name}, or it has been destroyed"
            ),
            Self::InstanceDestroyed => write!(f, "instance has been destroyed"),
            Self::MissingValues(operation) => {
                write!(f, "no values were provided for {operation}")
            }
            Self::Dispatch(message) => write!(f, "handler dispatch failed: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Record(err) => write!(f, "{err}"),
            Self::Provider(err) => write!(f, "{err}"),
        }
    }
}

impl Error for InquiryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Record(err) => Some(err),
            Self::Provider(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for InquiryError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for InquiryError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RecordError> for InquiryError {
    fn from(value: RecordError) -> Self {
        Self::Record(value)
    }
}

impl From<ProviderError> for InquiryError {
    fn from(value: ProviderError) -> Self {
        Self::Provider(value)
    }
}
