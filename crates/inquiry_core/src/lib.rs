//! Core of Inquiry: named SQLite instances and typed CRUD query builders.
//! Rows are plain Rust types implementing `Record`; targets are local tables
//! or `content://` URIs served by registered providers.

pub mod context;
pub mod db;
pub mod error;
pub mod handler;
pub mod instance;
pub mod logging;
pub mod model;
pub mod provider;
pub mod query;
pub mod uri;

pub use context::Context;
pub use db::{DbError, DbResult};
pub use error::{InquiryError, InquiryResult};
pub use handler::Handler;
pub use instance::{
    Inquiry, InquiryBuilder, InstanceInfo, DEFAULT_DATABASE_NAME, DEFAULT_DATABASE_VERSION,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::record::{Column, ColumnType, Record, RecordError, RecordResult};
pub use model::selection::Selection;
pub use model::values::ContentValues;
pub use provider::{ContentProvider, ContentResolver, ProviderError, ProviderResult, TableProvider};
pub use query::{Delete, Insert, Query, QueryKind, QueryTarget, Select, Update};
pub use rusqlite::types::Value;
pub use uri::{ContentUri, UriError};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
