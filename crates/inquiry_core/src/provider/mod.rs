//! Content-provider contract and in-process resolver.
//!
//! # Responsibility
//! - Define the CRUD surface a data source exposes under a `content://` authority.
//! - Route `ContentUri` requests to the provider registered for their authority.
//!
//! # Invariants
//! - One provider per authority; duplicates are rejected, not replaced.
//! - Providers receive selection clauses and arguments unchanged.

use crate::db::DbError;
use crate::model::selection::Selection;
use crate::model::values::ContentValues;
use crate::uri::{is_valid_authority, ContentUri};
use log::debug;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

mod table;

pub use table::TableProvider;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Provider registration and execution errors.
#[derive(Debug)]
pub enum ProviderError {
    InvalidAuthority(String),
    DuplicateAuthority(String),
    ProviderNotFound(String),
    /// Provider does not serve this path shape.
    UnsupportedUri(String),
    Db(DbError),
    /// Provider-specific refusal.
    Rejected(String),
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAuthority(value) => write!(f, "provider authority is invalid: {value}"),
            Self::DuplicateAuthority(value) => {
                write!(f, "provider authority already registered: {value}")
            }
            Self::ProviderNotFound(value) => write!(f, "no provider for authority: {value}"),
            Self::UnsupportedUri(value) => write!(f, "unsupported provider uri: {value}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Rejected(message) => write!(f, "provider rejected request: {message}"),
        }
    }
}

impl Error for ProviderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ProviderError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ProviderError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Data source reachable through `content://<authority>/...`.
pub trait ContentProvider: Send + Sync {
    fn authority(&self) -> &str;

    fn query(
        &self,
        uri: &ContentUri,
        projection: Option<&[String]>,
        selection: &Selection,
        sort_order: Option<&str>,
    ) -> ProviderResult<Vec<ContentValues>>;

    /// Inserts one row and returns the URI addressing it.
    fn insert(&self, uri: &ContentUri, values: &ContentValues) -> ProviderResult<ContentUri>;

    fn update(
        &self,
        uri: &ContentUri,
        values: &ContentValues,
        selection: &Selection,
    ) -> ProviderResult<usize>;

    fn delete(&self, uri: &ContentUri, selection: &Selection) -> ProviderResult<usize>;
}

/// Authority-keyed provider registry shared through a `Context`.
#[derive(Default)]
pub struct ContentResolver {
    providers: RwLock<BTreeMap<String, Arc<dyn ContentProvider>>>,
}

impl ContentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one provider under its trimmed authority.
    pub fn register(&self, provider: Arc<dyn ContentProvider>) -> ProviderResult<()> {
        let authority = provider.authority().trim().to_string();
        if !is_valid_authority(&authority) {
            return Err(ProviderError::InvalidAuthority(authority));
        }

        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        if providers.contains_key(authority.as_str()) {
            return Err(ProviderError::DuplicateAuthority(authority));
        }
        debug!("event=provider_register module=provider status=ok authority={authority}");
        providers.insert(authority, provider);
        Ok(())
    }

    /// Removes the provider for `authority`; returns whether one was present.
    pub fn unregister(&self, authority: &str) -> bool {
        self.providers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(authority.trim())
            .is_some()
    }

    /// Returns the provider serving `uri`'s authority.
    pub fn acquire(&self, uri: &ContentUri) -> ProviderResult<Arc<dyn ContentProvider>> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uri.authority())
            .cloned()
            .ok_or_else(|| ProviderError::ProviderNotFound(uri.authority().to_string()))
    }

    /// Returns sorted registered authorities.
    pub fn authorities(&self) -> Vec<String> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn query(
        &self,
        uri: &ContentUri,
        projection: Option<&[String]>,
        selection: &Selection,
        sort_order: Option<&str>,
    ) -> ProviderResult<Vec<ContentValues>> {
        self.acquire(uri)?
            .query(uri, projection, selection, sort_order)
    }

    pub fn insert(&self, uri: &ContentUri, values: &ContentValues) -> ProviderResult<ContentUri> {
        self.acquire(uri)?.insert(uri, values)
    }

    pub fn update(
        &self,
        uri: &ContentUri,
        values: &ContentValues,
        selection: &Selection,
    ) -> ProviderResult<usize> {
        self.acquire(uri)?.update(uri, values, selection)
    }

    pub fn delete(&self, uri: &ContentUri, selection: &Selection) -> ProviderResult<usize> {
        self.acquire(uri)?.delete(uri, selection)
    }
}

impl Debug for ContentResolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentResolver")
            .field("authorities", &self.authorities())
            .finish()
    }
}
