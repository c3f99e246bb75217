//! Host context: component identity, storage location and provider resolver.
//!
//! # Invariants
//! - `name` is non-blank and doubles as the default instance name.
//! - Database `db` lives at `data_dir/db`.

use crate::error::{InquiryError, InquiryResult};
use crate::provider::ContentResolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Context {
    name: String,
    data_dir: PathBuf,
    resolver: Arc<ContentResolver>,
}

impl Context {
    /// Creates a context with its own empty resolver.
    pub fn new(name: impl Into<String>, data_dir: impl Into<PathBuf>) -> InquiryResult<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(InquiryError::InvalidContext(name));
        }
        Ok(Self {
            name: trimmed.to_string(),
            data_dir: data_dir.into(),
            resolver: Arc::new(ContentResolver::new()),
        })
    }

    /// Shares `resolver` instead of the context's own.
    pub fn with_resolver(mut self, resolver: Arc<ContentResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry key used when a builder is given no explicit instance name.
    pub fn instance_name(&self) -> String {
        self.name.clone()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn database_path(&self, database_name: &str) -> PathBuf {
        self.data_dir.join(database_name)
    }

    pub fn resolver(&self) -> &Arc<ContentResolver> {
        &self.resolver
    }
}
