//! Typed query builders for select/insert/update/delete.
//!
//! # Responsibility
//! - Accumulate selection, projection, ordering and row payloads.
//! - Execute against a local table or a content-provider URI captured from
//!   the originating instance.
//!
//! # Invariants
//! - A query owns a snapshot of its instance's settings; destroying the
//!   instance afterwards does not affect an already-built query.
//! - Only the operations valid for a query's kind are callable on it.

use crate::db::schema::{quote_identifier, validate_identifier};
use crate::error::InquiryResult;
use crate::handler::Handler;
use crate::model::record::Record;
use crate::model::selection::Selection;
use crate::provider::ContentResolver;
use crate::uri::ContentUri;
use rusqlite::types::Value;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

mod exec;

/// Where a query runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTarget {
    Table(String),
    Provider(ContentUri),
}

/// Instance settings captured when the query was created.
#[derive(Debug, Clone)]
pub struct QuerySource {
    pub target: QueryTarget,
    pub database_path: PathBuf,
    pub database_version: u32,
    pub resolver: Arc<ContentResolver>,
    pub handler: Handler,
}

mod sealed {
    pub trait Sealed {}
}

/// Marker for the operation a query performs.
pub trait QueryKind: sealed::Sealed {
    const NAME: &'static str;
}

#[derive(Debug)]
pub struct Select;
#[derive(Debug)]
pub struct Insert;
#[derive(Debug)]
pub struct Update;
#[derive(Debug)]
pub struct Delete;

macro_rules! query_kind {
    ($kind:ident, $name:literal) => {
        impl sealed::Sealed for $kind {}
        impl QueryKind for $kind {
            const NAME: &'static str = $name;
        }
    };
}

query_kind!(Select, "select");
query_kind!(Insert, "insert");
query_kind!(Update, "update");
query_kind!(Delete, "delete");

/// Fluent query bound to one target; `K` fixes the operation.
pub struct Query<T, K> {
    source: QuerySource,
    selection: Selection,
    projection: Option<Vec<String>>,
    sort_order: Option<String>,
    limit: Option<u32>,
    rows: Vec<T>,
    /// First column rejected by `where_eq`; reported when the query runs.
    invalid_column: Option<String>,
    _kind: PhantomData<K>,
}

impl<T: Record, K: QueryKind> Query<T, K> {
    pub(crate) fn new(source: QuerySource) -> Self {
        Self {
            source,
            selection: Selection::new(),
            projection: None,
            sort_order: None,
            limit: None,
            rows: Vec::new(),
            invalid_column: None,
            _kind: PhantomData,
        }
    }

    /// ANDs a raw predicate with `?` placeholders bound to `args`.
    pub fn where_clause<V: Into<Value>>(
        mut self,
        clause: impl Into<String>,
        args: impl IntoIterator<Item = V>,
    ) -> Self {
        self.selection = self.selection.and(clause, args);
        self
    }

    /// ANDs `"column" = ?`.
    ///
    /// An invalid column name fails the query with `InvalidIdentifier` when it runs.
    pub fn where_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        if validate_identifier(column).is_err() {
            self.invalid_column.get_or_insert_with(|| column.to_string());
            return self;
        }
        self.where_clause(format!("{} = ?", quote_identifier(column)), [value.into()])
    }

    pub fn target(&self) -> &QueryTarget {
        &self.source.target
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }
}

impl<T, K: QueryKind> Debug for Query<T, K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("kind", &K::NAME)
            .field("target", &self.source.target)
            .field("selection", &self.selection)
            .field("rows", &self.rows.len())
            .finish()
    }
}

impl<T: Record> Query<T, Select> {
    /// Restricts returned columns; rows must still decode into `T`.
    pub fn projection<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.projection = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Raw `ORDER BY` fragment, e.g. `"name ASC"`.
    pub fn sort(mut self, order: impl Into<String>) -> Self {
        self.sort_order = Some(order.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Runs the select and decodes every row.
    pub fn all(&self) -> InquiryResult<Vec<T>> {
        exec::select(self, self.limit)
    }

    /// Runs the select and decodes the first row, if any.
    pub fn first(&self) -> InquiryResult<Option<T>> {
        let limit = Some(self.limit.map_or(1, |limit| limit.min(1)));
        Ok(exec::select(self, limit)?.into_iter().next())
    }

    /// Counts matching rows without decoding them.
    pub fn count(&self) -> InquiryResult<usize> {
        exec::count(self)
    }

    /// Runs `all` on the instance handler and passes the result to `callback`
    /// on that thread.
    pub fn all_async(
        self,
        callback: impl FnOnce(InquiryResult<Vec<T>>) + Send + 'static,
    ) -> InquiryResult<()>
    where
        T: Send + 'static,
    {
        let handler = self.source.handler.clone();
        handler.post(move || callback(self.all()))
    }
}

impl<T: Record> Query<T, Insert> {
    /// Appends rows to insert.
    pub fn values(mut self, rows: impl IntoIterator<Item = T>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn value(mut self, row: T) -> Self {
        self.rows.push(row);
        self
    }

    /// Inserts every row; returns new row ids in input order.
    pub fn run(&self) -> InquiryResult<Vec<i64>> {
        exec::insert(self)
    }

    pub fn run_async(
        self,
        callback: impl FnOnce(InquiryResult<Vec<i64>>) + Send + 'static,
    ) -> InquiryResult<()>
    where
        T: Send + 'static,
    {
        let handler = self.source.handler.clone();
        handler.post(move || callback(self.run()))
    }
}

impl<T: Record> Query<T, Update> {
    /// Sets the row whose values are written; replaces any earlier one.
    pub fn value(mut self, row: T) -> Self {
        self.rows = vec![row];
        self
    }

    /// Restricts which columns of the row are written.
    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.projection = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Returns the number of rows changed.
    pub fn run(&self) -> InquiryResult<usize> {
        exec::update(self)
    }

    pub fn run_async(
        self,
        callback: impl FnOnce(InquiryResult<usize>) + Send + 'static,
    ) -> InquiryResult<()>
    where
        T: Send + 'static,
    {
        let handler = self.source.handler.clone();
        handler.post(move || callback(self.run()))
    }
}

impl<T: Record> Query<T, Delete> {
    /// Returns the number of rows removed; no selection removes all rows.
    pub fn run(&self) -> InquiryResult<usize> {
        exec::delete(self)
    }

    pub fn run_async(
        self,
        callback: impl FnOnce(InquiryResult<usize>) + Send + 'static,
    ) -> InquiryResult<()>
    where
        T: Send + 'static,
    {
        let handler = self.source.handler.clone();
        handler.post(move || callback(self.run()))
    }
}
