//! Provider that exposes the tables of one SQLite database file.
//!
//! # Responsibility
//! - Serve `content://<authority>/<table>` (whole table) and
//!   `content://<authority>/<table>/<rowid>` (single row) requests.
//!
//! # Invariants
//! - Each request opens and closes its own connection at the configured version.
//! - Row-id URIs AND `rowid = ?` onto the caller's selection.

use super::{ContentProvider, ProviderError, ProviderResult};
use crate::db::schema::{delete_sql, insert_sql, select_sql, update_sql};
use crate::db::{collect_values, open_database};
use crate::model::selection::Selection;
use crate::model::values::ContentValues;
use crate::uri::ContentUri;
use rusqlite::{params_from_iter, Connection};
use std::path::PathBuf;

pub struct TableProvider {
    authority: String,
    database_path: PathBuf,
    database_version: u32,
}

struct TableTarget<'a> {
    table: &'a str,
    row_id: Option<i64>,
}

impl TableProvider {
    pub fn new(
        authority: impl Into<String>,
        database_path: impl Into<PathBuf>,
        database_version: u32,
    ) -> Self {
        Self {
            authority: authority.into(),
            database_path: database_path.into(),
            database_version,
        }
    }

    fn open(&self) -> ProviderResult<Connection> {
        Ok(open_database(&self.database_path, self.database_version)?)
    }

    fn target<'a>(&self, uri: &'a ContentUri) -> ProviderResult<TableTarget<'a>> {
        match uri.path_segments() {
            [table] => Ok(TableTarget {
                table: table.as_str(),
                row_id: None,
            }),
            [table, id] => {
                let row_id = id
                    .parse::<i64>()
                    .map_err(|_| ProviderError::UnsupportedUri(uri.to_string()))?;
                Ok(TableTarget {
                    table: table.as_str(),
                    row_id: Some(row_id),
                })
            }
            _ => Err(ProviderError::UnsupportedUri(uri.to_string())),
        }
    }
}

impl TableTarget<'_> {
    fn scoped(&self, selection: &Selection) -> Selection {
        match self.row_id {
            Some(id) => selection.clone().and("rowid = ?", [id]),
            None => selection.clone(),
        }
    }
}

impl ContentProvider for TableProvider {
    fn authority(&self) -> &str {
        &self.authority
    }

    fn query(
        &self,
        uri: &ContentUri,
        projection: Option<&[String]>,
        selection: &Selection,
        sort_order: Option<&str>,
    ) -> ProviderResult<Vec<ContentValues>> {
        let target = self.target(uri)?;
        let selection = target.scoped(selection);
        let sql = select_sql(target.table, projection, selection.clause(), sort_order, None)?;
        let conn = self.open()?;
        Ok(collect_values(&conn, &sql, selection.args())?)
    }

    fn insert(&self, uri: &ContentUri, values: &ContentValues) -> ProviderResult<ContentUri> {
        let target = self.target(uri)?;
        if target.row_id.is_some() {
            return Err(ProviderError::UnsupportedUri(uri.to_string()));
        }

        let sql = insert_sql(target.table, values.columns())?;
        let conn = self.open()?;
        conn.execute(&sql, params_from_iter(values.values()))?;
        Ok(uri.with_appended_id(conn.last_insert_rowid()))
    }

    fn update(
        &self,
        uri: &ContentUri,
        values: &ContentValues,
        selection: &Selection,
    ) -> ProviderResult<usize> {
        if values.is_empty() {
            return Err(ProviderError::Rejected("update without values".to_string()));
        }
        let target = self.target(uri)?;
        let selection = target.scoped(selection);
        let sql = update_sql(target.table, values.columns(), selection.clause())?;
        let conn = self.open()?;
        let changed = conn.execute(
            &sql,
            params_from_iter(values.values().chain(selection.args().iter())),
        )?;
        Ok(changed)
    }

    fn delete(&self, uri: &ContentUri, selection: &Selection) -> ProviderResult<usize> {
        let target = self.target(uri)?;
        let selection = target.scoped(selection);
        let sql = delete_sql(target.table, selection.clause())?;
        let conn = self.open()?;
        let changed = conn.execute(&sql, params_from_iter(selection.args().iter()))?;
        Ok(changed)
    }
}
