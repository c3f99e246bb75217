//! Query execution against local tables and content providers.

use super::{Delete, Insert, Query, QueryKind, QueryTarget, Select, Update};
use crate::db::schema::{count_sql, delete_sql, ensure_table, insert_sql, select_sql, update_sql};
use crate::db::{collect_values, open_database, DbError};
use crate::error::{InquiryError, InquiryResult};
use crate::model::record::{writable_values, Record};
use crate::model::values::ContentValues;
use log::{debug, error};
use rusqlite::{params_from_iter, Connection};
use std::time::Instant;

pub(super) fn select<T: Record>(
    query: &Query<T, Select>,
    limit: Option<u32>,
) -> InquiryResult<Vec<T>> {
    logged(query, || {
        let rows = match &query.source.target {
            QueryTarget::Table(table) => {
                let conn = open_table(query, table)?;
                let sql = select_sql(
                    table,
                    query.projection.as_deref(),
                    query.selection.clause(),
                    query.sort_order.as_deref(),
                    limit,
                )?;
                collect_values(&conn, &sql, query.selection.args())?
            }
            QueryTarget::Provider(uri) => {
                let mut rows = query.source.resolver.query(
                    uri,
                    query.projection.as_deref(),
                    &query.selection,
                    query.sort_order.as_deref(),
                )?;
                if let Some(limit) = limit {
                    rows.truncate(limit as usize);
                }
                rows
            }
        };

        rows.iter()
            .map(|values| T::from_values(values).map_err(InquiryError::from))
            .collect()
    })
}

pub(super) fn count<T: Record>(query: &Query<T, Select>) -> InquiryResult<usize> {
    logged(query, || match &query.source.target {
        QueryTarget::Table(table) => {
            let conn = open_table(query, table)?;
            let sql = count_sql(table, query.selection.clause())?;
            let count = conn.query_row(&sql, params_from_iter(query.selection.args()), |row| {
                row.get::<_, i64>(0)
            })?;
            Ok(usize::try_from(count).unwrap_or_default())
        }
        QueryTarget::Provider(uri) => Ok(query
            .source
            .resolver
            .query(uri, None, &query.selection, None)?
            .len()),
    })
}

pub(super) fn insert<T: Record>(query: &Query<T, Insert>) -> InquiryResult<Vec<i64>> {
    if query.rows.is_empty() {
        return Err(InquiryError::MissingValues(Insert::NAME));
    }

    logged(query, || match &query.source.target {
        QueryTarget::Table(table) => {
            let mut conn = open_table(query, table)?;
            let tx = conn.transaction()?;
            let mut ids = Vec::with_capacity(query.rows.len());
            for row in &query.rows {
                let values = writable_values(row);
                let sql = insert_sql(table, values.columns())?;
                tx.execute(&sql, params_from_iter(values.values()))?;
                ids.push(tx.last_insert_rowid());
            }
            tx.commit()?;
            Ok(ids)
        }
        QueryTarget::Provider(uri) => query
            .rows
            .iter()
            .map(|row| -> InquiryResult<i64> {
                let inserted = query.source.resolver.insert(uri, &writable_values(row))?;
                Ok(inserted.parse_id().unwrap_or(-1))
            })
            .collect(),
    })
}

pub(super) fn update<T: Record>(query: &Query<T, Update>) -> InquiryResult<usize> {
    let Some(row) = query.rows.first() else {
        return Err(InquiryError::MissingValues(Update::NAME));
    };
    let values = update_values(row, query.projection.as_deref());
    if values.is_empty() {
        return Err(InquiryError::MissingValues(Update::NAME));
    }

    logged(query, || match &query.source.target {
        QueryTarget::Table(table) => {
            let conn = open_table(query, table)?;
            let sql = update_sql(table, values.columns(), query.selection.clause())?;
            let changed = conn.execute(
                &sql,
                params_from_iter(values.values().chain(query.selection.args())),
            )?;
            Ok(changed)
        }
        QueryTarget::Provider(uri) => {
            Ok(query
                .source
                .resolver
                .update(uri, &values, &query.selection)?)
        }
    })
}

pub(super) fn delete<T: Record>(query: &Query<T, Delete>) -> InquiryResult<usize> {
    logged(query, || match &query.source.target {
        QueryTarget::Table(table) => {
            let conn = open_table(query, table)?;
            let sql = delete_sql(table, query.selection.clause())?;
            Ok(conn.execute(&sql, params_from_iter(query.selection.args()))?)
        }
        QueryTarget::Provider(uri) => Ok(query.source.resolver.delete(uri, &query.selection)?),
    })
}

fn update_values<T: Record>(row: &T, columns: Option<&[String]>) -> ContentValues {
    let mut values = writable_values(row);
    if let Some(columns) = columns {
        values.retain_columns(columns);
    }
    values
}

fn open_table<T: Record, K>(query: &Query<T, K>, table: &str) -> InquiryResult<Connection> {
    let conn = open_database(&query.source.database_path, query.source.database_version)?;
    ensure_table(&conn, table, &T::columns())?;
    Ok(conn)
}

fn logged<T, K: QueryKind, R>(
    query: &Query<T, K>,
    run: impl FnOnce() -> InquiryResult<R>,
) -> InquiryResult<R> {
    if let Some(column) = &query.invalid_column {
        return Err(DbError::InvalidIdentifier(column.clone()).into());
    }

    let started_at = Instant::now();
    let target = match &query.source.target {
        QueryTarget::Table(table) => format!("table:{table}"),
        QueryTarget::Provider(uri) => uri.to_string(),
    };

    let result = run();
    match &result {
        Ok(_) => debug!(
            "event=query_run module=query status=ok kind={} target={} duration_ms={}",
            K::NAME,
            target,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=query_run module=query status=error kind={} target={} duration_ms={} error={}",
            K::NAME,
            target,
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}
