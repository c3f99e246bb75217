//! Identifier validation and SQL text builders.
//!
//! # Invariants
//! - Identifiers match `^[A-Za-z_][A-Za-z0-9_]*$` and are always emitted quoted.
//! - Selection clauses and sort orders are caller-provided SQL fragments and
//!   are embedded verbatim; their values bind through `?` placeholders.

use super::{DbError, DbResult};
use crate::model::record::{Column, ColumnType};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern must compile")
});

/// Rejects anything that is not a plain SQL identifier.
pub fn validate_identifier(value: &str) -> DbResult<()> {
    if IDENTIFIER_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(value.to_string()))
    }
}

/// Wraps an identifier in double quotes, escaping embedded quotes.
pub fn quote_identifier(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn checked(value: &str) -> DbResult<String> {
    validate_identifier(value)?;
    Ok(quote_identifier(value))
}

fn column_type_sql(kind: ColumnType) -> &'static str {
    match kind {
        ColumnType::Integer => "INTEGER",
        ColumnType::Real => "REAL",
        ColumnType::Text => "TEXT",
        ColumnType::Blob => "BLOB",
    }
}

/// Builds `CREATE TABLE IF NOT EXISTS` for a record schema.
///
/// A single primary-key column is declared inline (with `AUTOINCREMENT`
/// when requested); several primary-key columns become a table constraint.
pub fn create_table_sql(table: &str, columns: &[Column]) -> DbResult<String> {
    let table_sql = checked(table)?;
    if columns.is_empty() {
        return Err(DbError::EmptySchema(table.to_string()));
    }

    let key_count = columns.iter().filter(|column| column.primary_key).count();
    let mut definitions = Vec::with_capacity(columns.len() + 1);
    for column in columns {
        let mut definition = format!("{} {}", checked(column.name)?, column_type_sql(column.kind));
        if column.primary_key && key_count == 1 {
            definition.push_str(" PRIMARY KEY");
            if column.auto_increment && column.kind == ColumnType::Integer {
                definition.push_str(" AUTOINCREMENT");
            }
        }
        if column.not_null {
            definition.push_str(" NOT NULL");
        }
        definitions.push(definition);
    }

    if key_count > 1 {
        let keys = columns
            .iter()
            .filter(|column| column.primary_key)
            .map(|column| quote_identifier(column.name))
            .collect::<Vec<_>>()
            .join(", ");
        definitions.push(format!("PRIMARY KEY ({keys})"));
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {table_sql} ({});",
        definitions.join(", ")
    ))
}

/// Creates `table` from `columns` unless it already exists.
pub fn ensure_table(conn: &Connection, table: &str, columns: &[Column]) -> DbResult<()> {
    conn.execute_batch(&create_table_sql(table, columns)?)?;
    Ok(())
}

/// Runs `DROP TABLE IF EXISTS` for `table`.
pub fn drop_table(conn: &Connection, table: &str) -> DbResult<()> {
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", checked(table)?))?;
    Ok(())
}

/// Builds a `SELECT` over `table`; `*` when no projection is given.
pub fn select_sql(
    table: &str,
    projection: Option<&[String]>,
    selection: Option<&str>,
    sort_order: Option<&str>,
    limit: Option<u32>,
) -> DbResult<String> {
    let columns = match projection {
        Some(columns) if !columns.is_empty() => columns
            .iter()
            .map(|column| checked(column))
            .collect::<DbResult<Vec<_>>>()?
            .join(", "),
        _ => "*".to_string(),
    };

    let mut sql = format!("SELECT {columns} FROM {}", checked(table)?);
    push_where(&mut sql, selection);
    if let Some(order) = sort_order.map(str::trim).filter(|order| !order.is_empty()) {
        sql.push_str(" ORDER BY ");
        sql.push_str(order);
    }
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    Ok(sql)
}

/// Builds `SELECT COUNT(*)` over `table`.
pub fn count_sql(table: &str, selection: Option<&str>) -> DbResult<String> {
    let mut sql = format!("SELECT COUNT(*) FROM {}", checked(table)?);
    push_where(&mut sql, selection);
    Ok(sql)
}

/// Builds an `INSERT` with one positional placeholder per column.
pub fn insert_sql<'a>(table: &str, columns: impl IntoIterator<Item = &'a str>) -> DbResult<String> {
    let table_sql = checked(table)?;
    let columns = columns
        .into_iter()
        .map(checked)
        .collect::<DbResult<Vec<_>>>()?;
    if columns.is_empty() {
        return Ok(format!("INSERT INTO {table_sql} DEFAULT VALUES"));
    }
    let placeholders = vec!["?"; columns.len()].join(", ");
    Ok(format!(
        "INSERT INTO {table_sql} ({}) VALUES ({placeholders})",
        columns.join(", ")
    ))
}

/// Builds an `UPDATE`; assignment placeholders come before selection ones.
pub fn update_sql<'a>(
    table: &str,
    columns: impl IntoIterator<Item = &'a str>,
    selection: Option<&str>,
) -> DbResult<String> {
    let assignments = columns
        .into_iter()
        .map(|column| checked(column).map(|quoted| format!("{quoted} = ?")))
        .collect::<DbResult<Vec<_>>>()?;
    let mut sql = format!("UPDATE {} SET {}", checked(table)?, assignments.join(", "));
    push_where(&mut sql, selection);
    Ok(sql)
}

/// Builds a `DELETE`; no selection deletes every row.
pub fn delete_sql(table: &str, selection: Option<&str>) -> DbResult<String> {
    let mut sql = format!("DELETE FROM {}", checked(table)?);
    push_where(&mut sql, selection);
    Ok(sql)
}

fn push_where(sql: &mut String, selection: Option<&str>) {
    if let Some(clause) = selection.map(str::trim).filter(|clause| !clause.is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(clause);
    }
}
