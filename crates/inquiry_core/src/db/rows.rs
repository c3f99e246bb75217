//! Row decoding into `ContentValues`.

use super::DbResult;
use crate::model::values::ContentValues;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

/// Runs `sql` with positional `args` and decodes every row by column name.
pub fn collect_values(conn: &Connection, sql: &str, args: &[Value]) -> DbResult<Vec<ContentValues>> {
    let mut stmt = conn.prepare(sql)?;
    let names = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let mut rows = stmt.query(params_from_iter(args.iter()))?;
    let mut decoded = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = ContentValues::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            values.put(name.clone(), row.get::<_, Value>(index)?);
        }
        decoded.push(values);
    }

    Ok(decoded)
}
