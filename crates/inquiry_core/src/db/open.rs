//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by query execution.
//! - Record the requested database version in `PRAGMA user_version`.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections carry `user_version == requested version`.

use super::{DbError, DbResult};
use log::{debug, error, info};
use rusqlite::Connection;
use std::cmp::Ordering;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating when missing) the database file at `path`.
///
/// Parent directories are created on demand.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the file was last opened with a
///   higher version than `version`.
/// - `DbError::Io` when the parent directory cannot be created.
pub fn open_database(path: impl AsRef<Path>, version: u32) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    debug!(
        "event=db_open module=db status=start mode=file version={version} path={}",
        path.display()
    );

    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if let Err(err) = std::fs::create_dir_all(parent) {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_dir_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    }

    let conn = Connection::open(path).map_err(|err| {
        error!(
            "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        DbError::from(err)
    })?;

    finish_open(conn, "file", version, started_at)
}

/// Opens a private in-memory database at `version`.
pub fn open_database_in_memory(version: u32) -> DbResult<Connection> {
    let started_at = Instant::now();
    debug!("event=db_open module=db status=start mode=memory version={version}");

    let conn = Connection::open_in_memory().map_err(|err| {
        error!(
            "event=db_open module=db status=error mode=memory duration_ms={} error_code=db_open_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        DbError::from(err)
    })?;

    finish_open(conn, "memory", version, started_at)
}

fn finish_open(
    conn: Connection,
    mode: &str,
    version: u32,
    started_at: Instant,
) -> DbResult<Connection> {
    match bootstrap_connection(&conn, version) {
        Ok(()) => {
            debug!(
                "event=db_open module=db status=ok mode={mode} version={version} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &Connection, version: u32) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    reconcile_user_version(conn, version)
}

fn reconcile_user_version(conn: &Connection, version: u32) -> DbResult<()> {
    let current = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;

    match current.cmp(&version) {
        Ordering::Equal => Ok(()),
        Ordering::Greater => Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            requested_version: version,
        }),
        Ordering::Less => {
            conn.execute_batch(&format!("PRAGMA user_version = {version};"))?;
            if current != 0 {
                info!(
                    "event=db_upgrade module=db status=ok from_version={current} to_version={version}"
                );
            }
            Ok(())
        }
    }
}
