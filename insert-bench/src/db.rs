//! Database handle and scratch-table plumbing.
//!
//! A [`Database`] is a connection factory: the harness acquires a fresh
//! [`Connection`] for each trial and drops it when the trial ends. `:memory:`
//! is served from a named shared-cache database that an anchor connection
//! keeps alive for as long as the handle exists.

use crate::error::BenchResult;
use crate::sql;
use bench_core::dataset::ColumnType;
use rusqlite::{Connection, OpenFlags};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const MEMORY: &str = ":memory:";

static MEMORY_DB_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Pragmas applied to every connection the handle hands out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub journal_mode: String,
    pub synchronous: String,
    pub busy_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            journal_mode: "WAL".to_string(),
            synchronous: "NORMAL".to_string(),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

enum Target {
    File(PathBuf),
    SharedMemory(String),
}

pub struct Database {
    target: Target,
    settings: ConnectionSettings,
    // Holds a shared-cache memory database open between trials.
    _anchor: Option<Connection>,
}

impl Database {
    /// Open a handle for `connection`: a SQLite file path or `:memory:`.
    pub fn open(connection: &str, settings: ConnectionSettings) -> BenchResult<Self> {
        if connection != MEMORY {
            return Ok(Self {
                target: Target::File(PathBuf::from(connection)),
                settings,
                _anchor: None,
            });
        }

        let uri = format!(
            "file:insert-bench-{}-{}?mode=memory&cache=shared",
            std::process::id(),
            MEMORY_DB_SEQ.fetch_add(1, Ordering::Relaxed)
        );
        let anchor = Connection::open_with_flags(&uri, Self::flags())?;
        Ok(Self {
            target: Target::SharedMemory(uri),
            settings,
            _anchor: Some(anchor),
        })
    }

    fn flags() -> OpenFlags {
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
    }

    /// Acquire a configured connection. Dropping it releases it.
    pub fn connect(&self) -> BenchResult<Connection> {
        let conn = match &self.target {
            Target::File(path) => Connection::open_with_flags(path, Self::flags())?,
            Target::SharedMemory(uri) => Connection::open_with_flags(uri, Self::flags())?,
        };
        conn.busy_timeout(self.settings.busy_timeout)?;
        let mode = set_journal_mode(&conn, &self.settings.journal_mode)?;
        conn.pragma_update(None, "synchronous", &self.settings.synchronous)?;
        log::trace!(
            "connected to {} (journal_mode={mode}, synchronous={})",
            self.describe(),
            self.settings.synchronous
        );
        Ok(conn)
    }

    pub fn describe(&self) -> String {
        match &self.target {
            Target::File(path) => path.display().to_string(),
            Target::SharedMemory(_) => MEMORY.to_string(),
        }
    }
}

/// Set `journal_mode` and return the mode SQLite actually settled on.
fn set_journal_mode(conn: &Connection, mode: &str) -> BenchResult<String> {
    Ok(conn.pragma_update_and_check(None, "journal_mode", mode, |row| row.get(0))?)
}

pub fn table_exists(conn: &Connection, table: &str) -> BenchResult<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [table],
        |row| row.get(0),
    )?)
}

/// Drop `table` if present; a missing table is not an error.
pub fn drop_table(conn: &Connection, table: &str) -> BenchResult<()> {
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", sql::quote_ident(table)))?;
    Ok(())
}

/// Drop and recreate `table` with the given column affinities.
pub fn replace_table(
    conn: &Connection,
    table: &str,
    columns: &[String],
    types: &[ColumnType],
) -> BenchResult<()> {
    drop_table(conn, table)?;
    conn.execute_batch(&sql::create_table(table, columns, types))?;
    Ok(())
}

pub fn row_count(conn: &Connection, table: &str) -> BenchResult<u64> {
    let n: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", sql::quote_ident(table)),
        [],
        |row| row.get(0),
    )?;
    Ok(n as u64)
}

/// Write-durability state of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Durability {
    pub journal_mode: String,
    pub synchronous: i64,
}

impl Durability {
    pub fn read(conn: &Connection) -> BenchResult<Self> {
        Ok(Self {
            journal_mode: conn.pragma_query_value(None, "journal_mode", |row| row.get(0))?,
            synchronous: conn.pragma_query_value(None, "synchronous", |row| row.get(0))?,
        })
    }

    fn apply(&self, conn: &Connection) -> BenchResult<()> {
        set_journal_mode(conn, &self.journal_mode)?;
        conn.pragma_update(None, "synchronous", self.synchronous)?;
        Ok(())
    }
}

/// Turns journaling and syncing off for the lifetime of the guard.
///
/// [`restore`](Self::restore) puts the previous settings back and reports
/// failures; if the guard is dropped without it (an error path), `Drop`
/// restores and logs whatever goes wrong.
pub struct DurabilityGuard<'c> {
    conn: &'c mut Connection,
    saved: Durability,
    restored: bool,
}

impl<'c> DurabilityGuard<'c> {
    pub fn relax(conn: &'c mut Connection) -> BenchResult<Self> {
        let saved = Durability::read(conn)?;
        let guard = Self {
            conn,
            saved,
            restored: false,
        };
        let mode = set_journal_mode(&*guard.conn, "OFF")?;
        guard.conn.pragma_update(None, "synchronous", "OFF")?;
        log::debug!(
            "durability relaxed (journal_mode {} -> {mode})",
            guard.saved.journal_mode
        );
        Ok(guard)
    }

    pub fn saved(&self) -> &Durability {
        &self.saved
    }

    pub fn restore(mut self) -> BenchResult<()> {
        self.restored = true;
        self.saved.apply(&*self.conn)
    }
}

impl Deref for DurabilityGuard<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &*self.conn
    }
}

impl DerefMut for DurabilityGuard<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut *self.conn
    }
}

impl Drop for DurabilityGuard<'_> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = self.saved.apply(&*self.conn) {
            log::error!(
                "failed to restore durability (journal_mode={}, synchronous={}): {e}",
                self.saved.journal_mode,
                self.saved.synchronous
            );
        }
    }
}
