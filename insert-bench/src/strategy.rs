//! The fixed menu of row-insertion strategies.
//!
//! Every strategy takes the same inputs (target table, connection, column
//! names, rows) and is dispatched through [`Strategy::insert`]. Strategies
//! never create the table themselves; the harness does that before each
//! repetition.

use crate::copy;
use crate::db::{self, DurabilityGuard};
use crate::error::{BenchError, BenchResult};
use crate::sql::{self, Param, MAX_BOUND_PARAMETERS};
use bench_core::dataset::Value;
use bitflags::bitflags;
use rusqlite::{params_from_iter, Connection};
use std::fmt;
use std::path::Path;

/// Rows per statement for [`Strategy::PagedValues`] when no chunk size is given.
pub const DEFAULT_PAGE_SIZE: usize = 100;

bitflags! {
    /// What a strategy does with the rows it is handed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        /// Handles rows one at a time.
        const STREAM = 1 << 0;
        /// Groups many rows into one statement or transaction.
        const BATCH = 1 << 1;
        /// Goes through the copy protocol.
        const BULK_COPY = 1 << 2;
        /// Relaxes write durability while it loads.
        const UNLOGGED = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Autocommit, one freshly prepared INSERT per row.
    RowByRow,
    /// One multi-row `VALUES (?, ..), (?, ..)` statement per chunk.
    MultiRowParams,
    /// Copy protocol fed from a temp file.
    CopyTempFile,
    /// Copy protocol fed from an in-memory buffer.
    CopyBuffer,
    /// [`Strategy::CopyBuffer`] with journaling and syncing switched off.
    CopyBufferUnlogged,
    /// One prepared single-row statement executed per row in one transaction.
    ExecuteMany,
    /// One INSERT with every row inlined as literals.
    InlineValues,
    /// Inlined literals paged into statements of a bounded number of rows.
    PagedValues,
}

/// Where rows go.
#[derive(Debug, Clone, Copy)]
pub struct InsertTarget<'a> {
    pub table: &'a str,
    pub columns: &'a [String],
}

#[derive(Debug, Clone, Copy)]
pub struct InsertOptions<'a> {
    /// Rows per statement for the chunking strategies.
    pub chunk_size: Option<usize>,
    /// Directory for [`Strategy::CopyTempFile`].
    pub temp_dir: &'a Path,
}

impl Strategy {
    /// Run order used by the comparison.
    pub const ALL: [Strategy; 8] = [
        Strategy::RowByRow,
        Strategy::MultiRowParams,
        Strategy::CopyTempFile,
        Strategy::CopyBuffer,
        Strategy::CopyBufferUnlogged,
        Strategy::ExecuteMany,
        Strategy::InlineValues,
        Strategy::PagedValues,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::RowByRow => "row_by_row",
            Strategy::MultiRowParams => "multi_row_params",
            Strategy::CopyTempFile => "copy_temp_file",
            Strategy::CopyBuffer => "copy_buffer",
            Strategy::CopyBufferUnlogged => "copy_buffer_unlogged",
            Strategy::ExecuteMany => "execute_many",
            Strategy::InlineValues => "inline_values",
            Strategy::PagedValues => "paged_values",
        }
    }

    pub fn capabilities(self) -> Capabilities {
        match self {
            Strategy::RowByRow => Capabilities::STREAM,
            Strategy::MultiRowParams => Capabilities::BATCH,
            Strategy::CopyTempFile | Strategy::CopyBuffer => {
                Capabilities::STREAM | Capabilities::BULK_COPY
            }
            Strategy::CopyBufferUnlogged => {
                Capabilities::STREAM | Capabilities::BULK_COPY | Capabilities::UNLOGGED
            }
            Strategy::ExecuteMany => Capabilities::STREAM | Capabilities::BATCH,
            Strategy::InlineValues | Strategy::PagedValues => Capabilities::BATCH,
        }
    }

    /// Insert `rows` into an existing table, returning the number inserted.
    ///
    /// Fails with [`BenchError::MissingTable`] before touching any row when
    /// the target table is absent.
    pub fn insert(
        self,
        conn: &mut Connection,
        target: &InsertTarget<'_>,
        rows: &[Vec<Value>],
        options: &InsertOptions<'_>,
    ) -> BenchResult<u64> {
        if target.columns.is_empty() {
            return Err(BenchError::EmptySchema);
        }
        if !db::table_exists(conn, target.table)? {
            return Err(BenchError::MissingTable(target.table.to_string()));
        }

        let InsertTarget { table, columns } = *target;
        match self {
            Strategy::RowByRow => row_by_row(conn, table, columns, rows),
            Strategy::MultiRowParams => {
                multi_row_params(conn, table, columns, rows, options.chunk_size)
            }
            Strategy::CopyTempFile => {
                copy::copy_via_temp_file(conn, table, columns, rows, options.temp_dir)
            }
            Strategy::CopyBuffer => copy::copy_via_buffer(conn, table, columns, rows),
            Strategy::CopyBufferUnlogged => {
                let mut relaxed = DurabilityGuard::relax(conn)?;
                let loaded = copy::copy_via_buffer(&mut relaxed, table, columns, rows)?;
                relaxed.restore()?;
                Ok(loaded)
            }
            Strategy::ExecuteMany => execute_many(conn, table, columns, rows),
            Strategy::InlineValues => inline_values(conn, table, columns, rows),
            Strategy::PagedValues => paged_values(
                conn,
                table,
                columns,
                rows,
                options.chunk_size.unwrap_or(DEFAULT_PAGE_SIZE),
            ),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rows per multi-row statement: the requested chunk, capped by the bound
/// parameter limit, and never zero.
pub fn rows_per_statement(columns: usize, chunk_size: Option<usize>) -> usize {
    let cap = (MAX_BOUND_PARAMETERS / columns.max(1)).max(1);
    chunk_size.map_or(cap, |c| c.clamp(1, cap))
}

fn row_by_row(conn: &Connection, table: &str, columns: &[String], rows: &[Vec<Value>]) -> BenchResult<u64> {
    let insert = sql::insert_placeholders(table, columns, 1);
    for row in rows {
        conn.execute(&insert, params_from_iter(row.iter().map(Param)))?;
    }
    Ok(rows.len() as u64)
}

fn multi_row_params(
    conn: &mut Connection,
    table: &str,
    columns: &[String],
    rows: &[Vec<Value>],
    chunk_size: Option<usize>,
) -> BenchResult<u64> {
    let per_statement = rows_per_statement(columns.len(), chunk_size);
    let tx = conn.transaction()?;
    for chunk in rows.chunks(per_statement) {
        let mut stmt = tx.prepare_cached(&sql::insert_placeholders(table, columns, chunk.len()))?;
        stmt.execute(params_from_iter(chunk.iter().flatten().map(Param)))?;
    }
    tx.commit()?;
    Ok(rows.len() as u64)
}

fn execute_many(
    conn: &mut Connection,
    table: &str,
    columns: &[String],
    rows: &[Vec<Value>],
) -> BenchResult<u64> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&sql::insert_placeholders(table, columns, 1))?;
        for row in rows {
            stmt.execute(params_from_iter(row.iter().map(Param)))?;
        }
    }
    tx.commit()?;
    Ok(rows.len() as u64)
}

fn inline_values(conn: &Connection, table: &str, columns: &[String], rows: &[Vec<Value>]) -> BenchResult<u64> {
    if rows.is_empty() {
        return Ok(0);
    }
    conn.execute(&sql::insert_literals(table, columns, rows)?, [])?;
    Ok(rows.len() as u64)
}

fn paged_values(
    conn: &mut Connection,
    table: &str,
    columns: &[String],
    rows: &[Vec<Value>],
    page_size: usize,
) -> BenchResult<u64> {
    let tx = conn.transaction()?;
    for page in rows.chunks(page_size.max(1)) {
        tx.execute(&sql::insert_literals(table, columns, page)?, [])?;
    }
    tx.commit()?;
    Ok(rows.len() as u64)
}
