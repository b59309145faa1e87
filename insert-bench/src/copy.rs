//! Bulk "copy from stream" for SQLite.
//!
//! Rows travel as headed CSV with `\N` for NULL, the same text format a
//! server-side `COPY ... FROM STDIN` consumes. [`copy_from`] reads any such
//! stream and loads it in a single transaction through one prepared
//! statement; every field binds as text and the column affinity converts it.
//!
//! A text cell whose content is exactly `\N` reads back as NULL.

use crate::error::{BenchError, BenchResult};
use crate::sql;
use bench_core::dataset::Value;
use rusqlite::{params_from_iter, Connection};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub const NULL_MARKER: &str = "\\N";

/// Temp files created by [`copy_via_temp_file`] start with this prefix.
pub const TEMP_FILE_PREFIX: &str = "insert-bench-copy-";

/// Serialise `columns` and `rows` as copy-format CSV.
pub fn write_rows<W: Write>(writer: W, columns: &[String], rows: &[Vec<Value>]) -> BenchResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(columns)?;
    for row in rows {
        for value in row {
            match value {
                Value::Null => csv.write_field(NULL_MARKER)?,
                Value::Integer(i) => csv.write_field(i.to_string())?,
                Value::Real(f) => csv.write_field(format!("{f:?}"))?,
                Value::Text(s) => csv.write_field(s)?,
            }
        }
        csv.write_record(None::<&[u8]>)?;
    }
    csv.flush()?;
    Ok(())
}

/// Load a copy-format stream into `table`, returning the number of rows.
pub fn copy_from<R: Read>(
    conn: &mut Connection,
    table: &str,
    columns: &[String],
    reader: R,
) -> BenchResult<u64> {
    let mut csv = csv::Reader::from_reader(reader);
    let header: Vec<String> = csv.headers()?.iter().map(str::to_string).collect();
    if header != columns {
        return Err(BenchError::HeaderMismatch {
            expected: columns.to_vec(),
            actual: header,
        });
    }

    let tx = conn.transaction()?;
    let mut loaded = 0u64;
    {
        let mut stmt = tx.prepare(&sql::insert_placeholders(table, columns, 1))?;
        let mut record = csv::StringRecord::new();
        while csv.read_record(&mut record)? {
            stmt.execute(params_from_iter(
                record
                    .iter()
                    .map(|field| (field != NULL_MARKER).then_some(field)),
            ))?;
            loaded += 1;
        }
    }
    tx.commit()?;

    Ok(loaded)
}

/// Serialise to an in-memory buffer and copy from it.
pub fn copy_via_buffer(
    conn: &mut Connection,
    table: &str,
    columns: &[String],
    rows: &[Vec<Value>],
) -> BenchResult<u64> {
    let mut buf = Vec::new();
    write_rows(&mut buf, columns, rows)?;
    copy_from(conn, table, columns, buf.as_slice())
}

/// Serialise to a temp file in `dir` and copy from it.
///
/// The file is owned by a [`tempfile::NamedTempFile`], so it is deleted when
/// this returns, whether the load succeeded or not.
pub fn copy_via_temp_file(
    conn: &mut Connection,
    table: &str,
    columns: &[String],
    rows: &[Vec<Value>],
    dir: &Path,
) -> BenchResult<u64> {
    let mut file = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .suffix(".csv")
        .tempfile_in(dir)?;
    write_rows(BufWriter::new(file.as_file_mut()), columns, rows)?;
    log::trace!("copy file {} written", file.path().display());

    let loaded = copy_from(conn, table, columns, BufReader::new(file.reopen()?))?;
    file.close()?;
    Ok(loaded)
}
