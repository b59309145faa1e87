//! In-memory tables: named columns over rows of loosely typed cells.
//!
//! A [`Dataset`] knows nothing about the records it carries; the column
//! affinities used to create a table are inferred from the cells themselves.

use anyhow::{bail, Context, Result};
use std::fmt;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    /// Parse a CSV field: empty is NULL, then integer, then real, then text.
    pub fn parse(field: &str) -> Self {
        if field.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = field.parse::<i64>() {
            return Value::Integer(i);
        }
        match field.parse::<f64>() {
            // "inf"/"NaN" parse as f64 but are words in a CSV cell.
            Ok(f) if f.is_finite() => Value::Real(f),
            _ => Value::Text(field.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Storage class a column is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn sql_name(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// Ordered rows sharing one list of column names.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            bail!(
                "row {} has {} values, expected {} ({:?})",
                i,
                row.len(),
                columns.len(),
                columns
            );
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Infer one storage class per column from the non-null cells.
    ///
    /// Integers widen to real when both appear; any text (or a column with
    /// no values at all) makes the column text.
    pub fn column_types(&self) -> Vec<ColumnType> {
        (0..self.columns.len())
            .map(|c| {
                let mut seen = None;
                for row in &self.rows {
                    let cell = match &row[c] {
                        Value::Null => continue,
                        Value::Integer(_) => ColumnType::Integer,
                        Value::Real(_) => ColumnType::Real,
                        Value::Text(_) => return ColumnType::Text,
                    };
                    seen = Some(match (seen, cell) {
                        (Some(ColumnType::Real), _) | (_, ColumnType::Real) => ColumnType::Real,
                        _ => ColumnType::Integer,
                    });
                }
                seen.unwrap_or(ColumnType::Text)
            })
            .collect()
    }

    /// Read a headed CSV stream, inferring each cell with [`Value::parse`].
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::Reader::from_reader(reader);
        let columns: Vec<String> = csv
            .headers()
            .context("reading CSV header")?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (i, record) in csv.records().enumerate() {
            let record = record.with_context(|| format!("reading CSV record {}", i + 1))?;
            rows.push(record.iter().map(Value::parse).collect());
        }

        Self::new(columns, rows)
    }

    pub fn read_csv_path(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        Self::read_csv(file).with_context(|| format!("loading {}", path.display()))
    }

    /// Write the header and every row; NULL becomes an empty field.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&self.columns)?;

        let mut fields: Vec<String> = Vec::with_capacity(self.columns.len());
        for row in &self.rows {
            fields.clear();
            fields.extend(row.iter().map(|v| match v {
                Value::Null => String::new(),
                Value::Integer(i) => i.to_string(),
                Value::Real(f) => format!("{f:?}"),
                Value::Text(s) => s.clone(),
            }));
            csv.write_record(&fields)?;
        }

        csv.flush()?;
        Ok(())
    }

    /// Write to `path`, creating missing parent directories first.
    pub fn write_csv_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        self.write_csv(std::io::BufWriter::new(file))
            .with_context(|| format!("writing {}", path.display()))
    }
}
