//! SQL text helpers: identifier quoting, literal rendering and statement
//! builders shared by the insert strategies.

use crate::error::{BenchError, BenchResult};
use bench_core::dataset::{ColumnType, Value};
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};

/// Largest number of bound parameters one statement may carry
/// (`SQLITE_MAX_VARIABLE_NUMBER` in the bundled build).
pub const MAX_BOUND_PARAMETERS: usize = 32_766;

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn create_table(table: &str, columns: &[String], types: &[ColumnType]) -> String {
    let defs = columns
        .iter()
        .zip(types)
        .map(|(c, t)| format!("{} {}", quote_ident(c), t))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({})", quote_ident(table), defs)
}

/// `INSERT INTO t (a, b) VALUES (?, ?), (?, ?)` for `rows` placeholder tuples.
pub fn insert_placeholders(table: &str, columns: &[String], rows: usize) -> String {
    let tuple = format!("({})", vec!["?"; columns.len()].join(", "));
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(table),
        column_list(columns),
        vec![tuple.as_str(); rows].join(", ")
    )
}

/// `INSERT INTO t (a, b) VALUES (1, 'x'), ...` with every row inlined.
pub fn insert_literals(table: &str, columns: &[String], rows: &[Vec<Value>]) -> BenchResult<String> {
    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ",
        quote_ident(table),
        column_list(columns)
    );
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for (j, value) in row.iter().enumerate() {
            if j > 0 {
                sql.push_str(", ");
            }
            push_literal(&mut sql, value)?;
        }
        sql.push(')');
    }
    Ok(sql)
}

/// Append `value` as an SQL literal.
pub fn push_literal(sql: &mut String, value: &Value) -> BenchResult<()> {
    match value {
        Value::Null => sql.push_str("NULL"),
        Value::Integer(i) => sql.push_str(&i.to_string()),
        Value::Real(f) if f.is_finite() => sql.push_str(&format!("{f:?}")),
        Value::Real(f) => return Err(BenchError::InvalidLiteral(f.to_string())),
        Value::Text(s) if s.contains('\0') => {
            return Err(BenchError::InvalidLiteral(format!("{s:?}")));
        }
        Value::Text(s) => {
            sql.push('\'');
            sql.push_str(&s.replace('\'', "''"));
            sql.push('\'');
        }
    }
    Ok(())
}

/// Binds a dataset cell without copying text.
pub struct Param<'a>(pub &'a Value);

impl ToSql for Param<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("test_table"), "\"test_table\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn literals_escape_quotes() {
        let mut sql = String::new();
        push_literal(&mut sql, &Value::Text("O'Hara".into())).unwrap();
        assert_eq!(sql, "'O''Hara'");

        let mut sql = String::new();
        push_literal(&mut sql, &Value::Real(1.0)).unwrap();
        assert_eq!(sql, "1.0");
    }

    #[test]
    fn literals_reject_what_sql_cannot_spell() {
        let mut sql = String::new();
        assert!(matches!(
            push_literal(&mut sql, &Value::Real(f64::NAN)),
            Err(BenchError::InvalidLiteral(_))
        ));
        assert!(matches!(
            push_literal(&mut sql, &Value::Text("a\0b".into())),
            Err(BenchError::InvalidLiteral(_))
        ));
    }

    #[test]
    fn placeholder_statement_has_one_tuple_per_row() {
        let sql = insert_placeholders("t", &cols(&["a", "b"]), 3);
        assert_eq!(
            sql,
            "INSERT INTO \"t\" (\"a\", \"b\") VALUES (?, ?), (?, ?), (?, ?)"
        );
    }

    #[test]
    fn literal_statement_inlines_rows() {
        let rows = vec![
            vec![Value::Integer(1), Value::Null],
            vec![Value::Integer(2), Value::Text("x".into())],
        ];
        let sql = insert_literals("t", &cols(&["a", "b"]), &rows).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"t\" (\"a\", \"b\") VALUES (1, NULL), (2, 'x')"
        );
    }

    #[test]
    fn create_table_uses_inferred_types() {
        let sql = create_table(
            "t",
            &cols(&["n", "s"]),
            &[ColumnType::Integer, ColumnType::Text],
        );
        assert_eq!(sql, "CREATE TABLE \"t\" (\"n\" INTEGER, \"s\" TEXT)");
    }
}
