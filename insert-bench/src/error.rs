use thiserror::Error;

pub type BenchResult<T> = Result<T, BenchError>;

/// Errors raised while preparing, loading or timing the scratch table.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    /// A strategy ran while its target table was absent.
    #[error("scratch table `{0}` does not exist")]
    MissingTable(String),

    #[error("dataset has no columns")]
    EmptySchema,

    #[error("repetitions must be at least 1")]
    ZeroRepetitions,

    #[error("copy header mismatch: expected {expected:?}, got {actual:?}")]
    HeaderMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("value cannot be written as an SQL literal: {0}")]
    InvalidLiteral(String),
}
