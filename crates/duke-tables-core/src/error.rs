//! Error types for duke-tables-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in duke-tables-core
#[derive(Debug, Error)]
pub enum Error {
    /// Table not found by ID or title
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Column not found in a table
    #[error("Column {column} not found in table {table}")]
    ColumnNotFound { table: String, column: String },

    /// Unrecognised UI type name
    #[error("Unknown column type: {0}")]
    UnknownUiType(String),
}
