//! Formula error types

use std::fmt;

use duke_tables_core::FormulaDataType;
use thiserror::Error;

use crate::meta::MetaError;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Syntax error with the byte offset it was detected at
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at character {position}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Errors that can occur while parsing or validating a formula
#[derive(Debug, Error)]
pub enum FormulaError {
    /// Formula text could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Related table metadata could not be fetched
    #[error("Metadata for table {table_id} is not available: {source}")]
    NotAvailable {
        table_id: String,
        #[source]
        source: MetaError,
    },

    /// Construct the engine cannot type (unary operators, arrays, ...)
    #[error("{0} is not supported")]
    NotSupported(String),

    /// Fewer arguments than the function's minimum
    #[error("{function} requires at least {min} arguments, found {actual}")]
    MinArgs {
        function: String,
        min: usize,
        actual: usize,
    },

    /// More arguments than the function's maximum
    #[error("{function} accepts at most {max} arguments, found {actual}")]
    MaxArgs {
        function: String,
        max: usize,
        actual: usize,
    },

    /// Argument count differs from the function's exact requirement
    #[error("{function} requires {required} arguments, found {actual}")]
    RequiredArgs {
        function: String,
        required: usize,
        actual: usize,
    },

    /// Argument of the wrong type
    #[error(
        "{function}: {} with {actual} type is found but {expected} type is expected",
        describe_arg(.column)
    )]
    TypeMismatch {
        function: String,
        /// Set when the offending argument is a column reference
        column: Option<String>,
        expected: FormulaDataType,
        actual: FormulaDataType,
    },

    /// Argument value outside what the function accepts
    #[error("{function}: invalid value for argument {index}: {message}")]
    InvalidArgValue {
        function: String,
        index: usize,
        message: String,
    },

    /// Call to a function that does not exist
    #[error("Function {0} is not available")]
    InvalidFunctionName(String),

    /// Reference to a column that does not exist
    #[error("Invalid column name/id {0:?} in formula")]
    InvalidColumn(String),

    /// Formula columns reference each other
    #[error("Circular reference detected involving column {0}")]
    CircularReference(String),
}

fn describe_arg(column: &Option<String>) -> String {
    match column {
        Some(name) => format!("field {}", name),
        None => "argument".to_string(),
    }
}

/// Stable classification of a [`FormulaError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum FormulaErrorKind {
    ParseError,
    NotAvailable,
    NotSupported,
    MinArg,
    MaxArg,
    #[cfg_attr(feature = "serde", serde(rename = "INVALID_ARG_COUNT"))]
    InvalidArgCount,
    TypeMismatch,
    InvalidArgValue,
    InvalidFunctionName,
    InvalidColumn,
    CircularReference,
}

impl FormulaErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaErrorKind::ParseError => "PARSE_ERROR",
            FormulaErrorKind::NotAvailable => "NOT_AVAILABLE",
            FormulaErrorKind::NotSupported => "NOT_SUPPORTED",
            FormulaErrorKind::MinArg => "MIN_ARG",
            FormulaErrorKind::MaxArg => "MAX_ARG",
            FormulaErrorKind::InvalidArgCount => "INVALID_ARG_COUNT",
            FormulaErrorKind::TypeMismatch => "TYPE_MISMATCH",
            FormulaErrorKind::InvalidArgValue => "INVALID_ARG_VALUE",
            FormulaErrorKind::InvalidFunctionName => "INVALID_FUNCTION_NAME",
            FormulaErrorKind::InvalidColumn => "INVALID_COLUMN",
            FormulaErrorKind::CircularReference => "CIRCULAR_REFERENCE",
        }
    }
}

impl fmt::Display for FormulaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FormulaError {
    /// Classification tag of this error
    pub fn kind(&self) -> FormulaErrorKind {
        match self {
            FormulaError::Parse(_) => FormulaErrorKind::ParseError,
            FormulaError::NotAvailable { .. } => FormulaErrorKind::NotAvailable,
            FormulaError::NotSupported(_) => FormulaErrorKind::NotSupported,
            FormulaError::MinArgs { .. } => FormulaErrorKind::MinArg,
            FormulaError::MaxArgs { .. } => FormulaErrorKind::MaxArg,
            FormulaError::RequiredArgs { .. } => FormulaErrorKind::InvalidArgCount,
            FormulaError::TypeMismatch { .. } => FormulaErrorKind::TypeMismatch,
            FormulaError::InvalidArgValue { .. } => FormulaErrorKind::InvalidArgValue,
            FormulaError::InvalidFunctionName(_) => FormulaErrorKind::InvalidFunctionName,
            FormulaError::InvalidColumn(_) => FormulaErrorKind::InvalidColumn,
            FormulaError::CircularReference(_) => FormulaErrorKind::CircularReference,
        }
    }

    pub(crate) fn parse(message: impl Into<String>, position: usize) -> Self {
        FormulaError::Parse(ParseError::new(message, position))
    }

    pub(crate) fn invalid_value(
        function: &str,
        index: usize,
        message: impl Into<String>,
    ) -> Self {
        FormulaError::InvalidArgValue {
            function: function.to_string(),
            index,
            message: message.into(),
        }
    }
}
