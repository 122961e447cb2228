//! Table operator error types.
//!
//! Every operator and row expression reports failures through
//! [`TableError`]. There is no per-row recovery: the first failure ends the
//! operator call and, through the scheduler, the whole run.

use crate::types::{Value, ValueKind};
use thiserror::Error;

/// Errors raised by table operators and row-expression evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Column {column} not in table (available: {})", available.join(","))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("Cannot ungroup data that is not grouped")]
    NotGrouped,

    #[error("Value {value} is not a number")]
    NotNumber { value: Value },

    #[error("Values {left} ({left_kind}) and {right} ({right_kind}) have different types")]
    TypeMismatch {
        left: Value,
        left_kind: ValueKind,
        right: Value,
        right_kind: ValueKind,
    },

    #[error("No table has been published under the name {name}")]
    UnknownTable { name: String },

    #[error("Invalid table schema: {0}")]
    InvalidSchema(String),

    #[error("{0}")]
    Assertion(String),
}

impl TableError {
    /// Build a `MissingColumn` error for `column` against the given schema.
    pub fn missing_column(column: impl Into<String>, available: &[String]) -> Self {
        TableError::MissingColumn {
            column: column.into(),
            available: available.to_vec(),
        }
    }

    /// Build a generic `Assertion` error carrying `message`.
    pub fn assertion(message: impl Into<String>) -> Self {
        TableError::Assertion(message.into())
    }

    /// Build a `TypeMismatch` error from the two offending operands.
    pub fn type_mismatch(left: &Value, right: &Value) -> Self {
        TableError::TypeMismatch {
            left: left.clone(),
            left_kind: left.kind(),
            right: right.clone(),
            right_kind: right.kind(),
        }
    }
}

pub type TableResult<T> = std::result::Result<T, TableError>;

/// Fail with the error built by `fail` unless `check` holds.
///
/// Shared by the operators and the expression evaluator. The error is only
/// built on failure.
pub fn ensure<F>(check: bool, fail: F) -> TableResult<()>
where
    F: FnOnce() -> TableError,
{
    if check {
        Ok(())
    } else {
        Err(fail())
    }
}
