//! Error handling for tidyblocks-rs
//!
//! This module defines the crate-level error type and a Result alias.
//! Table operators report the narrower [`TableError`]; it converts into
//! [`TidyError`] with `?`.

use crate::table::TableError;
use thiserror::Error;

/// Main error type for tidyblocks-rs operations
#[derive(Error, Debug)]
pub enum TidyError {
    /// A table operator failed
    #[error(transparent)]
    Table(#[from] TableError),

    /// The program could not be obtained or is malformed
    #[error("Program error: {0}")]
    Program(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<TidyError>,
    },
}

impl TidyError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        TidyError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost table error, if this error came from a table operator
    pub fn table_error(&self) -> Option<&TableError> {
        match self {
            TidyError::Table(err) => Some(err),
            TidyError::WithContext { source, .. } => source.table_error(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TidyError {
    fn from(err: serde_json::Error) -> Self {
        TidyError::Serialization(err.to_string())
    }
}

/// Result type alias for tidyblocks-rs operations
pub type Result<T> = std::result::Result<T, TidyError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, TableError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| TidyError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| TidyError::from(e).with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TidyError::Program("no pipelines".to_string());
        assert_eq!(err.to_string(), "Program error: no pipelines");
    }

    #[test]
    fn test_table_error_is_transparent() {
        let err = TidyError::from(TableError::NotGrouped);
        assert_eq!(err.to_string(), TableError::NotGrouped.to_string());
    }

    #[test]
    fn test_error_with_context() {
        let result: std::result::Result<(), TableError> = Err(TableError::NotGrouped);
        let err = result.context("pipeline 3").unwrap_err();
        assert!(err.to_string().starts_with("pipeline 3: "));
        assert_eq!(err.table_error(), Some(&TableError::NotGrouped));
    }
}
