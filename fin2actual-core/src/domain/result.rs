//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core library error type
///
/// Every variant aborts the import. Nothing is retried and nothing already
/// created in the destination is rolled back.
#[derive(Error, Debug)]
pub enum Error {
    /// The export could not be projected into destination entities
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// A reference was looked up before it was registered
    #[error("Not found: {0}")]
    NotFound(String),

    /// A transfer could not be paired with its other leg
    #[error("Transfer counterpart error: {0}")]
    Counterpart(String),

    /// The export contradicts itself in a way the import cannot paper over
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Destination error: {0}")]
    Destination(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a mapping error
    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::Mapping(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a counterpart error
    pub fn counterpart(msg: impl Into<String>) -> Self {
        Self::Counterpart(msg.into())
    }

    /// Create an integrity error
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }

    /// Create a destination error
    pub fn destination(msg: impl Into<String>) -> Self {
        Self::Destination(msg.into())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (for `--json` output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: None,
        }
    }

    /// Attach a context entry (e.g. the stage an import stopped at)
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_result_ok() {
        let result: OperationResult<i32> = OperationResult::ok(42);
        assert!(result.success);
        assert_eq!(result.data, Some(42));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_operation_result_fail_with_context() {
        let result: OperationResult<i32> = OperationResult::fail("boom")
            .with_context("stage", serde_json::json!("payees"));
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("boom"));
        let context = result.context.unwrap();
        assert_eq!(context["stage"], serde_json::json!("payees"));
    }

    #[test]
    fn test_from_result() {
        let err: Result<i32> = Err(Error::counterpart("no leg for abc"));
        let result: OperationResult<i32> = err.into();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Transfer counterpart error"));
    }
}
