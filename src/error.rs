//! Structured error types for lifecycle operations.

use serde::Serialize;
use thiserror::Error;

/// Error codes for programmatic error handling at the API boundary.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    Conflict,
    DatabaseError,
    InternalError,
}

/// Failures raised by the task engine and its persistence gateway.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Missing or malformed input. Nothing was written.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// The operation targeted a task id that does not exist.
    #[error("Task not found: {0}")]
    NotFound(i64),

    /// Reserved for concurrent reorder detection; operations are currently
    /// last-writer-wins and never raise it.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] refinery::Error),

    /// A stored row could not be decoded into a task.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl TaskError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn missing_field(field: &'static str) -> Self {
        Self::validation(field, format!("{} is required", field))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::ValidationError,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Conflict(_) => ErrorCode::Conflict,
            Self::Database(_) | Self::Migration(_) => ErrorCode::DatabaseError,
            Self::Corrupt(_) => ErrorCode::InternalError,
        }
    }

    /// The offending input field, for validation errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Serializable error body returned to API clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl From<&TaskError> for ErrorBody {
    fn from(err: &TaskError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            field: err.field().map(str::to_string),
        }
    }
}

/// Result type for task operations.
pub type TaskResult<T> = std::result::Result<T, TaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_carries_field() {
        let err = TaskError::missing_field("title");
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(err.field(), Some("title"));
        assert_eq!(err.to_string(), "title is required");
    }

    #[test]
    fn not_found_is_distinguishable() {
        let err = TaskError::NotFound(42);
        assert!(err.is_not_found());
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.to_string(), "Task not found: 42");
    }

    #[test]
    fn error_body_serializes_screaming_snake_code() {
        let err = TaskError::validation("status", "invalid status 'Later'");
        let body = serde_json::to_value(ErrorBody::from(&err)).unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field"], "status");

        let body = serde_json::to_value(ErrorBody::from(&TaskError::NotFound(1))).unwrap();
        assert_eq!(body["code"], "NOT_FOUND");
        assert!(body.get("field").is_none());
    }
}
