//! Error types for txview-core
//!
//! This module provides error handling for the transaction list engine,
//! including error codes, detailed messages, and suggestions.

use thiserror::Error;
use serde::{Deserialize, Serialize};
use std::io;

use crate::source::SourceError;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Transaction not found
    TransactionNotFound,
    /// Fetching transactions failed
    FetchFailed,
    /// Deleting an authorization failed
    DeleteFailed,
    /// Another delete is still pending
    DeleteInProgress,
    /// Sort field or order could not be parsed
    InvalidSort,
    /// Preference store could not be read or written
    PreferenceStore,
    /// Result arrived for a closed view
    SessionClosed,
    /// IO error
    IoError,
    /// Internal error
    InternalError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::TransactionNotFound => write!(f, "TRANSACTION_NOT_FOUND"),
            ErrorCode::FetchFailed => write!(f, "FETCH_FAILED"),
            ErrorCode::DeleteFailed => write!(f, "DELETE_FAILED"),
            ErrorCode::DeleteInProgress => write!(f, "DELETE_IN_PROGRESS"),
            ErrorCode::InvalidSort => write!(f, "INVALID_SORT"),
            ErrorCode::PreferenceStore => write!(f, "PREFERENCE_STORE"),
            ErrorCode::SessionClosed => write!(f, "SESSION_CLOSED"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
            ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// Detailed error information for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Debug information
    Debug,
    /// Informational
    Info,
    /// Warning - operation may be affected
    Warning,
    /// Error - operation failed
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Debug => write!(f, "debug"),
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Main error type for txview-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Transaction not found: {id}")]
    TransactionNotFound { id: String },

    #[error("Failed to load transactions: {source}")]
    FetchFailed {
        #[source]
        source: SourceError,
    },

    #[error("Failed to delete authorization {id}: {source}")]
    DeleteFailed {
        id: String,
        #[source]
        source: SourceError,
    },

    #[error("A delete is already in progress for {id}")]
    DeleteInProgress { id: String },

    #[error("Invalid sort: {value}")]
    InvalidSort { value: String },

    #[error("Preference store error: {message}")]
    PreferenceStore { message: String },

    #[error("View was closed before the result arrived")]
    SessionClosed,

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::TransactionNotFound { .. } => ErrorCode::TransactionNotFound,
            CoreError::FetchFailed { .. } => ErrorCode::FetchFailed,
            CoreError::DeleteFailed { .. } => ErrorCode::DeleteFailed,
            CoreError::DeleteInProgress { .. } => ErrorCode::DeleteInProgress,
            CoreError::InvalidSort { .. } => ErrorCode::InvalidSort,
            CoreError::PreferenceStore { .. } => ErrorCode::PreferenceStore,
            CoreError::SessionClosed => ErrorCode::SessionClosed,
            CoreError::IoError(_) => ErrorCode::IoError,
            CoreError::InternalError { .. } => ErrorCode::InternalError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::TransactionNotFound { .. } => ErrorSeverity::Info,
            CoreError::FetchFailed { .. } => ErrorSeverity::Error,
            CoreError::DeleteFailed { .. } => ErrorSeverity::Warning,
            CoreError::DeleteInProgress { .. } => ErrorSeverity::Info,
            CoreError::InvalidSort { .. } => ErrorSeverity::Info,
            CoreError::PreferenceStore { .. } => ErrorSeverity::Warning,
            CoreError::SessionClosed => ErrorSeverity::Debug,
            CoreError::IoError(_) => ErrorSeverity::Error,
            CoreError::InternalError { .. } => ErrorSeverity::Error,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::TransactionNotFound { id } => {
                details = details.with_detail(serde_json::json!({ "transaction_id": id }));
                details = details.with_suggestion(
                    "Refresh the list; the transaction may have been removed.".to_string()
                );
            }
            CoreError::FetchFailed { .. } => {
                details = details.with_suggestion(
                    "Try again; the last loaded list is still shown.".to_string()
                );
            }
            CoreError::DeleteFailed { id, .. } => {
                details = details.with_detail(serde_json::json!({ "transaction_id": id }));
                details = details.with_suggestion(
                    "Only pending authorizations can be deleted.".to_string()
                );
            }
            CoreError::DeleteInProgress { .. } => {
                details = details.with_suggestion(
                    "Wait for the current delete to finish.".to_string()
                );
            }
            CoreError::InvalidSort { .. } => {
                details = details.with_suggestion(
                    "Use one of date, status, title, amount with asc or desc, e.g. date-desc.".to_string()
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// User whose list is shown
    pub user_id: Option<String>,
    /// Operation being performed
    pub operation: String,
    /// Additional context data
    pub data: serde_json::Value,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(operation: &str) -> Self {
        Self {
            user_id: None,
            operation: operation.to_string(),
            data: serde_json::json!({}),
        }
    }

    /// Add user ID
    pub fn with_user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    /// Add context data
    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data[key] = value;
        self
    }
}

/// Error logger trait
pub trait ErrorLogger: Send + Sync {
    /// Log an error
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    /// Log a warning
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Debug, Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        let message = format!(
            "[{}] {} - Operation: {} - User: {:?} - Data: {}",
            error.code(),
            error,
            context.operation,
            context.user_id,
            context.data
        );
        match error.severity() {
            ErrorSeverity::Error => log::error!("{}", message),
            ErrorSeverity::Warning => log::warn!("{}", message),
            ErrorSeverity::Info => log::info!("{}", message),
            ErrorSeverity::Debug => log::debug!("{}", message),
        }
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            "WARNING: {} - Operation: {} - User: {:?}",
            message,
            context.operation,
            context.user_id
        );
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::FetchFailed.to_string(), "FETCH_FAILED");
        assert_eq!(ErrorCode::DeleteInProgress.to_string(), "DELETE_IN_PROGRESS");
        assert_eq!(ErrorCode::InvalidSort.to_string(), "INVALID_SORT");
    }

    #[test]
    fn test_core_error_code_and_severity() {
        let error = CoreError::DeleteFailed {
            id: "tx-1".to_string(),
            source: SourceError::Rejected { message: "not an authorization".to_string() },
        };
        assert_eq!(error.code(), ErrorCode::DeleteFailed);
        assert_eq!(error.severity(), ErrorSeverity::Warning);
        assert!(error.to_string().contains("tx-1"));
        assert!(error.to_string().contains("not an authorization"));

        let error = CoreError::FetchFailed { source: SourceError::Unavailable { message: "offline".to_string() } };
        assert_eq!(error.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_error_details_invalid_sort() {
        let error = CoreError::InvalidSort { value: "color-up".to_string() };
        let details = error.to_details();

        assert_eq!(details.code, ErrorCode::InvalidSort);
        assert!(details.message.contains("color-up"));
        assert_eq!(details.suggestions.len(), 1);
    }

    #[test]
    fn test_error_details_serialization() {
        let error = CoreError::TransactionNotFound { id: "tx-9".to_string() };
        let json = serde_json::to_value(error.to_details()).unwrap();
        assert_eq!(json["code"], "TRANSACTION_NOT_FOUND");
        assert_eq!(json["details"]["transaction_id"], "tx-9");
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::new("delete_authorization")
            .with_user_id("user-456")
            .with_data("transaction_id", serde_json::json!("tx-1"));

        assert_eq!(context.operation, "delete_authorization");
        assert_eq!(context.user_id.as_deref(), Some("user-456"));
        assert_eq!(context.data["transaction_id"], "tx-1");
    }
}
