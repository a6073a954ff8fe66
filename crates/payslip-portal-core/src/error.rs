//! Error types for payslip-portal-core
//!
//! Every failure the view can run into is classified here, together with a
//! stable code, a severity and a user-facing message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Reading years or payslips failed
    FetchFailure,
    /// Document generation or execution failed
    ActionFailure,
    /// Year selection rejected before any remote call
    InvalidSelection,
    /// Payslip is not part of the current list
    UnknownPayslip,
    /// No user identity available
    Unauthorized,
    /// Action type the host cannot execute
    NotSupported,
    /// Internal error
    InternalError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::FetchFailure => write!(f, "FETCH_FAILURE"),
            ErrorCode::ActionFailure => write!(f, "ACTION_FAILURE"),
            ErrorCode::InvalidSelection => write!(f, "INVALID_SELECTION"),
            ErrorCode::UnknownPayslip => write!(f, "UNKNOWN_PAYSLIP"),
            ErrorCode::Unauthorized => write!(f, "UNAUTHORIZED"),
            ErrorCode::NotSupported => write!(f, "NOT_SUPPORTED"),
            ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

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
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Main error type for payslip-portal-core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Failed to read {model}: {message}")]
    FetchFailure { model: String, message: String },

    #[error("Document action failed: {message}")]
    ActionFailure { message: String },

    #[error("Invalid year selection '{value}': {reason}")]
    InvalidSelection { value: String, reason: String },

    #[error("Payslip {id} is not in the current list")]
    UnknownPayslip { id: i64 },

    #[error("No authenticated user")]
    Unauthorized,

    #[error("Operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl CoreError {
    /// Shorthand for a read failure against `model`
    pub fn fetch(model: &str, message: impl Into<String>) -> Self {
        CoreError::FetchFailure {
            model: model.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for a failed document action
    pub fn action(message: impl Into<String>) -> Self {
        CoreError::ActionFailure {
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::FetchFailure { .. } => ErrorCode::FetchFailure,
            CoreError::ActionFailure { .. } => ErrorCode::ActionFailure,
            CoreError::InvalidSelection { .. } => ErrorCode::InvalidSelection,
            CoreError::UnknownPayslip { .. } => ErrorCode::UnknownPayslip,
            CoreError::Unauthorized => ErrorCode::Unauthorized,
            CoreError::NotSupported { .. } => ErrorCode::NotSupported,
            CoreError::InternalError { .. } => ErrorCode::InternalError,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::FetchFailure { .. } => ErrorSeverity::Error,
            CoreError::ActionFailure { .. } => ErrorSeverity::Error,
            CoreError::InvalidSelection { .. } => ErrorSeverity::Warning,
            CoreError::UnknownPayslip { .. } => ErrorSeverity::Warning,
            CoreError::Unauthorized => ErrorSeverity::Warning,
            CoreError::NotSupported { .. } => ErrorSeverity::Warning,
            CoreError::InternalError { .. } => ErrorSeverity::Critical,
        }
    }

    /// Message shown to the employee in the portal
    pub fn user_message(&self) -> String {
        match self {
            CoreError::FetchFailure { .. } => {
                "Payslips could not be loaded. Please try again later.".to_string()
            }
            CoreError::ActionFailure { .. } | CoreError::NotSupported { .. } => {
                "The payslip document could not be generated.".to_string()
            }
            CoreError::InvalidSelection { .. } => "Please choose a year from the list.".to_string(),
            CoreError::UnknownPayslip { .. } => "This payslip is not available.".to_string(),
            CoreError::Unauthorized => "Please sign in to view your payslips.".to_string(),
            CoreError::InternalError { .. } => "Something went wrong.".to_string(),
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::FetchFailure { model, .. } => {
                details = details
                    .with_detail(serde_json::json!({ "model": model }))
                    .with_suggestion("Check that the record service is reachable.".to_string())
                    .with_suggestion(
                        "Check that the service account can read this model.".to_string(),
                    );
            }
            CoreError::InvalidSelection { value, .. } => {
                details = details
                    .with_detail(serde_json::json!({ "value": value }))
                    .with_suggestion("Use one of the ids listed by /api/state.".to_string());
            }
            CoreError::NotSupported { operation } => {
                details = details.with_suggestion(format!(
                    "The host cannot execute '{}' actions.",
                    operation
                ));
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
    /// User the operation ran for
    pub user_id: Option<i64>,
    /// Operation being performed
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            user_id: None,
            operation: operation.to_string(),
        }
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Error logger trait
pub trait ErrorLogger: Send + Sync {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Debug, Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        match error.severity() {
            ErrorSeverity::Info => log::info!(
                target: "payslip_portal::error",
                "{} - Operation: {} - User: {:?}",
                error.to_details(),
                context.operation,
                context.user_id
            ),
            ErrorSeverity::Warning => log::warn!(
                target: "payslip_portal::error",
                "{} - Operation: {} - User: {:?}",
                error.to_details(),
                context.operation,
                context.user_id
            ),
            ErrorSeverity::Error | ErrorSeverity::Critical => log::error!(
                target: "payslip_portal::error",
                "{} - Operation: {} - User: {:?}",
                error.to_details(),
                context.operation,
                context.user_id
            ),
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::FetchFailure.to_string(), "FETCH_FAILURE");
        assert_eq!(ErrorCode::InvalidSelection.to_string(), "INVALID_SELECTION");
    }

    #[test]
    fn test_severity() {
        assert_eq!(
            CoreError::fetch("hr.payslip", "timeout").severity(),
            ErrorSeverity::Error
        );
        let err = CoreError::InvalidSelection {
            value: "abc".to_string(),
            reason: "not a number".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.code(), ErrorCode::InvalidSelection);
    }

    #[test]
    fn test_fetch_failure_details() {
        let details = CoreError::fetch("hr.working_year", "connection refused").to_details();
        assert_eq!(details.code, ErrorCode::FetchFailure);
        assert_eq!(details.details, Some(serde_json::json!({ "model": "hr.working_year" })));
        assert_eq!(details.suggestions.len(), 2);
        assert!(details.message.contains("connection refused"));
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = CoreError::fetch("hr.payslip", "psycopg2.OperationalError");
        assert!(!err.user_message().contains("psycopg2"));
        assert!(!CoreError::action("KeyError: report_name")
            .user_message()
            .contains("KeyError"));
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::new("load_payslips").with_user_id(42);
        assert_eq!(context.operation, "load_payslips");
        assert_eq!(context.user_id, Some(42));
    }
}
