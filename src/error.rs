//! Error types for the job board gate.
//!
//! All errors are explicitly typed using thiserror. No panics in production code.

use thiserror::Error;

/// Central error type for all gate operations.
#[derive(Debug, Error)]
pub enum GateError {
    /// The REST backend answered with a non-success status.
    #[error("Backend error ({status}): {message}")]
    Backend {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Message from the backend envelope, if any.
        message: String,
    },

    /// Configuration error (missing env vars, invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential cookie could not be read.
    #[error("Cookie error: {0}")]
    Cookie(String),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex pattern compilation error.
    #[error("Regex pattern error: {0}")]
    RegexPattern(#[from] regex::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GateError {
    /// Log error with full context using tracing.
    pub fn log_with_context(&self, context: &ErrorContext) {
        match self {
            Self::Io(_) => {
                tracing::error!(
                    error = %self,
                    request_id = %context.request_id,
                    path = ?context.path,
                    operation = %context.operation,
                    "Critical error occurred"
                );
            }
            // A 401/403 from the backend is an expected outcome of a stale session
            Self::Backend { status, .. } if matches!(status, 401 | 403) => {
                tracing::warn!(
                    error = %self,
                    request_id = %context.request_id,
                    operation = %context.operation,
                    status = status,
                    "Backend rejected credentials"
                );
            }
            Self::Backend { .. } | Self::Http(_) => {
                tracing::error!(
                    error = %self,
                    request_id = %context.request_id,
                    path = ?context.path,
                    operation = %context.operation,
                    "Backend API error"
                );
            }
            Self::Config(_) | Self::RegexPattern(_) => {
                tracing::error!(
                    error = %self,
                    request_id = %context.request_id,
                    operation = %context.operation,
                    "Configuration error"
                );
            }
            Self::Json(_) | Self::Cookie(_) => {
                tracing::warn!(
                    error = %self,
                    request_id = %context.request_id,
                    path = ?context.path,
                    operation = %context.operation,
                    "Data processing error"
                );
            }
        }
    }

    /// Get user-friendly error message (hides internal details)
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Backend { status: 401, .. } => "Invalid credentials",
            Self::Backend { status: 403, .. } => "Access denied",
            Self::Backend { .. } | Self::Http(_) => "Job board service temporarily unavailable",
            Self::Config(_) | Self::RegexPattern(_) => "Service configuration error",
            Self::Io(_) => "Internal service error",
            Self::Cookie(_) => "Session data could not be read",
            Self::Json(_) => "Data format error",
        }
    }
}

/// Context information for error logging.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Unique request identifier for correlation
    pub request_id: String,
    /// Request path, if any
    pub path: Option<String>,
    /// Operation being performed
    pub operation: String,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            path: None,
            operation: operation.into(),
        }
    }

    /// Set request path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Result type alias for gate operations.
pub type Result<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_backend() {
        let err = GateError::Backend {
            status: 502,
            message: "upstream down".to_string(),
        };
        assert_eq!(err.to_string(), "Backend error (502): upstream down");
    }

    #[test]
    fn error_display_config() {
        let err = GateError::Config("BACKEND_URL not set".to_string());
        assert_eq!(err.to_string(), "Configuration error: BACKEND_URL not set");
    }

    #[test]
    fn backend_auth_statuses_get_specific_messages() {
        let unauthorized = GateError::Backend {
            status: 401,
            message: "Bad credentials".to_string(),
        };
        assert_eq!(unauthorized.user_message(), "Invalid credentials");

        let forbidden = GateError::Backend {
            status: 403,
            message: "nope".to_string(),
        };
        assert_eq!(forbidden.user_message(), "Access denied");
    }

    #[test]
    fn error_user_message_hides_details() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "0.0.0.0:3000 in use");
        let err = GateError::Io(io);
        assert_eq!(err.user_message(), "Internal service error");
        assert!(!err.user_message().contains("3000"));

        let err = GateError::Backend {
            status: 500,
            message: "NullPointerException in UserService".to_string(),
        };
        assert!(!err.user_message().contains("UserService"));
    }

    #[test]
    fn error_context_builder() {
        let ctx = ErrorContext::new("login").with_path("/api/auth/login");

        assert_eq!(ctx.operation, "login");
        assert_eq!(ctx.path.as_deref(), Some("/api/auth/login"));
        assert!(!ctx.request_id.is_empty());
    }

    #[test]
    fn error_context_generates_request_id() {
        let ctx1 = ErrorContext::new("op1");
        let ctx2 = ErrorContext::new("op2");

        assert_ne!(ctx1.request_id, ctx2.request_id);
        assert!(!ctx1.request_id.is_empty());
    }
}
