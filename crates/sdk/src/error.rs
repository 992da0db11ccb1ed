//! Error types for the ServiceNow SDK.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for SDK operations.
pub type ServiceNowResult<T> = Result<T, ServiceNowError>;

/// Symbolic, machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    UnknownTool,
    InvalidRequest,
    WriteNotEnabled,
    HttpError,
    ApiError,
    AuthenticationFailed,
    NotFound,
    RateLimited,
    Timeout,
    ConfigError,
    SerializationError,
    InvalidUrl,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownTool => "UNKNOWN_TOOL",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::WriteNotEnabled => "WRITE_NOT_ENABLED",
            Self::HttpError => "HTTP_ERROR",
            Self::ApiError => "API_ERROR",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimited => "RATE_LIMITED",
            Self::Timeout => "TIMEOUT",
            Self::ConfigError => "CONFIG_ERROR",
            Self::SerializationError => "SERIALIZATION_ERROR",
            Self::InvalidUrl => "INVALID_URL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types that can occur when talking to ServiceNow or dispatching tools.
#[derive(Debug, thiserror::Error)]
pub enum ServiceNowError {
    /// No tool with this name is registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Missing or out-of-range parameters.
    #[error("{0}")]
    InvalidRequest(String),

    /// A write tool was called while writes are disabled.
    #[error("Write operations are disabled, so {0} cannot run. Set WRITE_ENABLED=true to enable it")]
    WriteNotEnabled(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// ServiceNow returned an error response.
    #[error("ServiceNow API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        detail: Option<String>,
    },

    /// Credentials were rejected or a token could not be obtained.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Record, user, group or resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the instance.
    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ServiceNowError {
    /// The symbolic code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownTool(_) => ErrorCode::UnknownTool,
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::WriteNotEnabled(_) => ErrorCode::WriteNotEnabled,
            Self::Http(_) => ErrorCode::HttpError,
            Self::Api { .. } => ErrorCode::ApiError,
            Self::Authentication(_) => ErrorCode::AuthenticationFailed,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::RateLimited { .. } => ErrorCode::RateLimited,
            Self::Timeout => ErrorCode::Timeout,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::InvalidUrl(_) => ErrorCode::InvalidUrl,
        }
    }

    /// Structured details, when the error carries any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Api {
                status, detail, ..
            } => Some(serde_json::json!({ "status": status, "detail": detail })),
            Self::RateLimited { retry_after_secs } => {
                Some(serde_json::json!({ "retry_after_secs": retry_after_secs }))
            }
            _ => None,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Create an error from a non-success status code and response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorResponse>(body).ok();
        let message = parsed
            .as_ref()
            .map(|r| r.error.message.clone())
            .unwrap_or_else(|| body.to_string());

        match status {
            401 | 403 => Self::Authentication(message),
            404 => Self::NotFound(message),
            _ => Self::Api {
                status,
                message,
                detail: parsed.and_then(|r| r.error.detail),
            },
        }
    }
}

/// Error envelope returned by the ServiceNow REST API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
