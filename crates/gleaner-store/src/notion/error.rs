//! Notion-specific error handling.

use gleaner_core::Error;

/// Notion API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// Integration token invalid.
    Unauthorized,
    /// Integration lacks access to the resource.
    RestrictedResource,
    /// Resource missing or not shared with the integration.
    ObjectNotFound,
    /// Request body failed validation.
    ValidationError,
    /// Concurrent transaction conflict.
    ConflictError,
    /// Rate limit exceeded.
    RateLimited,
    /// Upstream unavailable or timed out.
    Unavailable,
    /// Server error.
    InternalServerError,
    /// Unknown error.
    Unknown,
}

impl NotionErrorCode {
    /// Determine error code from HTTP status and the body's `code` field.
    pub fn from_response(status: u16, code: &str) -> Self {
        match (status, code) {
            (429, _) | (_, "rate_limited") => Self::RateLimited,
            (401, _) | (_, "unauthorized") => Self::Unauthorized,
            (403, _) | (_, "restricted_resource") => Self::RestrictedResource,
            (404, _) | (_, "object_not_found") => Self::ObjectNotFound,
            (409, _) | (_, "conflict_error") => Self::ConflictError,
            (408 | 502 | 503 | 504, _) | (_, "service_unavailable" | "gateway_timeout") => {
                Self::Unavailable
            }
            (400, _) | (_, "validation_error" | "invalid_json" | "invalid_request") => {
                Self::ValidationError
            }
            (500..=599, _) => Self::InternalServerError,
            _ => Self::Unknown,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Unavailable | Self::ConflictError
        )
    }
}

/// Convert a Notion error into a gleaner [`Error`].
///
/// Rate limiting maps to [`Error::RateLimited`] and the other retryable
/// codes to [`Error::Timeout`], so both count as transient.
pub fn to_gleaner_error(status: u16, code: NotionErrorCode, message: &str) -> Error {
    match code {
        NotionErrorCode::RateLimited => Error::RateLimited(message.to_string()),
        NotionErrorCode::ObjectNotFound => Error::NotFound(message.to_string()),
        NotionErrorCode::Unauthorized => {
            Error::Config(format!("Notion authentication failed: {}", message))
        }
        code if code.is_retryable() => {
            Error::Timeout(format!("Notion returned {}: {}", status, message))
        }
        _ => Error::Remote {
            status,
            message: message.to_string(),
        },
    }
}
