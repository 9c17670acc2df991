//! OpenAI-specific error handling.

use gleaner_core::Error;

/// OpenAI-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large.
    ContextLengthExceeded,
    /// Upstream timed out.
    Timeout,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (408 | 504, _) => Self::Timeout,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

/// Convert an OpenAI error into a gleaner [`Error`].
pub fn to_gleaner_error(status: u16, code: OpenAIErrorCode, message: &str) -> Error {
    match code {
        OpenAIErrorCode::AuthenticationError => {
            Error::Config(format!("Authentication failed: {}", message))
        }
        OpenAIErrorCode::RateLimitExceeded => {
            Error::RateLimited(format!("Rate limit exceeded: {}", message))
        }
        OpenAIErrorCode::ModelNotFound => Error::Config(format!("Model not found: {}", message)),
        OpenAIErrorCode::ContextLengthExceeded => {
            Error::Classification(format!("Context too long: {}", message))
        }
        OpenAIErrorCode::Timeout => Error::Timeout(format!("Upstream timeout: {}", message)),
        OpenAIErrorCode::ServerError | OpenAIErrorCode::Unknown => Error::Remote {
            status,
            message: message.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_from_401() {
        let code = OpenAIErrorCode::from_response(401, "invalid_api_key");
        assert_eq!(code, OpenAIErrorCode::AuthenticationError);
    }

    #[test]
    fn test_error_code_from_429() {
        let code = OpenAIErrorCode::from_response(429, "rate_limit_exceeded");
        assert_eq!(code, OpenAIErrorCode::RateLimitExceeded);
    }

    #[test]
    fn test_error_code_from_504() {
        let code = OpenAIErrorCode::from_response(504, "");
        assert_eq!(code, OpenAIErrorCode::Timeout);
    }

    #[test]
    fn test_error_code_context_length() {
        let code = OpenAIErrorCode::from_response(400, "context_length_exceeded");
        assert_eq!(code, OpenAIErrorCode::ContextLengthExceeded);
    }

    #[test]
    fn test_error_code_from_unknown() {
        let code = OpenAIErrorCode::from_response(418, "im_a_teapot");
        assert_eq!(code, OpenAIErrorCode::Unknown);
    }

    #[test]
    fn test_to_gleaner_error_timeout_is_transient() {
        let err = to_gleaner_error(504, OpenAIErrorCode::Timeout, "upstream");
        assert!(err.is_transient());
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_to_gleaner_error_rate_limit_is_retried_upstream() {
        let err = to_gleaner_error(429, OpenAIErrorCode::RateLimitExceeded, "Too many requests");
        assert!(err.is_rate_limited());
        assert!(err.to_string().contains("Rate limit exceeded"));
    }

    #[test]
    fn test_to_gleaner_error_auth_is_config() {
        let err = to_gleaner_error(401, OpenAIErrorCode::AuthenticationError, "Invalid key");
        assert!(matches!(err, Error::Config(_)));
        assert!(!err.is_transient());
    }
}
