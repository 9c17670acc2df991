//! Error types for gleaner.

use thiserror::Error;

/// Result type alias using gleaner's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for gleaner operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Remote service signalled rate limiting (429-class).
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Remote call timed out or the connection failed.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Remote call failed permanently.
    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Record or node not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Heading-bounded section not found in a block sequence
    #[error("Section not found: {0}")]
    SectionNotFound(String),

    /// Classification service errored or returned malformed data
    #[error("Classification error: {0}")]
    Classification(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an error from a non-success HTTP status and response body.
    ///
    /// 429 is rate limiting, 408/504 are timeouts, 404 is not-found;
    /// every other status is a permanent remote failure.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => Error::RateLimited(message),
            408 | 504 => Error::Timeout(message),
            404 => Error::NotFound(message),
            _ => Error::Remote { status, message },
        }
    }

    /// True when the remote service asked us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited(_))
    }

    /// True for network-class failures (rate limit, timeout, connection).
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::RateLimited(_) | Error::Timeout(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            return Error::Timeout(e.to_string());
        }
        match e.status() {
            Some(status) => Error::from_status(status.as_u16(), e.to_string()),
            None if e.is_decode() => Error::Serialization(e.to_string()),
            None => Error::Remote {
                status: 0,
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_rate_limited() {
        let err = Error::RateLimited("slow down".to_string());
        assert_eq!(err.to_string(), "Rate limited: slow down");
    }

    #[test]
    fn test_error_display_remote() {
        let err = Error::Remote {
            status: 400,
            message: "validation_error".to_string(),
        };
        assert_eq!(err.to_string(), "Remote error (400): validation_error");
    }

    #[test]
    fn test_error_display_section_not_found() {
        let err = Error::SectionNotFound("important links".to_string());
        assert_eq!(err.to_string(), "Section not found: important links");
    }

    #[test]
    fn test_from_status_classifies_rate_limit() {
        assert!(Error::from_status(429, "x").is_rate_limited());
        assert!(Error::from_status(429, "x").is_transient());
    }

    #[test]
    fn test_from_status_classifies_timeouts() {
        let err = Error::from_status(504, "gateway timeout");
        assert!(matches!(err, Error::Timeout(_)));
        assert!(err.is_transient());
        assert!(!err.is_rate_limited());
        assert!(Error::from_status(408, "x").is_transient());
    }

    #[test]
    fn test_from_status_not_found() {
        assert!(matches!(Error::from_status(404, "gone"), Error::NotFound(_)));
    }

    #[test]
    fn test_from_status_permanent() {
        let err = Error::from_status(400, "bad request");
        assert!(!err.is_transient());
        match err {
            Error::Remote { status, .. } => assert_eq!(status, 400),
            _ => panic!("Expected Remote error"),
        }
    }

    #[test]
    fn test_non_remote_errors_are_not_transient() {
        assert!(!Error::NotFound("x".into()).is_transient());
        assert!(!Error::Classification("x".into()).is_transient());
        assert!(!Error::Internal("x".into()).is_transient());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(err.to_string().contains("Serialization error:"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
