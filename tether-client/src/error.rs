//! Error types for the Tether broker client

use std::fmt;
use thiserror::Error;

/// Result type alias for broker operations
pub type Result<T> = std::result::Result<T, BrokerError>;

/// Transport-level classification of a failed broker call
///
/// The worker's retry policy branches on this value only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Broker refused the connection or could not be reached
    Unavailable,
    /// Broker is overloaded
    ResourceExhausted,
    /// Fault between the broker's internal components
    Internal,
    /// The call ran out of time, usually a long-poll with no work
    DeadlineExceeded,
    /// The in-flight call was cancelled
    Cancelled,
    Other,
}

impl ErrorClass {
    /// Maps an HTTP status code onto an error class
    pub fn from_status(status: u16) -> Self {
        match status {
            502 | 503 => Self::Unavailable,
            429 => Self::ResourceExhausted,
            500 => Self::Internal,
            408 | 504 => Self::DeadlineExceeded,
            499 => Self::Cancelled,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unavailable => "unavailable",
            Self::ResourceExhausted => "resource exhausted",
            Self::Internal => "internal",
            Self::DeadlineExceeded => "deadline exceeded",
            Self::Cancelled => "cancelled",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Errors that can occur when talking to the broker
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Broker could not be reached
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    /// Broker signalled overload
    #[error("Broker resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Broker reported an internal fault
    #[error("Broker internal error: {0}")]
    Internal(String),

    /// The call did not finish in time
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// The call was cancelled before it finished
    #[error("Request cancelled: {0}")]
    Cancelled(String),

    /// API returned an error status code that has no dedicated class
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// HTTP request failed for a reason not covered above
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),
}

impl BrokerError {
    /// Create an error from a non-success status code and body
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match ErrorClass::from_status(status) {
            ErrorClass::Unavailable => Self::Unavailable(message),
            ErrorClass::ResourceExhausted => Self::ResourceExhausted(message),
            ErrorClass::Internal => Self::Internal(message),
            ErrorClass::DeadlineExceeded => Self::DeadlineExceeded(message),
            ErrorClass::Cancelled => Self::Cancelled(message),
            ErrorClass::Other => Self::ApiError { status, message },
        }
    }

    /// Returns the transport classification of this error
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Unavailable(_) => ErrorClass::Unavailable,
            Self::ResourceExhausted(_) => ErrorClass::ResourceExhausted,
            Self::Internal(_) => ErrorClass::Internal,
            Self::DeadlineExceeded(_) => ErrorClass::DeadlineExceeded,
            Self::Cancelled(_) => ErrorClass::Cancelled,
            Self::ApiError { .. } | Self::ParseError(_) | Self::RequestFailed(_) => {
                ErrorClass::Other
            }
        }
    }
}

impl From<reqwest::Error> for BrokerError {
    fn from(err: reqwest::Error) -> Self {
        // Render the whole source chain; reqwest keeps the useful part in it
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        // A connect timeout is both; the broker was never reached
        if err.is_connect() {
            Self::Unavailable(message)
        } else if err.is_timeout() {
            Self::DeadlineExceeded(message)
        } else if let Some(status) = err.status() {
            Self::api_error(status.as_u16(), message)
        } else if err.is_decode() {
            Self::ParseError(message)
        } else {
            Self::RequestFailed(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(ErrorClass::from_status(503), ErrorClass::Unavailable);
        assert_eq!(ErrorClass::from_status(502), ErrorClass::Unavailable);
        assert_eq!(ErrorClass::from_status(429), ErrorClass::ResourceExhausted);
        assert_eq!(ErrorClass::from_status(500), ErrorClass::Internal);
        assert_eq!(ErrorClass::from_status(504), ErrorClass::DeadlineExceeded);
        assert_eq!(ErrorClass::from_status(408), ErrorClass::DeadlineExceeded);
        assert_eq!(ErrorClass::from_status(499), ErrorClass::Cancelled);
        assert_eq!(ErrorClass::from_status(404), ErrorClass::Other);
        assert_eq!(ErrorClass::from_status(400), ErrorClass::Other);
    }

    #[test]
    fn test_api_error_picks_variant_by_class() {
        assert!(matches!(
            BrokerError::api_error(503, "down"),
            BrokerError::Unavailable(_)
        ));
        assert!(matches!(
            BrokerError::api_error(429, "slow down"),
            BrokerError::ResourceExhausted(_)
        ));

        let err = BrokerError::api_error(404, "no such job");
        assert_eq!(err.class(), ErrorClass::Other);
        assert_eq!(err.to_string(), "API error (status 404): no such job");
    }

    #[test]
    fn test_parse_errors_are_other() {
        let err = BrokerError::ParseError("bad batch".to_string());
        assert_eq!(err.class(), ErrorClass::Other);
    }
}
