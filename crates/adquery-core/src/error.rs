//! Directory query error types
//!
//! Error definitions with transient/permanent classification so callers can
//! decide whether re-issuing a whole query is worthwhile. The engine itself
//! never retries.

use thiserror::Error;

use crate::ids::QueryId;
use crate::types::ResultCode;

/// Error that can occur while connecting to or querying a directory.
#[derive(Debug, Error)]
pub enum QueryError {
    // Connection errors
    /// Failed to establish a session with the directory server.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connecting to the server did not finish in time.
    #[error("connection timeout after {timeout_secs} seconds")]
    ConnectionTimeout { timeout_secs: u64 },

    /// A single search round trip did not finish in time.
    #[error("request timeout after {timeout_secs} seconds")]
    RequestTimeout { timeout_secs: u64 },

    /// The caller cancelled the query.
    #[error("query cancelled")]
    Cancelled,

    // Authentication errors
    /// The server rejected the bind.
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // Configuration errors
    /// Search or connection configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    // Protocol errors
    /// The server answered a search with a non-recoverable result code.
    #[error("directory error {code}: {message}")]
    Directory { code: ResultCode, message: String },

    /// Transport or protocol failure not attributable to a result code.
    #[error("protocol error: {message}")]
    Protocol {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A range slice arrived that does not continue the previous one.
    #[error("range slice for '{attribute}' on '{dn}' starts at {low}, expected {expected}")]
    RangeOutOfOrder {
        dn: String,
        attribute: String,
        low: u32,
        expected: u32,
    },

    /// Range retrieval for one attribute needed more follow-up searches than allowed.
    #[error("range retrieval for '{attribute}' on '{dn}' exceeded {limit} follow-up searches")]
    RangeLimitExceeded {
        dn: String,
        attribute: String,
        limit: u32,
    },

    // Internal errors
    /// Partial results were merged into the accumulator of another query.
    #[error("results of query {actual} cannot be merged into query {expected}")]
    AccumulatorMismatch { expected: QueryId, actual: QueryId },

    /// Internal error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl QueryError {
    /// Check if this error is transient and re-issuing the query may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            QueryError::ConnectionFailed { .. }
                | QueryError::ConnectionTimeout { .. }
                | QueryError::RequestTimeout { .. }
                | QueryError::Protocol { .. }
        )
    }

    /// Check if this error is permanent and re-issuing the query won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Check if the error happened before or while binding the session.
    ///
    /// These abort a query regardless of the range failure policy.
    pub fn is_connection_level(&self) -> bool {
        matches!(
            self,
            QueryError::ConnectionFailed { .. }
                | QueryError::ConnectionTimeout { .. }
                | QueryError::AuthenticationFailed { .. }
                | QueryError::Cancelled
        )
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            QueryError::ConnectionTimeout { .. } => "CONNECTION_TIMEOUT",
            QueryError::RequestTimeout { .. } => "REQUEST_TIMEOUT",
            QueryError::Cancelled => "CANCELLED",
            QueryError::AuthenticationFailed { .. } => "AUTH_FAILED",
            QueryError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            QueryError::Directory { .. } => "DIRECTORY_ERROR",
            QueryError::Protocol { .. } => "PROTOCOL_ERROR",
            QueryError::RangeOutOfOrder { .. } => "RANGE_OUT_OF_ORDER",
            QueryError::RangeLimitExceeded { .. } => "RANGE_LIMIT_EXCEEDED",
            QueryError::AccumulatorMismatch { .. } => "ACCUMULATOR_MISMATCH",
            QueryError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    // Convenience constructors

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        QueryError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error with source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        QueryError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an authentication failed error.
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        QueryError::AuthenticationFailed {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        QueryError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        QueryError::Protocol {
            message: message.into(),
            source: None,
        }
    }

    /// Create a protocol error with source.
    pub fn protocol_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        QueryError::Protocol {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a directory error from a server result.
    pub fn directory(code: ResultCode, message: impl Into<String>) -> Self {
        QueryError::Directory {
            code,
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        QueryError::Internal {
            message: message.into(),
        }
    }
}

/// Result type for directory query operations.
pub type QueryResult<T> = Result<T, QueryError>;
