//! CLI error types and exit codes

use adquery_core::error::QueryError;
use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 2: Authentication failed
/// - 3: Network error or timeout
/// - 4: Invalid input
/// - 5: Directory error
/// - 130: Cancelled
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Connection failed: {0}\n\nTroubleshooting:\n  - Check that the server name resolves and the port is reachable\n  - Use --ssl (port 636) or --starttls if the server requires a secure channel")]
    ConnectionFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Search cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::AuthenticationFailed(_) => 2,
            CliError::ConnectionFailed(_) | CliError::Network(_) => 3,
            CliError::Validation(_) | CliError::Config(_) => 4,
            CliError::Directory(_) => 5,
            CliError::Cancelled => 130,
            CliError::Io(_) | CliError::Internal(_) => 1,
        }
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {}", self);
        } else {
            eprintln!("Error: {}", self);
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {}", suggestion);
            } else {
                eprintln!("\nSuggestion: {}", suggestion);
            }
        }
    }

    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::AuthenticationFailed(_) => Some(
                "Check --username and ADQUERY_PASSWORD, or pass --client-cert for certificate authentication.",
            ),
            CliError::Network(_) => Some("Raise --timeout or narrow the filter and try again."),
            _ => None,
        }
    }
}

impl From<QueryError> for CliError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::AuthenticationFailed { .. } => CliError::AuthenticationFailed(e.to_string()),
            QueryError::ConnectionFailed { .. } => CliError::ConnectionFailed(e.to_string()),
            QueryError::ConnectionTimeout { .. }
            | QueryError::RequestTimeout { .. }
            | QueryError::Protocol { .. } => CliError::Network(e.to_string()),
            QueryError::InvalidConfiguration { .. } => CliError::Validation(e.to_string()),
            QueryError::Directory { .. }
            | QueryError::RangeOutOfOrder { .. }
            | QueryError::RangeLimitExceeded { .. } => CliError::Directory(e.to_string()),
            QueryError::Cancelled => CliError::Cancelled,
            QueryError::AccumulatorMismatch { .. } | QueryError::Internal { .. } => {
                CliError::Internal(e.to_string())
            }
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Io(format!("JSON error: {}", e))
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(e: serde_yaml::Error) -> Self {
        CliError::Config(format!("YAML error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adquery_core::types::ResultCode;

    #[test]
    fn test_exit_codes() {
        let cases = [
            (QueryError::authentication_failed("bad password"), 2),
            (QueryError::connection_failed("refused"), 3),
            (QueryError::RequestTimeout { timeout_secs: 60 }, 3),
            (QueryError::invalid_configuration("no server"), 4),
            (
                QueryError::directory(ResultCode::INSUFFICIENT_ACCESS_RIGHTS, "denied"),
                5,
            ),
            (QueryError::Cancelled, 130),
            (QueryError::internal("bug"), 1),
        ];

        for (error, code) in cases {
            let description = error.to_string();
            assert_eq!(CliError::from(error).exit_code(), code, "{}", description);
        }
    }

    #[test]
    fn test_yaml_error_is_config_error() {
        let err = serde_yaml::from_str::<serde_yaml::Value>("a: [").unwrap_err();
        assert_eq!(CliError::from(err).exit_code(), 4);
    }
}
