//! Directory query type definitions
//!
//! Search scopes and LDAP result codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How far below the search base a search reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// Only the base object itself.
    Base,
    /// Immediate children of the base object.
    #[serde(alias = "one")]
    OneLevel,
    /// The base object and everything below it.
    #[default]
    #[serde(alias = "sub")]
    Subtree,
}

impl SearchScope {
    /// Get the canonical string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchScope::Base => "base",
            SearchScope::OneLevel => "onelevel",
            SearchScope::Subtree => "subtree",
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SearchScope {
    type Err = ParseSearchScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "base" => Ok(SearchScope::Base),
            "onelevel" | "one" => Ok(SearchScope::OneLevel),
            "subtree" | "sub" => Ok(SearchScope::Subtree),
            _ => Err(ParseSearchScopeError(s.to_string())),
        }
    }
}

/// Error parsing a search scope from string.
#[derive(Debug, Clone)]
pub struct ParseSearchScopeError(String);

impl fmt::Display for ParseSearchScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid search scope '{}', expected one of: base, onelevel, subtree",
            self.0
        )
    }
}

impl std::error::Error for ParseSearchScopeError {}

/// LDAP result code (RFC 4511 section 4.1.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCode(pub u32);

impl ResultCode {
    pub const SUCCESS: ResultCode = ResultCode(0);
    pub const OPERATIONS_ERROR: ResultCode = ResultCode(1);
    pub const PROTOCOL_ERROR: ResultCode = ResultCode(2);
    pub const TIME_LIMIT_EXCEEDED: ResultCode = ResultCode(3);
    pub const SIZE_LIMIT_EXCEEDED: ResultCode = ResultCode(4);
    pub const REFERRAL: ResultCode = ResultCode(10);
    pub const ADMIN_LIMIT_EXCEEDED: ResultCode = ResultCode(11);
    pub const UNAVAILABLE_CRITICAL_EXTENSION: ResultCode = ResultCode(12);
    pub const NO_SUCH_OBJECT: ResultCode = ResultCode(32);
    pub const INVALID_CREDENTIALS: ResultCode = ResultCode(49);
    pub const INSUFFICIENT_ACCESS_RIGHTS: ResultCode = ResultCode(50);
    pub const BUSY: ResultCode = ResultCode(51);
    pub const UNAVAILABLE: ResultCode = ResultCode(52);

    /// Check if this code means the operation succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }

    /// Check if a search answered with this code should end the page loop
    /// with a warning instead of failing the query.
    ///
    /// Entries delivered together with a recoverable code are kept.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            *self,
            Self::TIME_LIMIT_EXCEEDED
                | Self::SIZE_LIMIT_EXCEEDED
                | Self::REFERRAL
                | Self::ADMIN_LIMIT_EXCEEDED
                | Self::NO_SUCH_OBJECT
        )
    }

    /// Get the RFC 4511 name of the code, if known.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self.0 {
            0 => "success",
            1 => "operationsError",
            2 => "protocolError",
            3 => "timeLimitExceeded",
            4 => "sizeLimitExceeded",
            10 => "referral",
            11 => "adminLimitExceeded",
            12 => "unavailableCriticalExtension",
            32 => "noSuchObject",
            49 => "invalidCredentials",
            50 => "insufficientAccessRights",
            51 => "busy",
            52 => "unavailable",
            53 => "unwillingToPerform",
            _ => "other",
        }
    }
}

impl From<u32> for ResultCode {
    fn from(code: u32) -> Self {
        ResultCode(code)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.name())
    }
}
