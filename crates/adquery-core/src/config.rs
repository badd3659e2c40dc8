//! Connection configuration types
//!
//! Where to connect, how to authenticate, and how long to wait.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{QueryError, QueryResult};

const REDACTED: &str = "***REDACTED***";

/// Timeouts applied to a directory session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Connection (TCP + TLS + bind) timeout in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Timeout for a single search round trip in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connection_timeout_secs: default_connection_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ConnectionSettings {
    /// Create new connection settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection timeout.
    pub fn with_connection_timeout(mut self, secs: u64) -> Self {
        self.connection_timeout_secs = secs;
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Get connection timeout as Duration.
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Get request timeout as Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Server certificate verification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Whether to verify the server certificate.
    #[serde(default = "default_true")]
    pub verify_certificate: bool,

    /// Path to an additional CA certificate (PEM) to trust.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert_path: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            verify_certificate: true,
            ca_cert_path: None,
        }
    }
}

impl TlsConfig {
    /// Log a warning when the configuration disables verification.
    pub fn validate_security(&self) {
        if !self.verify_certificate {
            tracing::warn!(
                target: "security",
                "TLS certificate verification is DISABLED; the directory session is open to \
                 man-in-the-middle attacks"
            );
        }
    }
}

/// Client certificate presented during TLS negotiation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCertificate {
    /// Path to a PKCS#12 bundle holding certificate and private key.
    pub pkcs12_path: String,

    /// Password protecting the bundle.
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for ClientCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCertificate")
            .field("pkcs12_path", &self.pkcs12_path)
            .field("password", &REDACTED)
            .finish()
    }
}

/// How the session authenticates. Exactly one mode applies per search.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AuthMode {
    /// Anonymous session identified by a TLS client certificate; no bind.
    Certificate(ClientCertificate),

    /// Simple bind with a username (DN or UPN) and password.
    Basic { username: String, password: String },

    /// Kerberos/negotiate bind with the ambient ticket of the current identity.
    ///
    /// Only `adquery-ldap` builds with its `gssapi` feature can bind this
    /// way; other builds fail with `InvalidConfiguration` at connect time.
    #[default]
    Negotiate,
}

impl AuthMode {
    /// Short name used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Certificate(_) => "certificate",
            AuthMode::Basic { .. } => "basic",
            AuthMode::Negotiate => "negotiate",
        }
    }
}

impl std::fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::Certificate(cert) => f.debug_tuple("Certificate").field(cert).finish(),
            AuthMode::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &REDACTED)
                .finish(),
            AuthMode::Negotiate => write!(f, "Negotiate"),
        }
    }
}

/// Everything needed to open a bound session to one directory server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    /// Server hostname or IP address.
    pub server: String,

    /// Server port (389 for LDAP, 636 for LDAPS).
    #[serde(default = "default_ldap_port")]
    pub port: u16,

    /// Use LDAPS.
    #[serde(default)]
    pub use_ssl: bool,

    /// Upgrade a plain connection with STARTTLS.
    #[serde(default)]
    pub use_starttls: bool,

    /// Authentication mode.
    #[serde(default)]
    pub auth: AuthMode,

    /// Timeouts.
    #[serde(default)]
    pub connection: ConnectionSettings,

    /// Certificate verification.
    #[serde(default)]
    pub tls: TlsConfig,
}

fn default_ldap_port() -> u16 {
    389
}

impl ConnectionTarget {
    /// Create a target for a plain LDAP server using the current identity.
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            port: default_ldap_port(),
            use_ssl: false,
            use_starttls: false,
            auth: AuthMode::default(),
            connection: ConnectionSettings::default(),
            tls: TlsConfig::default(),
        }
    }

    /// Set the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable LDAPS on port 636.
    #[must_use]
    pub fn with_ssl(mut self) -> Self {
        self.use_ssl = true;
        self.port = 636;
        self
    }

    /// Set the authentication mode.
    #[must_use]
    pub fn with_auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    /// Set timeouts.
    #[must_use]
    pub fn with_connection_settings(mut self, connection: ConnectionSettings) -> Self {
        self.connection = connection;
        self
    }

    /// Get the LDAP URL.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.server, self.port)
    }

    /// Validate the target.
    pub fn validate(&self) -> QueryResult<()> {
        if self.server.trim().is_empty() {
            return Err(QueryError::invalid_configuration("server is required"));
        }

        if self.port == 0 {
            return Err(QueryError::invalid_configuration(
                "port must be between 1 and 65535",
            ));
        }

        if self.use_ssl && self.use_starttls {
            return Err(QueryError::invalid_configuration(
                "cannot use both SSL and STARTTLS",
            ));
        }

        match &self.auth {
            AuthMode::Certificate(cert) => {
                if !self.use_ssl && !self.use_starttls {
                    return Err(QueryError::invalid_configuration(
                        "certificate authentication requires SSL or STARTTLS",
                    ));
                }
                if cert.pkcs12_path.is_empty() {
                    return Err(QueryError::invalid_configuration(
                        "certificate authentication requires a PKCS#12 path",
                    ));
                }
            }
            AuthMode::Basic { username, .. } => {
                if username.is_empty() {
                    return Err(QueryError::invalid_configuration(
                        "basic authentication requires a username",
                    ));
                }
            }
            AuthMode::Negotiate => {}
        }

        if self.connection.connection_timeout_secs == 0 || self.connection.request_timeout_secs == 0
        {
            return Err(QueryError::invalid_configuration(
                "timeouts must be at least one second",
            ));
        }

        Ok(())
    }
}
