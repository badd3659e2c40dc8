//! Command-line arguments and query file loading

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueEnum};
use serde::Deserialize;

use adquery_core::config::{AuthMode, ClientCertificate, ConnectionTarget};
use adquery_core::types::SearchScope;
use adquery_ldap::config::domain_to_base_dn;
use adquery_ldap::{QueryOptions, RangeFailurePolicy, SearchSpecification};

use crate::error::{CliError, CliResult};
use crate::logging::LogFormat;

/// adquery - Query Active Directory over LDAP
///
/// Prints every matching entry as one JSON object per line. Large
/// multi-valued attributes are retrieved in full.
#[derive(Parser, Debug)]
#[command(name = "adquery")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML file holding a `search` section and optional `options`
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Directory server hostname
    #[arg(short = 's', long, env = "ADQUERY_SERVER")]
    pub server: Option<String>,

    /// Server port (default 389, or 636 with --ssl)
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Search base DN
    #[arg(short = 'b', long = "base")]
    pub base_dn: Option<String>,

    /// DNS domain to derive the search base from (e.g. example.com)
    #[arg(long, conflicts_with = "base_dn")]
    pub domain: Option<String>,

    /// LDAP filter
    #[arg(short = 'f', long)]
    pub filter: Option<String>,

    /// Comma-separated attributes to return (default: all)
    #[arg(short = 'a', long, value_delimiter = ',')]
    pub attributes: Vec<String>,

    /// Search scope: base, onelevel or subtree
    #[arg(long)]
    pub scope: Option<SearchScope>,

    /// Maximum number of entries (0 = no limit)
    #[arg(long)]
    pub size_limit: Option<u32>,

    /// Entries per page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Use LDAPS
    #[arg(long)]
    pub ssl: bool,

    /// Upgrade the connection with STARTTLS
    #[arg(long, conflicts_with = "ssl")]
    pub starttls: bool,

    /// Do not verify the server certificate
    #[arg(long)]
    pub insecure: bool,

    /// Extra CA certificate (PEM) to trust
    #[arg(long)]
    pub ca_cert: Option<String>,

    /// Bind user (DN or UPN) for simple authentication.
    ///
    /// Without it, --client-cert or a query file, the search binds with
    /// Kerberos, which needs a build with the `gssapi` feature.
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// Bind password
    #[arg(long, env = "ADQUERY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// PKCS#12 bundle for client certificate authentication
    #[arg(long, conflicts_with = "username")]
    pub client_cert: Option<String>,

    /// Password of the PKCS#12 bundle
    #[arg(long, env = "ADQUERY_CERT_PASSWORD", hide_env_values = true)]
    pub cert_password: Option<String>,

    /// What to do when retrieving a ranged attribute fails
    #[arg(long, value_enum)]
    pub on_range_failure: Option<RangePolicyArg>,

    /// Maximum range follow-up searches per attribute
    #[arg(long)]
    pub max_range_requests: Option<u32>,

    /// Keep untyped 16-byte binary values as bytes
    #[arg(long)]
    pub no_guid_detection: bool,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Connection timeout in seconds
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Range failure policy as a flag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RangePolicyArg {
    /// Fail the whole search
    Abort,
    /// Keep the values retrieved so far and warn
    KeepPartial,
}

impl From<RangePolicyArg> for RangeFailurePolicy {
    fn from(arg: RangePolicyArg) -> Self {
        match arg {
            RangePolicyArg::Abort => RangeFailurePolicy::Abort,
            RangePolicyArg::KeepPartial => RangeFailurePolicy::KeepPartial,
        }
    }
}

/// Query file layout.
#[derive(Debug, Deserialize)]
pub struct QueryFile {
    pub search: SearchSpecification,
    #[serde(default)]
    pub options: QueryOptions,
}

impl QueryFile {
    /// Load a query file.
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

impl Cli {
    /// Build the search and engine options from the query file (if any) and
    /// the flags, flags taking precedence.
    pub fn resolve(&self) -> CliResult<(SearchSpecification, QueryOptions)> {
        let (mut spec, mut options) = match &self.config {
            Some(path) => {
                let file = QueryFile::load(path)?;
                (file.search, file.options)
            }
            None => (self.spec_from_flags()?, QueryOptions::default()),
        };

        self.apply_overrides(&mut spec, &mut options)?;
        Ok((spec, options))
    }

    fn spec_from_flags(&self) -> CliResult<SearchSpecification> {
        let server = self.server.clone().ok_or_else(|| {
            CliError::Validation("--server is required without --config".to_string())
        })?;
        let base_dn = match (&self.base_dn, &self.domain) {
            (Some(base), _) => base.clone(),
            (None, Some(domain)) => domain_to_base_dn(domain),
            (None, None) => {
                return Err(CliError::Validation(
                    "--base or --domain is required without --config".to_string(),
                ))
            }
        };

        let mut target = ConnectionTarget::new(server);
        if self.ssl {
            target = target.with_ssl();
        }
        Ok(SearchSpecification::new(target, base_dn))
    }

    fn apply_overrides(
        &self,
        spec: &mut SearchSpecification,
        options: &mut QueryOptions,
    ) -> CliResult<()> {
        let target = &mut spec.target;
        if let Some(server) = &self.server {
            target.server = server.clone();
        }
        if self.ssl && !target.use_ssl {
            target.use_ssl = true;
            target.port = 636;
        }
        if self.starttls {
            target.use_starttls = true;
        }
        if let Some(port) = self.port {
            target.port = port;
        }
        if self.insecure {
            target.tls.verify_certificate = false;
        }
        if let Some(ca) = &self.ca_cert {
            target.tls.ca_cert_path = Some(ca.clone());
        }
        if let Some(secs) = self.timeout {
            target.connection.request_timeout_secs = secs;
        }
        if let Some(secs) = self.connect_timeout {
            target.connection.connection_timeout_secs = secs;
        }
        self.apply_auth(&mut target.auth)?;

        if let Some(base) = &self.base_dn {
            spec.base_dn = base.clone();
        } else if let Some(domain) = &self.domain {
            spec.base_dn = domain_to_base_dn(domain);
        }
        if let Some(filter) = &self.filter {
            spec.filter = filter.clone();
        }
        if !self.attributes.is_empty() {
            spec.attributes = self.attributes.clone();
        }
        if let Some(scope) = self.scope {
            spec.scope = scope;
        }
        if let Some(limit) = self.size_limit {
            spec.size_limit = limit;
        }
        if let Some(size) = self.page_size {
            spec.page_size = size;
        }

        if let Some(policy) = self.on_range_failure {
            options.range_failure_policy = policy.into();
        }
        if let Some(limit) = self.max_range_requests {
            options.max_range_requests = Some(limit);
        }
        if self.no_guid_detection {
            options.detect_guid_blobs = false;
        }

        Ok(())
    }

    /// Pick the authentication mode: client certificate, then username and
    /// password, then whatever the query file says, then Kerberos.
    ///
    /// Builds without the `gssapi` feature reject the Kerberos fallback.
    fn apply_auth(&self, auth: &mut AuthMode) -> CliResult<()> {
        if let Some(path) = &self.client_cert {
            *auth = AuthMode::Certificate(ClientCertificate {
                pkcs12_path: path.clone(),
                password: self.cert_password.clone().unwrap_or_default(),
            });
            return Ok(());
        }

        if let Some(username) = &self.username {
            let password = self.password.clone().ok_or_else(|| {
                CliError::Validation(
                    "a password is required with --username (--password or ADQUERY_PASSWORD)"
                        .to_string(),
                )
            })?;
            *auth = AuthMode::Basic {
                username: username.clone(),
                password,
            };
            return Ok(());
        }

        match auth {
            AuthMode::Basic { password, .. } => {
                if let Some(p) = &self.password {
                    *password = p.clone();
                }
            }
            AuthMode::Certificate(cert) => {
                if let Some(p) = &self.cert_password {
                    cert.password = p.clone();
                }
            }
            AuthMode::Negotiate if !cfg!(feature = "gssapi") => {
                return Err(CliError::Validation(
                    "no credentials given and Kerberos support is not built in; pass --username \
                     or --client-cert, or rebuild with --features gssapi"
                        .to_string(),
                ));
            }
            AuthMode::Negotiate => {}
        }
        Ok(())
    }
}
