//! LDAP session implementation
//!
//! Opens ldap3 sessions (LDAPv3, referrals not chased) and runs single
//! page requests with the paged-results and domain-scope controls attached.

use async_trait::async_trait;
use ldap3::controls::{Control, ControlType, PagedResults, RawControl};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry, SearchOptions, SearchResult};
use native_tls::{Certificate, Identity, TlsConnector};
use tracing::{debug, info, instrument, warn};

use adquery_core::config::{AuthMode, ConnectionTarget};
use adquery_core::error::{QueryError, QueryResult};
use adquery_core::operation::{PageRequest, PageResponse, RawAttribute, RawEntry, RawValue};
use adquery_core::traits::{BoxedSession, DirectoryConnector, DirectorySession};
use adquery_core::types::{ResultCode, SearchScope};

/// LDAP_SERVER_DOMAIN_SCOPE_OID: the server must not generate referrals.
pub const DOMAIN_SCOPE_OID: &str = "1.2.840.113556.1.4.1339";

/// Opens sessions against LDAP/Active Directory servers.
#[derive(Debug, Clone, Copy, Default)]
pub struct LdapConnector;

impl LdapConnector {
    /// Create a new connector.
    pub fn new() -> Self {
        Self
    }

    /// Build the TLS connector for LDAPS/STARTTLS targets.
    ///
    /// Carries the client certificate for certificate authentication and any
    /// extra trusted CA.
    fn tls_connector(target: &ConnectionTarget) -> QueryResult<Option<TlsConnector>> {
        if !target.use_ssl && !target.use_starttls {
            return Ok(None);
        }

        target.tls.validate_security();

        let mut builder = TlsConnector::builder();
        builder.danger_accept_invalid_certs(!target.tls.verify_certificate);

        if let Some(path) = &target.tls.ca_cert_path {
            let pem = std::fs::read(path).map_err(|e| {
                QueryError::invalid_configuration(format!(
                    "cannot read CA certificate {}: {}",
                    path, e
                ))
            })?;
            let ca = Certificate::from_pem(&pem).map_err(|e| {
                QueryError::invalid_configuration(format!("invalid CA certificate {}: {}", path, e))
            })?;
            builder.add_root_certificate(ca);
        }

        if let AuthMode::Certificate(cert) = &target.auth {
            let bundle = std::fs::read(&cert.pkcs12_path).map_err(|e| {
                QueryError::invalid_configuration(format!(
                    "cannot read client certificate {}: {}",
                    cert.pkcs12_path, e
                ))
            })?;
            let identity = Identity::from_pkcs12(&bundle, &cert.password).map_err(|e| {
                QueryError::invalid_configuration(format!(
                    "cannot load client certificate {}: {}",
                    cert.pkcs12_path, e
                ))
            })?;
            builder.identity(identity);
        }

        builder.build().map(Some).map_err(|e| {
            QueryError::connection_failed_with_source("Failed to build TLS connector", e)
        })
    }

    async fn bind(ldap: &mut Ldap, target: &ConnectionTarget) -> QueryResult<()> {
        match &target.auth {
            AuthMode::Certificate(_) => {
                debug!("Client certificate presented during TLS negotiation, skipping bind");
                Ok(())
            }
            AuthMode::Basic { username, password } => {
                debug!(username = %username, "Performing LDAP simple bind");
                let result = ldap.simple_bind(username, password).await.map_err(|e| {
                    QueryError::connection_failed_with_source(
                        format!("LDAP bind failed for {}", username),
                        e,
                    )
                })?;
                check_bind_result(result.rc, &result.text)
            }
            AuthMode::Negotiate => Self::negotiate_bind(ldap, target).await,
        }
    }

    #[cfg(feature = "gssapi")]
    async fn negotiate_bind(ldap: &mut Ldap, target: &ConnectionTarget) -> QueryResult<()> {
        debug!(server = %target.server, "Performing SASL GSSAPI bind");
        let result = ldap.sasl_gssapi_bind(&target.server).await.map_err(|e| {
            QueryError::connection_failed_with_source("Kerberos bind failed", e)
        })?;
        check_bind_result(result.rc, &result.text)
    }

    #[cfg(not(feature = "gssapi"))]
    async fn negotiate_bind(_ldap: &mut Ldap, _target: &ConnectionTarget) -> QueryResult<()> {
        Err(QueryError::invalid_configuration(
            "Kerberos authentication requires the `gssapi` feature; use basic or certificate authentication",
        ))
    }
}

fn check_bind_result(rc: u32, text: &str) -> QueryResult<()> {
    match rc {
        0 => Ok(()),
        49 => Err(QueryError::authentication_failed(if text.is_empty() {
            "invalid credentials".to_string()
        } else {
            text.to_string()
        })),
        _ => Err(QueryError::connection_failed(format!(
            "LDAP bind failed with code {}: {}",
            ResultCode(rc),
            text
        ))),
    }
}

#[async_trait]
impl DirectoryConnector for LdapConnector {
    #[instrument(skip(self, target), fields(server = %target.server, port = target.port, auth = target.auth.as_str()))]
    async fn connect(&self, target: &ConnectionTarget) -> QueryResult<BoxedSession> {
        target.validate()?;

        let url = target.url();
        debug!(url = %url, "Connecting to LDAP server");

        let mut settings = LdapConnSettings::new()
            .set_conn_timeout(target.connection.connection_timeout())
            .set_starttls(target.use_starttls);
        if let Some(connector) = Self::tls_connector(target)? {
            settings = settings.set_connector(connector);
        }

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                QueryError::connection_failed_with_source(
                    format!("Failed to connect to LDAP server at {}", url),
                    e,
                )
            })?;

        // Spawn the connection driver
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        if let Err(e) = Self::bind(&mut ldap, target).await {
            let _ = ldap.unbind().await;
            return Err(e);
        }

        info!(url = %url, "LDAP session established");

        Ok(Box::new(LdapSession { ldap, url }))
    }
}

/// One bound LDAP session.
pub struct LdapSession {
    ldap: Ldap,
    url: String,
}

impl LdapSession {
    fn scope(scope: SearchScope) -> Scope {
        match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::OneLevel => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        }
    }

    fn controls(request: &PageRequest) -> Vec<RawControl> {
        vec![
            PagedResults {
                size: i32::try_from(request.page_size).unwrap_or(i32::MAX),
                cookie: request.cursor.clone(),
            }
            .into(),
            RawControl {
                ctype: DOMAIN_SCOPE_OID.to_string(),
                crit: false,
                val: None,
            },
        ]
    }

    fn next_cursor(ctrls: &[Control]) -> Vec<u8> {
        ctrls
            .iter()
            .find_map(|Control(ctype, raw)| match ctype {
                Some(ControlType::PagedResults) => Some(raw.parse::<PagedResults>().cookie),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn raw_entry(entry: SearchEntry) -> RawEntry {
        let mut attributes: Vec<RawAttribute> = entry
            .attrs
            .into_iter()
            .map(|(key, values)| {
                RawAttribute::new(key, values.into_iter().map(RawValue::Text).collect())
            })
            .collect();
        attributes.extend(entry.bin_attrs.into_iter().map(|(key, values)| {
            RawAttribute::new(key, values.into_iter().map(RawValue::Bytes).collect())
        }));

        RawEntry {
            dn: entry.dn,
            attributes,
        }
    }
}

#[async_trait]
impl DirectorySession for LdapSession {
    async fn search_page(&mut self, request: &PageRequest) -> QueryResult<PageResponse> {
        let mut options = SearchOptions::new();
        if request.size_limit > 0 {
            options = options.sizelimit(i32::try_from(request.size_limit).unwrap_or(i32::MAX));
        }

        debug!(
            base_dn = %request.base_dn,
            scope = %request.scope,
            filter = %request.filter,
            cursor_len = request.cursor.len(),
            "Sending LDAP search page"
        );

        let attributes: Vec<&str> = request.attributes.iter().map(String::as_str).collect();
        let SearchResult(entries, result) = self
            .ldap
            .with_controls(Self::controls(request))
            .with_search_options(options)
            .search(
                &request.base_dn,
                Self::scope(request.scope),
                &request.filter,
                attributes,
            )
            .await
            .map_err(|e| QueryError::protocol_with_source("LDAP search failed", e))?;

        let entries = entries
            .into_iter()
            .filter(|e| !e.is_ref())
            .map(SearchEntry::construct)
            .map(Self::raw_entry)
            .collect();

        Ok(PageResponse {
            entries,
            cursor: Self::next_cursor(&result.ctrls),
            result_code: ResultCode(result.rc),
            message: result.text,
        })
    }

    async fn close(&mut self) {
        match self.ldap.unbind().await {
            Ok(()) => debug!(url = %self.url, "LDAP session closed"),
            Err(e) => warn!(url = %self.url, error = %e, "Error during LDAP unbind"),
        }
    }
}

impl std::fmt::Debug for LdapSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapSession")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}
