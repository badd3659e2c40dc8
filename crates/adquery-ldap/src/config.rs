//! Search configuration
//!
//! Configuration types for one directory search and the engine options
//! that govern range retrieval.

use serde::{Deserialize, Serialize};

use adquery_core::config::ConnectionTarget;
use adquery_core::error::{QueryError, QueryResult};
use adquery_core::operation::PageRequest;
use adquery_core::types::SearchScope;

use crate::range::AttributeRange;

/// Filter matching every object; used for range follow-ups.
pub const MATCH_ALL_FILTER: &str = "(objectClass=*)";

/// One directory search: where to connect and what to ask for.
///
/// Immutable for the duration of a search. Range follow-ups are derived
/// with [`SearchSpecification::range_request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpecification {
    /// Server, port, transport security and authentication.
    #[serde(flatten)]
    pub target: ConnectionTarget,

    /// Search base (e.g., "DC=example,DC=com").
    pub base_dn: String,

    /// LDAP filter string.
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Attributes to return; empty means all user attributes. Names may
    /// carry an explicit `;range=` option.
    #[serde(default)]
    pub attributes: Vec<String>,

    /// Search scope.
    #[serde(default)]
    pub scope: SearchScope,

    /// Maximum entries for the whole search; 0 means no limit.
    #[serde(default)]
    pub size_limit: u32,

    /// Entries per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_filter() -> String {
    MATCH_ALL_FILTER.to_string()
}

fn default_page_size() -> u32 {
    1000
}

impl SearchSpecification {
    /// Create a subtree search of `base_dn` matching every object.
    pub fn new(target: ConnectionTarget, base_dn: impl Into<String>) -> Self {
        Self {
            target,
            base_dn: base_dn.into(),
            filter: default_filter(),
            attributes: Vec::new(),
            scope: SearchScope::default(),
            size_limit: 0,
            page_size: default_page_size(),
        }
    }

    /// Set the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Set the attributes to return.
    #[must_use]
    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the scope.
    #[must_use]
    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the size limit.
    #[must_use]
    pub fn with_size_limit(mut self, size_limit: u32) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Set the page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Validate the specification, including the connection target.
    pub fn validate(&self) -> QueryResult<()> {
        self.target.validate()?;

        if self.base_dn.trim().is_empty() {
            return Err(QueryError::invalid_configuration("base_dn is required"));
        }

        let filter = self.filter.trim();
        if !(filter.starts_with('(') && filter.ends_with(')')) {
            return Err(QueryError::invalid_configuration(format!(
                "filter must be enclosed in parentheses: {}",
                self.filter
            )));
        }

        if self.attributes.iter().any(|a| a.trim().is_empty()) {
            return Err(QueryError::invalid_configuration(
                "attribute names must not be empty",
            ));
        }

        if self.page_size == 0 {
            return Err(QueryError::invalid_configuration(
                "page_size must be at least 1",
            ));
        }

        Ok(())
    }

    /// The first page request of the top-level search.
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            base_dn: self.base_dn.clone(),
            scope: self.scope,
            filter: self.filter.clone(),
            attributes: self.attributes.clone(),
            size_limit: self.size_limit,
            page_size: self.page_size,
            cursor: Vec::new(),
        }
    }

    /// A base-scope request for the next slice of one attribute of one entry.
    pub fn range_request(&self, dn: &str, attribute: &str, range: AttributeRange) -> PageRequest {
        PageRequest {
            base_dn: dn.to_string(),
            scope: SearchScope::Base,
            filter: MATCH_ALL_FILTER.to_string(),
            attributes: vec![range.qualify(attribute)],
            size_limit: 0,
            page_size: self.page_size,
            cursor: Vec::new(),
        }
    }
}

/// What to do when retrieving further range slices of an attribute fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RangeFailurePolicy {
    /// Fail the whole query.
    #[default]
    Abort,
    /// Keep the values merged so far, report the attribute as partial and
    /// add a warning.
    KeepPartial,
}

/// Engine options independent of any single search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Handling of failed range follow-ups.
    #[serde(default)]
    pub range_failure_policy: RangeFailurePolicy,

    /// Maximum range follow-up searches per attribute per entry; `None` is
    /// unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_range_requests: Option<u32>,

    /// Read untyped 16-byte binary values as GUIDs.
    #[serde(default = "default_true")]
    pub detect_guid_blobs: bool,
}

fn default_true() -> bool {
    true
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            range_failure_policy: RangeFailurePolicy::default(),
            max_range_requests: None,
            detect_guid_blobs: true,
        }
    }
}

impl QueryOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the range failure policy.
    #[must_use]
    pub fn with_range_failure_policy(mut self, policy: RangeFailurePolicy) -> Self {
        self.range_failure_policy = policy;
        self
    }

    /// Cap range follow-up searches per attribute.
    #[must_use]
    pub fn with_max_range_requests(mut self, limit: u32) -> Self {
        self.max_range_requests = Some(limit);
        self
    }

    /// Enable or disable the GUID heuristic.
    #[must_use]
    pub fn with_guid_detection(mut self, enabled: bool) -> Self {
        self.detect_guid_blobs = enabled;
        self
    }
}

/// Derive a base DN from a DNS domain name.
///
/// `example.com` becomes `DC=example,DC=com`.
#[must_use]
pub fn domain_to_base_dn(domain: &str) -> String {
    domain
        .trim_matches('.')
        .split('.')
        .filter(|part| !part.is_empty())
        .map(|part| format!("DC={part}"))
        .collect::<Vec<_>>()
        .join(",")
}
