//! Common test utilities for adquery-ldap integration tests.
//!
//! [`MockDirectory`] is an in-memory directory that answers page requests the
//! way Active Directory does: offset cursors, size limits, and ranged values
//! once an attribute holds more values than `max_value_range`.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard, Once};
use std::time::Duration;

use adquery_core::async_trait;
use adquery_core::prelude::*;
use adquery_ldap::SearchSpecification;

pub const BASE_DN: &str = "DC=example,DC=com";

static TRACING: Once = Once::new();

/// Route engine logs to the test harness; `RUST_LOG` selects the level.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Test data factory for one directory object.
#[derive(Debug, Clone)]
pub struct MockEntry {
    pub dn: String,
    pub attributes: Vec<(String, Vec<RawValue>)>,
}

impl MockEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    /// Add a text-valued attribute.
    pub fn attr<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.push((
            name.to_string(),
            values.into_iter().map(|v| RawValue::Text(v.into())).collect(),
        ));
        self
    }

    /// Add a binary attribute, classified the way the wire layer would.
    pub fn binary(mut self, name: &str, values: Vec<Vec<u8>>) -> Self {
        self.attributes.push((
            name.to_string(),
            values.into_iter().map(RawValue::from_octets).collect(),
        ));
        self
    }
}

/// Creates a user object.
pub fn create_user(cn: &str) -> MockEntry {
    MockEntry::new(format!("CN={},OU=Users,{}", cn, BASE_DN))
        .attr("objectClass", ["top", "person", "user"])
        .attr("cn", [cn])
        .attr("sAMAccountName", [cn.to_lowercase()])
        .attr("mail", [format!("{}@example.com", cn.to_lowercase())])
}

/// Creates `count` numbered users.
pub fn create_users(count: usize) -> Vec<MockEntry> {
    (0..count).map(|i| create_user(&format!("User{:04}", i))).collect()
}

/// Creates a group whose `member` attribute lists `members` users.
pub fn create_group(cn: &str, members: usize) -> MockEntry {
    MockEntry::new(format!("CN={},OU=Groups,{}", cn, BASE_DN))
        .attr("objectClass", ["top", "group"])
        .attr("cn", [cn])
        .attr("member", member_dns(members))
}

pub fn member_dns(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("CN=User{:04},OU=Users,{}", i, BASE_DN))
        .collect()
}

/// How the mock rejects connection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailure {
    Unreachable,
    InvalidCredentials,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub entries: Vec<MockEntry>,
    /// Values per range slice; 0 disables ranging.
    pub max_value_range: usize,
    pub connect_failure: Option<ConnectFailure>,
    pub connect_delay: Option<Duration>,
    pub page_delay: Option<Duration>,
    /// Answer a range request starting at this low bound with this code.
    pub fail_range_low: Option<(u32, ResultCode)>,
    /// Report range slices one past their real low bound.
    pub misreport_range_low: bool,
    pub requests: Vec<PageRequest>,
    pub connects: usize,
    pub closes: usize,
}

/// In-memory directory implementing [`DirectoryConnector`].
#[derive(Debug, Clone, Default)]
pub struct MockDirectory {
    state: Arc<Mutex<MockState>>,
}

impl MockDirectory {
    pub fn new(entries: Vec<MockEntry>) -> Self {
        let directory = Self::default();
        directory.state().entries = entries;
        directory
    }

    pub fn with_max_value_range(self, max: usize) -> Self {
        self.state().max_value_range = max;
        self
    }

    pub fn with_connect_failure(self, failure: ConnectFailure) -> Self {
        self.state().connect_failure = Some(failure);
        self
    }

    pub fn with_connect_delay(self, delay: Duration) -> Self {
        self.state().connect_delay = Some(delay);
        self
    }

    pub fn with_page_delay(self, delay: Duration) -> Self {
        self.state().page_delay = Some(delay);
        self
    }

    pub fn with_range_failure(self, low: u32, code: ResultCode) -> Self {
        self.state().fail_range_low = Some((low, code));
        self
    }

    pub fn with_misreported_ranges(self) -> Self {
        self.state().misreport_range_low = true;
        self
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.state().requests.clone()
    }

    /// Requests that asked for a range slice.
    pub fn range_requests(&self) -> Vec<PageRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.attributes.iter().any(|a| a.contains(";range=")))
            .collect()
    }

    pub fn connects(&self) -> usize {
        self.state().connects
    }

    pub fn closes(&self) -> usize {
        self.state().closes
    }
}

#[async_trait]
impl DirectoryConnector for MockDirectory {
    async fn connect(&self, _target: &ConnectionTarget) -> QueryResult<BoxedSession> {
        let (failure, delay) = {
            let mut state = self.state();
            state.connects += 1;
            (state.connect_failure, state.connect_delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match failure {
            Some(ConnectFailure::Unreachable) => {
                Err(QueryError::connection_failed("connection refused"))
            }
            Some(ConnectFailure::InvalidCredentials) => Err(QueryError::authentication_failed(
                "80090308: LdapErr: DSID-0C090439, comment: AcceptSecurityContext error",
            )),
            None => Ok(Box::new(MockSession {
                state: Arc::clone(&self.state),
            })),
        }
    }
}

pub struct MockSession {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl DirectorySession for MockSession {
    async fn search_page(&mut self, request: &PageRequest) -> QueryResult<PageResponse> {
        let delay = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.requests.push(request.clone());
            state.page_delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(answer(&state, request))
    }

    async fn close(&mut self) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).closes += 1;
    }
}

fn answer(state: &MockState, request: &PageRequest) -> PageResponse {
    let known_base = state
        .entries
        .iter()
        .any(|e| in_subtree(&e.dn, &request.base_dn));
    if !known_base {
        return failure(ResultCode::NO_SUCH_OBJECT, "0000208D: NameErr: DSID-03100241");
    }

    let matching: Vec<&MockEntry> = state
        .entries
        .iter()
        .filter(|e| in_scope(&e.dn, &request.base_dn, request.scope))
        .filter(|e| matches_filter(e, &request.filter))
        .collect();

    let total = matching.len();
    let limit = if request.size_limit > 0 {
        total.min(request.size_limit as usize)
    } else {
        total
    };

    let offset: usize = std::str::from_utf8(&request.cursor)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let end = (offset + request.page_size as usize).min(limit);

    let mut entries = Vec::new();
    for entry in &matching[offset.min(end)..end] {
        match project(state, entry, &request.attributes) {
            Ok(raw) => entries.push(raw),
            Err(code) => return failure(code, "range retrieval rejected"),
        }
    }

    if end < limit {
        return PageResponse::success(entries, end.to_string().into_bytes());
    }

    if limit < total {
        return PageResponse {
            entries,
            cursor: Vec::new(),
            result_code: ResultCode::SIZE_LIMIT_EXCEEDED,
            message: String::new(),
        };
    }

    PageResponse::success(entries, Vec::new())
}

fn failure(code: ResultCode, message: &str) -> PageResponse {
    PageResponse {
        entries: Vec::new(),
        cursor: Vec::new(),
        result_code: code,
        message: message.to_string(),
    }
}

fn parent(dn: &str) -> &str {
    dn.split_once(',').map_or("", |(_, rest)| rest)
}

fn in_subtree(dn: &str, base: &str) -> bool {
    let dn = dn.to_ascii_lowercase();
    let base = base.to_ascii_lowercase();
    dn == base || dn.ends_with(&format!(",{}", base))
}

fn in_scope(dn: &str, base: &str, scope: SearchScope) -> bool {
    match scope {
        SearchScope::Base => dn.eq_ignore_ascii_case(base),
        SearchScope::OneLevel => parent(dn).eq_ignore_ascii_case(base),
        SearchScope::Subtree => in_subtree(dn, base),
    }
}

/// Presence `(attr=*)` and equality `(attr=value)` filters only.
fn matches_filter(entry: &MockEntry, filter: &str) -> bool {
    let inner = filter.trim().trim_start_matches('(').trim_end_matches(')');
    let Some((name, wanted)) = inner.split_once('=') else {
        return false;
    };

    if wanted == "*" && name.eq_ignore_ascii_case("objectClass") {
        return true;
    }

    entry
        .attributes
        .iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case(name))
        .any(|(_, values)| {
            wanted == "*"
                || values
                    .iter()
                    .filter_map(RawValue::as_text)
                    .any(|v| v.eq_ignore_ascii_case(wanted))
        })
}

/// Build the returned entry, slicing attributes like AD's MaxValRange.
fn project(
    state: &MockState,
    entry: &MockEntry,
    requested: &[String],
) -> Result<RawEntry, ResultCode> {
    let mut raw = RawEntry::new(entry.dn.clone());

    for (name, values) in &entry.attributes {
        let selection = if requested.is_empty() {
            Some(None)
        } else {
            requested.iter().find_map(|r| {
                let (bare, option) = match r.split_once(';') {
                    Some((bare, option)) => (bare, Some(option)),
                    None => (r.as_str(), None),
                };
                bare.eq_ignore_ascii_case(name).then(|| option.and_then(parse_range))
            })
        };

        let Some(range) = selection else {
            continue;
        };

        if range.is_none() && (state.max_value_range == 0 || values.len() <= state.max_value_range)
        {
            raw.attributes.push(RawAttribute::new(name.clone(), values.clone()));
            continue;
        }

        let (low, high) = range.unwrap_or((0, None));
        if let Some((fail_low, code)) = state.fail_range_low {
            if range.is_some() && fail_low == low {
                return Err(code);
            }
        }

        let low_idx = (low as usize).min(values.len());
        let mut end = values.len();
        if state.max_value_range > 0 {
            end = end.min(low_idx + state.max_value_range);
        }
        if let Some(high) = high {
            end = end.min(high as usize + 1);
        }

        let reported_low = if state.misreport_range_low { low + 1 } else { low };
        let key = if end >= values.len() {
            format!("{};range={}-*", name, reported_low)
        } else {
            format!("{};range={}-{}", name, reported_low, end - 1)
        };
        raw.attributes
            .push(RawAttribute::new(key, values[low_idx..end.max(low_idx)].to_vec()));
    }

    Ok(raw)
}

fn parse_range(option: &str) -> Option<(u32, Option<u32>)> {
    let bounds = option.strip_prefix("range=")?;
    let (low, high) = bounds.split_once('-')?;
    let high = if high == "*" {
        None
    } else {
        Some(high.parse().ok()?)
    };
    Some((low.parse().ok()?, high))
}

/// Search specification against the mock with basic credentials.
pub fn spec() -> SearchSpecification {
    SearchSpecification::new(
        ConnectionTarget::new("dc1.example.com").with_auth(AuthMode::Basic {
            username: "svc-reader@example.com".to_string(),
            password: "secret".to_string(),
        }),
        BASE_DN,
    )
}
