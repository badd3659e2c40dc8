//! Paged search and range resolution
//!
//! A [`SearchRun`] drives one logical search over an open session: page
//! requests go out until the server hands back an empty cursor, and every
//! entry of a page is resolved (formatted, merged, range slices fetched)
//! before the next page is requested. The slices of one ranged attribute
//! are walked in a loop of base-scope follow-ups under the same query id,
//! so all of it lands in one accumulator.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use adquery_core::error::{QueryError, QueryResult};
use adquery_core::ids::QueryId;
use adquery_core::operation::{PageRequest, PageResponse, RawEntry};
use adquery_core::traits::DirectorySession;
use adquery_core::types::ResultCode;

use crate::accumulator::QueryAccumulator;
use crate::config::{QueryOptions, RangeFailurePolicy, SearchSpecification};
use crate::format::ValueFormatter;
use crate::range::{AttributeDescription, AttributeRange, KeyOption};

/// Non-fatal conditions met during a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchWarning {
    /// The server ended a page loop with a recoverable result code. Entries
    /// received up to that point are kept.
    Recoverable {
        base_dn: String,
        code: ResultCode,
        message: String,
    },
    /// A returned attribute key carried an option other than a valid range.
    UnrecognizedOption { dn: String, key: String },
    /// Range retrieval for an attribute stopped early; the attribute holds
    /// the slices merged before the failure.
    RangeRetrievalFailed {
        dn: String,
        attribute: String,
        error: String,
    },
}

impl fmt::Display for SearchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchWarning::Recoverable {
                base_dn,
                code,
                message,
            } => write!(f, "search of '{}' ended early with {}: {}", base_dn, code, message),
            SearchWarning::UnrecognizedOption { dn, key } => {
                write!(f, "unrecognized attribute option '{}' on '{}'", key, dn)
            }
            SearchWarning::RangeRetrievalFailed {
                dn,
                attribute,
                error,
            } => write!(
                f,
                "range retrieval for '{}' on '{}' incomplete: {}",
                attribute, dn, error
            ),
        }
    }
}

/// Page loop states.
#[derive(Debug)]
pub(crate) enum PageState {
    /// Send the current request (first page or cursor echoed back).
    Requesting,
    /// A page arrived and its entries still need resolving.
    PageReceived(PageResponse),
    /// The cursor is exhausted or the server ended the search early.
    Done,
}

/// Counters for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunStats {
    pub pages: u32,
    pub range_requests: u32,
}

/// State shared by the top-level search and all of its range sub-searches.
pub(crate) struct SearchRun<'a> {
    session: &'a mut dyn DirectorySession,
    spec: &'a SearchSpecification,
    options: &'a QueryOptions,
    formatter: ValueFormatter,
    cancel: &'a CancellationToken,
    request_timeout: Duration,
    accumulator: QueryAccumulator,
    warnings: Vec<SearchWarning>,
    stats: RunStats,
}

impl<'a> SearchRun<'a> {
    pub(crate) fn new(
        session: &'a mut dyn DirectorySession,
        spec: &'a SearchSpecification,
        options: &'a QueryOptions,
        cancel: &'a CancellationToken,
        accumulator: QueryAccumulator,
    ) -> Self {
        Self {
            session,
            spec,
            options,
            formatter: ValueFormatter::new().with_guid_detection(options.detect_guid_blobs),
            cancel,
            request_timeout: spec.target.connection.request_timeout(),
            accumulator,
            warnings: Vec::new(),
            stats: RunStats::default(),
        }
    }

    /// Release the accumulated results.
    pub(crate) fn finish(self) -> (QueryAccumulator, Vec<SearchWarning>, RunStats) {
        (self.accumulator, self.warnings, self.stats)
    }

    /// Run one logical search until its cursor is exhausted.
    pub(crate) async fn paged_search(
        &mut self,
        query_id: QueryId,
        mut request: PageRequest,
    ) -> QueryResult<()> {
        self.accumulator.check_query(query_id)?;

        let mut state = PageState::Requesting;
        let mut page = 0u32;

        loop {
            state = match state {
                PageState::Requesting => {
                    let response = self.fetch_page(&request).await?;
                    page += 1;
                    self.stats.pages += 1;
                    debug!(
                        base_dn = %request.base_dn,
                        page,
                        entries = response.entries.len(),
                        result_code = %response.result_code,
                        "Page received"
                    );
                    PageState::PageReceived(response)
                }
                PageState::PageReceived(response) => {
                    self.process_page(query_id, &mut request, response).await?
                }
                PageState::Done => break,
            };
        }

        Ok(())
    }

    /// Resolve the entries of a page and decide where the loop goes next.
    async fn process_page(
        &mut self,
        query_id: QueryId,
        request: &mut PageRequest,
        response: PageResponse,
    ) -> QueryResult<PageState> {
        let PageResponse {
            entries,
            cursor,
            result_code,
            message,
        } = response;

        check_result_code(&request.base_dn, result_code, &message)?;

        for entry in entries {
            self.resolve_entry(query_id, entry).await?;
        }

        if !result_code.is_success() {
            self.ended_early(&request.base_dn, result_code, message);
            return Ok(PageState::Done);
        }

        if cursor.is_empty() {
            return Ok(PageState::Done);
        }

        request.cursor = cursor;
        Ok(PageState::Requesting)
    }

    /// Record a recoverable result code that ended a page loop.
    fn ended_early(&mut self, base_dn: &str, code: ResultCode, message: String) {
        warn!(
            base_dn,
            result_code = %code,
            diagnostic = %message,
            "Search ended early, keeping results received so far"
        );
        self.warnings.push(SearchWarning::Recoverable {
            base_dn: base_dn.to_string(),
            code,
            message,
        });
    }

    /// One round trip, bounded by the request timeout and the cancel token.
    async fn fetch_page(&mut self, request: &PageRequest) -> QueryResult<PageResponse> {
        let cancel = self.cancel;
        let timeout = self.request_timeout;
        let session = &mut *self.session;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(QueryError::Cancelled),
            result = tokio::time::timeout(timeout, session.search_page(request)) => match result {
                Ok(response) => response,
                Err(_) => Err(QueryError::RequestTimeout {
                    timeout_secs: timeout.as_secs(),
                }),
            },
        }
    }

    /// Format and merge every attribute of an entry, fetching outstanding
    /// range slices depth-first.
    async fn resolve_entry(&mut self, query_id: QueryId, entry: RawEntry) -> QueryResult<()> {
        self.accumulator.add_entry(query_id, &entry.dn)?;

        for attribute in &entry.attributes {
            let description = AttributeDescription::parse(&attribute.key);
            let name = description.name;
            let values = self.formatter.format(name, &attribute.values);

            match description.option {
                KeyOption::None => {
                    self.accumulator
                        .merge(query_id, &entry.dn, name, values, None)?;
                }
                KeyOption::Range(range) => {
                    self.accumulator
                        .merge(query_id, &entry.dn, name, values, Some(range))?;
                    if !range.is_final() {
                        self.fetch_range(query_id, &entry.dn, name, range).await?;
                    }
                }
                KeyOption::Unrecognized(option) => {
                    self.accumulator
                        .merge(query_id, &entry.dn, name, values, None)?;
                    warn!(dn = %entry.dn, key = %attribute.key, option, "Unrecognized attribute option");
                    self.warnings.push(SearchWarning::UnrecognizedOption {
                        dn: entry.dn.clone(),
                        key: attribute.key.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Fetch every slice of an attribute after `received`.
    async fn fetch_range(
        &mut self,
        query_id: QueryId,
        dn: &str,
        attribute: &str,
        received: AttributeRange,
    ) -> QueryResult<()> {
        let outcome = self
            .fetch_range_slices(query_id, dn, attribute, received)
            .await;

        match outcome {
            Err(e)
                if self.options.range_failure_policy == RangeFailurePolicy::KeepPartial
                    && !e.is_connection_level() =>
            {
                warn!(
                    dn,
                    attribute,
                    error = %e,
                    "Range retrieval failed, keeping values merged so far"
                );
                self.accumulator.mark_partial(dn, attribute);
                self.warnings.push(SearchWarning::RangeRetrievalFailed {
                    dn: dn.to_string(),
                    attribute: attribute.to_string(),
                    error: e.to_string(),
                });
                Ok(())
            }
            other => other,
        }
    }

    /// Walk the slices of one attribute, one follow-up per iteration.
    async fn fetch_range_slices(
        &mut self,
        query_id: QueryId,
        dn: &str,
        attribute: &str,
        received: AttributeRange,
    ) -> QueryResult<()> {
        let mut next = received.next();

        while let Some(range) = next.take() {
            let requests = self.accumulator.record_range_request(dn, attribute);
            if let Some(limit) = self.options.max_range_requests {
                if requests > limit {
                    return Err(QueryError::RangeLimitExceeded {
                        dn: dn.to_string(),
                        attribute: attribute.to_string(),
                        limit,
                    });
                }
            }

            self.stats.range_requests += 1;
            let request = self.spec.range_request(dn, attribute, range);
            debug!(dn, attribute, range = %range, "Requesting next range slice");

            next = self.fetch_slice(query_id, dn, attribute, request).await?;
        }

        if self.accumulator.is_complete(dn, attribute) {
            Ok(())
        } else {
            Err(QueryError::protocol(format!(
                "range retrieval for '{}' on '{}' ended before the final slice",
                attribute, dn
            )))
        }
    }

    /// Run one base-scope follow-up and merge the slice it returns.
    ///
    /// Only keys of the attribute being walked are merged. Returns the
    /// slice to request next, if any.
    async fn fetch_slice(
        &mut self,
        query_id: QueryId,
        dn: &str,
        attribute: &str,
        mut request: PageRequest,
    ) -> QueryResult<Option<AttributeRange>> {
        let mut next = None;

        loop {
            let response = self.fetch_page(&request).await?;
            self.stats.pages += 1;
            let PageResponse {
                entries,
                cursor,
                result_code,
                message,
            } = response;

            check_result_code(&request.base_dn, result_code, &message)?;

            for entry in entries.iter().filter(|e| e.dn.eq_ignore_ascii_case(dn)) {
                for raw in &entry.attributes {
                    let description = AttributeDescription::parse(&raw.key);
                    if !description.name.eq_ignore_ascii_case(attribute) {
                        debug!(dn, key = %raw.key, "Ignoring key outside the walked attribute");
                        continue;
                    }
                    let Some(range) = description.range() else {
                        debug!(dn, key = %raw.key, "Ignoring unranged key in range follow-up");
                        continue;
                    };

                    let values = self.formatter.format(attribute, &raw.values);
                    self.accumulator
                        .merge(query_id, dn, attribute, values, Some(range))?;
                    next = range.next();
                }
            }

            if !result_code.is_success() {
                self.ended_early(&request.base_dn, result_code, message);
                return Ok(None);
            }
            if cursor.is_empty() {
                return Ok(next);
            }
            request.cursor = cursor;
        }
    }
}

/// Fail on any result code that is neither success nor recoverable.
fn check_result_code(base_dn: &str, code: ResultCode, message: &str) -> QueryResult<()> {
    if code.is_success() || code.is_recoverable() {
        return Ok(());
    }
    warn!(base_dn, result_code = %code, diagnostic = message, "Search failed");
    Err(QueryError::directory(code, message.to_string()))
}
