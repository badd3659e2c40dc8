//! Directory query entry point
//!
//! [`DirectoryQuery`] owns a connector and runs top-level searches: one
//! session and one accumulator per call, results yielded once the top-level
//! page loop is done.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use adquery_core::error::{QueryError, QueryResult};
use adquery_core::ids::QueryId;
use adquery_core::traits::{BoxedSession, DirectoryConnector};
use adquery_core::value::DirectoryEntry;

use crate::accumulator::QueryAccumulator;
use crate::config::{QueryOptions, SearchSpecification};
use crate::paging::{SearchRun, SearchWarning};

/// Consolidated output of one top-level search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub query_id: QueryId,
    /// Entries in the order the server first returned them.
    pub entries: Vec<DirectoryEntry>,
    pub warnings: Vec<SearchWarning>,
}

impl SearchResults {
    /// Check if the search finished without warnings.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Find an entry by DN, ignoring ASCII case.
    pub fn entry(&self, dn: &str) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|e| e.dn.eq_ignore_ascii_case(dn))
    }
}

impl IntoIterator for SearchResults {
    type Item = DirectoryEntry;
    type IntoIter = std::vec::IntoIter<DirectoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Runs directory searches over sessions opened by `C`.
pub struct DirectoryQuery<C> {
    connector: C,
    options: QueryOptions,
}

impl<C: DirectoryConnector> DirectoryQuery<C> {
    /// Create an engine with default options.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            options: QueryOptions::default(),
        }
    }

    /// Set engine options.
    #[must_use]
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Run one search to completion.
    ///
    /// The session is opened once, shared by the paged search and all of
    /// its range follow-ups, and closed before returning whether the search
    /// succeeded, failed or was cancelled. Nothing is retried.
    #[instrument(
        skip(self, spec, cancel),
        fields(server = %spec.target.server, base_dn = %spec.base_dn, filter = %spec.filter)
    )]
    pub async fn search(
        &self,
        spec: &SearchSpecification,
        cancel: &CancellationToken,
    ) -> QueryResult<SearchResults> {
        spec.validate()?;

        let query_id = QueryId::new();
        debug!(%query_id, scope = %spec.scope, page_size = spec.page_size, "Starting search");

        let mut session = self.open_session(spec, cancel).await?;

        let mut run = SearchRun::new(
            &mut *session,
            spec,
            &self.options,
            cancel,
            QueryAccumulator::new(query_id),
        );
        let outcome = run.paged_search(query_id, spec.page_request()).await;
        let (accumulator, warnings, stats) = run.finish();

        session.close().await;

        if let Err(e) = outcome {
            warn!(%query_id, error = %e, code = e.error_code(), "Search failed");
            return Err(e);
        }

        let entries = accumulator.into_entries();
        info!(
            %query_id,
            entries = entries.len(),
            pages = stats.pages,
            range_requests = stats.range_requests,
            warnings = warnings.len(),
            "Search completed"
        );

        Ok(SearchResults {
            query_id,
            entries,
            warnings,
        })
    }

    /// Connect, bounded by the connection timeout and the cancel token.
    async fn open_session(
        &self,
        spec: &SearchSpecification,
        cancel: &CancellationToken,
    ) -> QueryResult<BoxedSession> {
        if cancel.is_cancelled() {
            return Err(QueryError::Cancelled);
        }

        let timeout = spec.target.connection.connection_timeout();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(QueryError::Cancelled),
            result = tokio::time::timeout(timeout, self.connector.connect(&spec.target)) => match result {
                Ok(session) => session,
                Err(_) => Err(QueryError::ConnectionTimeout {
                    timeout_secs: timeout.as_secs(),
                }),
            },
        }
    }
}

impl<C> std::fmt::Debug for DirectoryQuery<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryQuery")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
