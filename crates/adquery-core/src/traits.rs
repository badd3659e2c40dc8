//! Directory session traits
//!
//! The seams between the query engine and the wire: a connector opens a
//! bound session, a session answers one page request at a time.

use async_trait::async_trait;

use crate::config::ConnectionTarget;
use crate::error::QueryResult;
use crate::operation::{PageRequest, PageResponse};

/// An open, authenticated session to one directory server.
///
/// A session is used by a single logical task; requests are issued strictly
/// one after another.
#[async_trait]
pub trait DirectorySession: Send {
    /// Send one page request and wait for its response.
    ///
    /// A non-zero result code is reported in the response, not as an error;
    /// `Err` is reserved for transport and protocol failures.
    async fn search_page(&mut self, request: &PageRequest) -> QueryResult<PageResponse>;

    /// Close the session.
    ///
    /// Called exactly once per session, after the last request. Failures are
    /// logged by the implementation and not reported.
    async fn close(&mut self);
}

/// Opens directory sessions.
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    /// Connect and authenticate according to `target`.
    ///
    /// Any transport or authentication failure is terminal for the query
    /// that asked for the session; implementations do not retry.
    async fn connect(&self, target: &ConnectionTarget) -> QueryResult<Box<dyn DirectorySession>>;
}

/// Boxed session, as returned by [`DirectoryConnector::connect`].
pub type BoxedSession = Box<dyn DirectorySession>;
