//! # Directory Query Framework
//!
//! Core abstractions shared by the directory query engine and its callers.
//!
//! ## Architecture
//!
//! - [`DirectoryConnector`](traits::DirectoryConnector) - opens a bound session
//! - [`DirectorySession`](traits::DirectorySession) - answers page requests
//! - [`PageRequest`](operation::PageRequest) / [`PageResponse`](operation::PageResponse) -
//!   one round trip with its paging cursor
//! - [`DirectoryEntry`](value::DirectoryEntry) - a consolidated, typed result
//!
//! ## Crate Organization
//!
//! - [`ids`] - Query identifiers
//! - [`types`] - Search scopes and result codes
//! - [`error`] - Error types with transient/permanent classification
//! - [`config`] - Connection target, authentication and timeouts
//! - [`operation`] - Raw page protocol types
//! - [`value`] - Typed attribute values and entries
//! - [`traits`] - Session and connector traits

pub mod config;
pub mod error;
pub mod ids;
pub mod operation;
pub mod traits;
pub mod types;
pub mod value;

/// Prelude module for convenient imports.
///
/// ```
/// use adquery_core::prelude::*;
/// ```
pub mod prelude {
    // IDs
    pub use crate::ids::QueryId;

    // Types and enums
    pub use crate::types::{ResultCode, SearchScope};

    // Error handling
    pub use crate::error::{QueryError, QueryResult};

    // Traits
    pub use crate::traits::{BoxedSession, DirectoryConnector, DirectorySession};

    // Operations
    pub use crate::operation::{PageRequest, PageResponse, RawAttribute, RawEntry, RawValue};

    // Values
    pub use crate::value::{
        AttributeData, AttributeValue, CertificateInfo, DirectoryEntry, SecurityIdentifier,
    };

    // Configuration
    pub use crate::config::{
        AuthMode, ClientCertificate, ConnectionSettings, ConnectionTarget, TlsConfig,
    };
}

// Re-export async_trait for session implementors
pub use async_trait::async_trait;
