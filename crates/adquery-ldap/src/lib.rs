//! # AD Query Engine
//!
//! Runs LDAP searches against Active Directory and returns fully
//! materialized, typed entries.
//!
//! ## Features
//!
//! - Paged search with the simple paged results control
//! - Transparent retrieval of ranged (multi-slice) attribute values
//! - Typed values: timestamps, SIDs, GUIDs and X.509 certificates
//! - Basic, client certificate and Kerberos (`gssapi` feature) binds
//! - Per-request timeouts and cooperative cancellation
//!
//! ## Example
//!
//! ```ignore
//! use adquery_ldap::{CancellationToken, DirectoryQuery, LdapConnector, SearchSpecification};
//! use adquery_core::prelude::*;
//!
//! let target = ConnectionTarget::new("dc1.example.com")
//!     .with_ssl()
//!     .with_auth(AuthMode::Basic {
//!         username: "svc-reader@example.com".into(),
//!         password: "secret".into(),
//!     });
//! let spec = SearchSpecification::new(target, "DC=example,DC=com")
//!     .with_filter("(objectCategory=group)")
//!     .with_attributes(["cn", "member"]);
//!
//! let results = DirectoryQuery::new(LdapConnector::new())
//!     .search(&spec, &CancellationToken::new())
//!     .await?;
//! for entry in results {
//!     println!("{}", entry.dn);
//! }
//! ```

pub mod accumulator;
pub mod ad;
pub mod config;
pub mod connector;
pub mod engine;
pub mod format;
pub mod paging;
pub mod range;
pub mod schema_definitions;

// Re-exports
pub use accumulator::QueryAccumulator;
pub use config::{QueryOptions, RangeFailurePolicy, SearchSpecification};
pub use connector::{LdapConnector, LdapSession};
pub use engine::{DirectoryQuery, SearchResults};
pub use format::ValueFormatter;
pub use paging::SearchWarning;
pub use range::AttributeRange;
pub use tokio_util::sync::CancellationToken;
