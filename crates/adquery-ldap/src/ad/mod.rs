//! Active Directory value encodings
//!
//! Decoders for the binary and numeric encodings Active Directory uses for
//! timestamps, identifiers and certificates.

pub mod certificate;
pub mod guid;
pub mod time;

pub use certificate::decode_certificate;
pub use guid::{guess_guid, guid_from_bytes};
pub use time::{filetime_to_datetime, parse_generalized_time, FILETIME_NEVER_THRESHOLD};
