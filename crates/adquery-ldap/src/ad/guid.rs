//! GUID decoding
//!
//! Directory GUIDs are stored in the mixed-endian Windows layout: the first
//! three fields little-endian, the last eight bytes as-is.

use adquery_core::operation::RawValue;
use uuid::Uuid;

/// Byte length of a binary GUID.
pub const GUID_LEN: usize = 16;

/// Decode a binary GUID in Windows byte order.
pub fn guid_from_bytes(bytes: &[u8]) -> Option<Uuid> {
    let bytes: [u8; GUID_LEN] = bytes.try_into().ok()?;
    Some(Uuid::from_bytes_le(bytes))
}

/// Guess that an untyped binary value is a GUID.
///
/// Matches any non-text value of exactly 16 bytes, so an unrelated 16-byte
/// blob is misreported as a GUID. Values that decoded as text never match.
pub fn guess_guid(value: &RawValue) -> Option<Uuid> {
    match value {
        RawValue::Bytes(bytes) => guid_from_bytes(bytes),
        RawValue::Text(_) => None,
    }
}
