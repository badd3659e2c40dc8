//! Page-level protocol types
//!
//! One search round trip: the request sent with its paging cursor and the
//! page of raw entries that comes back.

use crate::types::{ResultCode, SearchScope};

/// One raw attribute value as the server sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// Value that decoded as UTF-8.
    Text(String),
    /// Value that is not valid UTF-8.
    Bytes(Vec<u8>),
}

impl RawValue {
    /// Classify raw octets.
    pub fn from_octets(octets: Vec<u8>) -> Self {
        match String::from_utf8(octets) {
            Ok(s) => RawValue::Text(s),
            Err(e) => RawValue::Bytes(e.into_bytes()),
        }
    }

    /// Get the value as octets regardless of classification.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RawValue::Text(s) => s.as_bytes(),
            RawValue::Bytes(b) => b,
        }
    }

    /// Get as text if the value decoded as UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            RawValue::Bytes(_) => None,
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(b: Vec<u8>) -> Self {
        RawValue::Bytes(b)
    }
}

/// One raw attribute: the key exactly as returned (possibly range-qualified)
/// and its values in server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    pub key: String,
    pub values: Vec<RawValue>,
}

impl RawAttribute {
    pub fn new(key: impl Into<String>, values: Vec<RawValue>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }
}

/// One entry of a search page before any value formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub dn: String,
    pub attributes: Vec<RawAttribute>,
}

impl RawEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    /// Add an attribute using builder pattern.
    pub fn with(mut self, key: impl Into<String>, values: Vec<RawValue>) -> Self {
        self.attributes.push(RawAttribute::new(key, values));
        self
    }
}

/// A single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub base_dn: String,
    pub scope: SearchScope,
    pub filter: String,
    pub attributes: Vec<String>,
    /// Total entries the server may return for the whole search; 0 = no limit.
    pub size_limit: u32,
    /// Entries per round trip.
    pub page_size: u32,
    /// Cursor from the previous page; empty on the first request.
    pub cursor: Vec<u8>,
}

/// A single page response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub entries: Vec<RawEntry>,
    /// Cursor for the next page; empty on the last page.
    pub cursor: Vec<u8>,
    pub result_code: ResultCode,
    /// Diagnostic message that came with the result code.
    pub message: String,
}

impl PageResponse {
    /// A successful page.
    pub fn success(entries: Vec<RawEntry>, cursor: Vec<u8>) -> Self {
        Self {
            entries,
            cursor,
            result_code: ResultCode::SUCCESS,
            message: String::new(),
        }
    }

    /// Check if this was the last page.
    pub fn is_last(&self) -> bool {
        self.cursor.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_classification() {
        assert_eq!(
            RawValue::from_octets(b"John Doe".to_vec()),
            RawValue::Text("John Doe".to_string())
        );

        let sid = vec![0x01, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, 0xff, 0xfe];
        let raw = RawValue::from_octets(sid.clone());
        assert_eq!(raw, RawValue::Bytes(sid.clone()));
        assert_eq!(raw.as_bytes(), sid.as_slice());
        assert!(raw.as_text().is_none());
    }

    #[test]
    fn test_page_response_last_page() {
        assert!(PageResponse::success(vec![], vec![]).is_last());
        assert!(!PageResponse::success(vec![], b"next".to_vec()).is_last());
    }
}
