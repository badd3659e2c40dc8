//! Typed attribute values and directory entries
//!
//! The shape of an attribute (no value, one value, many values) is part of
//! the contract: consumers branch on it.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// A binary security identifier (SID).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecurityIdentifier {
    revision: u8,
    authority: u64,
    sub_authorities: Vec<u32>,
}

impl SecurityIdentifier {
    /// Decode the binary SID layout: revision, sub-authority count,
    /// 48-bit big-endian identifier authority, little-endian sub-authorities.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 8 {
            return None;
        }
        let revision = bytes[0];
        let count = bytes[1] as usize;
        if revision != 1 || bytes.len() != 8 + count * 4 {
            return None;
        }

        let authority = bytes[2..8]
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));

        let sub_authorities = bytes[8..]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Some(Self {
            revision,
            authority,
            sub_authorities,
        })
    }

    /// Relative identifier (last sub-authority), if any.
    pub fn rid(&self) -> Option<u32> {
        self.sub_authorities.last().copied()
    }

    pub fn sub_authorities(&self) -> &[u32] {
        &self.sub_authorities
    }
}

impl fmt::Display for SecurityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}-", self.revision)?;
        if self.authority < (1u64 << 32) {
            write!(f, "{}", self.authority)?;
        } else {
            write!(f, "0x{:012X}", self.authority)?;
        }
        for sub in &self.sub_authorities {
            write!(f, "-{}", sub)?;
        }
        Ok(())
    }
}

impl Serialize for SecurityIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Summary of a decoded X.509 certificate, with the original DER kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateInfo {
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    #[serde(serialize_with = "serialize_base64")]
    pub der: Vec<u8>,
}

/// One typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Text passed through unchanged.
    Text(String),
    /// A number kept raw, such as a FileTime "never" sentinel.
    Integer(i64),
    /// A UTC instant.
    Timestamp(DateTime<Utc>),
    /// A security identifier.
    Sid(SecurityIdentifier),
    /// A 128-bit identifier.
    Guid(Uuid),
    /// A decoded certificate.
    Certificate(Box<CertificateInfo>),
    /// Opaque bytes (base64 in JSON).
    Bytes(#[serde(serialize_with = "serialize_base64")] Vec<u8>),
}

impl AttributeValue {
    /// Get as a string if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get as an integer if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a timestamp if this is a timestamp value.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            AttributeValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Get as a GUID if this is a GUID value.
    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            AttributeValue::Guid(g) => Some(*g),
            _ => None,
        }
    }

    /// Get as a SID if this is a SID value.
    pub fn as_sid(&self) -> Option<&SecurityIdentifier> {
        match self {
            AttributeValue::Sid(s) => Some(s),
            _ => None,
        }
    }

    /// Get as a certificate if this is a certificate value.
    pub fn as_certificate(&self) -> Option<&CertificateInfo> {
        match self {
            AttributeValue::Certificate(c) => Some(c),
            _ => None,
        }
    }

    /// Get as bytes if this is an opaque byte value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AttributeValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

/// The values of one attribute after formatting and range merging.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeData {
    /// The attribute was returned with zero values.
    NoValue,
    /// Exactly one value.
    Single(AttributeValue),
    /// Two or more values, in server order.
    Multi(Vec<AttributeValue>),
}

impl AttributeData {
    /// Collapse a value list: none -> `NoValue`, one -> `Single`, more -> `Multi`.
    pub fn from_values(mut values: Vec<AttributeValue>) -> Self {
        match values.len() {
            0 => AttributeData::NoValue,
            1 => AttributeData::Single(values.remove(0)),
            _ => AttributeData::Multi(values),
        }
    }

    pub fn is_no_value(&self) -> bool {
        matches!(self, AttributeData::NoValue)
    }

    /// Get the scalar value if there is exactly one.
    pub fn as_single(&self) -> Option<&AttributeValue> {
        match self {
            AttributeData::Single(v) => Some(v),
            _ => None,
        }
    }

    /// Get all values regardless of shape.
    pub fn values(&self) -> &[AttributeValue] {
        match self {
            AttributeData::NoValue => &[],
            AttributeData::Single(v) => std::slice::from_ref(v),
            AttributeData::Multi(v) => v,
        }
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A consolidated directory entry. Read-only once handed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attributes: BTreeMap<String, AttributeData>,
    /// Attributes whose range retrieval stopped early under a lenient policy.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partial_attributes: Vec<String>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: BTreeMap::new(),
            partial_attributes: Vec::new(),
        }
    }

    /// Look up an attribute by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&AttributeData> {
        self.attributes.get(name).or_else(|| {
            self.attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }

    /// Get a single-valued text attribute.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(AttributeData::as_single)
            .and_then(AttributeValue::as_text)
    }

    /// Get all values of an attribute; empty when absent.
    pub fn values(&self, name: &str) -> &[AttributeValue] {
        self.get(name).map(AttributeData::values).unwrap_or(&[])
    }

    /// Check if every attribute was fully retrieved.
    pub fn is_complete(&self) -> bool {
        self.partial_attributes.is_empty()
    }
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
}
