//! Attribute value formatting
//!
//! Turns the raw values of one attribute into typed values. Dispatch is on
//! the attribute name through the static syntax table; attributes outside
//! the table pass through, except that untyped 16-byte binary values may be
//! read as GUIDs.

use adquery_core::operation::RawValue;
use adquery_core::value::{AttributeData, AttributeValue, SecurityIdentifier};
use tracing::trace;

use crate::ad;
use crate::schema_definitions::{get_attribute_syntax, AttributeSyntax};

/// Converts raw attribute values into typed values.
///
/// Pure: no I/O and no state beyond its switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueFormatter {
    detect_guid_blobs: bool,
}

impl Default for ValueFormatter {
    fn default() -> Self {
        Self {
            detect_guid_blobs: true,
        }
    }
}

impl ValueFormatter {
    /// Create a formatter with GUID detection enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable reading untyped 16-byte values as GUIDs.
    #[must_use]
    pub fn with_guid_detection(mut self, enabled: bool) -> Self {
        self.detect_guid_blobs = enabled;
        self
    }

    /// Format every value of one attribute, keeping server order.
    ///
    /// `attribute` must be the bare name, without any `;range=` option.
    pub fn format(&self, attribute: &str, values: &[RawValue]) -> Vec<AttributeValue> {
        let syntax = get_attribute_syntax(attribute);
        values
            .iter()
            .map(|value| self.format_value(syntax, value))
            .collect()
    }

    /// Format an attribute and collapse the result to its shape.
    pub fn format_attribute(&self, attribute: &str, values: &[RawValue]) -> AttributeData {
        AttributeData::from_values(self.format(attribute, values))
    }

    fn format_value(&self, syntax: Option<AttributeSyntax>, value: &RawValue) -> AttributeValue {
        let Some(syntax) = syntax else {
            return self.format_untyped(value);
        };

        let formatted = match syntax {
            AttributeSyntax::FileTime => value.as_text().and_then(format_filetime),
            AttributeSyntax::GeneralizedTime => value
                .as_text()
                .and_then(ad::parse_generalized_time)
                .map(AttributeValue::Timestamp),
            AttributeSyntax::Sid => {
                SecurityIdentifier::from_bytes(value.as_bytes()).map(AttributeValue::Sid)
            }
            AttributeSyntax::Guid => ad::guid_from_bytes(value.as_bytes()).map(AttributeValue::Guid),
            AttributeSyntax::Certificate => ad::decode_certificate(value.as_bytes())
                .map(|info| AttributeValue::Certificate(Box::new(info))),
            AttributeSyntax::Bytes => Some(AttributeValue::Bytes(value.as_bytes().to_vec())),
        };

        formatted.unwrap_or_else(|| {
            trace!(?syntax, "Value does not decode under its syntax, passing through");
            passthrough(value)
        })
    }

    fn format_untyped(&self, value: &RawValue) -> AttributeValue {
        if self.detect_guid_blobs {
            if let Some(guid) = ad::guess_guid(value) {
                return AttributeValue::Guid(guid);
            }
        }
        passthrough(value)
    }
}

/// FILETIME integers convert below the "never" threshold and stay integers
/// otherwise.
fn format_filetime(text: &str) -> Option<AttributeValue> {
    let ticks: i64 = text.trim().parse().ok()?;
    Some(match ad::filetime_to_datetime(ticks) {
        Some(instant) => AttributeValue::Timestamp(instant),
        None => AttributeValue::Integer(ticks),
    })
}

fn passthrough(value: &RawValue) -> AttributeValue {
    match value {
        RawValue::Text(s) => AttributeValue::Text(s.clone()),
        RawValue::Bytes(b) => AttributeValue::Bytes(b.clone()),
    }
}
