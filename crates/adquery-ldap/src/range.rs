//! Ranged attribute retrieval (`name;range=low-high`)
//!
//! Active Directory caps how many values of one attribute it returns per
//! search. A truncated attribute comes back under a key such as
//! `member;range=0-1499`; the next slice is requested with
//! `member;range=1500-2999` until a key ending in `-*` arrives.

use std::fmt;

/// The bounds of one range slice. `high` is `None` for the final slice (`*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeRange {
    pub low: u32,
    pub high: Option<u32>,
}

impl AttributeRange {
    /// A bounded slice `low-high`.
    pub fn bounded(low: u32, high: u32) -> Self {
        Self {
            low,
            high: Some(high),
        }
    }

    /// The final slice `low-*`.
    pub fn open(low: u32) -> Self {
        Self { low, high: None }
    }

    /// Check if this is the last slice.
    pub fn is_final(&self) -> bool {
        self.high.is_none()
    }

    /// Parse the option text after `range=`, e.g. `0-1499` or `1500-*`.
    ///
    /// Rejects non-numeric bounds and `high < low`.
    pub fn parse(text: &str) -> Option<Self> {
        let (low, high) = text.split_once('-')?;
        let low: u32 = low.trim().parse().ok()?;
        match high.trim() {
            "*" => Some(Self::open(low)),
            high => {
                let high: u32 = high.parse().ok()?;
                (high >= low).then_some(Self::bounded(low, high))
            }
        }
    }

    /// The slice to request after this one, keeping the server's width.
    ///
    /// `None` when this slice is final or already ends at `u32::MAX`.
    pub fn next(&self) -> Option<Self> {
        let high = self.high?;
        let low = high.checked_add(1)?;
        Some(Self::bounded(low, low.saturating_add(high - self.low)))
    }

    /// The attribute key requesting this slice of `attribute`.
    pub fn qualify(&self, attribute: &str) -> String {
        format!("{};range={}", attribute, self)
    }
}

impl fmt::Display for AttributeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.high {
            Some(high) => write!(f, "{}-{}", self.low, high),
            None => write!(f, "{}-*", self.low),
        }
    }
}

/// What follows the attribute name in a returned key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOption<'a> {
    /// Plain attribute name.
    None,
    /// A well-formed range option.
    Range(AttributeRange),
    /// Any other option, or a malformed range. Kept for diagnostics.
    Unrecognized(&'a str),
}

/// An attribute key split into its name and option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDescription<'a> {
    pub name: &'a str,
    pub option: KeyOption<'a>,
}

impl<'a> AttributeDescription<'a> {
    /// Split a returned key such as `member;range=0-1499`.
    ///
    /// The option name is matched without regard to case.
    pub fn parse(key: &'a str) -> Self {
        let Some((name, suffix)) = key.split_once(';') else {
            return Self {
                name: key,
                option: KeyOption::None,
            };
        };

        let option = suffix
            .get(..6)
            .filter(|prefix| prefix.eq_ignore_ascii_case("range="))
            .and_then(|_| AttributeRange::parse(&suffix[6..]))
            .map_or(KeyOption::Unrecognized(suffix), KeyOption::Range);

        Self { name, option }
    }

    /// Get the range, if the key carried a well-formed one.
    pub fn range(&self) -> Option<AttributeRange> {
        match self.option {
            KeyOption::Range(range) => Some(range),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_key() {
        let desc = AttributeDescription::parse("member");
        assert_eq!(desc.name, "member");
        assert_eq!(desc.option, KeyOption::None);
    }

    #[test]
    fn test_bounded_range_key() {
        let desc = AttributeDescription::parse("member;range=0-1499");
        assert_eq!(desc.name, "member");
        assert_eq!(desc.range(), Some(AttributeRange::bounded(0, 1499)));
    }

    #[test]
    fn test_final_range_key() {
        let desc = AttributeDescription::parse("member;range=3000-*");
        assert_eq!(desc.range(), Some(AttributeRange::open(3000)));
        assert!(desc.range().unwrap().is_final());
    }

    #[test]
    fn test_range_option_case_insensitive() {
        let desc = AttributeDescription::parse("member;Range=0-999");
        assert_eq!(desc.range(), Some(AttributeRange::bounded(0, 999)));
    }

    #[test]
    fn test_unrecognized_options() {
        assert_eq!(
            AttributeDescription::parse("userCertificate;binary").option,
            KeyOption::Unrecognized("binary")
        );
        // Malformed ranges are diagnostics, not ranges
        assert_eq!(
            AttributeDescription::parse("member;range=10-5").option,
            KeyOption::Unrecognized("range=10-5")
        );
        assert_eq!(
            AttributeDescription::parse("member;range=a-b").option,
            KeyOption::Unrecognized("range=a-b")
        );
        assert_eq!(
            AttributeDescription::parse("member;range=99999999999-*").option,
            KeyOption::Unrecognized("range=99999999999-*")
        );
        assert_eq!(
            AttributeDescription::parse("member;rang").option,
            KeyOption::Unrecognized("rang")
        );
    }

    #[test]
    fn test_next_range_keeps_width() {
        let next = AttributeRange::bounded(0, 1499).next().unwrap();
        assert_eq!(next, AttributeRange::bounded(1500, 2999));

        let next = AttributeRange::bounded(1000, 1999).next().unwrap();
        assert_eq!(next, AttributeRange::bounded(2000, 2999));

        assert!(AttributeRange::open(3000).next().is_none());
    }

    #[test]
    fn test_single_value_slice() {
        let next = AttributeRange::bounded(7, 7).next().unwrap();
        assert_eq!(next, AttributeRange::bounded(8, 8));
    }

    #[test]
    fn test_no_slice_after_u32_max() {
        assert!(AttributeRange::bounded(u32::MAX - 9, u32::MAX).next().is_none());
        assert!(AttributeRange::bounded(u32::MAX, u32::MAX).next().is_none());

        let next = AttributeRange::bounded(u32::MAX - 20, u32::MAX - 10).next().unwrap();
        assert_eq!(next, AttributeRange::bounded(u32::MAX - 9, u32::MAX));
    }

    #[test]
    fn test_qualify() {
        assert_eq!(
            AttributeRange::bounded(1000, 1999).qualify("member"),
            "member;range=1000-1999"
        );
        assert_eq!(AttributeRange::open(5).qualify("member"), "member;range=5-*");
    }
}
