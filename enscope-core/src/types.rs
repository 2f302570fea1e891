//! Domain types for enscope.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A set of resolved ENS text records, keyed by well-known key.
///
/// Only keys that resolved to a non-empty value are present. Produced fresh
/// per lookup; never persisted.
pub type TextRecords = HashMap<String, String>;

/// A resolved ENS profile.
///
/// The aggregate returned by a profile lookup: whichever of name/address the
/// caller supplied plus everything the resolver could fill in. Fields that
/// did not resolve are `None` (or empty, for records).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsProfile {
    /// Primary ENS name, if one resolves.
    pub name: Option<String>,
    /// Checksummed Ethereum address, if one resolves.
    pub address: Option<String>,
    /// Avatar URI from the name's resolver, if any.
    pub avatar: Option<String>,
    /// Non-empty text records for the name.
    #[serde(default)]
    pub records: TextRecords,
}

impl EnsProfile {
    /// Returns true if nothing at all resolved.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.address.is_none()
            && self.avatar.is_none()
            && self.records.is_empty()
    }
}

/// Classification of a lookup query into a name or an address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupInput {
    /// A human-readable ENS name, normalized to lowercase.
    Name(String),
    /// A `0x`-prefixed 20-byte hex address, normalized to lowercase.
    Address(String),
}

impl LookupInput {
    /// Classifies a raw query string.
    ///
    /// Anything shaped like a 20-byte hex address (`0x` + 40 hex chars) is
    /// treated as an address; everything else is treated as a name. Names are
    /// trimmed and lowercased, matching ENS normalization for the ASCII
    /// subset; deeper validation is left to resolution itself.
    pub fn parse(query: &str) -> Self {
        let trimmed = query.trim();
        if is_address_like(trimmed) {
            LookupInput::Address(trimmed.to_lowercase())
        } else {
            LookupInput::Name(trimmed.to_lowercase())
        }
    }
}

/// Returns true if the input is shaped like an Ethereum address.
pub fn is_address_like(input: &str) -> bool {
    input.len() == 42
        && input.starts_with("0x")
        && input[2..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_address() {
        let input = LookupInput::parse("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
        assert_eq!(
            input,
            LookupInput::Address("0xd8da6bf26964af9d7eed9e03e53415d37aa96045".into())
        );
    }

    #[test]
    fn test_classify_name() {
        assert_eq!(
            LookupInput::parse("  Vitalik.ETH "),
            LookupInput::Name("vitalik.eth".into())
        );
    }

    #[test]
    fn test_short_hex_is_a_name() {
        // Too short to be an address, falls through to name handling.
        assert_eq!(LookupInput::parse("0xabc"), LookupInput::Name("0xabc".into()));
    }

    #[test]
    fn test_profile_serde_round_trip() {
        let mut records = TextRecords::new();
        records.insert("com.twitter".into(), "alice".into());
        let profile = EnsProfile {
            name: Some("alice.eth".into()),
            address: Some("0xd8da6bf26964af9d7eed9e03e53415d37aa96045".into()),
            avatar: None,
            records,
        };
        let json = serde_json::to_string(&profile).unwrap();
        let back: EnsProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_profile_is_empty() {
        assert!(EnsProfile::default().is_empty());
    }
}
