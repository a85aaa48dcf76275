//! Type-safe identifiers for sessions and messages.
//!
//! Newtype wrappers prevent mixing a client generation with a message ID,
//! or a raw phone string with a normalized [`Recipient`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Matches every character that is not an ASCII digit.
static NON_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9]").expect("static pattern compiles"));

/// Prefix marking a number written in local (trunk) format.
const LOCAL_PREFIX: char = '0';

/// Global counter for Session Client generations.
static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// ClientId
// ============================================================================

/// Generation number of one constructed Session Client.
///
/// Every initialize cycle gets a fresh ID. Events tagged with an ID that no
/// longer matches the live client are stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    /// Allocates the next client generation.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

// ============================================================================
// MessageId
// ============================================================================

/// Unique ID of a queued outbound message (for log correlation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Generates a new random message ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ============================================================================
// Recipient
// ============================================================================

/// A normalized phone identifier: digits only, international format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipient(String);

impl Recipient {
    /// Normalizes a raw phone number.
    ///
    /// Strips every non-digit character, then rewrites a leading local-format
    /// `0` to `country_code`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecipient`] if no digits remain.
    ///
    /// # Example
    ///
    /// ```
    /// use session_lifecycle::Recipient;
    ///
    /// let r = Recipient::normalize("0300-123 4567", "92").unwrap();
    /// assert_eq!(r.as_str(), "923001234567");
    /// ```
    pub fn normalize(raw: &str, country_code: &str) -> Result<Self> {
        let digits = NON_DIGITS.replace_all(raw, "");

        if digits.is_empty() {
            return Err(Error::invalid_recipient(raw));
        }

        let normalized = match digits.strip_prefix(LOCAL_PREFIX) {
            Some(rest) => format!("{country_code}{rest}"),
            None => digits.into_owned(),
        };

        Ok(Self(normalized))
    }

    /// Returns the normalized digits.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_client_ids_are_unique() {
        let a = ClientId::next();
        let b = ClientId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_client_id_display() {
        let id = ClientId(7);
        assert_eq!(id.to_string(), "client-7");
    }

    #[test]
    fn test_message_ids_are_unique() {
        assert_ne!(MessageId::generate(), MessageId::generate());
    }

    #[test]
    fn test_normalize_strips_formatting() {
        let r = Recipient::normalize("+92 (300) 123-4567", "92").unwrap();
        assert_eq!(r.as_str(), "923001234567");
    }

    #[test]
    fn test_normalize_rewrites_local_prefix() {
        let r = Recipient::normalize("03001234567", "92").unwrap();
        assert_eq!(r.as_str(), "923001234567");
    }

    #[test]
    fn test_normalize_rewrites_only_one_zero() {
        let r = Recipient::normalize("00441234", "92").unwrap();
        assert_eq!(r.as_str(), "920441234");
    }

    #[test]
    fn test_normalize_keeps_international_number() {
        let r = Recipient::normalize("447700900123", "92").unwrap();
        assert_eq!(r.as_str(), "447700900123");
    }

    #[test]
    fn test_normalize_rejects_empty() {
        let err = Recipient::normalize("call me", "92").unwrap_err();
        assert!(matches!(err, Error::InvalidRecipient { .. }));
    }

    #[test]
    fn test_recipient_serializes_as_string() {
        let r = Recipient::normalize("123", "92").unwrap();
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"123\"");
    }

    proptest! {
        #[test]
        fn prop_normalized_is_digits_only(raw in "\\PC{0,24}") {
            if let Ok(r) = Recipient::normalize(&raw, "92") {
                prop_assert!(r.as_str().chars().all(|c| c.is_ascii_digit()));
                prop_assert!(!r.as_str().starts_with('0'));
            }
        }

        #[test]
        fn prop_normalize_is_idempotent(raw in "[0-9 +()-]{1,20}") {
            if let Ok(once) = Recipient::normalize(&raw, "92") {
                let twice = Recipient::normalize(once.as_str(), "92").unwrap();
                prop_assert_eq!(once, twice);
            }
        }
    }
}
