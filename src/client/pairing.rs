//! Pairing code payloads.
//!
//! A pairing code wraps a one-time handshake token in an opaque payload the
//! UI layer can hand straight to a renderer.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde::{Serialize, Serializer};

// ============================================================================
// Constants
// ============================================================================

/// Data URI prefix of a rendered pairing payload.
const PAYLOAD_PREFIX: &str = "data:text/plain;base64,";

// ============================================================================
// PairingCode
// ============================================================================

/// Opaque rendering of a one-time handshake token.
///
/// Only valid while the manager is `AwaitingPairing`; superseded by any newer
/// code and by readiness or failure.
#[derive(Clone, PartialEq, Eq)]
pub struct PairingCode {
    /// Rendered payload.
    payload: String,
}

impl PairingCode {
    /// Renders a raw handshake token.
    ///
    /// # Example
    ///
    /// ```
    /// use session_lifecycle::PairingCode;
    ///
    /// let code = PairingCode::render("2@token");
    /// assert!(code.payload().starts_with("data:text/plain;base64,"));
    /// ```
    #[must_use]
    pub fn render(token: &str) -> Self {
        let mut payload = String::with_capacity(PAYLOAD_PREFIX.len() + token.len() * 4 / 3 + 4);
        payload.push_str(PAYLOAD_PREFIX);
        Base64Standard.encode_string(token, &mut payload);
        Self { payload }
    }

    /// Returns the rendered payload.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

// Tokens are credentials; keep them out of logs.
impl fmt::Debug for PairingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairingCode")
            .field("len", &self.payload.len())
            .finish_non_exhaustive()
    }
}

impl Serialize for PairingCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.payload)
    }
}

// ============================================================================
// Tests
// ============================================================================
