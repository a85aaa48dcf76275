//! Session Client lifecycle events.
//!
//! Events are notifications a Session Client pushes to the manager through
//! its registered [`EventHandler`](super::EventHandler).
//!
//! # Event Types
//!
//! | Event | Effect on the manager |
//! |-------|-----------------------|
//! | `qr` | issues a pairing code |
//! | `ready` | transition to `Ready` |
//! | `auth_failure` | transition to `Failed` |
//! | `disconnected` | transition to `Disconnected` |
//! | `authenticated`, `change_state`, `loading_screen`, `remote_session_saved`, `error` | logged only |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// ClientEvent
// ============================================================================

/// A lifecycle event from a Session Client.
///
/// # Format
///
/// Adapters bridging a JSON event stream can deserialize directly:
///
/// ```json
/// { "event": "disconnected", "reason": "NAVIGATION" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// A new one-time handshake token was issued.
    #[serde(rename = "qr")]
    PairingCode {
        /// Raw handshake token.
        token: String,
    },

    /// Credentials were accepted; readiness follows.
    Authenticated,

    /// Connection is usable for sending.
    Ready,

    /// Pairing or stored credentials were rejected.
    AuthFailure {
        /// Message from the network.
        message: String,
    },

    /// Connection lost.
    Disconnected {
        /// Reason from the network.
        reason: String,
    },

    /// Network-side state label changed.
    ChangeState {
        /// New state label.
        state: String,
    },

    /// Startup progress.
    LoadingScreen {
        /// Percent complete.
        percent: u8,
        /// Progress message.
        message: String,
    },

    /// Credentials were persisted by the client.
    RemoteSessionSaved,

    /// Non-fatal client error.
    Error {
        /// Error description.
        message: String,
    },
}

impl ClientEvent {
    /// Returns the wire name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PairingCode { .. } => "qr",
            Self::Authenticated => "authenticated",
            Self::Ready => "ready",
            Self::AuthFailure { .. } => "auth_failure",
            Self::Disconnected { .. } => "disconnected",
            Self::ChangeState { .. } => "change_state",
            Self::LoadingScreen { .. } => "loading_screen",
            Self::RemoteSessionSaved => "remote_session_saved",
            Self::Error { .. } => "error",
        }
    }

    /// Returns `true` if this event can change connection state.
    #[inline]
    #[must_use]
    pub fn drives_transition(&self) -> bool {
        matches!(
            self,
            Self::PairingCode { .. }
                | Self::Ready
                | Self::AuthFailure { .. }
                | Self::Disconnected { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
