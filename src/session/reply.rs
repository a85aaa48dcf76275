//! Operation replies.
//!
//! Each reply serializes to the JSON shape the surrounding HTTP layer hands
//! to its clients.
//!
//! | Operation | Shape |
//! |-----------|-------|
//! | `init` | `{status: started\|initializing\|connected\|error, error?}` |
//! | `qr` | `{ready:true} \| {qr: payload} \| {initializing:true} \| {notStarted:true}` |
//! | `status` | `{ready, state, initializing}` |
//! | `send-message` | `{status: sent\|queued\|failed, error?}` |
//! | `logout` | `{success, error?}` |
//! | `reconnect` | `{status: started\|already_connected\|already_initializing\|error, message?, error?}` |

// ============================================================================
// Imports
// ============================================================================

use std::time::SystemTime;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::client::PairingCode;

use super::state::{ConnectionState, serialize_opt_unix_millis};

// ============================================================================
// Constants
// ============================================================================

/// Explanation attached to a refused reconnect.
pub const ALREADY_CONNECTED_MESSAGE: &str =
    "Session is already connected. Use logout first to disconnect.";

// ============================================================================
// InitReply
// ============================================================================

/// Result of `initialize()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InitReply {
    /// A new Session Client was constructed and started.
    Started,
    /// Another initialize is in progress, or pairing is pending.
    Initializing,
    /// Already ready; nothing was done.
    Connected,
    /// Construction or startup failed.
    Error {
        /// Failure description.
        error: String,
    },
}

// ============================================================================
// PairingReply
// ============================================================================

/// Result of `pairing_code()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingReply {
    /// Already paired and ready.
    Ready,
    /// A pairing code is waiting to be scanned.
    Code(PairingCode),
    /// A client is starting; no code yet.
    Initializing,
    /// No client exists.
    NotStarted,
}

impl Serialize for PairingReply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::Ready => map.serialize_entry("ready", &true)?,
            Self::Code(code) => map.serialize_entry("qr", code)?,
            Self::Initializing => map.serialize_entry("initializing", &true)?,
            Self::NotStarted => map.serialize_entry("notStarted", &true)?,
        }
        map.end()
    }
}

// ============================================================================
// StatusSnapshot / StatusReply
// ============================================================================

/// Point-in-time copy of the manager state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Current state.
    pub state: ConnectionState,
    /// Valid pairing code, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairing_code: Option<PairingCode>,
    /// Network-side label such as `CONNECTED`, kept only while ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_state: Option<String>,
    /// Last time anything happened on the connection.
    #[serde(serialize_with = "serialize_opt_unix_millis")]
    pub last_activity: Option<SystemTime>,
}

/// Compact status for polling clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReply {
    /// Connection usable for sending.
    pub ready: bool,
    /// Network-side label while ready, `None` otherwise.
    pub state: Option<String>,
    /// A client is starting or awaiting pairing.
    pub initializing: bool,
}

impl From<&StatusSnapshot> for StatusReply {
    fn from(snapshot: &StatusSnapshot) -> Self {
        let state = if snapshot.state.is_ready() {
            snapshot.network_state.clone()
        } else {
            None
        };

        Self {
            ready: snapshot.state.is_ready(),
            state,
            initializing: snapshot.state.is_starting(),
        }
    }
}

// ============================================================================
// SendReply
// ============================================================================

/// Result of `send()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SendReply {
    /// Handed to the Session Client.
    Sent,
    /// Buffered until the connection is ready.
    Queued,
    /// Rejected or failed; not retried.
    Failed {
        /// Failure description.
        error: String,
    },
}

// ============================================================================
// LogoutReply
// ============================================================================

/// Result of `logout()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoutReply {
    /// Local teardown and credential wipe completed.
    pub success: bool,
    /// Why the credential wipe failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogoutReply {
    /// Successful logout.
    #[inline]
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// Logout whose credential wipe failed.
    #[inline]
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

// ============================================================================
// ReconnectReply
// ============================================================================

/// Result of `reconnect()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReconnectReply {
    /// Old client torn down and a new one started.
    Started,
    /// Refused; a healthy session exists.
    AlreadyConnected {
        /// Operator guidance.
        message: String,
    },
    /// Refused; a client is already starting.
    AlreadyInitializing,
    /// Teardown done but the new client failed to start.
    Error {
        /// Failure description.
        error: String,
    },
}

impl ReconnectReply {
    /// Refusal for a ready session.
    #[must_use]
    pub fn already_connected() -> Self {
        Self::AlreadyConnected {
            message: ALREADY_CONNECTED_MESSAGE.to_string(),
        }
    }
}

impl From<InitReply> for ReconnectReply {
    fn from(reply: InitReply) -> Self {
        match reply {
            InitReply::Started => Self::Started,
            InitReply::Initializing => Self::AlreadyInitializing,
            InitReply::Connected => Self::already_connected(),
            InitReply::Error { error } => Self::Error { error },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
