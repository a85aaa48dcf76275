//! Connection state machine.
//!
//! # Transitions
//!
//! | From | Trigger | To |
//! |------|---------|----|
//! | `Uninitialized` / `Disconnected` / `Failed` / `AwaitingPairing` | initialize, reconnect | `Initializing` |
//! | `Initializing` / `AwaitingPairing` | pairing code | `AwaitingPairing` |
//! | `Initializing` / `AwaitingPairing` | ready | `Ready` |
//! | `Initializing` / `AwaitingPairing` | auth failure, start error | `Failed` |
//! | `Initializing` / `AwaitingPairing` / `Ready` | disconnect, reconnect teardown | `Disconnected` |
//! | any | logout | `LoggingOut` |
//! | `LoggingOut` | teardown done | `Disconnected` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};

use crate::client::PairingCode;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the single logical connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    /// No Session Client exists.
    #[default]
    Uninitialized,

    /// Session Client under construction or starting.
    Initializing,

    /// A pairing code has been issued and is unconsumed.
    AwaitingPairing {
        /// Current pairing payload.
        code: PairingCode,
    },

    /// Connection usable for sending.
    Ready {
        /// When the connection became ready.
        #[serde(serialize_with = "serialize_unix_millis")]
        since: SystemTime,
    },

    /// Connection lost or torn down; no Session Client remains.
    Disconnected {
        /// Why the connection ended.
        reason: String,
    },

    /// Teardown and credential wipe in progress.
    LoggingOut,

    /// Unrecoverable error; needs an explicit initialize or reconnect.
    Failed {
        /// Failure description.
        message: String,
    },
}

// ============================================================================
// ConnectionState - Predicates
// ============================================================================

impl ConnectionState {
    /// Returns the state name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::AwaitingPairing { .. } => "awaiting_pairing",
            Self::Ready { .. } => "ready",
            Self::Disconnected { .. } => "disconnected",
            Self::LoggingOut => "logging_out",
            Self::Failed { .. } => "failed",
        }
    }

    /// Returns `true` if the connection is usable for sending.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Returns `true` while a client is starting or waiting to be paired.
    #[inline]
    #[must_use]
    pub fn is_starting(&self) -> bool {
        matches!(self, Self::Initializing | Self::AwaitingPairing { .. })
    }

    /// Returns the pairing code if one is currently valid.
    #[inline]
    #[must_use]
    pub fn pairing_code(&self) -> Option<&PairingCode> {
        match self {
            Self::AwaitingPairing { code } => Some(code),
            _ => None,
        }
    }

    /// Returns `true` if moving to `next` follows a defined edge.
    #[must_use]
    pub fn accepts(&self, next: &Self) -> bool {
        use ConnectionState as S;

        match (self, next) {
            (_, S::LoggingOut) => true,
            (S::LoggingOut, S::Disconnected { .. }) => true,
            (S::Ready { .. } | S::Initializing, S::Initializing) => false,
            (_, S::Initializing) => !matches!(self, S::LoggingOut),
            (S::Initializing | S::AwaitingPairing { .. }, S::AwaitingPairing { .. }) => true,
            (S::Initializing | S::AwaitingPairing { .. }, S::Ready { .. }) => true,
            (S::Initializing | S::AwaitingPairing { .. }, S::Failed { .. }) => true,
            (
                S::Initializing | S::AwaitingPairing { .. } | S::Ready { .. },
                S::Disconnected { .. },
            ) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected { reason } => write!(f, "disconnected ({reason})"),
            Self::Failed { message } => write!(f, "failed ({message})"),
            other => f.write_str(other.name()),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Milliseconds since the Unix epoch, saturating at zero.
#[must_use]
pub fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Serializes a [`SystemTime`] as Unix milliseconds.
pub(crate) fn serialize_unix_millis<S: Serializer>(
    time: &SystemTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(unix_millis(*time))
}

/// Serializes an optional [`SystemTime`] as Unix milliseconds or null.
pub(crate) fn serialize_opt_unix_millis<S: Serializer>(
    time: &Option<SystemTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match time {
        Some(t) => serializer.serialize_some(&unix_millis(*t)),
        None => serializer.serialize_none(),
    }
}

// ============================================================================
// Tests
// ============================================================================
