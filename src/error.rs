//! Error types for the session lifecycle manager.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use session_lifecycle::{Error, Result};
//!
//! async fn example(client: &dyn SessionClient, to: &Recipient) -> Result<()> {
//!     client.send_message(to, "hello").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::Credentials`] |
//! | Lifecycle | [`Error::Initialization`], [`Error::AuthFailure`], [`Error::Disconnected`] |
//! | Messaging | [`Error::Send`], [`Error::NotConnected`], [`Error::InvalidRecipient`] |
//! | Teardown | [`Error::LogoutTeardown`] |
//! | External | [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when manager configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Credential store error.
    ///
    /// Returned when the credential directory cannot be created or wiped.
    #[error("Credential store error at {path}: {message}")]
    Credentials {
        /// Directory the operation targeted.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Session Client failed to construct or start.
    ///
    /// No automatic retry; an operator must initialize again.
    #[error("Initialization failed: {message}")]
    Initialization {
        /// Description of the startup failure.
        message: String,
    },

    /// Pairing or stored credentials were rejected by the network.
    #[error("Authentication failed: {message}")]
    AuthFailure {
        /// Message reported by the Session Client.
        message: String,
    },

    /// The Session Client reported loss of connection.
    #[error("Disconnected: {reason}")]
    Disconnected {
        /// Reason reported by the Session Client.
        reason: String,
    },

    // ========================================================================
    // Messaging Errors
    // ========================================================================
    /// A single send failed while the connection was ready.
    ///
    /// Does not affect connection state and is never retried.
    #[error("Send failed: {message}")]
    Send {
        /// Protocol error reported by the Session Client.
        message: String,
    },

    /// Operation requires a ready connection.
    #[error("Not connected")]
    NotConnected,

    /// Recipient contains no usable digits.
    #[error("Invalid recipient: {input:?}")]
    InvalidRecipient {
        /// The raw recipient as supplied by the caller.
        input: String,
    },

    // ========================================================================
    // Teardown Errors
    // ========================================================================
    /// Remote logout or destroy call failed.
    ///
    /// Always swallowed by the manager; exposed for Session Client
    /// implementations to report.
    #[error("Logout teardown failed: {message}")]
    LogoutTeardown {
        /// Description of the teardown failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a credential store error.
    #[inline]
    pub fn credentials(path: impl Into<PathBuf>, err: &IoError) -> Self {
        Self::Credentials {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Creates an initialization error.
    #[inline]
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization {
            message: message.into(),
        }
    }

    /// Creates an authentication failure error.
    #[inline]
    pub fn auth_failure(message: impl Into<String>) -> Self {
        Self::AuthFailure {
            message: message.into(),
        }
    }

    /// Creates a disconnected error.
    #[inline]
    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self::Disconnected {
            reason: reason.into(),
        }
    }

    /// Creates a transient send error.
    #[inline]
    pub fn send(message: impl Into<String>) -> Self {
        Self::Send {
            message: message.into(),
        }
    }

    /// Creates an invalid recipient error.
    #[inline]
    pub fn invalid_recipient(input: impl Into<String>) -> Self {
        Self::InvalidRecipient {
            input: input.into(),
        }
    }

    /// Creates a logout teardown error.
    #[inline]
    pub fn logout_teardown(message: impl Into<String>) -> Self {
        Self::LogoutTeardown {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the network rejected the session credentials.
    #[inline]
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthFailure { .. })
    }

    /// Returns `true` if this error only affects the current call.
    ///
    /// Transient errors never change connection state.
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Send { .. } | Self::InvalidRecipient { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::Disconnected { .. } | Self::Initialization { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::initialization("browser exited");
        assert_eq!(err.to_string(), "Initialization failed: browser exited");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("missing factory");
        assert_eq!(err.to_string(), "Configuration error: missing factory");
    }

    #[test]
    fn test_invalid_recipient_display() {
        let err = Error::invalid_recipient("+--");
        assert_eq!(err.to_string(), "Invalid recipient: \"+--\"");
    }

    #[test]
    fn test_credentials_error_carries_path() {
        let io_err = IoError::new(ErrorKind::PermissionDenied, "denied");
        let err = Error::credentials("/tmp/auth", &io_err);
        assert!(err.to_string().contains("/tmp/auth"));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_is_auth_failure() {
        assert!(Error::auth_failure("bad creds").is_auth_failure());
        assert!(!Error::send("timeout").is_auth_failure());
    }

    #[test]
    fn test_is_transient() {
        assert!(Error::send("rate limited").is_transient());
        assert!(Error::invalid_recipient("").is_transient());
        assert!(!Error::disconnected("NAVIGATION").is_transient());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::NotConnected.is_connection_error());
        assert!(Error::disconnected("LOGOUT").is_connection_error());
        assert!(Error::initialization("boom").is_connection_error());
        assert!(!Error::config("test").is_connection_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
