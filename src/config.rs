//! Session manager configuration.
//!
//! Provides a type-safe interface for the timings and identifiers the
//! [`LifecycleManager`](crate::LifecycleManager) runs with.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use session_lifecycle::SessionConfig;
//!
//! let config = SessionConfig::new()
//!     .with_auth_dir("./auth")
//!     .with_country_code("44")
//!     .with_drain_delay(Duration::from_millis(500));
//!
//! assert!(config.validate().is_ok());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default credential directory, relative to the working directory.
pub const DEFAULT_AUTH_DIR: &str = "session_auth";

/// Default session name inside the credential directory.
pub const DEFAULT_CLIENT_ID: &str = "primary-session";

/// Default country code substituted for a local `0` prefix.
pub const DEFAULT_COUNTRY_CODE: &str = "92";

/// Default keep-alive probe interval.
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(60);

/// Default delay between messages while draining the queue.
pub const DEFAULT_DRAIN_DELAY: Duration = Duration::from_secs(1);

/// Default pause between teardown and re-initialize on reconnect.
pub const DEFAULT_RECONNECT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Default number of buffered status events per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

// ============================================================================
// SessionConfig
// ============================================================================

/// Lifecycle manager configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Root directory of the persisted credential store.
    pub auth_dir: PathBuf,

    /// Session name; credentials live in `<auth_dir>/session-<client_id>`.
    pub client_id: String,

    /// Country code digits used to rewrite local-format numbers.
    pub country_code: String,

    /// Interval between keep-alive probes while ready.
    pub keep_alive_interval: Duration,

    /// Delay between consecutive sends while draining the queue.
    pub drain_delay: Duration,

    /// Pause after teardown before a reconnect re-initializes.
    pub reconnect_settle_delay: Duration,

    /// Buffered status events per subscriber before lagging.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl SessionConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            auth_dir: PathBuf::from(DEFAULT_AUTH_DIR),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            keep_alive_interval: DEFAULT_KEEP_ALIVE_INTERVAL,
            drain_delay: DEFAULT_DRAIN_DELAY,
            reconnect_settle_delay: DEFAULT_RECONNECT_SETTLE_DELAY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl SessionConfig {
    /// Sets the credential store root directory.
    #[inline]
    #[must_use]
    pub fn with_auth_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.auth_dir = path.into();
        self
    }

    /// Sets the session name.
    #[inline]
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Sets the country code for local-format numbers.
    #[inline]
    #[must_use]
    pub fn with_country_code(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = country_code.into();
        self
    }

    /// Sets the keep-alive probe interval.
    #[inline]
    #[must_use]
    pub fn with_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    /// Sets the inter-message delay used while draining.
    #[inline]
    #[must_use]
    pub fn with_drain_delay(mut self, delay: Duration) -> Self {
        self.drain_delay = delay;
        self
    }

    /// Sets the reconnect settle delay.
    #[inline]
    #[must_use]
    pub fn with_reconnect_settle_delay(mut self, delay: Duration) -> Self {
        self.reconnect_settle_delay = delay;
        self
    }

    /// Sets the per-subscriber status event buffer.
    #[inline]
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SessionConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(Error::config("client_id must not be empty"));
        }

        if self
            .client_id
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        {
            return Err(Error::config(format!(
                "client_id may only contain [A-Za-z0-9_-], got {:?}",
                self.client_id
            )));
        }

        if self.country_code.is_empty() || !self.country_code.chars().all(|c| c.is_ascii_digit())
        {
            return Err(Error::config(format!(
                "country_code must be digits only, got {:?}",
                self.country_code
            )));
        }

        if self.keep_alive_interval.is_zero() {
            return Err(Error::config("keep_alive_interval must be greater than zero"));
        }

        if self.event_capacity == 0 {
            return Err(Error::config("event_capacity must be greater than zero"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
