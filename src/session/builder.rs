//! Builder pattern for manager configuration.
//!
//! Provides a fluent API for configuring and creating [`LifecycleManager`]
//! instances.
//!
//! # Example
//!
//! ```ignore
//! use session_lifecycle::{LifecycleManager, SessionConfig};
//!
//! let manager = LifecycleManager::builder()
//!     .config(SessionConfig::new().with_country_code("44"))
//!     .factory(|store: &CredentialStore| connect(store))
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::client::{CredentialStore, SessionClientFactory};
use crate::config::SessionConfig;
use crate::error::{Error, Result};

use super::manager::LifecycleManager;

// ============================================================================
// ManagerBuilder
// ============================================================================

/// Builder for configuring a [`LifecycleManager`] instance.
///
/// Use [`LifecycleManager::builder()`] to create a new builder.
#[derive(Default)]
pub struct ManagerBuilder {
    /// Manager configuration.
    config: SessionConfig,
    /// Session Client factory.
    factory: Option<Arc<dyn SessionClientFactory>>,
    /// Credential store; derived from the config when unset.
    credentials: Option<CredentialStore>,
}

impl fmt::Debug for ManagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerBuilder")
            .field("config", &self.config)
            .field("factory", &self.factory.as_ref().map(|_| "<factory>"))
            .field("credentials", &self.credentials)
            .finish()
    }
}

// ============================================================================
// ManagerBuilder Implementation
// ============================================================================

impl ManagerBuilder {
    /// Creates a builder with default configuration and no factory.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the manager configuration.
    #[inline]
    #[must_use]
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the Session Client factory.
    ///
    /// Closures of type `Fn(&CredentialStore) -> Result<Arc<dyn SessionClient>>`
    /// are accepted directly.
    #[inline]
    #[must_use]
    pub fn factory(mut self, factory: impl SessionClientFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Sets an already shared Session Client factory.
    #[inline]
    #[must_use]
    pub fn shared_factory(mut self, factory: Arc<dyn SessionClientFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Overrides the credential store.
    ///
    /// By default the store lives under `config.auth_dir`, keyed by
    /// `config.client_id`.
    #[inline]
    #[must_use]
    pub fn credentials(mut self, credentials: CredentialStore) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Builds the manager with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the configuration is invalid or no factory is set
    /// - [`Error::Credentials`] if the credential directory cannot be created
    pub fn build(self) -> Result<LifecycleManager> {
        self.config.validate()?;

        let factory = self.factory.ok_or_else(|| {
            Error::config(
                "Session client factory is required. Use .factory() to set it.\n\
                 Example: LifecycleManager::builder().factory(MyClientFactory::new())",
            )
        })?;

        let credentials = match self.credentials {
            Some(credentials) => credentials,
            None => CredentialStore::from_path(&self.config.auth_dir, &self.config.client_id)?,
        };

        Ok(LifecycleManager::new(self.config, factory, credentials))
    }
}

// ============================================================================
// Tests
// ============================================================================
