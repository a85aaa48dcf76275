//! Session Client seam.
//!
//! The wire protocol and browser automation that talk to the messaging
//! network live behind [`SessionClient`]. The lifecycle manager is the only
//! code that holds one, and it never holds more than one at a time.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   create()    ┌─────────────────────────┐
//! │  LifecycleManager    │──────────────►│  SessionClientFactory   │
//! │                      │               └─────────────────────────┘
//! │  Arc<dyn Session-    │  start / send / logout / destroy
//! │       Client>        │──────────────►┌─────────────────────────┐
//! │                      │◄──────────────│  SessionClient          │
//! └──────────────────────┘  ClientEvent  │  (network connection)   │
//!                           via handler  └─────────────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `credentials` | Persisted credential directory |
//! | `event` | Lifecycle events emitted by a client |
//! | `pairing` | Pairing code rendering |

// ============================================================================
// Submodules
// ============================================================================

/// Persisted credential directory owned by the Session Client.
pub mod credentials;

/// Lifecycle events emitted by a Session Client.
pub mod event;

/// Pairing code payloads.
pub mod pairing;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::identifiers::Recipient;

// ============================================================================
// Re-exports
// ============================================================================

pub use credentials::CredentialStore;
pub use event::ClientEvent;
pub use pairing::PairingCode;

// ============================================================================
// Types
// ============================================================================

/// Event handler callback type.
///
/// Called for each lifecycle event the client emits. Must not block.
pub type EventHandler = Box<dyn Fn(ClientEvent) + Send + Sync>;

// ============================================================================
// SessionClient
// ============================================================================

/// Opaque, stateful handle to one network connection.
///
/// Implementations are not reentrant: the manager guarantees that at most one
/// instance exists at a time and that no other component calls these methods.
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Registers the event handler, replacing any previous one.
    fn set_event_handler(&self, handler: EventHandler);

    /// Removes the event handler. Events emitted afterwards are dropped.
    fn clear_event_handler(&self);

    /// Starts the connection.
    ///
    /// Returns once the client is running; pairing and readiness arrive
    /// later as events.
    async fn start(&self) -> Result<()>;

    /// Probes the network-side connection state.
    ///
    /// Known to be unreliable: may fail or return `None` on a healthy
    /// connection.
    async fn connection_state(&self) -> Result<Option<String>>;

    /// Sends a text message.
    async fn send_message(&self, recipient: &Recipient, body: &str) -> Result<()>;

    /// Logs the session out on the network side.
    async fn logout(&self) -> Result<()>;

    /// Releases every local resource held by the client.
    async fn destroy(&self) -> Result<()>;
}

// ============================================================================
// SessionClientFactory
// ============================================================================

/// Constructs a fresh [`SessionClient`] for each initialize cycle.
pub trait SessionClientFactory: Send + Sync {
    /// Creates a new, not yet started client bound to `credentials`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be constructed.
    fn create(&self, credentials: &CredentialStore) -> Result<Arc<dyn SessionClient>>;
}

impl<F> SessionClientFactory for F
where
    F: Fn(&CredentialStore) -> Result<Arc<dyn SessionClient>> + Send + Sync,
{
    fn create(&self, credentials: &CredentialStore) -> Result<Arc<dyn SessionClient>> {
        self(credentials)
    }
}
