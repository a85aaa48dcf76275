//! Session Lifecycle - Single-connection manager for a messaging network.
//!
//! This library owns one long-lived authenticated connection to a messaging
//! network and exposes idempotent, race-free operations on it.
//!
//! # Architecture
//!
//! The manager sits between an HTTP-style operation surface and an opaque
//! Session Client:
//!
//! - **Operations**: initialize, reconnect, logout, status, pairing code, send
//! - **Session Client**: wire protocol behind the [`SessionClient`] trait
//!
//! Key design principles:
//!
//! - At most one [`SessionClient`] exists at any time
//! - Only the [`LifecycleManager`] mutates [`ConnectionState`]
//! - Messages sent while not ready are queued and drained on `Ready`
//! - No operation blocks on another; concurrent calls short-circuit
//!
//! # Quick Start
//!
//! ```ignore
//! use session_lifecycle::{LifecycleManager, PairingReply, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> session_lifecycle::Result<()> {
//!     let manager = LifecycleManager::builder()
//!         .config(SessionConfig::new().with_auth_dir("./session_auth"))
//!         .factory(MyClientFactory::new())
//!         .build()?;
//!
//!     manager.initialize().await;
//!
//!     if let PairingReply::Code(code) = manager.pairing_code() {
//!         println!("Scan: {}", code.payload());
//!     }
//!
//!     manager.send("03001234567", "hello").await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Session Client seam: trait, events, credentials |
//! | [`config`] | Manager configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers and recipient normalization |
//! | [`session`] | Lifecycle manager, state machine, queue, keep-alive |

// ============================================================================
// Modules
// ============================================================================

/// Session Client seam.
///
/// - [`SessionClient`] - One network connection
/// - [`SessionClientFactory`] - Builds a fresh client per initialize cycle
/// - [`ClientEvent`] - Lifecycle events emitted by a client
pub mod client;

/// Manager configuration.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Session lifecycle management.
///
/// Use [`LifecycleManager::builder()`] to create a configured manager.
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{
    ClientEvent, CredentialStore, EventHandler, PairingCode, SessionClient, SessionClientFactory,
};

// Config types
pub use config::SessionConfig;

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ClientId, MessageId, Recipient};

// Session types
pub use session::{
    ConnectionState, DeliveryPolicy, InitReply, LifecycleManager, LogoutReply, ManagerBuilder,
    PairingReply, PendingMessage, ReconnectReply, SendReply, StatusEvent, StatusReply,
    StatusSnapshot,
};
