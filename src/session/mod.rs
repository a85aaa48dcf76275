//! Session lifecycle module.
//!
//! Owns the single logical connection: its state machine, the outbound
//! message queue, the keep-alive ticker, and status notifications.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`LifecycleManager`] | Creates, drives, and destroys the Session Client |
//! | [`ManagerBuilder`] | Fluent configuration builder |
//! | [`ConnectionState`] | Lifecycle state machine |
//! | [`MessageQueue`] | Messages waiting for a ready connection |
//! | [`KeepAliveTicker`] | Periodic liveness probe |
//! | [`StatusEventBus`] | Broadcast of state changes |
//!
//! # Example
//!
//! ```ignore
//! use session_lifecycle::{LifecycleManager, SendReply};
//!
//! let manager = LifecycleManager::builder().factory(factory).build()?;
//! manager.initialize().await;
//!
//! // Queued until the client reports ready, then drained in order.
//! assert_eq!(manager.send("03001234567", "hello").await, SendReply::Queued);
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for manager configuration.
pub mod builder;

/// Status event bus.
pub mod events;

/// Keep-alive ticker.
pub mod keepalive;

/// Core manager implementation.
pub mod manager;

/// Outbound message queue.
pub mod queue;

/// Operation replies.
pub mod reply;

/// Connection state machine.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ManagerBuilder;
pub use events::{StatusEvent, StatusEventBus};
pub use keepalive::KeepAliveTicker;
pub use manager::{LOGGED_OUT_REASON, LifecycleManager, RECONNECTING_REASON, SHUTDOWN_REASON};
pub use queue::{DeliveryPolicy, MessageQueue, PendingMessage};
pub use reply::{
    InitReply, LogoutReply, PairingReply, ReconnectReply, SendReply, StatusReply, StatusSnapshot,
};
pub use state::ConnectionState;
