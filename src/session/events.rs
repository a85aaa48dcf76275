//! Status event bus.
//!
//! Fan-out of state-change notifications to external observers. Independent
//! of [`LifecycleManager::status`](super::LifecycleManager::status): a
//! subscriber that never reads still leaves the getters correct, and a slow
//! subscriber lags instead of blocking the manager.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::client::PairingCode;

use super::state::ConnectionState;

// ============================================================================
// StatusEvent
// ============================================================================

/// A notification published on every observable change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StatusEvent {
    /// A new pairing code is available.
    PairingCodeIssued {
        /// The pairing payload.
        code: PairingCode,
    },

    /// Connection state changed.
    StatusChanged {
        /// The new state.
        state: ConnectionState,
    },

    /// The connection ended.
    Disconnected {
        /// Why the connection ended.
        reason: String,
    },
}

// ============================================================================
// StatusEventBus
// ============================================================================

/// Broadcast channel for [`StatusEvent`]s.
#[derive(Debug, Clone)]
pub struct StatusEventBus {
    /// Broadcast sender; receivers are created on subscribe.
    sender: broadcast::Sender<StatusEvent>,
}

impl StatusEventBus {
    /// Creates a bus buffering `capacity` events per subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. [`SessionConfig::validate`](crate::SessionConfig::validate)
    /// rejects that before the manager is built.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of live subscribers.
    #[inline]
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event. Having no subscribers is not an error.
    pub fn publish(&self, event: StatusEvent) {
        match self.sender.send(event) {
            Ok(receivers) => trace!(receivers, "Status event published"),
            Err(_) => trace!("Status event dropped, no subscribers"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_in_order() {
        let bus = StatusEventBus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(StatusEvent::StatusChanged {
            state: ConnectionState::Initializing,
        });
        bus.publish(StatusEvent::Disconnected {
            reason: "LOGOUT".into(),
        });

        assert_eq!(
            rx.recv().await.expect("first"),
            StatusEvent::StatusChanged {
                state: ConnectionState::Initializing
            }
        );
        assert!(matches!(
            rx.recv().await.expect("second"),
            StatusEvent::Disconnected { .. }
        ));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = StatusEventBus::new(1);
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(StatusEvent::Disconnected {
            reason: "none listening".into(),
        });
    }

    #[tokio::test]
    async fn test_slow_subscriber_lags() {
        let bus = StatusEventBus::new(1);
        let mut rx = bus.subscribe();

        for _ in 0..3 {
            bus.publish(StatusEvent::StatusChanged {
                state: ConnectionState::Initializing,
            });
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(2))
        ));
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_string(&StatusEvent::PairingCodeIssued {
            code: PairingCode::render("a"),
        })
        .expect("serialize");
        assert_eq!(
            json,
            r#"{"kind":"pairing-code-issued","code":"data:text/plain;base64,YQ=="}"#
        );

        let json = serde_json::to_string(&StatusEvent::StatusChanged {
            state: ConnectionState::LoggingOut,
        })
        .expect("serialize");
        assert_eq!(
            json,
            r#"{"kind":"status-changed","state":{"state":"logging_out"}}"#
        );
    }
}
