//! Outbound message queue.
//!
//! Buffers messages accepted while the connection is not ready. Draining
//! hands them back one batch at a time; the delivery loop lives in the
//! manager because it goes through the regular send path.
//!
//! # Delivery Policy
//!
//! [`DeliveryPolicy::AtMostOnce`]: a drained message that fails to send is
//! logged and discarded. The caller already received `queued` and is not
//! notified. Messages that were never attempted (the connection dropped
//! mid-drain) are returned to the front of the queue.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use parking_lot::Mutex;
use serde::Serialize;

use crate::identifiers::{MessageId, Recipient};

use super::state::serialize_unix_millis;

// ============================================================================
// DeliveryPolicy
// ============================================================================

/// Delivery guarantee of queued messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryPolicy {
    /// Each message is attempted at most once; failures are dropped.
    AtMostOnce,
}

// ============================================================================
// PendingMessage
// ============================================================================

/// An outbound message waiting for a ready connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMessage {
    /// Log correlation ID.
    pub id: MessageId,
    /// Normalized recipient.
    pub recipient: Recipient,
    /// Message text.
    pub body: String,
    /// When the message was accepted.
    #[serde(serialize_with = "serialize_unix_millis")]
    pub enqueued_at: SystemTime,
}

impl PendingMessage {
    /// Creates a message stamped with the current time.
    #[must_use]
    pub fn new(recipient: Recipient, body: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            recipient,
            body: body.into(),
            enqueued_at: SystemTime::now(),
        }
    }
}

// ============================================================================
// MessageQueue
// ============================================================================

/// FIFO buffer of [`PendingMessage`]s.
#[derive(Debug, Default)]
pub struct MessageQueue {
    /// Buffered messages, oldest first.
    messages: Mutex<VecDeque<PendingMessage>>,
    /// Set while a drain task owns the queue.
    draining: AtomicBool,
}

impl MessageQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the delivery guarantee for drained messages.
    #[inline]
    #[must_use]
    pub const fn policy(&self) -> DeliveryPolicy {
        DeliveryPolicy::AtMostOnce
    }

    /// Appends a message.
    pub fn enqueue(&self, message: PendingMessage) {
        self.messages.lock().push_back(message);
    }

    /// Atomically removes every queued message as one batch.
    ///
    /// Messages enqueued afterwards form the next batch.
    #[must_use]
    pub fn take_batch(&self) -> Vec<PendingMessage> {
        let taken = mem::take(&mut *self.messages.lock());
        taken.into()
    }

    /// Puts never-attempted messages back ahead of anything queued since.
    pub fn requeue_front(&self, messages: impl IntoIterator<Item = PendingMessage>) {
        let mut queue = self.messages.lock();
        let mut restored: VecDeque<PendingMessage> = messages.into_iter().collect();
        restored.append(&mut queue);
        *queue = restored;
    }

    /// Returns the number of queued messages.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Returns `true` if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    /// Claims the single drain slot. Returns `false` if a drain is running.
    pub(crate) fn try_begin_drain(&self) -> bool {
        self.draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Releases the drain slot.
    pub(crate) fn end_drain(&self) {
        self.draining.store(false, Ordering::Release);
    }
}

// ============================================================================
// Tests
// ============================================================================
