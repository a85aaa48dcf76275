//! Keep-alive ticker.
//!
//! Probes the Session Client at a fixed interval while the connection is
//! ready. Passive: a failed probe is logged and nothing else happens, since
//! the probe can fail on a healthy connection.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, warn};

use crate::error::Result;

// ============================================================================
// Types
// ============================================================================

/// One keep-alive probe.
///
/// Returns `None` once the connection has left `Ready`, which ends the
/// ticker. Otherwise returns the probe future.
pub type Probe =
    Box<dyn Fn() -> Option<BoxFuture<'static, Result<Option<String>>>> + Send + Sync>;

// ============================================================================
// KeepAliveTicker
// ============================================================================

/// Periodic liveness probe task.
///
/// Aborted when dropped.
#[derive(Debug)]
pub struct KeepAliveTicker {
    /// Probe loop task.
    handle: JoinHandle<()>,
}

impl KeepAliveTicker {
    /// Spawns the ticker. The first probe fires one `period` from now.
    #[must_use]
    pub fn start(period: Duration, probe: Probe) -> Self {
        let handle = tokio::spawn(Self::run(period, probe));
        let period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
        debug!(period_ms, "Keep-alive started");
        Self { handle }
    }

    /// Stops the ticker.
    pub fn stop(self) {
        drop(self);
    }

    /// Returns `true` once the probe loop has exited.
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Probe loop.
    async fn run(period: Duration, probe: Probe) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(ping) = probe() else {
                debug!("Keep-alive stopping, connection no longer ready");
                break;
            };

            match ping.await {
                Ok(state) => debug!(state = ?state, "Keep-alive ping ok"),
                Err(e) => warn!(error = %e, "Keep-alive ping failed"),
            }
        }
    }
}

impl Drop for KeepAliveTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// Tests
// ============================================================================
