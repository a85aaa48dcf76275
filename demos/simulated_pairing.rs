//! Full session lifecycle against a simulated network.
//!
//! Demonstrates:
//! - Building a manager with a closure factory
//! - Pairing code issue and pairing
//! - Messages queued before `Ready` draining in order
//! - Refused reconnect while connected, then logout
//!
//! Usage:
//!   cargo run --example simulated_pairing
//!   cargo run --example simulated_pairing -- --debug

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::Mutex;
use session_lifecycle::{
    ClientEvent, CredentialStore, EventHandler, LifecycleManager, PairingReply, Recipient,
    SessionClient, SessionConfig, StatusEvent,
};
use tracing_subscriber::EnvFilter;

// ============================================================================
// SimulatedClient
// ============================================================================

/// Emits a pairing code shortly after start and becomes ready a bit later.
#[derive(Default)]
struct SimulatedClient {
    handler: Arc<Mutex<Option<EventHandler>>>,
}

impl SimulatedClient {
    fn emit(handler: &Mutex<Option<EventHandler>>, event: ClientEvent) {
        if let Some(handler) = handler.lock().as_ref() {
            handler(event);
        }
    }
}

#[async_trait]
impl SessionClient for SimulatedClient {
    fn set_event_handler(&self, handler: EventHandler) {
        *self.handler.lock() = Some(handler);
    }

    fn clear_event_handler(&self) {
        *self.handler.lock() = None;
    }

    async fn start(&self) -> session_lifecycle::Result<()> {
        let handler = Arc::clone(&self.handler);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Self::emit(
                &handler,
                ClientEvent::PairingCode {
                    token: "2@simulated-pairing-token".to_string(),
                },
            );

            tokio::time::sleep(Duration::from_secs(1)).await;
            Self::emit(&handler, ClientEvent::Authenticated);
            Self::emit(&handler, ClientEvent::Ready);
        });
        Ok(())
    }

    async fn connection_state(&self) -> session_lifecycle::Result<Option<String>> {
        Ok(Some("CONNECTED".to_string()))
    }

    async fn send_message(&self, recipient: &Recipient, body: &str) -> session_lifecycle::Result<()> {
        println!("    → {recipient}: {body}");
        Ok(())
    }

    async fn logout(&self) -> session_lifecycle::Result<()> {
        Ok(())
    }

    async fn destroy(&self) -> session_lifecycle::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let debug = std::env::args().any(|a| a == "--debug");
    let filter = if debug {
        "session_lifecycle=debug"
    } else {
        "session_lifecycle=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    println!("=== Simulated Pairing ===\n");

    // ========================================================================
    // Build Manager
    // ========================================================================

    println!("[1] Building manager...");

    let manager = LifecycleManager::builder()
        .config(SessionConfig::new().with_drain_delay(Duration::from_millis(300)))
        .credentials(CredentialStore::temporary("demo").context("temporary credentials")?)
        .factory(
            |_: &CredentialStore| -> session_lifecycle::Result<Arc<dyn SessionClient>> {
                Ok(Arc::new(SimulatedClient::default()))
            },
        )
        .build()
        .context("build manager")?;

    let mut events = manager.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let StatusEvent::StatusChanged { state } = event {
                println!("    [status] {state}");
            }
        }
    });

    println!("    ✓ Manager ready\n");

    // ========================================================================
    // Initialize and Pair
    // ========================================================================

    println!("[2] Initializing...");
    println!("    {}", serde_json::to_string(&manager.initialize().await)?);

    println!("\n[3] Queueing messages before ready...");
    for body in ["first", "second", "third"] {
        let reply = manager.send("0300-1234567", body).await;
        println!("    {body}: {}", serde_json::to_string(&reply)?);
    }

    tokio::time::sleep(Duration::from_millis(400)).await;
    if let PairingReply::Code(code) = manager.pairing_code() {
        println!("\n[4] Pairing code: {}", code.payload());
    }

    println!("\n[5] Waiting for pairing and drain...");
    tokio::time::sleep(Duration::from_secs(2)).await;
    println!("    {}", serde_json::to_string(&manager.status_reply())?);

    // ========================================================================
    // Reconnect and Logout
    // ========================================================================

    println!("\n[6] Reconnect while connected...");
    println!("    {}", serde_json::to_string(&manager.reconnect().await)?);

    println!("\n[7] Logging out...");
    println!("    {}", serde_json::to_string(&manager.logout().await)?);
    println!("    {}", serde_json::to_string(&manager.pairing_code())?);

    println!("\n=== Done ===");
    Ok(())
}
