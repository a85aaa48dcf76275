//! Scripted Session Client for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::client::{ClientEvent, CredentialStore, EventHandler, SessionClient, SessionClientFactory};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::identifiers::Recipient;
use crate::session::LifecycleManager;

// ============================================================================
// Script
// ============================================================================

/// Canned behavior for every client a [`FakeFactory`] builds.
#[derive(Debug, Clone, Default)]
pub(crate) struct Script {
    pub start_delay: Duration,
    pub start_error: Option<String>,
    pub start_panic: bool,
    pub logout_error: Option<String>,
    pub logout_panic: bool,
    pub destroy_error: Option<String>,
    pub destroy_panic: bool,
    /// Keep emitting after `clear_event_handler`, like a misbehaving client.
    pub sticky_handler: bool,
}

// ============================================================================
// FakeClient
// ============================================================================

/// In-memory client that records every call.
pub(crate) struct FakeClient {
    script: Script,
    handler: Mutex<Option<EventHandler>>,
    send_error: Mutex<Option<String>>,
    sent: Mutex<Vec<(String, String, Instant)>>,
    pub probes: AtomicUsize,
    pub logged_out: AtomicBool,
    pub destroyed: AtomicBool,
}

impl FakeClient {
    fn new(script: Script) -> Self {
        Self {
            script,
            handler: Mutex::new(None),
            send_error: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            probes: AtomicUsize::new(0),
            logged_out: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Delivers an event to the registered handler. Returns `false` if none.
    pub fn emit(&self, event: ClientEvent) -> bool {
        match self.handler.lock().as_ref() {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }

    pub fn emit_pairing_code(&self, token: &str) -> bool {
        self.emit(ClientEvent::PairingCode {
            token: token.to_string(),
        })
    }

    /// Makes every following send fail with `error`.
    pub fn fail_sends(&self, error: &str) {
        *self.send_error.lock() = Some(error.to_string());
    }

    pub fn sent_bodies(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, body, _)| body.clone()).collect()
    }

    pub fn sent_recipients(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(to, _, _)| to.clone()).collect()
    }

    pub fn sent_at(&self) -> Vec<Instant> {
        self.sent.lock().iter().map(|(_, _, at)| *at).collect()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn has_handler(&self) -> bool {
        self.handler.lock().is_some()
    }
}

#[async_trait]
impl SessionClient for FakeClient {
    fn set_event_handler(&self, handler: EventHandler) {
        *self.handler.lock() = Some(handler);
    }

    fn clear_event_handler(&self) {
        if !self.script.sticky_handler {
            *self.handler.lock() = None;
        }
    }

    async fn start(&self) -> Result<()> {
        if !self.script.start_delay.is_zero() {
            tokio::time::sleep(self.script.start_delay).await;
        }
        if self.script.start_panic {
            panic!("browser crashed");
        }
        match &self.script.start_error {
            Some(message) => Err(Error::initialization(message.clone())),
            None => Ok(()),
        }
    }

    async fn connection_state(&self) -> Result<Option<String>> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(Some("CONNECTED".to_string()))
    }

    async fn send_message(&self, recipient: &Recipient, body: &str) -> Result<()> {
        if let Some(error) = self.send_error.lock().clone() {
            return Err(Error::send(error));
        }
        self.sent
            .lock()
            .push((recipient.to_string(), body.to_string(), Instant::now()));
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        self.logged_out.store(true, Ordering::SeqCst);
        if self.script.logout_panic {
            panic!("page closed during logout");
        }
        match &self.script.logout_error {
            Some(message) => Err(Error::logout_teardown(message.clone())),
            None => Ok(()),
        }
    }

    async fn destroy(&self) -> Result<()> {
        self.destroyed.store(true, Ordering::SeqCst);
        if self.script.destroy_panic {
            panic!("browser already gone");
        }
        match &self.script.destroy_error {
            Some(message) => Err(Error::logout_teardown(message.clone())),
            None => Ok(()),
        }
    }
}

// ============================================================================
// FakeFactory
// ============================================================================

/// Factory that hands out [`FakeClient`]s and keeps them for inspection.
#[derive(Default)]
pub(crate) struct FakeFactory {
    script: Mutex<Script>,
    create_error: Mutex<Option<String>>,
    clients: Mutex<Vec<Arc<FakeClient>>>,
}

impl FakeFactory {
    pub fn with_script(script: Script) -> Arc<Self> {
        let factory = Self::default();
        *factory.script.lock() = script;
        Arc::new(factory)
    }

    /// Script for clients built from now on.
    pub fn set_script(&self, script: Script) {
        *self.script.lock() = script;
    }

    pub fn fail_create(&self, error: Option<&str>) {
        *self.create_error.lock() = error.map(str::to_string);
    }

    pub fn created(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn client(&self, index: usize) -> Arc<FakeClient> {
        Arc::clone(&self.clients.lock()[index])
    }

    pub fn latest(&self) -> Arc<FakeClient> {
        let clients = self.clients.lock();
        Arc::clone(clients.last().expect("no client created"))
    }
}

impl SessionClientFactory for FakeFactory {
    fn create(&self, _credentials: &CredentialStore) -> Result<Arc<dyn SessionClient>> {
        if let Some(error) = self.create_error.lock().clone() {
            return Err(Error::initialization(error));
        }
        let client = Arc::new(FakeClient::new(self.script.lock().clone()));
        self.clients.lock().push(Arc::clone(&client));
        Ok(client)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Config with the default timings and a test-only client id.
pub(crate) fn test_config() -> SessionConfig {
    SessionConfig::new().with_client_id("test-session")
}

/// Manager over a temporary credential store.
pub(crate) fn manager(factory: &Arc<FakeFactory>) -> LifecycleManager {
    manager_with(factory, test_config())
}

pub(crate) fn manager_with(factory: &Arc<FakeFactory>, config: SessionConfig) -> LifecycleManager {
    let credentials = CredentialStore::temporary(config.client_id.clone()).expect("temp store");
    LifecycleManager::builder()
        .config(config)
        .shared_factory(Arc::clone(factory) as Arc<dyn SessionClientFactory>)
        .credentials(credentials)
        .build()
        .expect("build manager")
}

/// Lets spawned event loops and drains run. Paused clocks only advance once
/// every task is idle, so a short sleep is enough.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
