//! Session lifecycle manager.
//!
//! The [`LifecycleManager`] is the only component that creates, drives, or
//! destroys a Session Client, and the only one that mutates
//! [`ConnectionState`]. Every operation is non-blocking: concurrent
//! `initialize()` calls short-circuit on a trylock flag instead of waiting.
//!
//! # Event Loop
//!
//! Each constructed client gets a spawned task that receives its events in
//! order. Events are tagged with the client's [`ClientId`]; once that client
//! is replaced or torn down its events are ignored.
//!
//! # Example
//!
//! ```ignore
//! let manager = LifecycleManager::builder()
//!     .config(SessionConfig::new().with_auth_dir("./auth"))
//!     .factory(MyClientFactory::new())
//!     .build()?;
//!
//! manager.initialize().await;
//! match manager.pairing_code() {
//!     PairingReply::Code(code) => show(code.payload()),
//!     other => println!("{other:?}"),
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::SystemTime;

use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::client::{ClientEvent, CredentialStore, PairingCode, SessionClient, SessionClientFactory};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::identifiers::{ClientId, Recipient};

use super::builder::ManagerBuilder;
use super::events::{StatusEvent, StatusEventBus};
use super::keepalive::{KeepAliveTicker, Probe};
use super::queue::{MessageQueue, PendingMessage};
use super::reply::{
    InitReply, LogoutReply, PairingReply, ReconnectReply, SendReply, StatusReply, StatusSnapshot,
};
use super::state::ConnectionState;

// ============================================================================
// Constants
// ============================================================================

/// Disconnect reason recorded by `logout()`.
pub const LOGGED_OUT_REASON: &str = "logged_out";

/// Disconnect reason recorded while `reconnect()` tears down.
pub const RECONNECTING_REASON: &str = "reconnecting";

/// Disconnect reason recorded by `shutdown()`.
pub const SHUTDOWN_REASON: &str = "shutdown";

// ============================================================================
// Types
// ============================================================================

/// The live Session Client and its generation.
#[derive(Clone)]
struct ClientSlot {
    /// Generation tag for events.
    id: ClientId,
    /// Client handle.
    handle: Arc<dyn SessionClient>,
}

/// Mutable state guarded by one lock.
struct Shared {
    /// Current lifecycle state.
    state: ConnectionState,
    /// At most one client, ever.
    client: Option<ClientSlot>,
    /// Last transition, event, or successful send.
    last_activity: Option<SystemTime>,
    /// Running only while `Ready`.
    keep_alive: Option<KeepAliveTicker>,
    /// Label last reported by the network, kept only while `Ready`.
    network_state: Option<String>,
}

impl Shared {
    /// Returns the client if the connection is ready.
    fn ready_client(&self) -> Result<Arc<dyn SessionClient>> {
        match &self.client {
            Some(slot) if self.state.is_ready() => Ok(Arc::clone(&slot.handle)),
            _ => Err(Error::NotConnected),
        }
    }

    /// Returns `true` if `id` is the live client.
    fn is_current(&self, id: ClientId) -> bool {
        self.client.as_ref().is_some_and(|slot| slot.id == id)
    }
}

/// Internal shared state for the manager.
pub(crate) struct ManagerInner {
    /// Timings and identifiers.
    config: SessionConfig,
    /// Builds a fresh client per initialize cycle.
    factory: Arc<dyn SessionClientFactory>,
    /// Persisted credentials, wiped by logout.
    credentials: CredentialStore,
    /// Trylock held for the duration of one `initialize()`.
    initializing: AtomicBool,
    /// State, client, and keep-alive.
    shared: Mutex<Shared>,
    /// Messages waiting for `Ready`.
    queue: MessageQueue,
    /// Status notifications.
    bus: StatusEventBus,
}

impl ManagerInner {
    /// Applies a transition and publishes it. Leaving `Ready` stops the
    /// keep-alive.
    fn transition(&self, shared: &mut Shared, next: ConnectionState) -> bool {
        if !shared.state.accepts(&next) {
            warn!(from = %shared.state, to = %next, "Rejected state transition");
            return false;
        }

        if shared.state.is_ready() && !next.is_ready() {
            shared.keep_alive = None;
            shared.network_state = None;
        }

        info!(from = %shared.state, to = %next, "State transition");
        shared.state = next.clone();
        shared.last_activity = Some(SystemTime::now());
        self.bus.publish(StatusEvent::StatusChanged { state: next });
        true
    }
}

// ============================================================================
// InitGuard
// ============================================================================

/// Holds the initializing flag; clears it on every exit path, panics included.
struct InitGuard<'a>(&'a AtomicBool);

impl<'a> InitGuard<'a> {
    /// Sets the flag if clear. Never waits.
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// LifecycleManager
// ============================================================================

/// Owner of the single logical connection.
///
/// Cheap to clone; all clones drive the same connection.
#[derive(Clone)]
pub struct LifecycleManager {
    /// Shared inner state.
    pub(crate) inner: Arc<ManagerInner>,
}

// ============================================================================
// LifecycleManager - Display
// ============================================================================

impl fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("state", &self.state())
            .field("queued", &self.queued_len())
            .field("subscribers", &self.inner.bus.subscriber_count())
            .field("credentials", &self.inner.credentials)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// LifecycleManager - Constructor
// ============================================================================

impl LifecycleManager {
    /// Creates a configuration builder for the manager.
    #[inline]
    #[must_use]
    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::new()
    }

    /// Creates a manager in `Uninitialized` state.
    pub(crate) fn new(
        config: SessionConfig,
        factory: Arc<dyn SessionClientFactory>,
        credentials: CredentialStore,
    ) -> Self {
        let bus = StatusEventBus::new(config.event_capacity);

        debug!(
            client_id = %credentials.client_id(),
            auth_dir = %credentials.root().display(),
            "Lifecycle manager created"
        );

        Self {
            inner: Arc::new(ManagerInner {
                config,
                factory,
                credentials,
                initializing: AtomicBool::new(false),
                shared: Mutex::new(Shared {
                    state: ConnectionState::Uninitialized,
                    client: None,
                    last_activity: None,
                    keep_alive: None,
                    network_state: None,
                }),
                queue: MessageQueue::new(),
                bus,
            }),
        }
    }
}

// ============================================================================
// LifecycleManager - Accessors
// ============================================================================

impl LifecycleManager {
    /// Returns a snapshot of the current state. Never blocks on the network.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        let shared = self.inner.shared.lock();
        StatusSnapshot {
            state: shared.state.clone(),
            pairing_code: shared.state.pairing_code().cloned(),
            network_state: shared.network_state.clone(),
            last_activity: shared.last_activity,
        }
    }

    /// Returns the compact polling status.
    #[must_use]
    pub fn status_reply(&self) -> StatusReply {
        StatusReply::from(&self.status())
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.shared.lock().state.clone()
    }

    /// Returns `true` if the connection is usable for sending.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.shared.lock().state.is_ready()
    }

    /// Returns the pairing payload or the reason there is none.
    #[must_use]
    pub fn pairing_code(&self) -> PairingReply {
        match &self.inner.shared.lock().state {
            ConnectionState::Ready { .. } => PairingReply::Ready,
            ConnectionState::AwaitingPairing { code } => PairingReply::Code(code.clone()),
            ConnectionState::Initializing => PairingReply::Initializing,
            _ => PairingReply::NotStarted,
        }
    }

    /// Subscribes to status events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.inner.bus.subscribe()
    }

    /// Returns the number of queued messages.
    #[inline]
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.inner.queue.len()
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Returns the credential store.
    #[inline]
    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }
}

// ============================================================================
// LifecycleManager - Lifecycle
// ============================================================================

impl LifecycleManager {
    /// Constructs and starts a new Session Client.
    ///
    /// Returns immediately without side effects if a client is already
    /// starting, awaiting pairing, or ready. Readiness arrives later as an
    /// event; this returns as soon as the client's `start()` does.
    pub async fn initialize(&self) -> InitReply {
        if let Some(reply) = self.short_circuit_initialize() {
            return reply;
        }

        let Some(_guard) = InitGuard::try_acquire(&self.inner.initializing) else {
            debug!("Initialize already in progress");
            return InitReply::Initializing;
        };

        // Re-check under the guard: another initialize may have finished
        // between the first check and acquiring the flag.
        let stale = {
            let mut shared = self.inner.shared.lock();
            if let Some(reply) = Self::initialize_reply_for(&shared.state) {
                return reply;
            }
            shared.keep_alive = None;
            let stale = shared.client.take();
            self.inner.transition(&mut shared, ConnectionState::Initializing);
            stale
        };

        info!("Starting session client");

        if let Some(stale) = stale {
            debug!(client_id = %stale.id, "Tearing down stale client");
            Self::teardown(stale).await;
        }

        let handle = match self.inner.factory.create(&self.inner.credentials) {
            Ok(handle) => handle,
            Err(e) => {
                error!(error = %e, "Failed to construct session client");
                let message = e.to_string();
                self.fail_start(None, message.clone());
                return InitReply::Error { error: message };
            }
        };

        let slot = ClientSlot {
            id: ClientId::next(),
            handle,
        };
        self.attach(&slot);

        let installed = {
            let mut shared = self.inner.shared.lock();
            if matches!(shared.state, ConnectionState::Initializing) {
                shared.client = Some(slot.clone());
                true
            } else {
                false
            }
        };

        if !installed {
            warn!(client_id = %slot.id, "Initialize interrupted, discarding new client");
            Self::teardown(slot).await;
            return InitReply::Error {
                error: Error::initialization("interrupted by logout").to_string(),
            };
        }

        let started = guard_panics(slot.handle.start(), Error::initialization).await;

        match started {
            Ok(()) => {
                if !self.inner.shared.lock().is_current(slot.id) {
                    warn!(client_id = %slot.id, "Client torn down while starting");
                    return InitReply::Error {
                        error: Error::initialization("interrupted by logout").to_string(),
                    };
                }
                info!(client_id = %slot.id, "Session client started");
                InitReply::Started
            }
            Err(e) => {
                error!(client_id = %slot.id, error = %e, "Session client failed to start");
                let message = e.to_string();
                if let Some(slot) = self.fail_start(Some(slot.id), message.clone()) {
                    Self::teardown(slot).await;
                }
                InitReply::Error { error: message }
            }
        }
    }

    /// Tears down a non-ready connection and initializes a fresh one.
    ///
    /// Refused while ready or starting. Persisted credentials are kept. If
    /// another operation moves the connection during the settle delay, that
    /// outcome stands and no client is built.
    pub async fn reconnect(&self) -> ReconnectReply {
        let (stale, settled) = {
            let mut shared = self.inner.shared.lock();
            match shared.state {
                ConnectionState::Ready { .. } => {
                    info!("Already connected, refusing to reconnect");
                    return ReconnectReply::already_connected();
                }
                ConnectionState::Initializing => {
                    debug!("Already initializing, refusing to reconnect");
                    return ReconnectReply::AlreadyInitializing;
                }
                ConnectionState::LoggingOut => {
                    return ReconnectReply::Error {
                        error: Error::initialization("logout in progress").to_string(),
                    };
                }
                _ => {}
            }

            if self.inner.initializing.load(Ordering::Acquire) {
                debug!("Initialize in flight, refusing to reconnect");
                return ReconnectReply::AlreadyInitializing;
            }

            info!(state = %shared.state, "Reconnecting");
            shared.keep_alive = None;
            let stale = shared.client.take();
            if shared.state.is_starting() {
                self.inner.transition(
                    &mut shared,
                    ConnectionState::Disconnected {
                        reason: RECONNECTING_REASON.to_string(),
                    },
                );
            }
            (stale, shared.state.clone())
        };

        if let Some(stale) = stale {
            Self::teardown(stale).await;
        }

        tokio::time::sleep(self.inner.config.reconnect_settle_delay).await;

        // Another operation may have moved the connection during the settle.
        let current = self.state();
        if current != settled {
            info!(from = %settled, to = %current, "Reconnect superseded");
            return match Self::initialize_reply_for(&current) {
                Some(reply) if !matches!(reply, InitReply::Error { .. }) => reply.into(),
                _ => ReconnectReply::Error {
                    error: Error::initialization(format!("reconnect superseded by {current}"))
                        .to_string(),
                },
            };
        }

        self.initialize().await.into()
    }

    /// Logs out remotely, destroys the client, and wipes credentials.
    ///
    /// Allowed from any state. Remote failures are swallowed; local state
    /// always ends `Disconnected { reason: "logged_out" }`. The reply fails
    /// only if the credential wipe itself fails.
    pub async fn logout(&self) -> LogoutReply {
        info!("Logging out");

        let slot = {
            let mut shared = self.inner.shared.lock();
            shared.keep_alive = None;
            self.inner.transition(&mut shared, ConnectionState::LoggingOut);
            shared.client.take()
        };

        if let Some(slot) = slot {
            let logout = guard_panics(slot.handle.logout(), Error::logout_teardown).await;
            if let Err(e) = logout {
                warn!(client_id = %slot.id, error = %e, "Remote logout failed, continuing teardown");
            }
            Self::teardown(slot).await;
        }

        let wiped = self.inner.credentials.wipe();

        self.finish_disconnect(LOGGED_OUT_REASON);

        match wiped {
            Ok(()) => {
                info!("Logged out");
                LogoutReply::ok()
            }
            Err(e) => {
                error!(error = %e, "Failed to wipe session credentials");
                LogoutReply::failed(e.to_string())
            }
        }
    }

    /// Destroys the client without touching credentials.
    ///
    /// For process exit; a later `initialize()` resumes the stored session.
    pub async fn shutdown(&self) {
        let slot = {
            let mut shared = self.inner.shared.lock();
            shared.keep_alive = None;
            let slot = shared.client.take();
            if slot.is_some() {
                self.inner.transition(
                    &mut shared,
                    ConnectionState::Disconnected {
                        reason: SHUTDOWN_REASON.to_string(),
                    },
                );
            }
            slot
        };

        if let Some(slot) = slot {
            Self::teardown(slot).await;
            info!("Session client shut down");
        }
    }
}

// ============================================================================
// LifecycleManager - Messaging
// ============================================================================

impl LifecycleManager {
    /// Sends a message, or queues it while the connection is not ready.
    ///
    /// A failed send is reported to the caller only: state is unchanged and
    /// the message is not queued.
    pub async fn send(&self, number: &str, body: &str) -> SendReply {
        let recipient = match Recipient::normalize(number, &self.inner.config.country_code) {
            Ok(recipient) => recipient,
            Err(e) => {
                warn!(error = %e, "Rejected message");
                return SendReply::Failed {
                    error: e.to_string(),
                };
            }
        };

        // Enqueue under the state lock so it cannot slip past a drain that
        // is starting on a concurrent transition into `Ready`.
        let client = {
            let shared = self.inner.shared.lock();
            match shared.ready_client() {
                Ok(client) => client,
                Err(e) => {
                    let message = PendingMessage::new(recipient, body);
                    debug!(
                        message_id = %message.id,
                        state = %shared.state,
                        reason = %e,
                        "Message queued"
                    );
                    self.inner.queue.enqueue(message);
                    return SendReply::Queued;
                }
            }
        };

        match self.dispatch(client, &recipient, body).await {
            Ok(()) => SendReply::Sent,
            Err(e) => SendReply::Failed {
                error: e.to_string(),
            },
        }
    }

    /// Hands one message to the client. Shared by `send()` and the drain.
    async fn dispatch(
        &self,
        client: Arc<dyn SessionClient>,
        recipient: &Recipient,
        body: &str,
    ) -> Result<()> {
        match guard_panics(client.send_message(recipient, body), Error::send).await {
            Ok(()) => {
                self.inner.shared.lock().last_activity = Some(SystemTime::now());
                debug!(recipient = %recipient, "Message sent");
                Ok(())
            }
            Err(e) => {
                warn!(recipient = %recipient, error = %e, "Send failed");
                Err(e)
            }
        }
    }

    /// Starts a drain task unless one is running or nothing is queued.
    fn spawn_drain(&self) {
        if self.inner.queue.is_empty() {
            return;
        }
        let manager = self.clone();
        tokio::spawn(async move { manager.drain_queue().await });
    }

    /// Delivers queued batches while the connection stays ready.
    async fn drain_queue(&self) {
        let queue = &self.inner.queue;

        loop {
            if !queue.try_begin_drain() {
                debug!("Drain already running");
                return;
            }

            let batch = queue.take_batch();
            if !batch.is_empty() {
                info!(count = batch.len(), policy = ?queue.policy(), "Draining queued messages");
                self.deliver_batch(batch).await;
            }

            queue.end_drain();

            // Catch a batch that formed while this one was in flight.
            if queue.is_empty() || !self.is_ready() {
                return;
            }
        }
    }

    /// Sends one batch in order, spaced by the drain delay.
    ///
    /// Failures are dropped. If the connection leaves `Ready`, the rest of
    /// the batch goes back to the front of the queue unattempted.
    async fn deliver_batch(&self, batch: Vec<PendingMessage>) {
        let delay = self.inner.config.drain_delay;
        let mut pending = batch.into_iter();
        let mut first = true;

        while let Some(message) = pending.next() {
            if !first {
                tokio::time::sleep(delay).await;
            }
            first = false;

            let client = self.inner.shared.lock().ready_client();
            let client = match client {
                Ok(client) => client,
                Err(e) => {
                    let remaining: Vec<_> = std::iter::once(message).chain(pending).collect();
                    warn!(count = remaining.len(), error = %e, "Drain interrupted, requeueing");
                    self.inner.queue.requeue_front(remaining);
                    return;
                }
            };

            if let Err(e) = self.dispatch(client, &message.recipient, &message.body).await {
                warn!(message_id = %message.id, error = %e, "Queued message dropped");
            }
        }
    }
}

// ============================================================================
// LifecycleManager - Events
// ============================================================================

impl LifecycleManager {
    /// Registers an event handler that forwards into a per-client loop.
    fn attach(&self, slot: &ClientSlot) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        slot.handle.set_event_handler(Box::new(move |event| {
            let _ = event_tx.send(event);
        }));

        tokio::spawn(Self::run_event_loop(
            Arc::downgrade(&self.inner),
            slot.id,
            event_rx,
        ));
    }

    /// Processes one client's events in arrival order.
    async fn run_event_loop(
        inner: Weak<ManagerInner>,
        id: ClientId,
        mut event_rx: mpsc::UnboundedReceiver<ClientEvent>,
    ) {
        while let Some(event) = event_rx.recv().await {
            let Some(inner) = inner.upgrade() else {
                break;
            };
            let manager = Self { inner };
            if !manager.handle_event(id, event).await {
                break;
            }
        }

        debug!(client_id = %id, "Event loop terminated");
    }

    /// Applies one event. Returns `false` once `id` is no longer live.
    async fn handle_event(&self, id: ClientId, event: ClientEvent) -> bool {
        let name = event.name();
        let mut drain = false;

        let teardown = {
            let mut shared = self.inner.shared.lock();

            if !shared.is_current(id) {
                debug!(client_id = %id, event = name, "Ignoring event from stale client");
                return false;
            }

            debug!(
                client_id = %id,
                event = name,
                transition = event.drives_transition(),
                "Client event"
            );
            shared.last_activity = Some(SystemTime::now());

            match event {
                ClientEvent::PairingCode { token } => {
                    if shared.state.is_starting() {
                        let code = PairingCode::render(&token);
                        let state = ConnectionState::AwaitingPairing { code: code.clone() };
                        if self.inner.transition(&mut shared, state) {
                            self.inner.bus.publish(StatusEvent::PairingCodeIssued { code });
                            info!(client_id = %id, "Pairing code issued");
                        }
                    } else {
                        debug!(state = %shared.state, "Ignoring pairing code");
                    }
                    None
                }

                ClientEvent::Ready => {
                    if shared.state.is_starting() {
                        let ready = ConnectionState::Ready {
                            since: SystemTime::now(),
                        };
                        if self.inner.transition(&mut shared, ready) {
                            shared.keep_alive = Some(KeepAliveTicker::start(
                                self.inner.config.keep_alive_interval,
                                self.keep_alive_probe(id),
                            ));
                            drain = true;
                            info!(client_id = %id, "Session ready");
                        }
                    } else {
                        debug!(state = %shared.state, "Ignoring ready");
                    }
                    None
                }

                ClientEvent::AuthFailure { message } => {
                    error!(client_id = %id, message = %message, "Authentication failed");
                    let failed = ConnectionState::Failed { message };
                    if shared.state.is_starting() && self.inner.transition(&mut shared, failed) {
                        shared.client.take()
                    } else {
                        None
                    }
                }

                ClientEvent::Disconnected { reason } => {
                    warn!(client_id = %id, reason = %reason, "Disconnected");
                    let disconnected = ConnectionState::Disconnected {
                        reason: reason.clone(),
                    };
                    if self.inner.transition(&mut shared, disconnected) {
                        self.inner.bus.publish(StatusEvent::Disconnected { reason });
                        shared.client.take()
                    } else {
                        None
                    }
                }

                ClientEvent::Authenticated => {
                    info!(client_id = %id, "Authenticated");
                    None
                }

                ClientEvent::ChangeState { state } => {
                    debug!(client_id = %id, state = %state, "Network state changed");
                    if shared.state.is_ready() {
                        shared.network_state = Some(state);
                    }
                    None
                }

                ClientEvent::LoadingScreen { percent, message } => {
                    debug!(client_id = %id, percent, message = %message, "Loading");
                    None
                }

                ClientEvent::RemoteSessionSaved => {
                    debug!(client_id = %id, "Remote session saved");
                    None
                }

                ClientEvent::Error { message } => {
                    warn!(client_id = %id, message = %message, "Client error");
                    None
                }
            }
        };

        if drain {
            self.spawn_drain();
        }

        match teardown {
            Some(slot) => {
                Self::teardown(slot).await;
                false
            }
            None => true,
        }
    }

    /// Builds the keep-alive probe for client `id`.
    fn keep_alive_probe(&self, id: ClientId) -> Probe {
        let inner = Arc::downgrade(&self.inner);

        Box::new(move || {
            let weak = inner.clone();
            let inner = inner.upgrade()?;
            let client = {
                let shared = inner.shared.lock();
                if !shared.is_current(id) {
                    return None;
                }
                shared.ready_client().ok()?
            };
            Some(
                async move {
                    let state = client.connection_state().await?;
                    if let Some(inner) = weak.upgrade() {
                        let mut shared = inner.shared.lock();
                        if shared.is_current(id) && shared.state.is_ready() && state.is_some() {
                            shared.network_state.clone_from(&state);
                        }
                    }
                    Ok(state)
                }
                .boxed(),
            )
        })
    }
}

// ============================================================================
// LifecycleManager - Internal
// ============================================================================

impl LifecycleManager {
    /// Reply for states in which `initialize()` must not act.
    fn initialize_reply_for(state: &ConnectionState) -> Option<InitReply> {
        match state {
            ConnectionState::Ready { .. } => Some(InitReply::Connected),
            ConnectionState::Initializing | ConnectionState::AwaitingPairing { .. } => {
                Some(InitReply::Initializing)
            }
            ConnectionState::LoggingOut => Some(InitReply::Error {
                error: Error::initialization("logout in progress").to_string(),
            }),
            _ => None,
        }
    }

    /// Lock-only pre-check so concurrent callers never touch the guard.
    fn short_circuit_initialize(&self) -> Option<InitReply> {
        let reply = Self::initialize_reply_for(&self.inner.shared.lock().state)?;
        debug!(reply = ?reply, "Initialize short-circuited");
        Some(reply)
    }

    /// Moves a starting connection to `Failed`.
    ///
    /// With `Some(id)`, only acts if `id` is still the live client, and
    /// returns it for teardown.
    fn fail_start(&self, id: Option<ClientId>, message: String) -> Option<ClientSlot> {
        let mut shared = self.inner.shared.lock();

        if let Some(id) = id
            && !shared.is_current(id)
        {
            return None;
        }

        if !shared.state.is_starting() {
            return None;
        }

        self.inner.transition(&mut shared, ConnectionState::Failed { message });
        shared.client.take()
    }

    /// Final step of logout.
    fn finish_disconnect(&self, reason: &str) {
        let mut shared = self.inner.shared.lock();
        let disconnected = ConnectionState::Disconnected {
            reason: reason.to_string(),
        };
        if self.inner.transition(&mut shared, disconnected) {
            self.inner.bus.publish(StatusEvent::Disconnected {
                reason: reason.to_string(),
            });
        }
    }

    /// Detaches and destroys a client. Errors are logged, never returned.
    async fn teardown(slot: ClientSlot) {
        slot.handle.clear_event_handler();

        match guard_panics(slot.handle.destroy(), Error::logout_teardown).await {
            Ok(()) => debug!(client_id = %slot.id, "Session client destroyed"),
            Err(e) => warn!(client_id = %slot.id, error = %e, "Failed to destroy session client"),
        }
    }
}

// ============================================================================
// Private Helpers
// ============================================================================

/// Awaits a client call, converting a panic into an error.
async fn guard_panics<T, F>(call: impl Future<Output = Result<T>>, on_panic: F) -> Result<T>
where
    F: FnOnce(String) -> Error,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(on_panic(panic_message(payload.as_ref()))),
    }
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("session client panicked: {detail}")
}

// ============================================================================
// Tests
// ============================================================================
