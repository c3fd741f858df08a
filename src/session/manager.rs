//! Live broker session.
//!
//! Owns at most one client at a time.  `connect` ends any live client,
//! opens a new one under a fresh generation number and hands back a
//! `ConnectOutcome` that settles exactly once: on the first handshake
//! acknowledgement, when the retry budget runs out, or when a later
//! `connect` / `end` supersedes it.

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{debug, info, warn};

use super::events::{EventSender, LinkEventQueue, TaggedEvent};
use super::ports::{ClientOptions, HatTrigger, MqttClient, MqttConnector};
use super::state::{self, Action, LinkEvent, SessionState};
use crate::config::SessionConfig;
use crate::error::SessionError;

/// Hat opcode fired for every inbound message.
pub const HAT_OPCODE: &str = "IoT_mqttGot";

type OutcomeSignal = Signal<CriticalSectionRawMutex, Result<(), SessionError>>;

// ── Connect outcome ───────────────────────────────────────────

/// Deferred result of one `connect` call.
#[derive(Clone)]
pub struct ConnectOutcome {
    signal: Arc<OutcomeSignal>,
}

impl ConnectOutcome {
    /// Wait for the outcome.
    pub async fn wait(&self) -> Result<(), SessionError> {
        self.signal.wait().await
    }

    /// Take the outcome if it has settled.
    pub fn try_take(&self) -> Option<Result<(), SessionError>> {
        self.signal.try_take()
    }

    pub fn is_settled(&self) -> bool {
        self.signal.signaled()
    }
}

// ── Manager ───────────────────────────────────────────────────

pub struct SessionManager<C: MqttConnector, T: HatTrigger> {
    connector: C,
    trigger: T,
    config: SessionConfig,
    queue: Arc<LinkEventQueue>,
    client: Option<C::Client>,
    generation: u32,
    state: SessionState,
    pending: Option<Arc<OutcomeSignal>>,
    message: Option<String>,
}

impl<C: MqttConnector, T: HatTrigger> SessionManager<C, T> {
    pub fn new(connector: C, trigger: T, config: SessionConfig, queue: Arc<LinkEventQueue>) -> Self {
        Self {
            connector,
            trigger,
            config,
            queue,
            client: None,
            generation: 0,
            state: SessionState::Disconnected,
            pending: None,
            message: None,
        }
    }

    /// Open a client for `server`, ending any live one first.
    pub fn connect(
        &mut self,
        server: &str,
        client_id: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> ConnectOutcome {
        self.teardown();

        self.generation = self.generation.wrapping_add(1);
        let url = self.config.broker_url(server);
        let options = ClientOptions::new(client_id, username, password);
        info!(
            "session: connecting to {} as '{}' (generation {})",
            url, client_id, self.generation
        );

        let events = EventSender::new(Arc::clone(&self.queue), self.generation);
        self.client = Some(self.connector.open(&url, &options, events));
        self.state = SessionState::Connecting;

        let signal = Arc::new(OutcomeSignal::new());
        self.pending = Some(Arc::clone(&signal));
        ConnectOutcome { signal }
    }

    /// Apply one link event.  Events from superseded clients are ignored.
    pub fn handle(&mut self, tagged: TaggedEvent) {
        if tagged.generation != self.generation || self.client.is_none() {
            debug!(
                "session: ignoring event from generation {} (current {})",
                tagged.generation, self.generation
            );
            return;
        }

        match &tagged.event {
            LinkEvent::Error(e) => warn!("session: transport error: {}", e),
            LinkEvent::Closed => info!("session: client closed"),
            _ => {}
        }

        let (next, action) = state::step(self.state, &tagged.event, self.config.max_reconnect_attempts);
        if next != self.state {
            debug!("session: {:?} -> {:?}", self.state, next);
        }
        self.state = next;

        match action {
            Action::None => {}
            Action::Resolve => {
                info!("session: connected");
                self.settle(Ok(()));
            }
            Action::GiveUp { attempts } => {
                warn!("session: giving up after {} reconnect attempts", attempts);
                if let Some(mut client) = self.client.take() {
                    client.end();
                }
                self.settle(Err(SessionError::RetryBudgetExceeded));
            }
            Action::Deliver => {
                if let LinkEvent::Message { topic, payload } = tagged.event {
                    self.message = Some(payload);
                    self.trigger.start_hats(HAT_OPCODE, &topic);
                }
            }
        }
    }

    /// Drain every queued event without blocking.  Returns how many were
    /// taken off the queue.
    pub fn process_pending(&mut self) -> usize {
        let mut n = 0;
        while let Some(event) = self.queue.try_receive() {
            self.handle(event);
            n += 1;
        }
        n
    }

    /// Publish through the live client.  No-op when disconnected.
    pub fn publish(&mut self, topic: &str, payload: &str) {
        match self.client.as_mut() {
            Some(c) => c.publish(topic, payload),
            None => debug!("session: publish to '{}' while disconnected", topic),
        }
    }

    /// Subscribe through the live client.  No-op when disconnected.
    pub fn subscribe(&mut self, topic: &str) {
        match self.client.as_mut() {
            Some(c) => c.subscribe(topic),
            None => debug!("session: subscribe to '{}' while disconnected", topic),
        }
    }

    /// End the live client and return to `Disconnected`.
    pub fn end(&mut self) {
        self.teardown();
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.state.retry_count()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// Most recent inbound payload.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn teardown(&mut self) {
        if let Some(mut client) = self.client.take() {
            info!("session: ending client (generation {})", self.generation);
            client.end();
        }
        self.settle(Err(SessionError::Superseded));
        self.state = SessionState::Disconnected;
    }

    /// Settle the pending outcome, if any.  Later calls are no-ops.
    fn settle(&mut self, result: Result<(), SessionError>) {
        if let Some(signal) = self.pending.take() {
            signal.signal(result);
        }
    }
}
