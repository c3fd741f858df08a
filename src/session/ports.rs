//! Session port traits.
//!
//! The manager depends only on these traits.  The host supplies the real
//! network client and hat scheduler; tests supply recording mocks.
//!
//! ```text
//!   SessionManager ──open()──► MqttConnector ──► MqttClient
//!         │                         │
//!         │                         └─ EventSender (link notifications)
//!         └──start_hats()──► HatTrigger
//! ```

use super::events::EventSender;

// ── Client options ────────────────────────────────────────────

/// Options passed when a client is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ClientOptions {
    /// Credentials are attached only when `username` is non-empty; the
    /// password rides with it.
    pub fn new(client_id: &str, username: Option<&str>, password: Option<&str>) -> Self {
        let username = username.filter(|u| !u.is_empty());
        Self {
            client_id: client_id.to_string(),
            password: username.map(|_| password.unwrap_or_default().to_string()),
            username: username.map(str::to_string),
        }
    }
}

// ── Network client ────────────────────────────────────────────

/// A live publish/subscribe client.
pub trait MqttClient {
    fn publish(&mut self, topic: &str, payload: &str);
    fn subscribe(&mut self, topic: &str);
    /// Close the client.  No further events are expected from it.
    fn end(&mut self);
}

/// Factory for clients.  The client reports link events through `events`.
pub trait MqttConnector {
    type Client: MqttClient;

    fn open(&mut self, url: &str, options: &ClientOptions, events: EventSender) -> Self::Client;
}

// ── Host trigger sink ─────────────────────────────────────────

/// The host's event-hat scheduler.
pub trait HatTrigger {
    /// Start every hat of `opcode` whose TOPIC matches `topic`.
    fn start_hats(&mut self, opcode: &str, topic: &str);
}
