//! Session connection state machine.
//!
//! ```text
//!                connect()
//!  Disconnected ──────────► Connecting ──Connected──► Connected
//!        ▲                      │                       │   ▲
//!        │ end()          Reconnect               Reconnect │ Connected
//!        │                      ▼                       ▼   │
//!        └──────────────── Reconnecting{n} ◄──Reconnect──┘
//!                               │ n > max
//!                               ▼
//!                         Failed{attempts}
//! ```
//!
//! `step` is pure: it maps (state, event) to the next state plus the
//! action the manager must carry out.  The retry counter lives in the
//! state itself, so a connect acknowledgement resets it by construction.

/// Where the live session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    /// Link lost; `attempt` reconnect notifications seen so far.
    Reconnecting { attempt: u32 },
    /// Retry budget exhausted; the client has been ended.
    Failed { attempts: u32 },
}

impl SessionState {
    /// Reconnect notifications counted since the last acknowledgement.
    pub fn retry_count(self) -> u32 {
        match self {
            Self::Reconnecting { attempt } => attempt,
            Self::Failed { attempts } => attempts,
            _ => 0,
        }
    }

    /// A client handle exists for this state.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected | Self::Reconnecting { .. })
    }
}

/// Notifications delivered by the network client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Broker handshake acknowledged.
    Connected,
    /// The client is retrying the link.
    Reconnect,
    /// Inbound publish on a subscribed topic.
    Message { topic: String, payload: String },
    /// Transport error.  Logged only.
    Error(String),
    /// The client closed.  Logged only.
    Closed,
}

/// What the manager does in response to a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    /// Settle the pending connect successfully.
    Resolve,
    /// End the client and reject the pending connect.
    GiveUp { attempts: u32 },
    /// Store the payload and fire the topic trigger.
    Deliver,
}

/// Apply `event` to `state`.  `max_retries` reconnects are tolerated; the
/// next one gives up.
pub fn step(state: SessionState, event: &LinkEvent, max_retries: u32) -> (SessionState, Action) {
    use SessionState as S;

    if !state.is_live() {
        return (state, Action::None);
    }

    match event {
        LinkEvent::Connected => (S::Connected, Action::Resolve),
        LinkEvent::Reconnect => {
            let attempt = state.retry_count().saturating_add(1);
            if attempt > max_retries {
                (S::Failed { attempts: attempt }, Action::GiveUp { attempts: attempt })
            } else {
                (S::Reconnecting { attempt }, Action::None)
            }
        }
        LinkEvent::Message { .. } => (state, Action::Deliver),
        LinkEvent::Error(_) | LinkEvent::Closed => (state, Action::None),
    }
}
