//! Interactive broker session.
//!
//! Used when the block program runs inside the host instead of on a
//! board.  The manager drives one network client at a time through the
//! connect / reconnect / retry state machine and forwards inbound topic
//! messages to the host's hat scheduler.

pub mod events;
pub mod manager;
pub mod ports;
pub mod state;

pub use events::{EventSender, LinkEventQueue, TaggedEvent, pump_events};
pub use manager::{ConnectOutcome, HAT_OPCODE, SessionManager};
pub use ports::{ClientOptions, HatTrigger, MqttClient, MqttConnector};
pub use state::{LinkEvent, SessionState};
