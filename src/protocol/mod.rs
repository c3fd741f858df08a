//! Companion-firmware line protocol.
//!
//! The interpreted target has no network stack of its own; it drives the
//! companion WiFi firmware over a serial line with newline-terminated,
//! space-tokenised text commands:
//!
//! ```text
//! ┌────┬──────────┬────────┬──────────────────────────────┬────┐
//! │ WF │ <opcode> │ <argc> │ <field> <field> ... <field>  │ \n │
//! └────┴──────────┴────────┴──────────────────────────────┴────┘
//!
//!  board ──▶ firmware   Init(10) · ConnectAp(52) · ConnectBroker(15)
//!                       Publish(11) · Subscribe(12)
//!  firmware ──▶ board   Notification(3): WF 3 <n> 5 <topic> <payload>
//! ```
//!
//! No checksum, no escaping, no acknowledgement.  Arguments containing
//! spaces or quotes are outside the supported input domain: quotes are
//! stripped, spaces split the token.

pub mod codec;
pub mod dispatch;
pub mod line;

pub use codec::{Command, Credentials, Frame, Notification};
pub use dispatch::TopicDispatcher;
pub use line::LineDecoder;

/// Fixed literal that starts every protocol line.
pub const MARKER: &str = "WF";

/// Opcode values understood by the companion firmware.
pub mod opcode {
    /// Inbound topic notification (firmware → board).
    pub const NOTIFY: u8 = 3;
    /// Wake/initialise the IoT subsystem.
    pub const INIT: u8 = 10;
    /// Publish a payload on a topic.
    pub const PUBLISH: u8 = 11;
    /// Subscribe to a topic.
    pub const SUBSCRIBE: u8 = 12;
    /// Connect to a broker or cloud service.
    pub const BROKER_CONNECT: u8 = 15;
    /// Join a WiFi access point.
    pub const AP_CONNECT: u8 = 52;
}
