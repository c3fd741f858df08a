//! Command encoding and notification decoding.
//!
//! Every command has a fixed template; the only variable parts are the
//! user-supplied arguments, which are stripped of `"` and trimmed before
//! they are spliced in.

use super::{MARKER, opcode};
use crate::error::ProtocolError;

/// Field value the firmware places in slot 3 of a topic notification.
const NOTIFY_TOPIC_KIND: &str = "5";

/// Minimum token count of a topic notification line.
const NOTIFY_MIN_TOKENS: usize = 6;

// ---------------------------------------------------------------------------
// Board → firmware
// ---------------------------------------------------------------------------

/// Broker credentials.  Only attached when the username is non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// A command written by generated code to the companion firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Bring up the IoT subsystem after the wake sequence.
    Init,
    /// Join an access point.
    ConnectAp { ssid: &'a str, password: &'a str },
    /// Connect to a broker, optionally with credentials.
    ConnectBroker {
        server: &'a str,
        client_id: &'a str,
        credentials: Option<Credentials<'a>>,
    },
    /// Publish `data` on `topic`.
    Publish { topic: &'a str, data: &'a str },
    /// Subscribe to `topic`.
    Subscribe { topic: &'a str },
}

impl<'a> Command<'a> {
    pub fn opcode(&self) -> u8 {
        match self {
            Self::Init => opcode::INIT,
            Self::ConnectAp { .. } => opcode::AP_CONNECT,
            Self::ConnectBroker { .. } => opcode::BROKER_CONNECT,
            Self::Publish { .. } => opcode::PUBLISH,
            Self::Subscribe { .. } => opcode::SUBSCRIBE,
        }
    }

    /// The argument-count slot as the firmware expects it for this template.
    pub fn argc(&self) -> u8 {
        match self {
            Self::Init | Self::Publish { .. } => 4,
            Self::ConnectAp { .. } | Self::Subscribe { .. } => 2,
            Self::ConnectBroker { credentials, .. } => {
                if credentials.is_some() {
                    4
                } else {
                    2
                }
            }
        }
    }

    /// Tokens following the argument-count slot, before cleaning.
    pub fn fields(&self) -> Vec<&'a str> {
        match *self {
            Self::Init => vec!["0", "2", "3", "4", "5"],
            Self::ConnectAp { ssid, password } => vec!["52", ssid, password],
            Self::ConnectBroker {
                server,
                client_id,
                credentials,
            } => {
                let mut fields = vec!["15", server, client_id];
                if let Some(c) = credentials {
                    fields.push(c.username);
                    fields.push(c.password);
                }
                fields
            }
            Self::Publish { topic, data } => vec!["11", "0", "0", topic, data],
            Self::Subscribe { topic } => vec!["0", topic, "0"],
        }
    }

    /// Encode into a single protocol line, including the trailing `\n`.
    pub fn encode(&self) -> String {
        let mut line = format!("{} {} {}", MARKER, self.opcode(), self.argc());
        for field in self.fields() {
            line.push(' ');
            line.push_str(&clean_arg(field));
        }
        line.push('\n');
        line
    }
}

/// Strip double quotes and surrounding whitespace from an argument.
pub fn clean_arg(arg: &str) -> String {
    arg.replace('"', "").trim().to_string()
}

// ---------------------------------------------------------------------------
// Firmware → board
// ---------------------------------------------------------------------------

/// A tokenised `WF` line: opcode plus the raw tokens after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<'a> {
    pub opcode: u8,
    /// Tokens after the opcode (`fields[0]` is protocol slot 2).
    pub fields: Vec<&'a str>,
}

impl<'a> Frame<'a> {
    /// Split a line on single spaces and check the marker and opcode.
    /// A trailing `\n` / `\r\n` is ignored.
    pub fn parse(line: &'a str) -> Result<Self, ProtocolError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut tokens = line.split(' ');
        if tokens.next() != Some(MARKER) {
            return Err(ProtocolError::MissingMarker);
        }
        let opcode = tokens
            .next()
            .and_then(|t| t.parse::<u8>().ok())
            .ok_or(ProtocolError::BadOpcode)?;
        Ok(Self {
            opcode,
            fields: tokens.collect(),
        })
    }

    /// Token at a protocol slot (0 = marker, 1 = opcode).
    fn slot(&self, index: usize) -> Option<&'a str> {
        index.checked_sub(2).and_then(|i| self.fields.get(i).copied())
    }
}

/// An inbound topic notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub topic: String,
    pub payload: String,
}

impl Notification {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        Self::from_frame(&Frame::parse(line)?)
    }

    /// Layout: slot 1 == `3`, slot 3 == `5`, slot 4 = topic, slot 5 = payload.
    pub fn from_frame(frame: &Frame<'_>) -> Result<Self, ProtocolError> {
        if frame.opcode != opcode::NOTIFY || frame.fields.len() + 2 < NOTIFY_MIN_TOKENS {
            return Err(ProtocolError::BadLayout);
        }
        if frame.slot(3) != Some(NOTIFY_TOPIC_KIND) {
            return Err(ProtocolError::BadLayout);
        }
        match (frame.slot(4), frame.slot(5)) {
            (Some(topic), Some(payload)) => Ok(Self {
                topic: topic.to_string(),
                payload: payload.trim().to_string(),
            }),
            _ => Err(ProtocolError::BadLayout),
        }
    }
}
