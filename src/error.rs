//! Unified error types for the IoT block toolchain.
//!
//! A single `Error` enum that every subsystem converts into, so the CLI
//! and the host bindings handle failures uniformly.  Subsystem enums stay
//! small and carry just enough context to produce a readable message.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Code generation could not produce a program.
    Codegen(CodegenError),
    /// A protocol line could not be encoded or decoded.
    Protocol(ProtocolError),
    /// The live session failed.
    Session(SessionError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codegen(e) => write!(f, "codegen: {e}"),
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Session(e) => write!(f, "session: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Code generation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    /// A required argument was absent from the block.
    MissingArgument { opcode: String, argument: String },
    /// A block was used where its shape does not fit (e.g. a command as a value).
    ShapeMismatch { opcode: String, expected: &'static str },
    /// The block has no translation for the selected target.
    UnsupportedOnTarget { opcode: String, target: &'static str },
    /// Two distinct topics derive the same generated handler name.
    CallbackCollision {
        name: String,
        first_topic: String,
        second_topic: String,
    },
}

impl CodegenError {
    /// Fatal errors abort the whole generation pass.  Everything else is
    /// local to the offending block, which then renders as empty text.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CallbackCollision { .. })
    }
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArgument { opcode, argument } => {
                write!(f, "block '{opcode}' is missing argument {argument}")
            }
            Self::ShapeMismatch { opcode, expected } => {
                write!(f, "block '{opcode}' cannot be used as a {expected}")
            }
            Self::UnsupportedOnTarget { opcode, target } => {
                write!(f, "block '{opcode}' has no {target} translation")
            }
            Self::CallbackCollision {
                name,
                first_topic,
                second_topic,
            } => write!(
                f,
                "topics '{first_topic}' and '{second_topic}' both map to handler {name}"
            ),
        }
    }
}

impl std::error::Error for CodegenError {}

impl From<CodegenError> for Error {
    fn from(e: CodegenError) -> Self {
        Self::Codegen(e)
    }
}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Line does not start with the `WF` marker.
    MissingMarker,
    /// Opcode token is absent or not a small integer.
    BadOpcode,
    /// Field layout does not match the opcode.
    BadLayout,
    /// Line exceeded the decoder buffer.
    LineTooLong,
    /// Line bytes are not valid UTF-8.
    InvalidUtf8,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMarker => write!(f, "missing WF marker"),
            Self::BadOpcode => write!(f, "bad opcode"),
            Self::BadLayout => write!(f, "unexpected field layout"),
            Self::LineTooLong => write!(f, "line too long"),
            Self::InvalidUtf8 => write!(f, "line is not UTF-8"),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The broker handshake did not complete within the reconnect budget.
    RetryBudgetExceeded,
    /// A newer connect request (or an explicit end) replaced this one.
    Superseded,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetryBudgetExceeded => write!(f, "error: time out"),
            Self::Superseded => write!(f, "connection superseded"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config text could not be deserialised.
    Malformed(String),
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(msg) => write!(f, "malformed config: {msg}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
