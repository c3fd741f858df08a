//! IoT block toolchain library.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  extension (descriptor · IotRuntime · BlockArgs)             │
//! │                                                              │
//! │  ┌─────────────────────────┐   ┌──────────────────────────┐  │
//! │  │ codegen                 │   │ session                  │  │
//! │  │ Program → Translator    │   │ SessionManager ─ FSM     │  │
//! │  │   → TargetEmitter       │   │ LinkEventQueue · ports   │  │
//! │  └───────────┬─────────────┘   └──────────────────────────┘  │
//! │              │ WF lines                                      │
//! │  ┌───────────▼─────────────┐                                 │
//! │  │ protocol (codec · line  │                                 │
//! │  │   decoder · dispatch)   │                                 │
//! │  └─────────────────────────┘                                 │
//! │                                                              │
//! │  config · error                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Code generation is synchronous and pure.  The session is only used
//! when a program runs interactively inside the host.

#![deny(unused_must_use)]

pub mod codegen;
pub mod config;
pub mod error;
pub mod extension;
pub mod protocol;
pub mod session;

pub use error::{Error, Result};
