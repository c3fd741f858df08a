//! Toolchain configuration parameters
//!
//! All tunable parameters for code generation and the live session.
//! Values can be overridden from a JSON file passed to the CLI.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IotConfig {
    pub session: SessionConfig,
    pub codegen: CodegenConfig,
    pub extension: ExtensionConfig,
}

/// Live session parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// URL scheme for the broker transport
    pub broker_scheme: String,
    /// Broker port appended to every server host
    pub broker_port: u16,
    /// Reconnect notifications tolerated before the connect is abandoned
    pub max_reconnect_attempts: u32,
}

/// Generated-code parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Serial baud rate between the board and the companion firmware
    pub serial_baud: u32,
    /// UART peripheral index on the interpreted target
    pub uart_id: u8,
    /// Delay after each wake/init write on the interpreted target (ms)
    pub init_settle_ms: u32,
}

/// Host extension defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Default SERVER argument for the local broker connect block
    pub default_server: String,
    /// Default CLIENTID argument
    pub default_client_id: String,
    /// Default SERVER argument for the cloud connect block
    pub cloud_server: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            broker_scheme: "ws".into(),
            broker_port: 9234,
            max_reconnect_attempts: 5,
        }
    }
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            serial_baud: 115_200,
            uart_id: 1,
            init_settle_ms: 500,
        }
    }
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            default_server: "kittenblock".into(),
            default_client_id: "robot01".into(),
            cloud_server: "kittenbot.cn".into(),
        }
    }
}

impl IotConfig {
    /// Parse and validate a JSON config document.  Missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would produce unusable URLs or generated code.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.session;
        if s.broker_scheme.is_empty() || !s.broker_scheme.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ConfigError::ValidationFailed("session.broker_scheme must be alphanumeric"));
        }
        if s.broker_port == 0 {
            return Err(ConfigError::ValidationFailed("session.broker_port must be non-zero"));
        }
        if self.codegen.serial_baud == 0 {
            return Err(ConfigError::ValidationFailed("codegen.serial_baud must be non-zero"));
        }
        if self.extension.default_client_id.contains(char::is_whitespace) {
            return Err(ConfigError::ValidationFailed(
                "extension.default_client_id must not contain whitespace",
            ));
        }
        Ok(())
    }
}

impl SessionConfig {
    /// Broker URL for a server host, e.g. `ws://kittenblock:9234`.
    pub fn broker_url(&self, server: &str) -> String {
        format!("{}://{}:{}", self.broker_scheme, server, self.broker_port)
    }
}
