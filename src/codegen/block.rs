//! Block program model.
//!
//! A program is a list of scripts.  Each script is a chain of blocks that
//! runs once at start-up (`setup`), every tick (`loop`), or, when the
//! first block is a hat, whenever its trigger fires.  Argument values are
//! literals or nested reporter blocks.
//!
//! ```json
//! { "scripts": [
//!   { "stage": "setup", "blocks": [
//!     { "opcode": "mqttConnect", "args": { "SERVER": "10.0.0.2", "CLIENTID": "robot01" } } ] },
//!   { "blocks": [
//!     { "opcode": "mqttGot", "args": { "TOPIC": "/sensor" } },
//!     { "opcode": "code", "text": "Serial.println([V])",
//!       "args": { "V": { "opcode": "mqttData", "args": { "DATATYPE": "Number" } } } } ] } ] }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Opcodes
// ---------------------------------------------------------------------------

/// Every block the toolchain knows how to translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Opcode {
    #[serde(rename = "mqttConnect")]
    MqttConnect,
    #[serde(rename = "mqttConnectCloud")]
    MqttConnectCloud,
    #[serde(rename = "connectAP")]
    ConnectAp,
    #[serde(rename = "mqttPub")]
    MqttPublish,
    #[serde(rename = "mqttSub")]
    MqttSubscribe,
    #[serde(rename = "mqttGot")]
    MqttGot,
    #[serde(rename = "mqttData")]
    MqttData,
    #[serde(rename = "iotwork")]
    IotWork,
    /// Host passthrough statement with a `[NAME]` template.
    #[serde(rename = "code")]
    Code,
    /// Host passthrough value with a `[NAME]` template.
    #[serde(rename = "expr")]
    Expr,
}

impl Opcode {
    /// Blocks contributed by the IoT extension, in palette order.
    pub const EXTENSION: [Opcode; 8] = [
        Opcode::MqttConnect,
        Opcode::MqttConnectCloud,
        Opcode::ConnectAp,
        Opcode::MqttPublish,
        Opcode::MqttSubscribe,
        Opcode::MqttGot,
        Opcode::MqttData,
        Opcode::IotWork,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::MqttConnect => "mqttConnect",
            Self::MqttConnectCloud => "mqttConnectCloud",
            Self::ConnectAp => "connectAP",
            Self::MqttPublish => "mqttPub",
            Self::MqttSubscribe => "mqttSub",
            Self::MqttGot => "mqttGot",
            Self::MqttData => "mqttData",
            Self::IotWork => "iotwork",
            Self::Code => "code",
            Self::Expr => "expr",
        }
    }

    pub fn shape(self) -> BlockShape {
        match self {
            Self::MqttGot => BlockShape::Hat,
            Self::MqttData | Self::Expr => BlockShape::Reporter,
            _ => BlockShape::Command,
        }
    }
}

/// How a block connects to its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockShape {
    /// Statement in a chain.
    Command,
    /// Starts a chain that runs when an event fires.
    Hat,
    /// Produces a value for another block's argument.
    Reporter,
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// An argument slot value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arg {
    Number(f64),
    Text(String),
    Block(Box<Block>),
}

impl From<&str> for Arg {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<f64> for Arg {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<Block> for Arg {
    fn from(block: Block) -> Self {
        Self::Block(Box::new(block))
    }
}

/// One block instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub opcode: Opcode,
    #[serde(default)]
    pub args: BTreeMap<String, Arg>,
    /// Template for the `code` / `expr` passthrough blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Block {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            args: BTreeMap::new(),
            text: None,
        }
    }

    #[must_use]
    pub fn with_arg(mut self, name: &str, arg: impl Into<Arg>) -> Self {
        self.args.insert(name.to_string(), arg.into());
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn arg(&self, name: &str) -> Option<&Arg> {
        self.args.get(name)
    }

    /// A menu field: the raw text of a literal argument.
    pub fn field(&self, name: &str) -> Option<&str> {
        match self.args.get(name) {
            Some(Arg::Text(t)) => Some(t),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Scripts and programs
// ---------------------------------------------------------------------------

/// When a non-hat script runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Setup,
    Loop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub stage: Stage,
    pub blocks: Vec<Block>,
}

impl Script {
    pub fn new(stage: Stage, blocks: Vec<Block>) -> Self {
        Self { stage, blocks }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub scripts: Vec<Script>,
}

impl Program {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

// ---------------------------------------------------------------------------
// Menus
// ---------------------------------------------------------------------------

/// `mqttData` DATATYPE menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    String,
    Number,
    CStr,
}

impl DataType {
    pub const MENU: [DataType; 3] = [DataType::String, DataType::Number, DataType::CStr];

    /// Unknown menu values fall back to `String`.
    pub fn parse(text: &str) -> Self {
        match text {
            "Number" => Self::Number,
            "C_Str" => Self::CStr,
            _ => Self::String,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::CStr => "C_Str",
        }
    }
}
