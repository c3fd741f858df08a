//! Extension descriptor served to the block editor.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::codegen::{BlockShape, DataType, Opcode, Target};
use crate::config::ExtensionConfig;

pub const EXTENSION_ID: &str = "IoT";

const DATATYPE_MENU: &str = "datatype";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentType {
    String,
    Number,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentDescriptor {
    #[serde(rename = "type")]
    pub kind: ArgumentType,
    pub default_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu: Option<&'static str>,
}

impl ArgumentDescriptor {
    fn text(default: &str) -> Self {
        Self {
            kind: ArgumentType::String,
            default_value: default.to_string(),
            menu: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDescriptor {
    pub opcode: Opcode,
    pub block_type: BlockShape,
    pub text: &'static str,
    pub arguments: BTreeMap<&'static str, ArgumentDescriptor>,
    /// Runtime function bound to the block.
    pub func: &'static str,
    /// Targets with a translator for this block.
    pub targets: Vec<Target>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub color1: &'static str,
    pub color2: &'static str,
    pub color3: &'static str,
    pub blocks: Vec<BlockDescriptor>,
    pub menus: BTreeMap<&'static str, Vec<&'static str>>,
}

impl ExtensionDescriptor {
    pub fn block(&self, opcode: Opcode) -> Option<&BlockDescriptor> {
        self.blocks.iter().find(|b| b.opcode == opcode)
    }
}

/// Build the descriptor with argument defaults from `defaults`.
pub fn descriptor(defaults: &ExtensionConfig) -> ExtensionDescriptor {
    let blocks = Opcode::EXTENSION
        .iter()
        .map(|&opcode| block_descriptor(opcode, defaults))
        .collect();

    let mut menus = BTreeMap::new();
    menus.insert(DATATYPE_MENU, DataType::MENU.iter().map(|d| d.as_str()).collect());

    ExtensionDescriptor {
        id: EXTENSION_ID,
        name: "IoT",
        color1: "#1395BA",
        color2: "#107895",
        color3: "#107895",
        blocks,
        menus,
    }
}

fn block_descriptor(opcode: Opcode, defaults: &ExtensionConfig) -> BlockDescriptor {
    let both = vec![Target::Arduino, Target::MicroPython];
    let mut arguments = BTreeMap::new();

    let (text, func, targets) = match opcode {
        Opcode::MqttConnect => {
            arguments.insert("SERVER", ArgumentDescriptor::text(&defaults.default_server));
            arguments.insert("CLIENTID", ArgumentDescriptor::text(&defaults.default_client_id));
            ("Connect MQTT [SERVER] ID[CLIENTID]", "mqttConnect", both)
        }
        Opcode::MqttConnectCloud => {
            arguments.insert("SERVER", ArgumentDescriptor::text(&defaults.cloud_server));
            arguments.insert("CLIENTID", ArgumentDescriptor::text(&defaults.default_client_id));
            arguments.insert("USER", ArgumentDescriptor::text(""));
            arguments.insert("PASS", ArgumentDescriptor::text(""));
            (
                "Connect Cloud[SERVER] Access ID[USER] Pass[PASS] Device ID[CLIENTID]",
                "mqttConnectCloud",
                both,
            )
        }
        Opcode::ConnectAp => {
            arguments.insert("AP", ArgumentDescriptor::text("Home"));
            arguments.insert("PASS", ArgumentDescriptor::text("12345"));
            ("connect AP [AP] pass[PASS]", "noop", both)
        }
        Opcode::MqttPublish => {
            arguments.insert("TOPIC", ArgumentDescriptor::text("/hello"));
            arguments.insert("DATA", ArgumentDescriptor::text("helloworld"));
            ("MQTT Publish [TOPIC] [DATA]", "mqttPub", both)
        }
        Opcode::MqttSubscribe => {
            arguments.insert("TOPIC", ArgumentDescriptor::text("/hello"));
            ("MQTT Subscribe [TOPIC]", "mqttSub", both)
        }
        Opcode::MqttGot => {
            arguments.insert("TOPIC", ArgumentDescriptor::text("/hello"));
            ("MQTT Topic [TOPIC]", "mqttGot", both)
        }
        Opcode::MqttData => {
            arguments.insert(
                "DATATYPE",
                ArgumentDescriptor {
                    kind: ArgumentType::String,
                    default_value: DataType::String.as_str().to_string(),
                    menu: Some(DATATYPE_MENU),
                },
            );
            ("Topic Data [DATATYPE]", "mqttData", both)
        }
        Opcode::IotWork => ("Iot work@micropy", "noop", vec![Target::MicroPython]),
        Opcode::Code | Opcode::Expr => ("", "noop", both),
    };

    BlockDescriptor {
        opcode,
        block_type: opcode.shape(),
        text,
        arguments,
        func,
        targets,
    }
}
