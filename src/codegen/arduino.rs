//! Arduino translator.
//!
//! The sketch drives the companion firmware through the `KBIot` library,
//! which owns the serial link.  Every IoT block contributes the same
//! library boilerplate under fixed keys, so it appears once however many
//! blocks use it.

use log::warn;

use super::block::{Arg, Block, DataType, Opcode};
use super::context::GenContext;
use super::emitter::Section;
use super::fragment::{self, Call, CppFunction};
use super::{Target, Translator};
use crate::error::CodegenError;

/// Library instance name in the generated sketch.
const IOT: &str = "iot";

/// Parameter of every topic callback.
const TOPIC_DATA: &str = "topicData";

pub struct ArduinoTranslator;

impl ArduinoTranslator {
    /// Header, instance, serial start, init and per-loop service call.
    fn iot_common(&self, ctx: &mut GenContext<'_>) {
        let baud = ctx.config.serial_baud;
        let e = &mut ctx.emitter;
        e.contribute(Section::Headers, IOT, "#include \"KBIot.h\"");
        e.contribute(Section::Definitions, IOT, "KBIot iot(&Serial);");
        e.contribute(
            Section::Setup,
            "_serial",
            Call::method("Serial", "begin").arg(baud.to_string()).statement(Target::Arduino),
        );
        e.contribute(Section::Setup, IOT, Call::method(IOT, "init").statement(Target::Arduino));
        e.contribute(Section::Loop, IOT, Call::method(IOT, "loop").statement(Target::Arduino));
    }

    fn connect(&self, ctx: &mut GenContext<'_>, block: &Block) -> Result<String, CodegenError> {
        let server = self.required(ctx, block, "SERVER")?;
        let client_id = self.required(ctx, block, "CLIENTID")?;
        let user = self.optional(ctx, block, "USER")?;
        let pass = self.optional(ctx, block, "PASS")?;
        self.iot_common(ctx);

        // `mqttConect` is the library's own spelling.
        let mut call = Call::method(IOT, "mqttConect").arg(server.code).arg(client_id.code);
        if !user.is_blank() {
            call = call.arg(user.code).arg(pass.code);
        }
        Ok(call.to_string())
    }

    fn connect_ap(&self, ctx: &mut GenContext<'_>, block: &Block) -> Result<String, CodegenError> {
        let ssid = self.required(ctx, block, "AP")?;
        let pass = self.required(ctx, block, "PASS")?;
        self.iot_common(ctx);

        // A numeric password still goes over the wire as a string.
        let pass = match block.arg("PASS") {
            Some(Arg::Number(_)) => fragment::c_string(pass.text()),
            _ => pass.code,
        };
        Ok(Call::method(IOT, "connectAP").arg(ssid.code).arg(pass).to_string())
    }

    fn publish(&self, ctx: &mut GenContext<'_>, block: &Block) -> Result<String, CodegenError> {
        let topic = self.required(ctx, block, "TOPIC")?;
        let data = self.required(ctx, block, "DATA")?;
        self.iot_common(ctx);
        Ok(Call::method(IOT, "publish").arg(topic.code).arg(data.code).to_string())
    }

    fn subscribe(&self, ctx: &mut GenContext<'_>, block: &Block) -> Result<String, CodegenError> {
        let topic = self.required(ctx, block, "TOPIC")?;
        self.iot_common(ctx);
        Ok(Call::method(IOT, "subscribe").arg(topic.code).to_string())
    }

    /// Register a callback routine for the topic and emit the hat body
    /// into it.
    fn on_topic(
        &self,
        ctx: &mut GenContext<'_>,
        block: &Block,
        body: &[Block],
    ) -> Result<String, CodegenError> {
        let topic = self.hat_topic(block)?;
        self.iot_common(ctx);

        let name = ctx.callbacks.register(&topic)?;
        if ctx.emitter.fragment(Section::Functions, &name).is_some() {
            warn!("codegen: second hat on '{}' replaces {}", topic, name);
        }

        let statements = self.chain(ctx, body)?;
        let routine = CppFunction::new("void", &name)
            .param(&format!("String {TOPIC_DATA}"))
            .body(statements);

        ctx.emitter.contribute(
            Section::Setup,
            name.clone(),
            Call::method(IOT, "regGot")
                .arg(self.string_literal(&topic))
                .arg(format!("&{name}"))
                .statement(Target::Arduino),
        );
        ctx.emitter.contribute(Section::Functions, name, routine.to_string());
        Ok(String::new())
    }

    fn topic_data(&self, block: &Block) -> String {
        let kind = DataType::parse(block.field("DATATYPE").unwrap_or_default());
        match kind {
            DataType::String => TOPIC_DATA.to_string(),
            DataType::Number => format!("{TOPIC_DATA}.toInt()"),
            DataType::CStr => format!("{TOPIC_DATA}.c_str()"),
        }
    }
}

impl Translator for ArduinoTranslator {
    const TARGET: Target = Target::Arduino;

    fn string_literal(&self, text: &str) -> String {
        fragment::c_string(text)
    }

    fn command(
        &self,
        ctx: &mut GenContext<'_>,
        block: &Block,
        rest: &[Block],
    ) -> Result<String, CodegenError> {
        match block.opcode {
            Opcode::MqttConnect | Opcode::MqttConnectCloud => self.connect(ctx, block),
            Opcode::ConnectAp => self.connect_ap(ctx, block),
            Opcode::MqttPublish => self.publish(ctx, block),
            Opcode::MqttSubscribe => self.subscribe(ctx, block),
            Opcode::MqttGot => self.on_topic(ctx, block, rest),
            Opcode::Code => self.template(ctx, block),
            Opcode::IotWork => Err(CodegenError::UnsupportedOnTarget {
                opcode: block.opcode.name().to_string(),
                target: Self::TARGET.name(),
            }),
            Opcode::MqttData | Opcode::Expr => Err(CodegenError::ShapeMismatch {
                opcode: block.opcode.name().to_string(),
                expected: "statement",
            }),
        }
    }

    fn reporter(&self, ctx: &mut GenContext<'_>, block: &Block) -> Result<String, CodegenError> {
        match block.opcode {
            Opcode::MqttData => Ok(self.topic_data(block)),
            Opcode::Expr => self.template(ctx, block),
            _ => Err(CodegenError::ShapeMismatch {
                opcode: block.opcode.name().to_string(),
                expected: "value",
            }),
        }
    }
}
