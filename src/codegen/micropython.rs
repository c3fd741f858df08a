//! MicroPython translator.
//!
//! The script talks to the companion firmware directly: every command is
//! one `WF` protocol line written to the UART, and inbound notifications
//! are parsed by a generated `iotSerialWork()` routine that looks the
//! topic up in a handler table filled in at start-up.
//!
//! ```text
//!   setup:  wake + init ──► GOT_HANDLERS["/t"] = GOT_t ──► script statements
//!   loop:   iotSerialWork() ──► readline ──► GOT_HANDLERS.get(topic)(payload)
//! ```

use log::warn;

use super::block::{Block, Opcode};
use super::callback::topic_key;
use super::context::GenContext;
use super::emitter::Section;
use super::fragment::{self, Call, PyFunction};
use super::{Target, Translator, Value};
use crate::error::CodegenError;
use crate::protocol::{Command, Credentials};

const UART: &str = "uart";
const HANDLERS: &str = "GOT_HANDLERS";
const TOPIC_DATA: &str = "topicData";
const SERIAL_WORK: &str = "iotSerialWork";

/// Body of `iotSerialWork()`.
const SERIAL_WORK_BODY: &str = "\
if uart.any():
    a = uart.readline()
    linebuf += str(a, 'utf8')
    if linebuf.endswith('\\n'):
        tmp = linebuf.strip().split(' ')
        linebuf = ''
        if len(tmp) >= 6 and tmp[0] == 'WF' and tmp[1] == '3' and tmp[3] == '5':
            handler = GOT_HANDLERS.get(tmp[4])
            if handler:
                handler(tmp[5].strip())";

pub struct MicroPythonTranslator;

/// Protocol arguments prepared for one `uart.write`.
///
/// Literal arguments are baked into the line.  Anything else becomes a
/// `%s` slot filled at run time, in which case literal `%` is escaped.
struct LineArgs {
    texts: Vec<String>,
    exprs: Vec<String>,
}

impl LineArgs {
    fn new(values: &[&Value]) -> Self {
        let dynamic = values.iter().any(|v| v.literal.is_none());
        let mut texts = Vec::with_capacity(values.len());
        let mut exprs = Vec::new();
        for v in values {
            match &v.literal {
                Some(text) if dynamic => texts.push(text.replace('%', "%%")),
                Some(text) => texts.push(text.clone()),
                None => {
                    texts.push("%s".to_string());
                    exprs.push(v.code.clone());
                }
            }
        }
        Self { texts, exprs }
    }

    fn get(&self, index: usize) -> &str {
        self.texts.get(index).map_or("", String::as_str)
    }

    fn write(&self, command: &Command<'_>) -> String {
        let line = fragment::py_string(&command.encode());
        let arg = if self.exprs.is_empty() {
            line
        } else {
            format!("{line} % ({},)", self.exprs.join(", "))
        };
        Call::method(UART, "write").arg(arg).to_string()
    }
}

impl MicroPythonTranslator {
    /// Imports, UART instance, handler table and the wake sequence.
    fn iot_common(&self, ctx: &mut GenContext<'_>) {
        let (id, baud, settle) = (
            ctx.config.uart_id,
            ctx.config.serial_baud,
            ctx.config.init_settle_ms,
        );
        let sleep = Call::function("sleep_ms").arg(settle.to_string()).to_string();
        let wake = [
            "# iot init process".to_string(),
            Call::method(UART, "write").arg(fragment::py_string("\n\n")).to_string(),
            sleep.clone(),
            Call::method(UART, "write")
                .arg(fragment::py_string(&Command::Init.encode()))
                .to_string(),
            sleep,
        ];

        let e = &mut ctx.emitter;
        e.contribute(Section::Headers, UART, "from machine import UART");
        e.contribute(Section::Headers, "sleep", "from utime import sleep_ms");
        e.contribute(Section::Definitions, UART, format!("uart = UART({id}, {baud})"));
        e.contribute(Section::Definitions, "iot_handlers", format!("{HANDLERS} = {{}}"));
        e.contribute(Section::Setup, "iot", wake.join("\n"));
    }

    fn connect(&self, ctx: &mut GenContext<'_>, block: &Block) -> Result<String, CodegenError> {
        let server = self.required(ctx, block, "SERVER")?;
        let client_id = self.required(ctx, block, "CLIENTID")?;
        let user = self.optional(ctx, block, "USER")?;
        let pass = self.optional(ctx, block, "PASS")?;
        self.iot_common(ctx);

        let with_credentials = !user.is_blank();
        let args = if with_credentials {
            LineArgs::new(&[&server, &client_id, &user, &pass])
        } else {
            LineArgs::new(&[&server, &client_id])
        };
        let command = Command::ConnectBroker {
            server: args.get(0),
            client_id: args.get(1),
            credentials: with_credentials.then(|| Credentials {
                username: args.get(2),
                password: args.get(3),
            }),
        };
        Ok(args.write(&command))
    }

    fn connect_ap(&self, ctx: &mut GenContext<'_>, block: &Block) -> Result<String, CodegenError> {
        let ssid = self.required(ctx, block, "AP")?;
        let pass = self.required(ctx, block, "PASS")?;
        self.iot_common(ctx);

        let args = LineArgs::new(&[&ssid, &pass]);
        Ok(args.write(&Command::ConnectAp {
            ssid: args.get(0),
            password: args.get(1),
        }))
    }

    fn publish(&self, ctx: &mut GenContext<'_>, block: &Block) -> Result<String, CodegenError> {
        let topic = self.required(ctx, block, "TOPIC")?;
        let data = self.required(ctx, block, "DATA")?;
        self.iot_common(ctx);

        let args = LineArgs::new(&[&topic, &data]);
        Ok(args.write(&Command::Publish {
            topic: args.get(0),
            data: args.get(1),
        }))
    }

    fn subscribe(&self, ctx: &mut GenContext<'_>, block: &Block) -> Result<String, CodegenError> {
        let topic = self.required(ctx, block, "TOPIC")?;
        self.iot_common(ctx);

        let args = LineArgs::new(&[&topic]);
        Ok(args.write(&Command::Subscribe { topic: args.get(0) }))
    }

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
        let routine = PyFunction::new(&name).param(TOPIC_DATA).body(statements);

        let key = fragment::py_string(&topic_key(&topic));
        ctx.emitter
            .contribute(Section::Setup, name.clone(), format!("{HANDLERS}[{key}] = {name}"));
        ctx.emitter.contribute(Section::Functions, name, routine.to_string());
        Ok(String::new())
    }

    fn serial_work(&self, ctx: &mut GenContext<'_>) -> String {
        self.iot_common(ctx);
        let routine = PyFunction::new(SERIAL_WORK)
            .global("linebuf")
            .body([SERIAL_WORK_BODY]);
        ctx.emitter.contribute(Section::Definitions, "linebuf", "linebuf = ''");
        ctx.emitter.contribute(Section::Functions, "iotserial", routine.to_string());
        Call::function(SERIAL_WORK).to_string()
    }
}

impl Translator for MicroPythonTranslator {
    const TARGET: Target = Target::MicroPython;

    fn string_literal(&self, text: &str) -> String {
        fragment::py_string(text)
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
            Opcode::IotWork => Ok(self.serial_work(ctx)),
            Opcode::Code => self.template(ctx, block),
            Opcode::MqttData | Opcode::Expr => Err(CodegenError::ShapeMismatch {
                opcode: block.opcode.name().to_string(),
                expected: "statement",
            }),
        }
    }

    fn reporter(&self, ctx: &mut GenContext<'_>, block: &Block) -> Result<String, CodegenError> {
        match block.opcode {
            // The payload arrives as text whatever DATATYPE says.
            Opcode::MqttData => Ok(TOPIC_DATA.to_string()),
            Opcode::Expr => self.template(ctx, block),
            _ => Err(CodegenError::ShapeMismatch {
                opcode: block.opcode.name().to_string(),
                expected: "value",
            }),
        }
    }
}
