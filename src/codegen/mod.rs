//! Block program → target source translation.
//!
//! ```text
//!   Program ──► generate(target) ──► Translator ──contribute──► TargetEmitter ──► source
//!                                       │                          ▲
//!                                       ├─ value(): literals and nested reporters
//!                                       ├─ command(): statements and hats
//!                                       └─ CallbackTable ─────────┘ (hat routines)
//! ```
//!
//! Each target has one `Translator`.  Translators never write text
//! directly; they contribute keyed fragments (headers, definitions, setup,
//! loop, functions) and return inline code for the statement or value in
//! hand.  Generation is best-effort: a block that cannot be translated is
//! recorded as a diagnostic and renders as empty text.  Only a callback
//! name collision aborts the run.

pub mod arduino;
pub mod block;
pub mod callback;
pub mod context;
pub mod emitter;
pub mod fragment;
pub mod micropython;

use core::fmt;
use core::str::FromStr;

use log::info;
use serde::{Deserialize, Serialize};

pub use arduino::ArduinoTranslator;
pub use block::{Arg, Block, BlockShape, DataType, Opcode, Program, Script, Stage};
pub use callback::{CallbackBinding, CallbackTable};
pub use context::{Diagnostic, GenContext};
pub use emitter::{Section, TargetEmitter};
pub use micropython::MicroPythonTranslator;

use crate::config::CodegenConfig;
use crate::error::{CodegenError, Result};

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Output language family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Compiled C++ sketch with `setup()` / `loop()` entry points.
    Arduino,
    /// Interpreted script that talks to the companion firmware over UART.
    MicroPython,
}

impl Target {
    pub fn name(self) -> &'static str {
        match self {
            Self::Arduino => "arduino",
            Self::MicroPython => "micropython",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s {
            "arduino" => Ok(Self::Arduino),
            "micropython" | "micropy" => Ok(Self::MicroPython),
            other => Err(format!("unknown target '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A translated argument.
///
/// `code` is the target expression.  `literal` is the raw text when the
/// argument was a literal, which lets translators bake it into protocol
/// lines instead of formatting at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub code: String,
    pub literal: Option<String>,
}

impl Value {
    pub fn literal(code: String, text: &str) -> Self {
        Self {
            code,
            literal: Some(text.to_string()),
        }
    }

    pub fn expr(code: String) -> Self {
        Self { code, literal: None }
    }

    /// Stand-in for a missing or failed argument.
    pub fn empty() -> Self {
        Self {
            code: String::new(),
            literal: Some(String::new()),
        }
    }

    /// No usable content (empty literal or empty expression).
    pub fn is_blank(&self) -> bool {
        match &self.literal {
            Some(l) => l.trim().is_empty(),
            None => self.code.trim().is_empty(),
        }
    }

    /// Literal text if known, otherwise the expression text.
    pub fn text(&self) -> &str {
        self.literal.as_deref().unwrap_or(&self.code)
    }
}

// ---------------------------------------------------------------------------
// Translator
// ---------------------------------------------------------------------------

/// One target's translation rules.
pub trait Translator {
    const TARGET: Target;

    /// Quote `text` as a string literal.
    fn string_literal(&self, text: &str) -> String;

    /// Translate a command or hat.  `rest` is the chain below a hat and is
    /// empty for commands.  Returns inline statement code (empty for hats).
    fn command(
        &self,
        ctx: &mut GenContext<'_>,
        block: &Block,
        rest: &[Block],
    ) -> core::result::Result<String, CodegenError>;

    /// Translate a reporter into an expression.
    fn reporter(
        &self,
        ctx: &mut GenContext<'_>,
        block: &Block,
    ) -> core::result::Result<String, CodegenError>;

    /// Evaluate argument `name`; `None` if the block does not carry it.
    fn value(
        &self,
        ctx: &mut GenContext<'_>,
        block: &Block,
        name: &str,
    ) -> core::result::Result<Option<Value>, CodegenError> {
        let value = match block.arg(name) {
            None => return Ok(None),
            Some(Arg::Text(t)) => Value::literal(self.string_literal(t), t),
            Some(Arg::Number(n)) => {
                let text = fragment::number(*n);
                Value::literal(text.clone(), &text)
            }
            Some(Arg::Block(inner)) => {
                let result = match inner.opcode.shape() {
                    BlockShape::Reporter => self.reporter(ctx, inner),
                    _ => Err(CodegenError::ShapeMismatch {
                        opcode: inner.opcode.name().to_string(),
                        expected: "value",
                    }),
                };
                Value::expr(ctx.absorb(inner.opcode.name(), result)?)
            }
        };
        Ok(Some(value))
    }

    /// Like `value`, but a missing argument is recorded and yields an
    /// empty value.
    fn required(
        &self,
        ctx: &mut GenContext<'_>,
        block: &Block,
        name: &str,
    ) -> core::result::Result<Value, CodegenError> {
        match self.value(ctx, block, name)? {
            Some(v) => Ok(v),
            None => {
                ctx.report(
                    block.opcode.name(),
                    CodegenError::MissingArgument {
                        opcode: block.opcode.name().to_string(),
                        argument: name.to_string(),
                    },
                );
                Ok(Value::empty())
            }
        }
    }

    fn optional(
        &self,
        ctx: &mut GenContext<'_>,
        block: &Block,
        name: &str,
    ) -> core::result::Result<Value, CodegenError> {
        Ok(self.value(ctx, block, name)?.unwrap_or_else(Value::empty))
    }

    /// TOPIC of a hat as raw text.  The callback name is derived from it
    /// while generating, so it must be a literal that is not blank.
    fn hat_topic(&self, block: &Block) -> core::result::Result<String, CodegenError> {
        let text = match block.arg("TOPIC") {
            Some(Arg::Text(t)) => t.clone(),
            Some(Arg::Number(n)) => fragment::number(*n),
            Some(Arg::Block(_)) => {
                return Err(CodegenError::ShapeMismatch {
                    opcode: block.opcode.name().to_string(),
                    expected: "literal topic",
                });
            }
            None => String::new(),
        };
        if callback::topic_key(&text).trim().is_empty() {
            return Err(CodegenError::MissingArgument {
                opcode: block.opcode.name().to_string(),
                argument: "TOPIC".to_string(),
            });
        }
        Ok(text)
    }

    /// Translate a chain of blocks into statements.  A hat consumes the
    /// remainder of the chain as its body.
    fn chain(
        &self,
        ctx: &mut GenContext<'_>,
        blocks: &[Block],
    ) -> core::result::Result<Vec<String>, CodegenError> {
        let mut out = Vec::new();
        for (i, block) in blocks.iter().enumerate() {
            let name = block.opcode.name();
            match block.opcode.shape() {
                BlockShape::Hat => {
                    let result = self.command(ctx, block, &blocks[i + 1..]);
                    ctx.absorb(name, result)?;
                    break;
                }
                BlockShape::Command => {
                    let result = self.command(ctx, block, &[]);
                    out.push(ctx.absorb(name, result)?);
                }
                BlockShape::Reporter => ctx.report(
                    name,
                    CodegenError::ShapeMismatch {
                        opcode: name.to_string(),
                        expected: "statement",
                    },
                ),
            }
        }
        Ok(out)
    }

    /// Fill a passthrough block's `[NAME]` placeholders with its arguments.
    fn template(
        &self,
        ctx: &mut GenContext<'_>,
        block: &Block,
    ) -> core::result::Result<String, CodegenError> {
        let Some(text) = block.text.as_deref() else {
            return Err(CodegenError::MissingArgument {
                opcode: block.opcode.name().to_string(),
                argument: "text".to_string(),
            });
        };

        let mut fatal = None;
        let code = fragment::fill_template(text, |name| {
            match self.required(ctx, block, name) {
                Ok(v) => v.code,
                Err(e) => {
                    if fatal.is_none() {
                        fatal = Some(e);
                    }
                    String::new()
                }
            }
        });
        match fatal {
            Some(e) => Err(e),
            None => Ok(code),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Output of one generation run.
#[derive(Debug, Clone)]
pub struct GeneratedProgram {
    pub target: Target,
    pub source: String,
    pub callbacks: Vec<CallbackBinding>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Translate `program` for `target`.
pub fn generate(program: &Program, target: Target, config: &CodegenConfig) -> Result<GeneratedProgram> {
    match target {
        Target::Arduino => run(&ArduinoTranslator, program, config),
        Target::MicroPython => run(&MicroPythonTranslator, program, config),
    }
}

fn run<T: Translator>(translator: &T, program: &Program, config: &CodegenConfig) -> Result<GeneratedProgram> {
    let mut ctx = GenContext::new(T::TARGET, config);

    for script in &program.scripts {
        let statements = translator.chain(&mut ctx, &script.blocks)?;
        for s in &statements {
            ctx.emitter.push_statement(script.stage, s);
        }
    }

    let (emitter, callbacks, diagnostics) = ctx.into_parts();
    let source = emitter.render();
    info!(
        "codegen: {} program, {} bytes, {} callbacks, {} diagnostics",
        T::TARGET,
        source.len(),
        callbacks.len(),
        diagnostics.len()
    );

    Ok(GeneratedProgram {
        target: T::TARGET,
        source,
        callbacks: callbacks.into_bindings(),
        diagnostics,
    })
}
