//! Per-run generation state shared by every translator call.

use log::warn;

use super::Target;
use super::callback::CallbackTable;
use super::emitter::TargetEmitter;
use crate::config::CodegenConfig;
use crate::error::CodegenError;

/// A non-fatal problem recorded against one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub opcode: &'static str,
    pub error: CodegenError,
}

/// Emitter, callback table and diagnostics for one generation pass.
pub struct GenContext<'c> {
    pub emitter: TargetEmitter,
    pub callbacks: CallbackTable,
    pub config: &'c CodegenConfig,
    diagnostics: Vec<Diagnostic>,
}

impl<'c> GenContext<'c> {
    pub fn new(target: Target, config: &'c CodegenConfig) -> Self {
        Self {
            emitter: TargetEmitter::new(target),
            callbacks: CallbackTable::new(),
            config,
            diagnostics: Vec::new(),
        }
    }

    pub fn target(&self) -> Target {
        self.emitter.target()
    }

    /// Record a non-fatal problem with `opcode`.
    pub fn report(&mut self, opcode: &'static str, error: CodegenError) {
        warn!("codegen: {}", error);
        self.diagnostics.push(Diagnostic { opcode, error });
    }

    /// Pass fatal errors through; record anything else and substitute
    /// empty text so generation continues.
    pub fn absorb(
        &mut self,
        opcode: &'static str,
        result: Result<String, CodegenError>,
    ) -> Result<String, CodegenError> {
        match result {
            Ok(code) => Ok(code),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                self.report(opcode, e);
                Ok(String::new())
            }
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (TargetEmitter, CallbackTable, Vec<Diagnostic>) {
        (self.emitter, self.callbacks, self.diagnostics)
    }
}
