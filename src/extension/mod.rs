//! Host extension contract.
//!
//! The host talks to the extension through two narrow surfaces: the
//! descriptor it renders into the block palette, and the runtime
//! functions it calls when a block runs interactively.  Argument values
//! are read through `BlockArgs`.

pub mod descriptor;
pub mod runtime;

use std::collections::BTreeMap;

use crate::codegen::{Arg, Block, fragment};

pub use descriptor::{ExtensionDescriptor, descriptor};
pub use runtime::IotRuntime;

/// Current argument values of one block instance.
pub trait BlockArgs {
    /// Argument `name` as text, if present.
    fn text(&self, name: &str) -> Option<String>;
}

impl BlockArgs for BTreeMap<String, String> {
    fn text(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Literal arguments only; nested reporters have no value outside a run.
impl BlockArgs for Block {
    fn text(&self, name: &str) -> Option<String> {
        match self.arg(name)? {
            Arg::Text(t) => Some(t.clone()),
            Arg::Number(n) => Some(fragment::number(*n)),
            Arg::Block(_) => None,
        }
    }
}
