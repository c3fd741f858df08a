//! Topic → callback routine naming.
//!
//! A hat on topic `/a/b` becomes a routine named `GOT_a_b`: quotes are
//! dropped, every `/` becomes `_`, and the result is prefixed with `GOT`.
//! Every other character passes through unchanged, including MQTT's `-`,
//! `.`, `+` and `#`: `/room-1/+` becomes `GOT_room-1_+`.  Those names are
//! not valid C++ or Python identifiers, so hat topics should stick to
//! `[A-Za-z0-9_/]`.
//! Distinct topics can collapse to the same name (`/a/b` and `/a_b`); that
//! is reported as a fatal collision instead of silently merging handlers.

use serde::Serialize;

use crate::error::CodegenError;

pub const CALLBACK_PREFIX: &str = "GOT";

/// Topic text as the device sees it: quotes removed.
pub fn topic_key(topic: &str) -> String {
    topic.chars().filter(|c| *c != '"' && *c != '\'').collect()
}

pub fn callback_name(topic: &str) -> String {
    format!("{CALLBACK_PREFIX}{}", topic_key(topic).replace('/', "_"))
}

/// One topic bound to its callback routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackBinding {
    pub topic: String,
    pub name: String,
}

/// Callback routines registered during one generation run, in order.
#[derive(Debug, Clone, Default)]
pub struct CallbackTable {
    bindings: Vec<CallbackBinding>,
}

impl CallbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hat on `topic` and return its routine name.
    ///
    /// Registering the same topic again returns the same name; the caller
    /// decides what happens to the earlier body.
    pub fn register(&mut self, topic: &str) -> Result<String, CodegenError> {
        let topic = topic_key(topic);
        let name = callback_name(&topic);

        match self.bindings.iter().find(|b| b.name == name) {
            Some(b) if b.topic == topic => Ok(name),
            Some(b) => Err(CodegenError::CallbackCollision {
                name,
                first_topic: b.topic.clone(),
                second_topic: topic,
            }),
            None => {
                self.bindings.push(CallbackBinding {
                    topic,
                    name: name.clone(),
                });
                Ok(name)
            }
        }
    }

    pub fn contains_topic(&self, topic: &str) -> bool {
        let topic = topic_key(topic);
        self.bindings.iter().any(|b| b.topic == topic)
    }

    pub fn bindings(&self) -> &[CallbackBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn into_bindings(self) -> Vec<CallbackBinding> {
        self.bindings
    }
}
