//! Topic → handler dispatch for inbound notifications.
//!
//! The handler table is built ahead of time from the topics a program
//! subscribes to and looked up by exact string match when a notification
//! arrives.  Unknown topics and malformed lines are inert: nothing fires
//! and nothing is reported beyond a debug log.

use std::collections::BTreeMap;

use log::debug;

use super::codec::Notification;
use super::line::LineDecoder;

/// Static mapping from topic string to handler.
pub struct TopicDispatcher<H> {
    handlers: BTreeMap<String, H>,
}

impl<H: FnMut(&str)> TopicDispatcher<H> {
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Bind `handler` to `topic`, returning any handler it replaces.
    pub fn register(&mut self, topic: impl Into<String>, handler: H) -> Option<H> {
        self.handlers.insert(topic.into(), handler)
    }

    pub fn is_registered(&self, topic: &str) -> bool {
        self.handlers.contains_key(topic)
    }

    /// Registered topics in sorted order.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Run the handler for `notification.topic` with its payload.
    /// Returns `true` if a handler fired.
    pub fn dispatch(&mut self, notification: &Notification) -> bool {
        match self.handlers.get_mut(&notification.topic) {
            Some(handler) => {
                handler(&notification.payload);
                true
            }
            None => {
                debug!("dispatch: no handler for topic '{}'", notification.topic);
                false
            }
        }
    }

    /// Parse one protocol line and dispatch it if it is a notification.
    pub fn dispatch_line(&mut self, line: &str) -> bool {
        match Notification::parse(line) {
            Ok(n) => self.dispatch(&n),
            Err(e) => {
                debug!("dispatch: ignoring line ({})", e);
                false
            }
        }
    }

    /// Push raw serial bytes through `decoder` and dispatch every complete
    /// line.  Returns the number of handlers that fired.
    pub fn dispatch_bytes(&mut self, decoder: &mut LineDecoder, data: &[u8]) -> usize {
        let mut fired = 0;
        decoder.feed(data, |line| {
            if self.dispatch_line(line) {
                fired += 1;
            }
        });
        fired
    }
}

impl<H: FnMut(&str)> Default for TopicDispatcher<H> {
    fn default() -> Self {
        Self::new()
    }
}
