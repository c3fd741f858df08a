//! Mock session adapters for integration tests.
//!
//! Records every client open and call, plus hat triggers, in one ordered
//! log so tests can assert on the full history, and keeps each client's `EventSender` so tests can play
//! the network side.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use iotblocks::config::SessionConfig;
use iotblocks::session::{
    ClientOptions, EventSender, HatTrigger, LinkEventQueue, MqttClient, MqttConnector,
    SessionManager,
};

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ClientCall {
    Open { generation: u32, url: String },
    Publish { generation: u32, topic: String, payload: String },
    Subscribe { generation: u32, topic: String },
    End { generation: u32 },
}

#[derive(Default)]
pub struct Record {
    pub opened: Vec<(String, ClientOptions)>,
    pub senders: Vec<EventSender>,
    pub calls: Vec<ClientCall>,
    pub hats: Vec<(String, String)>,
}

pub type SharedRecord = Rc<RefCell<Record>>;

#[allow(dead_code)]
impl Record {
    /// Event sender of the `index`th opened client.
    pub fn sender(&self, index: usize) -> EventSender {
        self.senders[index].clone()
    }

    pub fn ended(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ClientCall::End { .. }))
            .count()
    }

    /// Clients opened and not yet ended.
    pub fn live_clients(&self) -> usize {
        self.opened.len() - self.ended()
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ClientCall::Publish { topic, payload, .. } => Some((topic.clone(), payload.clone())),
                _ => None,
            })
            .collect()
    }
}

// ── Mock adapters ─────────────────────────────────────────────

pub struct MockClient {
    generation: u32,
    record: SharedRecord,
}

impl MqttClient for MockClient {
    fn publish(&mut self, topic: &str, payload: &str) {
        self.record.borrow_mut().calls.push(ClientCall::Publish {
            generation: self.generation,
            topic: topic.to_string(),
            payload: payload.to_string(),
        });
    }

    fn subscribe(&mut self, topic: &str) {
        self.record.borrow_mut().calls.push(ClientCall::Subscribe {
            generation: self.generation,
            topic: topic.to_string(),
        });
    }

    fn end(&mut self) {
        self.record.borrow_mut().calls.push(ClientCall::End {
            generation: self.generation,
        });
    }
}

pub struct MockConnector {
    record: SharedRecord,
}

impl MqttConnector for MockConnector {
    type Client = MockClient;

    fn open(&mut self, url: &str, options: &ClientOptions, events: EventSender) -> MockClient {
        let generation = events.generation();
        let mut r = self.record.borrow_mut();
        r.calls.push(ClientCall::Open {
            generation,
            url: url.to_string(),
        });
        r.opened.push((url.to_string(), options.clone()));
        r.senders.push(events);
        MockClient {
            generation,
            record: Rc::clone(&self.record),
        }
    }
}

pub struct MockTrigger {
    record: SharedRecord,
}

impl HatTrigger for MockTrigger {
    fn start_hats(&mut self, opcode: &str, topic: &str) {
        self.record
            .borrow_mut()
            .hats
            .push((opcode.to_string(), topic.to_string()));
    }
}

pub type MockSession = SessionManager<MockConnector, MockTrigger>;

/// A session manager wired to fresh mocks.
pub fn new_session(config: SessionConfig) -> (Rc<RefCell<MockSession>>, SharedRecord, Arc<LinkEventQueue>) {
    let record = SharedRecord::default();
    let queue = Arc::new(LinkEventQueue::new());
    let session = SessionManager::new(
        MockConnector {
            record: Rc::clone(&record),
        },
        MockTrigger {
            record: Rc::clone(&record),
        },
        config,
        Arc::clone(&queue),
    );
    (Rc::new(RefCell::new(session)), record, queue)
}
