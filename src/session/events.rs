//! Link-event queue between network clients and the session manager.
//!
//! Clients may run on another thread, so they never touch the manager
//! directly: they post generation-tagged events into the queue and the
//! manager drains it, either synchronously
//! (`SessionManager::process_pending`) or from an async pump.
//!
//! ```text
//!  ┌────────────┐ TaggedEvent ┌──────────────────┐
//!  │ MqttClient │────────────▶│  LinkEventQueue  │──▶ pump_events ──▶ SessionManager
//!  │ (gen = n)  │             │  (FIFO + wakeup) │
//!  └────────────┘             └──────────────────┘
//! ```
//!
//! Control events (`Connected`, `Reconnect`, `Error`, `Closed`) are always
//! accepted.  Only `Message` events count against `EVENT_QUEUE_DEPTH`, so a
//! burst of inbound traffic can never push out a handshake acknowledgement.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::warn;

use super::manager::SessionManager;
use super::ports::{HatTrigger, MqttConnector};
use super::state::LinkEvent;

/// Pending `Message` events held before new ones are dropped.
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// A link event stamped with the generation of the client that sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedEvent {
    pub generation: u32,
    pub event: LinkEvent,
}

#[derive(Default)]
struct Pending {
    events: VecDeque<TaggedEvent>,
    messages: usize,
}

/// FIFO of tagged link events shared by every client and the manager.
pub struct LinkEventQueue {
    pending: Mutex<CriticalSectionRawMutex, RefCell<Pending>>,
    ready: Signal<CriticalSectionRawMutex, ()>,
}

impl Default for LinkEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkEventQueue {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(RefCell::new(Pending::default())),
            ready: Signal::new(),
        }
    }

    /// Enqueue `event`.  Returns `false` only for a `Message` arriving
    /// while `EVENT_QUEUE_DEPTH` messages are already pending.
    pub fn try_send(&self, event: TaggedEvent) -> bool {
        let accepted = self.pending.lock(|cell| {
            let mut p = cell.borrow_mut();
            if matches!(event.event, LinkEvent::Message { .. }) {
                if p.messages >= EVENT_QUEUE_DEPTH {
                    return false;
                }
                p.messages += 1;
            }
            p.events.push_back(event);
            true
        });
        if accepted {
            self.ready.signal(());
        }
        accepted
    }

    /// Oldest pending event, if any.
    pub fn try_receive(&self) -> Option<TaggedEvent> {
        self.pending.lock(|cell| {
            let mut p = cell.borrow_mut();
            let event = p.events.pop_front()?;
            if matches!(event.event, LinkEvent::Message { .. }) {
                p.messages -= 1;
            }
            Some(event)
        })
    }

    /// Wait for the next event.  Meant for a single consumer.
    pub async fn receive(&self) -> TaggedEvent {
        loop {
            if let Some(event) = self.try_receive() {
                return event;
            }
            self.ready.wait().await;
        }
    }

    pub fn len(&self) -> usize {
        self.pending.lock(|cell| cell.borrow().events.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle given to one client for posting its events.
#[derive(Clone)]
pub struct EventSender {
    queue: Arc<LinkEventQueue>,
    generation: u32,
}

impl EventSender {
    pub fn new(queue: Arc<LinkEventQueue>, generation: u32) -> Self {
        Self { queue, generation }
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Queue `event`.  Returns `false` if it was a message dropped because
    /// too many messages are already pending.
    pub fn post(&self, event: LinkEvent) -> bool {
        let tagged = TaggedEvent {
            generation: self.generation,
            event,
        };
        let accepted = self.queue.try_send(tagged);
        if !accepted {
            warn!("session: message backlog full, dropping message (generation {})", self.generation);
        }
        accepted
    }
}

/// Feed every queued event to `manager`, forever.
///
/// The manager is borrowed only while an event is handled, never across
/// an await point.
pub async fn pump_events<C, T>(manager: Rc<RefCell<SessionManager<C, T>>>, queue: Arc<LinkEventQueue>)
where
    C: MqttConnector,
    T: HatTrigger,
{
    loop {
        let event = queue.receive().await;
        manager.borrow_mut().handle(event);
    }
}
