//! Interactive-mode block functions.
//!
//! Each extension block's `func` maps to one method here.  Arguments come
//! from the host through `BlockArgs`; missing ones fall back to the
//! descriptor defaults.

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use super::BlockArgs;
use crate::codegen::callback::topic_key;
use crate::config::ExtensionConfig;
use crate::session::{ConnectOutcome, HatTrigger, MqttConnector, SessionManager};

pub struct IotRuntime<C: MqttConnector, T: HatTrigger> {
    session: Rc<RefCell<SessionManager<C, T>>>,
    defaults: ExtensionConfig,
}

impl<C: MqttConnector, T: HatTrigger> IotRuntime<C, T> {
    pub fn new(session: Rc<RefCell<SessionManager<C, T>>>, defaults: ExtensionConfig) -> Self {
        Self { session, defaults }
    }

    pub fn session(&self) -> &Rc<RefCell<SessionManager<C, T>>> {
        &self.session
    }

    /// `mqttConnect`: anonymous connect to a local broker.
    pub fn mqtt_connect(&self, args: &dyn BlockArgs) -> ConnectOutcome {
        let server = args.text("SERVER").unwrap_or_else(|| self.defaults.default_server.clone());
        let client_id = self.client_id(args);
        self.session.borrow_mut().connect(&server, &client_id, None, None)
    }

    /// `mqttConnectCloud`: connect with optional credentials.
    pub fn mqtt_connect_cloud(&self, args: &dyn BlockArgs) -> ConnectOutcome {
        let server = args.text("SERVER").unwrap_or_else(|| self.defaults.cloud_server.clone());
        let client_id = self.client_id(args);
        let user = args.text("USER");
        let pass = args.text("PASS");
        self.session
            .borrow_mut()
            .connect(&server, &client_id, user.as_deref(), pass.as_deref())
    }

    pub fn mqtt_pub(&self, args: &dyn BlockArgs) {
        let Some(topic) = args.text("TOPIC") else {
            warn!("iot: mqttPub without TOPIC");
            return;
        };
        let data = args.text("DATA").unwrap_or_default();
        self.session.borrow_mut().publish(&topic, &data);
    }

    pub fn mqtt_sub(&self, args: &dyn BlockArgs) {
        match args.text("TOPIC") {
            Some(topic) => self.session.borrow_mut().subscribe(&topic),
            None => warn!("iot: mqttSub without TOPIC"),
        }
    }

    /// Hat predicate: does this hat's TOPIC match the received `topic`?
    pub fn mqtt_got(&self, args: &dyn BlockArgs, topic: &str) -> bool {
        args.text("TOPIC").is_some_and(|t| topic_key(&t) == topic)
    }

    /// Most recent inbound payload.
    pub fn mqtt_data(&self) -> Option<String> {
        self.session.borrow().message().map(str::to_string)
    }

    /// `connectAP` and `iotwork` only matter on a board.
    pub fn noop(&self, _args: &dyn BlockArgs) {}

    fn client_id(&self, args: &dyn BlockArgs) -> String {
        args.text("CLIENTID")
            .unwrap_or_else(|| self.defaults.default_client_id.clone())
    }
}
