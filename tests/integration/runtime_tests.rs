//! Extension runtime bound to a mock session.

use std::collections::BTreeMap;

use iotblocks::codegen::{Block, Opcode};
use iotblocks::config::{ExtensionConfig, SessionConfig};
use iotblocks::extension::IotRuntime;
use iotblocks::session::LinkEvent;

use crate::mock_session::new_session;

fn args(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn connect_uses_defaults_for_missing_args() {
    let (session, record, _queue) = new_session(SessionConfig::default());
    let runtime = IotRuntime::new(session, ExtensionConfig::default());

    runtime.mqtt_connect(&args(&[]));
    runtime.mqtt_connect_cloud(&args(&[("USER", "id"), ("PASS", "key")]));

    let r = record.borrow();
    assert_eq!(r.opened[0].0, "ws://kittenblock:9234");
    assert_eq!(r.opened[0].1.client_id, "robot01");
    assert_eq!(r.opened[1].0, "ws://kittenbot.cn:9234");
    assert_eq!(r.opened[1].1.username.as_deref(), Some("id"));
}

#[test]
fn publish_reads_block_literals() {
    let (session, record, _queue) = new_session(SessionConfig::default());
    let runtime = IotRuntime::new(session, ExtensionConfig::default());
    runtime.mqtt_connect(&args(&[("SERVER", "h")]));

    let block = Block::new(Opcode::MqttPublish)
        .with_arg("TOPIC", "/hello")
        .with_arg("DATA", 7.0);
    runtime.mqtt_pub(&block);
    runtime.mqtt_pub(&args(&[("DATA", "no topic")]));

    assert_eq!(
        record.borrow().published(),
        vec![("/hello".to_string(), "7".to_string())]
    );
}

#[test]
fn hat_predicate_and_data_reporter() {
    let (session, record, _queue) = new_session(SessionConfig::default());
    let runtime = IotRuntime::new(session, ExtensionConfig::default());
    runtime.mqtt_connect(&args(&[]));
    assert_eq!(runtime.mqtt_data(), None);

    record.borrow().sender(0).post(LinkEvent::Message {
        topic: "/sensor".into(),
        payload: "17".into(),
    });
    runtime.session().borrow_mut().process_pending();

    let hat = args(&[("TOPIC", "/sensor")]);
    assert!(runtime.mqtt_got(&hat, "/sensor"));
    assert!(!runtime.mqtt_got(&hat, "/other"));
    assert!(!runtime.mqtt_got(&args(&[]), "/sensor"));
    assert_eq!(runtime.mqtt_data().as_deref(), Some("17"));

    runtime.noop(&hat);
}
