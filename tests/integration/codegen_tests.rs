//! End-to-end generation for both targets.

use std::cell::RefCell;
use std::rc::Rc;

use iotblocks::Error;
use iotblocks::codegen::{Block, Opcode, Program, Script, Stage, Target, generate};
use iotblocks::config::CodegenConfig;
use iotblocks::error::CodegenError;
use iotblocks::protocol::{LineDecoder, TopicDispatcher};

fn sensor_program(body_template: &str) -> Program {
    Program {
        scripts: vec![
            Script::new(
                Stage::Setup,
                vec![
                    Block::new(Opcode::MqttConnect)
                        .with_arg("SERVER", "10.0.0.2")
                        .with_arg("CLIENTID", "robot01"),
                    Block::new(Opcode::MqttSubscribe).with_arg("TOPIC", "/sensor"),
                ],
            ),
            Script::new(
                Stage::Setup,
                vec![
                    Block::new(Opcode::MqttGot).with_arg("TOPIC", "/sensor"),
                    Block::new(Opcode::Code).with_text(body_template).with_arg(
                        "V",
                        Block::new(Opcode::MqttData).with_arg("DATATYPE", "Number"),
                    ),
                ],
            ),
            Script::new(
                Stage::Loop,
                vec![
                    Block::new(Opcode::MqttPublish)
                        .with_arg("TOPIC", "/hello")
                        .with_arg("DATA", "helloworld"),
                ],
            ),
        ],
    }
}

#[test]
fn arduino_sensor_program() {
    let out = generate(
        &sensor_program("Serial.println([V])"),
        Target::Arduino,
        &CodegenConfig::default(),
    )
    .unwrap();

    assert!(out.diagnostics.is_empty());
    assert_eq!(
        out.source,
        r#"#include "KBIot.h"

KBIot iot(&Serial);

void setup(){
    Serial.begin(115200);
    iot.init();
    iot.regGot("/sensor", &GOT_sensor);
    iot.mqttConect("10.0.0.2", "robot01");
    iot.subscribe("/sensor");
}

void loop(){
    iot.loop();
    iot.publish("/hello", "helloworld");
}

void GOT_sensor(String topicData){
    Serial.println(topicData.toInt());
}
"#
    );
    assert_eq!(out.callbacks.len(), 1);
    assert_eq!(out.callbacks[0].topic, "/sensor");
    assert_eq!(out.callbacks[0].name, "GOT_sensor");
}

#[test]
fn micropython_sensor_program() {
    let mut program = sensor_program("print([V])");
    program.scripts[2].blocks.push(Block::new(Opcode::IotWork));
    let out = generate(&program, Target::MicroPython, &CodegenConfig::default()).unwrap();
    let src = &out.source;

    assert!(out.diagnostics.is_empty());
    assert!(src.starts_with("from machine import UART\nfrom utime import sleep_ms\n\n"));
    assert!(src.contains("uart = UART(1, 115200)\nGOT_HANDLERS = {}\nlinebuf = ''\n"));
    assert!(src.contains("def GOT_sensor(topicData):\n    print(topicData)\n"));
    assert!(src.contains("GOT_HANDLERS[\"/sensor\"] = GOT_sensor\n"));
    assert!(src.contains("uart.write(\"WF 15 2 15 10.0.0.2 robot01\\n\")\n"));
    assert!(src.ends_with(
        "while True:\n    uart.write(\"WF 11 4 11 0 0 /hello helloworld\\n\")\n    iotSerialWork()\n"
    ));

    // Routines are defined before the top-level code that references them.
    let def_cb = src.find("def GOT_sensor").unwrap();
    let def_work = src.find("def iotSerialWork").unwrap();
    let wake = src.find("# iot init process").unwrap();
    let register = src.find("GOT_HANDLERS[\"/sensor\"]").unwrap();
    let subscribe = src.find("WF 12 2 0 /sensor 0").unwrap();
    assert!(def_cb < wake && def_work < wake);
    assert!(wake < register && register < subscribe);
}

#[test]
fn generation_is_deterministic() {
    let program = sensor_program("print([V])");
    let config = CodegenConfig::default();
    for target in [Target::Arduino, Target::MicroPython] {
        let a = generate(&program, target, &config).unwrap();
        let b = generate(&program, target, &config).unwrap();
        assert_eq!(a.source, b.source);
    }
}

#[test]
fn repeated_blocks_share_boilerplate() {
    let publish = Block::new(Opcode::MqttPublish)
        .with_arg("TOPIC", "/t")
        .with_arg("DATA", "x");
    let program = Program {
        scripts: vec![Script::new(Stage::Loop, vec![publish.clone(), publish])],
    };

    let out = generate(&program, Target::Arduino, &CodegenConfig::default()).unwrap();
    assert_eq!(out.source.matches("#include \"KBIot.h\"").count(), 1);
    assert_eq!(out.source.matches("iot.init();").count(), 1);
    assert_eq!(out.source.matches("iot.publish(\"/t\", \"x\");").count(), 2);

    let out = generate(&program, Target::MicroPython, &CodegenConfig::default()).unwrap();
    assert_eq!(out.source.matches("# iot init process").count(), 1);
}

#[test]
fn colliding_callbacks_abort_generation() {
    let program = Program {
        scripts: vec![
            Script::new(Stage::Setup, vec![Block::new(Opcode::MqttGot).with_arg("TOPIC", "/a/b")]),
            Script::new(Stage::Setup, vec![Block::new(Opcode::MqttGot).with_arg("TOPIC", "/a_b")]),
        ],
    };

    let err = generate(&program, Target::Arduino, &CodegenConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Codegen(CodegenError::CallbackCollision { ref name, .. }) if name == "GOT_a_b"
    ));
}

#[test]
fn second_hat_on_same_topic_replaces_body() {
    let hat = |body: &str| {
        Script::new(
            Stage::Setup,
            vec![
                Block::new(Opcode::MqttGot).with_arg("TOPIC", "/s"),
                Block::new(Opcode::Code).with_text(body),
            ],
        )
    };
    let program = Program {
        scripts: vec![hat("first()"), hat("second()")],
    };

    let out = generate(&program, Target::Arduino, &CodegenConfig::default()).unwrap();
    assert_eq!(out.source.matches("void GOT_s(").count(), 1);
    assert!(out.source.contains("second();"));
    assert!(!out.source.contains("first();"));
}

#[test]
fn unsupported_block_is_best_effort() {
    let program = Program {
        scripts: vec![Script::new(
            Stage::Loop,
            vec![
                Block::new(Opcode::IotWork),
                Block::new(Opcode::MqttSubscribe).with_arg("TOPIC", "/t"),
                Block::new(Opcode::MqttPublish).with_arg("TOPIC", "/t"),
            ],
        )],
    };

    let out = generate(&program, Target::Arduino, &CodegenConfig::default()).unwrap();
    assert_eq!(out.diagnostics.len(), 2);
    assert!(matches!(
        out.diagnostics[0].error,
        CodegenError::UnsupportedOnTarget { target: "arduino", .. }
    ));
    assert!(matches!(
        &out.diagnostics[1].error,
        CodegenError::MissingArgument { argument, .. } if argument == "DATA"
    ));
    assert!(out.source.contains("iot.subscribe(\"/t\");"));
}

#[test]
fn hat_without_topic_renders_empty_on_both_targets() {
    let program = Program {
        scripts: vec![
            Script::new(
                Stage::Setup,
                vec![Block::new(Opcode::MqttSubscribe).with_arg("TOPIC", "/t")],
            ),
            Script::new(
                Stage::Setup,
                vec![
                    Block::new(Opcode::MqttGot),
                    Block::new(Opcode::Code).with_text("first()"),
                ],
            ),
        ],
    };

    for target in [Target::Arduino, Target::MicroPython] {
        let out = generate(&program, target, &CodegenConfig::default()).unwrap();
        assert_eq!(out.diagnostics.len(), 1, "{target}");
        assert!(matches!(
            &out.diagnostics[0].error,
            CodegenError::MissingArgument { argument, .. } if argument == "TOPIC"
        ));
        assert!(out.callbacks.is_empty());
        assert!(!out.source.contains("regGot"));
        assert!(!out.source.contains("GOT_HANDLERS["));
        assert!(!out.source.contains("first()"));
    }
}

#[test]
fn program_json_round_trip_through_generate() {
    let json = r#"{ "scripts": [
        { "stage": "loop", "blocks": [
            { "opcode": "mqttPub", "args": { "TOPIC": "/t", "DATA": 12 } } ] } ] }"#;
    let program = Program::from_json(json).unwrap();
    let out = generate(&program, Target::MicroPython, &CodegenConfig::default()).unwrap();
    assert!(out.source.contains("    uart.write(\"WF 11 4 11 0 0 /t 12\\n\")\n"));
}

/// The device-side lookup matches generated callback topics exactly.
#[test]
fn generated_callbacks_dispatch_by_exact_topic() {
    let out = generate(
        &sensor_program("print([V])"),
        Target::MicroPython,
        &CodegenConfig::default(),
    )
    .unwrap();

    let fired = Rc::new(RefCell::new(Vec::new()));
    let mut dispatcher: TopicDispatcher<Box<dyn FnMut(&str)>> = TopicDispatcher::new();
    for binding in &out.callbacks {
        let fired = Rc::clone(&fired);
        let name = binding.name.clone();
        dispatcher.register(
            binding.topic.clone(),
            Box::new(move |payload: &str| fired.borrow_mut().push(format!("{name}({payload})"))),
        );
    }

    let mut decoder = LineDecoder::new();
    let n = dispatcher.dispatch_bytes(
        &mut decoder,
        b"WF 3 2 5 /sensor 42 \r\nWF 3 2 5 /sensor/x 1\nWF 3 2 5 _sensor 2\n",
    );
    assert_eq!(n, 1);
    assert_eq!(*fired.borrow(), vec!["GOT_sensor(42)"]);
}
