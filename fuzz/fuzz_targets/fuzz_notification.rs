//! Fuzz target: `Notification::parse`
//!
//! Arbitrary UTF-8 lines must either parse into a notification whose
//! topic and payload are single tokens, or be rejected without panicking.
//!
//! cargo fuzz run fuzz_notification

#![no_main]

use iotblocks::protocol::{Frame, Notification};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };

    let _ = Frame::parse(line);
    if let Ok(n) = Notification::parse(line) {
        assert!(!n.topic.contains(' '), "topic spans tokens");
        assert_eq!(n.payload, n.payload.trim(), "payload not trimmed");
    }
});
