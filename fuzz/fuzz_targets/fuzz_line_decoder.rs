//! Fuzz target: `LineDecoder::feed`
//!
//! Drives arbitrary byte sequences through the serial line decoder and
//! the topic dispatcher and asserts that neither panics, that delivered
//! lines never carry a terminator, and that a reset leaves no residue.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use iotblocks::protocol::line::MAX_LINE_LEN;
use iotblocks::protocol::{LineDecoder, TopicDispatcher};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = LineDecoder::new();
    decoder.feed(data, |line| {
        assert!(!line.contains('\n'), "line carries its terminator");
        assert!(line.len() <= MAX_LINE_LEN, "line exceeds buffer");
    });

    decoder.reset();
    assert_eq!(decoder.pending(), 0);

    let mut dispatcher: TopicDispatcher<fn(&str)> = TopicDispatcher::new();
    dispatcher.register("/fuzz", |_| {});
    let _ = dispatcher.dispatch_bytes(&mut decoder, data);
});
