//! Streaming line decoder.
//!
//! Serial reads arrive in arbitrary chunks: part of a line, exactly one
//! line, or several lines back to back.  The decoder accumulates bytes in
//! a fixed-capacity buffer until `\n` and hands each complete line to the
//! caller without its terminator.
//!
//! Lines that overflow the buffer or are not UTF-8 are dropped whole; the
//! transport has no retransmission so there is nothing to recover.

use heapless::Vec;
use log::warn;

use crate::error::ProtocolError;

/// Longest accepted line, excluding the terminator.
pub const MAX_LINE_LEN: usize = 256;

/// Streaming `\n`-terminated line decoder.
pub struct LineDecoder {
    buf: Vec<u8, MAX_LINE_LEN>,
    /// Set while discarding the remainder of an over-long line.
    overflowed: bool,
    dropped: u32,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            overflowed: false,
            dropped: 0,
        }
    }

    /// Feed bytes into the decoder.
    ///
    /// Calls `on_line` once per complete line, in arrival order.  Returns
    /// the number of lines delivered.  `\r` bytes are ignored.
    pub fn feed(&mut self, data: &[u8], mut on_line: impl FnMut(&str)) -> usize {
        let mut delivered = 0;

        for &byte in data {
            match byte {
                b'\n' => {
                    match self.take_line() {
                        Ok(line) => {
                            on_line(&line);
                            delivered += 1;
                        }
                        Err(e) => {
                            self.dropped += 1;
                            warn!("line decoder: dropped line ({})", e);
                        }
                    }
                }
                b'\r' => {}
                _ if self.overflowed => {}
                _ => {
                    if self.buf.push(byte).is_err() {
                        self.overflowed = true;
                        self.buf.clear();
                    }
                }
            }
        }

        delivered
    }

    /// Reset decoder state (e.g. after the serial port is reopened).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }

    /// Bytes buffered for the line in progress.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Lines discarded since construction.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    fn take_line(&mut self) -> Result<String, ProtocolError> {
        let overflowed = core::mem::replace(&mut self.overflowed, false);
        let result = if overflowed {
            Err(ProtocolError::LineTooLong)
        } else {
            core::str::from_utf8(&self.buf)
                .map(str::to_string)
                .map_err(|_| ProtocolError::InvalidUtf8)
        };
        self.buf.clear();
        result
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}
