//! Fuzz target: `encode_line` / `send_line`
//!
//! Encodes arbitrary readings under arbitrary tags and pushes them through
//! a serial port that accepts bytes on an arbitrary schedule.  Asserts the
//! line always fits the wire buffer, parses back to the reading, and that
//! a timed-out transmit never reports more bytes than were written.
//!
//! cargo fuzz run fuzz_line_encoder

#![no_main]

use coguard::app::ports::SerialPort;
use coguard::error::CommsError;
use coguard::transmit::{LineTag, MAX_LINE_LEN, encode_line, send_line};
use libfuzzer_sys::fuzz_target;

/// Accepts a byte only when the next schedule bit is set.
struct ScheduledPort<'a> {
    schedule: &'a [u8],
    pos: usize,
    written: Vec<u8>,
}

impl SerialPort for ScheduledPort<'_> {
    fn try_write(&mut self, byte: u8) -> bool {
        let Some(&bits) = self.schedule.get(self.pos / 8) else {
            return false;
        };
        let ready = bits & (1 << (self.pos % 8)) != 0;
        self.pos += 1;
        if ready {
            self.written.push(byte);
        }
        ready
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let value = u16::from_le_bytes([data[0], data[1]]);
    let tag = LineTag::new(data[2] as char);
    let spin_limit = u32::from(data[3] % 8) + 1;

    let line = encode_line(tag, value);
    assert!(line.len() <= MAX_LINE_LEN);
    assert!(line.ends_with('\n'));

    let body = line.trim_end_matches('\n');
    let digits = match tag {
        Some(t) => body.strip_prefix(t.as_char()).expect("tag leads the line"),
        None => body,
    };
    assert_eq!(digits.parse::<u16>().ok(), Some(value));

    let mut port = ScheduledPort {
        schedule: &data[4..],
        pos: 0,
        written: Vec::new(),
    };
    match send_line(&mut port, line.as_bytes(), spin_limit) {
        Ok(()) => assert_eq!(port.written, line.as_bytes()),
        Err(CommsError::TransmitTimeout { sent }) => {
            assert_eq!(port.written.len(), sent);
            assert!(sent < line.len());
            assert_eq!(port.written, line.as_bytes()[..sent]);
        }
    }
});
