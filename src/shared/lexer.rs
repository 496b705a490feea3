use crate::tsip::codec::{DLE, ETX};
use crate::tsip::session::RawPacket;

// Longest frame kept, before de-stuffing overhead is removed.
pub const MAX_FRAME_LEN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    // Waiting for a DLE that could open a frame.
    Idle,
    // Saw DLE outside a frame; the next byte is the id.
    Start,
    InFrame,
    // Saw DLE inside a frame.
    Escape,
}

// Extract complete TSIP frames from arbitrary serial bytes.
pub struct FrameCollector {
    state: State,
    id: u8,
    buf: Vec<u8>,
    discarded: u64,
}

impl Default for FrameCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCollector {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            id: 0,
            buf: Vec::with_capacity(MAX_FRAME_LEN),
            discarded: 0,
        }
    }

    // Frames dropped for length since creation.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    pub fn push_bytes(&mut self, bytes: &[u8], out: &mut Vec<RawPacket>) {
        for &byte in bytes {
            match self.state {
                State::Idle => {
                    if byte == DLE {
                        self.state = State::Start;
                    }
                }
                State::Start => {
                    if byte == DLE || byte == ETX {
                        // tail of a frame we joined mid-way
                        self.state = State::Idle;
                    } else {
                        self.begin(byte);
                    }
                }
                State::InFrame => {
                    if byte == DLE {
                        self.state = State::Escape;
                    } else {
                        self.push(byte);
                    }
                }
                State::Escape => match byte {
                    DLE => {
                        self.state = State::InFrame;
                        self.push(DLE);
                    }
                    ETX => {
                        let payload = std::mem::take(&mut self.buf);
                        out.push(RawPacket::new(self.id, payload));
                        self.state = State::Idle;
                    }
                    // An unstuffed DLE: assume we lost sync and this opens a new frame.
                    other => self.begin(other),
                },
            }
        }
    }

    fn begin(&mut self, id: u8) {
        self.id = id;
        self.buf.clear();
        self.state = State::InFrame;
    }

    fn push(&mut self, byte: u8) {
        if self.buf.len() >= MAX_FRAME_LEN {
            self.discarded += 1;
            self.buf.clear();
            self.state = State::Idle;
            return;
        }
        self.buf.push(byte);
    }
}
