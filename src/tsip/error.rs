use std::fmt;
use thiserror::Error;

// Packet label used in log lines and errors: "x8f-20", "xa1-11", "x41".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketTag {
    pub id: u8,
    pub sub_id: Option<u8>,
}

impl PacketTag {
    pub fn new(id: u8, sub_id: Option<u8>) -> Self {
        Self { id, sub_id }
    }
}

impl fmt::Display for PacketTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sub_id {
            Some(sub) => write!(f, "x{:02x}-{:02x}", self.id, sub),
            None => write!(f, "x{:02x}", self.id),
        }
    }
}

// Reasons a single inbound packet is dropped. None of these are fatal; the
// session keeps going with the next packet and no navigation state changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("{tag}: runt, got length {got} need {need}")]
    Runt { tag: PacketTag, got: usize, need: usize },
    #[error("{tag}: wrong length {got}, expected one of {expected:?}")]
    WrongLength {
        tag: PacketTag,
        got: usize,
        expected: &'static [usize],
    },
    #[error("{tag}: declared length {declared} does not match received {got}")]
    BadEnvelopeLength {
        tag: PacketTag,
        declared: usize,
        got: usize,
    },
    #[error("{tag}: bad checksum, residue x{residue:02x}")]
    BadChecksum { tag: PacketTag, residue: u8 },
    #[error("{tag}: mode {mode} is not a response")]
    UnexpectedMode { tag: PacketTag, mode: u8 },
    #[error("{tag}: too many satellites ({count})")]
    TooManySatellites { tag: PacketTag, count: usize },
    #[error("{tag}: satellite index {index} out of range")]
    BadSatelliteIndex { tag: PacketTag, index: usize },
    #[error("{tag}: unknown packet")]
    Unknown { tag: PacketTag },
}

impl DecodeError {
    // Unknown ids are a soft outcome: nothing was attempted, nothing was rejected.
    pub fn is_unknown(&self) -> bool {
        matches!(self, DecodeError::Unknown { .. })
    }

    pub fn tag(&self) -> PacketTag {
        match self {
            DecodeError::Runt { tag, .. }
            | DecodeError::WrongLength { tag, .. }
            | DecodeError::BadEnvelopeLength { tag, .. }
            | DecodeError::BadChecksum { tag, .. }
            | DecodeError::UnexpectedMode { tag, .. }
            | DecodeError::TooManySatellites { tag, .. }
            | DecodeError::BadSatelliteIndex { tag, .. }
            | DecodeError::Unknown { tag } => *tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("empty command body")]
    Empty,
    #[error("command body of {len} bytes exceeds the {max} byte limit")]
    Oversize { len: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("short write: {written} of {expected} bytes")]
    Short { written: usize, expected: usize },
    #[error("writing command frame failed")]
    Io(#[from] std::io::Error),
}
