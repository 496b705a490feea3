use crate::tsip::bytes::{beu16, hexdump, put_be16};
use crate::tsip::error::{DecodeError, FrameError, PacketTag, WriteError};
use log::trace;
use std::io::{ErrorKind, Write};

pub const DLE: u8 = 0x10;
pub const ETX: u8 = 0x03;

// Largest command body (id included, before stuffing) we are willing to send.
pub const MAX_COMMAND_BODY: usize = 256;

// Envelope header after the id: sub id, two length bytes, mode.
pub const ENVELOPE_HEADER: usize = 4;

// Mode byte of an enveloped packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Query,
    Set,
    Response,
}

impl Mode {
    pub fn code(self) -> u8 {
        match self {
            Mode::Query => 0,
            Mode::Set => 1,
            Mode::Response => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Mode::Query),
            1 => Some(Mode::Set),
            2 => Some(Mode::Response),
            _ => None,
        }
    }
}

// Ids that belong to the enveloped generation.
pub fn is_enveloped_id(id: u8) -> bool {
    matches!(id, 0x90..=0x93 | 0xa0..=0xa5 | 0xd0)
}

// One outbound command, in either generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Id byte followed by the body, exactly as it goes on the wire before stuffing.
    Legacy(Vec<u8>),
    Enveloped {
        id: u8,
        sub_id: u8,
        mode: Mode,
        data: Vec<u8>,
    },
}

impl Command {
    pub fn legacy(bytes: &[u8]) -> Self {
        Command::Legacy(bytes.to_vec())
    }

    pub fn query(id: u8, sub_id: u8) -> Self {
        Command::Enveloped {
            id,
            sub_id,
            mode: Mode::Query,
            data: Vec::new(),
        }
    }

    pub fn enveloped(id: u8, sub_id: u8, mode: Mode, data: Vec<u8>) -> Self {
        Command::Enveloped {
            id,
            sub_id,
            mode,
            data,
        }
    }

    pub fn tag(&self) -> PacketTag {
        match self {
            Command::Legacy(bytes) => {
                PacketTag::new(bytes.first().copied().unwrap_or(0), bytes.get(1).copied())
            }
            Command::Enveloped { id, sub_id, .. } => PacketTag::new(*id, Some(*sub_id)),
        }
    }

    // Unstuffed body: id, payload and, for the enveloped generation, the
    // length, mode and checksum fields.
    pub fn body(&self) -> Vec<u8> {
        match self {
            Command::Legacy(bytes) => bytes.clone(),
            Command::Enveloped {
                id,
                sub_id,
                mode,
                data,
            } => {
                let mut out = Vec::with_capacity(data.len() + 6);
                out.push(*id);
                out.push(*sub_id);
                // mode + data + checksum
                put_be16(&mut out, (data.len() + 2) as u16);
                out.push(mode.code());
                out.extend_from_slice(data);
                out.push(checksum(&out));
                out
            }
        }
    }

    // Full wire frame: DLE, stuffed body, DLE ETX.
    pub fn frame(&self) -> Result<Vec<u8>, FrameError> {
        let body = self.body();
        if body.is_empty() {
            return Err(FrameError::Empty);
        }
        if body.len() > MAX_COMMAND_BODY {
            return Err(FrameError::Oversize {
                len: body.len(),
                max: MAX_COMMAND_BODY,
            });
        }
        let mut out = Vec::with_capacity(body.len() * 2 + 3);
        out.push(DLE);
        for &byte in &body {
            if byte == DLE {
                out.push(DLE);
            }
            out.push(byte);
        }
        out.push(DLE);
        out.push(ETX);
        Ok(out)
    }
}

// XOR of every byte; a valid enveloped body (checksum included) folds to zero.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

// Validated view of an inbound enveloped payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub sub_id: u8,
    // Declared length: mode, data and checksum.
    pub length: usize,
    pub mode: Mode,
    // Payload starting at the sub id, checksum included.
    pub raw: &'a [u8],
}

impl<'a> Envelope<'a> {
    // Data bytes between the mode and the trailing checksum.
    pub fn data(&self) -> &'a [u8] {
        let end = self.raw.len().saturating_sub(1);
        self.raw.get(ENVELOPE_HEADER..end).unwrap_or(&[])
    }
}

// Check an enveloped payload (starting at the sub id) before any field is read.
pub fn open_envelope(id: u8, payload: &[u8]) -> Result<Envelope<'_>, DecodeError> {
    let sub_id = payload.first().copied();
    let tag = PacketTag::new(id, sub_id);
    if payload.len() < ENVELOPE_HEADER {
        return Err(DecodeError::Runt {
            tag,
            got: payload.len(),
            need: ENVELOPE_HEADER,
        });
    }
    let length = usize::from(beu16(payload, 1));
    if length + 3 != payload.len() {
        return Err(DecodeError::BadEnvelopeLength {
            tag,
            declared: length + 3,
            got: payload.len(),
        });
    }
    let residue = id ^ checksum(payload);
    if residue != 0 {
        return Err(DecodeError::BadChecksum { tag, residue });
    }
    let mode_code = payload[3];
    match Mode::from_code(mode_code) {
        Some(Mode::Response) => Ok(Envelope {
            sub_id: payload[0],
            length,
            mode: Mode::Response,
            raw: payload,
        }),
        _ => Err(DecodeError::UnexpectedMode {
            tag,
            mode: mode_code,
        }),
    }
}

// Frame and write one command. The writer sees either the whole frame or an error.
pub fn write_command<W: Write + ?Sized>(writer: &mut W, command: &Command) -> Result<usize, WriteError> {
    let frame = command.frame()?;
    trace!("{} out: {}", command.tag(), hexdump(&command.body()));
    let mut written = 0;
    while written < frame.len() {
        match writer.write(&frame[written..]) {
            Ok(0) => {
                return Err(WriteError::Short {
                    written,
                    expected: frame.len(),
                });
            }
            Ok(n) => written += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(WriteError::Io(err)),
        }
    }
    writer.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_frame_doubles_dle() {
        let frame = Command::legacy(&[0x8e, 0x10, 0x01]).frame().unwrap();
        assert_eq!(frame, vec![0x10, 0x8e, 0x10, 0x10, 0x01, 0x10, 0x03]);
    }

    #[test]
    fn test_enveloped_query_body() {
        // x90-01 query as the receiver documentation spells it out
        let body = Command::query(0x90, 0x01).body();
        assert_eq!(body, vec![0x90, 0x01, 0x00, 0x02, 0x00, 0x93]);
        assert_eq!(checksum(&body), 0);
    }

    #[test]
    fn test_enveloped_round_trip() {
        let cmd = Command::enveloped(0x91, 0x05, Mode::Set, vec![0xff, 0x00, 0x0a, 0xaa, 0xaa]);
        let body = cmd.body();
        assert_eq!(checksum(&body), 0);
        // re-open it as if it had been echoed back as a response
        let mut echoed = body.clone();
        echoed[4] = Mode::Response.code();
        let last = echoed.len() - 1;
        echoed[last] = 0;
        echoed[last] = checksum(&echoed);
        let env = open_envelope(echoed[0], &echoed[1..]).unwrap();
        assert_eq!(env.sub_id, 0x05);
        assert_eq!(env.length, 7);
        assert_eq!(env.data(), &[0xff, 0x00, 0x0a, 0xaa, 0xaa]);
    }

    #[test]
    fn test_open_envelope_rejects_query_mode() {
        let body = Command::query(0x90, 0x00).body();
        let err = open_envelope(body[0], &body[1..]).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedMode { mode: 0, .. }));
    }

    #[test]
    fn test_open_envelope_rejects_flipped_checksum() {
        let cmd = Command::enveloped(0xa1, 0x00, Mode::Response, vec![0; 4]);
        let mut body = cmd.body();
        let last = body.len() - 1;
        body[last] ^= 0xff;
        let err = open_envelope(body[0], &body[1..]).unwrap_err();
        assert!(matches!(err, DecodeError::BadChecksum { residue: 0xff, .. }));
    }

    #[test]
    fn test_open_envelope_rejects_length_mismatch() {
        let payload = [0x00, 0x00, 0x09, 0x02, 0x00];
        let err = open_envelope(0xa1, &payload).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::BadEnvelopeLength {
                declared: 12,
                got: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_oversize_rejected_before_write() {
        let cmd = Command::Legacy(vec![0x8e; MAX_COMMAND_BODY + 1]);
        let mut sink = Vec::new();
        let err = write_command(&mut sink, &cmd).unwrap_err();
        assert!(matches!(err, WriteError::Frame(FrameError::Oversize { .. })));
        assert!(sink.is_empty());
    }

    struct Stalled;

    impl Write for Stalled {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_short_write_reported() {
        let err = write_command(&mut Stalled, &Command::legacy(&[0x21])).unwrap_err();
        assert!(matches!(
            err,
            WriteError::Short {
                written: 0,
                expected: 4
            }
        ));
    }
}
