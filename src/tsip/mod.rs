// Trimble Standard Interface Protocol, both generations: the single-byte-id
// legacy family and the enveloped family with sub ids, length, mode and
// checksum.

pub mod bytes;
pub mod codec;
pub mod decode;
pub mod dispatch;
pub mod epoch;
pub mod error;
pub mod fix;
pub mod gnss;
pub mod identity;
pub mod query;
pub mod session;
pub mod skyview;
pub mod tables;

pub use codec::{Command, Mode, write_command};
pub use error::{DecodeError, FrameError, PacketTag, WriteError};
pub use fix::{ChangeMask, Fix, NavState};
pub use session::{Parity, RawPacket, Session, SessionConfig};
