// One receiver session: routes inbound packets to the decoders, folds the
// results into the host's navigation state and collects the commands the
// decoders and schedulers want sent.

use crate::tsip::bytes::hexdump;
use crate::tsip::codec::{Command, is_enveloped_id, open_envelope};
use crate::tsip::decode::{DecodeContext, Packet};
use crate::tsip::dispatch::{self, Route};
use crate::tsip::epoch::GpsClock;
use crate::tsip::error::{DecodeError, PacketTag};
use crate::tsip::fix::{ChangeMask, Fix, NavState};
use crate::tsip::identity::DeviceIdentity;
use log::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    // never queue outbound commands
    pub readonly: bool,
    // ask for the receiver's configuration instead of setting it
    pub passive: bool,
    // 1024-week rollovers assumed for 10-bit weeks
    pub rollovers: u32,
    // assumed until the receiver reports its own
    pub leap_seconds: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            readonly: false,
            passive: false,
            rollovers: 2,
            leap_seconds: 18,
        }
    }
}

/// One de-stuffed inbound frame.
///
/// For the enveloped generation `payload` starts at the sub id and runs
/// through the trailing checksum; for the legacy generation it is
/// everything after the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    pub id: u8,
    pub sub_id: Option<u8>,
    pub payload: Vec<u8>,
    pub length: usize,
}

impl RawPacket {
    pub fn new(id: u8, payload: Vec<u8>) -> Self {
        let sub_id = if is_enveloped_id(id) || id == 0x8f {
            payload.first().copied()
        } else {
            None
        };
        Self {
            id,
            sub_id,
            length: payload.len(),
            payload,
        }
    }

    pub fn tag(&self) -> PacketTag {
        PacketTag::new(self.id, self.sub_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl Parity {
    fn code(self) -> u8 {
        match self {
            Parity::None => 0,
            Parity::Odd => 1,
            Parity::Even => 2,
        }
    }
}

// Port configuration baud code: 300 is 2, doubling each step.
pub fn baud_code(speed: u32) -> u8 {
    ((f64::from(speed) / 300.0).log2().round() + 2.0) as u8
}

#[derive(Debug, Clone)]
pub struct Session {
    ctx: DecodeContext,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            ctx: DecodeContext::new(
                GpsClock::new(config.leap_seconds, config.rollovers),
                config.readonly,
                config.passive,
            ),
        }
    }

    /// Decode one packet into `nav`.
    ///
    /// An `Err` means the packet was dropped and nothing in `nav` changed.
    /// Scheduled queries still go out either way, except after an envelope
    /// failure.
    pub fn parse(&mut self, raw: &RawPacket, nav: &mut NavState) -> Result<ChangeMask, DecodeError> {
        self.ctx.clear_diagnostics();
        trace!("{} in: {}", raw.tag(), hexdump(&raw.payload));
        let result = if is_enveloped_id(raw.id) {
            self.parse_v1(raw, nav)
        } else {
            self.parse_legacy(raw, nav)
        };
        match &result {
            Ok(mask) => debug!("{}: mask {mask}", raw.tag()),
            Err(err) if err.is_unknown() => info!("{err}"),
            Err(err) => warn!("{err}"),
        }
        result
    }

    fn parse_legacy(&mut self, raw: &RawPacket, nav: &mut NavState) -> Result<ChangeMask, DecodeError> {
        // scheduling runs on the time as it was before this packet
        let now = nav.now();
        let result = dispatch::legacy_route(raw.id, &raw.payload).and_then(|route| {
            let packet = Packet {
                tag: route.tag(),
                buf: &raw.payload,
                length: raw.payload.len(),
            };
            self.run(route, &packet, nav)
        });
        let polls = self.ctx.schedule.poll(now, self.ctx.identity.superpacket);
        self.ctx.send_all(polls);
        result
    }

    fn parse_v1(&mut self, raw: &RawPacket, nav: &mut NavState) -> Result<ChangeMask, DecodeError> {
        let envelope = open_envelope(raw.id, &raw.payload)?;
        let result = dispatch::v1_route(raw.id, envelope.sub_id, envelope.length).and_then(|route| {
            let packet = Packet {
                tag: route.tag(),
                buf: envelope.raw,
                length: envelope.length,
            };
            self.run(route, &packet, nav)
        });
        if let Some(probe) = self.ctx.schedule.advance_round_robin(self.ctx.passive) {
            self.ctx.send(probe);
        }
        result
    }

    fn run(&mut self, route: &Route, packet: &Packet<'_>, nav: &mut NavState) -> Result<ChangeMask, DecodeError> {
        let Some(decode) = route.decode else {
            info!("{}: unhandled, {}", packet.tag, route.name);
            return Ok(ChangeMask::empty());
        };
        let mut update = Fix::default();
        let mask = decode(&mut self.ctx, packet, nav, &mut update)?;
        nav.merge(&update, mask);
        Ok(mask)
    }

    // Commands queued since the last call, oldest first.
    pub fn take_commands(&mut self) -> Vec<Command> {
        self.ctx.take_commands()
    }

    // Decode records from the last `parse`.
    pub fn diagnostics(&self) -> &[String] {
        self.ctx.diagnostics()
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.ctx.identity
    }

    pub fn clock(&self) -> &GpsClock {
        &self.ctx.clock
    }

    fn quiet(&self) -> bool {
        self.ctx.readonly || self.ctx.passive
    }

    // First contact: ask for the hardware version, x1c-83. The
    // configuration choice follows from the answer.
    pub fn init_query(&mut self) {
        if self.quiet() {
            return;
        }
        self.ctx.send(Command::legacy(&[0x1c, 0x03]));
    }

    // Device identified or reactivated: ask for the software version, x45.
    pub fn identified(&mut self) {
        if self.quiet() {
            return;
        }
        self.ctx.send(Command::legacy(&[0x1f]));
    }

    // Switch the current port to NMEA output at 4800 8N1.
    pub fn request_nmea_mode(&mut self) {
        // 1 s interval; GGA, VTG, GSV, GSA
        self.ctx
            .send(Command::legacy(&[0x7a, 0x00, 0x01, 0x00, 0x00, 0x01, 0x19]));
        self.ctx.send(Command::legacy(&[
            0xbc, 0xff, 0x06, 0x06, 0x03, 0x00, 0x00, 0x00, 0x02, 0x04, 0x00,
        ]));
    }

    // Reconfigure the current port, TSIP in and out.
    pub fn request_speed(&mut self, speed: u32, parity: Parity, stop_bits: u8) {
        let code = baud_code(speed);
        self.ctx.send(Command::legacy(&[
            0xbc,
            0xff,
            code,
            code,
            0x03,
            parity.code(),
            stop_bits.saturating_sub(1),
            0x00,
            0x02,
            0x02,
            0x00,
        ]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tsip::codec::Mode;
    use crate::tsip::fix::{FixMode, FixStatus};

    fn session() -> Session {
        Session::new(SessionConfig::default())
    }

    fn lfwei() -> Vec<u8> {
        let mut buf = vec![0u8; 56];
        buf[0] = 0x20;
        buf[8..12].copy_from_slice(&345_600_000_u32.to_be_bytes());
        buf[28] = 4;
        buf[29] = 18;
        buf[30..32].copy_from_slice(&2300_u16.to_be_bytes());
        for i in 0..4 {
            buf[32 + i * 2] = 0xe0 | (i as u8 + 1);
        }
        buf
    }

    fn enveloped(id: u8, sub_id: u8, data: Vec<u8>) -> RawPacket {
        let body = Command::enveloped(id, sub_id, Mode::Response, data).body();
        RawPacket::new(id, body[1..].to_vec())
    }

    fn position(lat: f64, lon: f64) -> Vec<u8> {
        let mut data = vec![0x00, 0x02];
        data.extend(lat.to_be_bytes());
        data.extend(lon.to_be_bytes());
        data.extend(100.0_f64.to_be_bytes());
        data.extend([0u8; 24]);
        data
    }

    #[test]
    fn test_lfwei_end_to_end() {
        let mut session = session();
        let mut nav = NavState::new();
        let raw = RawPacket::new(0x8f, lfwei());
        assert_eq!(raw.sub_id, Some(0x20));
        let mask = session.parse(&raw, &mut nav).unwrap();
        assert!(mask.contains(
            ChangeMask::TIME
                | ChangeMask::LATLON
                | ChangeMask::STATUS
                | ChangeMask::MODE
                | ChangeMask::VNED
        ));
        assert_eq!(nav.fix.mode, FixMode::ThreeD);
        assert_eq!(nav.fix.status, FixStatus::Gps);
        assert_eq!(nav.fix.vel_n, Some(0.0));
        assert_eq!(nav.fix.vel_e, Some(0.0));
        assert_eq!(nav.fix.vel_d, Some(0.0));
        assert_eq!(nav.fix.latitude, Some(0.0));
        assert!(nav.fix.time.is_some());
        assert!(!session.diagnostics().is_empty());
        // the scheduler ran on the time before the packet: none yet
        assert!(session.take_commands().is_empty());
        session.parse(&raw, &mut nav).unwrap();
        let sent: Vec<Vec<u8>> = session.take_commands().iter().map(|c| c.body()).collect();
        assert!(sent.contains(&vec![0x21]));
    }

    #[test]
    fn test_flipped_checksum_changes_nothing() {
        let mut session = session();
        let mut nav = NavState::new();
        let mut raw = enveloped(0xa1, 0x11, position(40.0, -74.0));
        let last = raw.payload.len() - 1;
        raw.payload[last] ^= 0x5a;
        let err = session.parse(&raw, &mut nav).unwrap_err();
        assert!(matches!(err, DecodeError::BadChecksum { residue: 0x5a, .. }));
        assert_eq!(nav.fix, Fix::default());
        assert!(session.take_commands().is_empty());
    }

    #[test]
    fn test_enveloped_position_and_round_robin() {
        let mut session = session();
        let mut nav = NavState::new();
        let raw = enveloped(0xa1, 0x11, position(40.0, -74.0));
        for _ in 0..3 {
            session.parse(&raw, &mut nav).unwrap();
        }
        assert_eq!(nav.fix.latitude, Some(40.0));
        assert_eq!(nav.fix.longitude, Some(-74.0));
        assert_eq!(nav.fix.alt_hae, Some(100.0));
        // no legacy polling for this generation, and no probe yet
        assert!(session.take_commands().is_empty());
        session.parse(&raw, &mut nav).unwrap();
        let sent = session.take_commands();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].tag().to_string(), "x90-00");
    }

    #[test]
    fn test_unknown_enveloped_still_turns_round_robin() {
        let mut session = session();
        let mut nav = NavState::new();
        let raw = enveloped(0xa5, 0x07, vec![0x01]);
        for _ in 0..4 {
            assert!(session.parse(&raw, &mut nav).unwrap_err().is_unknown());
        }
        assert_eq!(session.take_commands().len(), 1);
    }

    #[test]
    fn test_runt_is_idempotent() {
        let mut session = session();
        let mut nav = NavState::new();
        session.parse(&RawPacket::new(0x8f, lfwei()), &mut nav).unwrap();
        let before = nav.clone();
        let err = session.parse(&RawPacket::new(0x41, vec![0; 9]), &mut nav).unwrap_err();
        assert!(matches!(err, DecodeError::Runt { got: 9, need: 10, .. }));
        assert_eq!(nav.fix, before.fix);
        assert_eq!(nav.skyview, before.skyview);
        assert_eq!(nav.dop, before.dop);
    }

    #[test]
    fn test_new_tow_clears_once() {
        let mut session = session();
        let mut nav = NavState::new();
        let xyz = |tow: f32| {
            let mut buf = Vec::new();
            for v in [1.0_f32, 2.0, 3.0, tow] {
                buf.extend(v.to_be_bytes());
            }
            RawPacket::new(0x42, buf)
        };
        let first = session.parse(&xyz(100.0), &mut nav).unwrap();
        assert!(first.contains(ChangeMask::CLEAR));
        let same = session.parse(&xyz(100.0), &mut nav).unwrap();
        assert!(!same.contains(ChangeMask::CLEAR));
        let next = session.parse(&xyz(101.0), &mut nav).unwrap();
        assert!(next.contains(ChangeMask::CLEAR));
        assert_eq!(nav.previous.ecef_x, Some(1.0));
    }

    #[test]
    fn test_unhandled_is_quiet() {
        let mut session = session();
        let mut nav = NavState::new();
        let mask = session.parse(&RawPacket::new(0x5f, vec![1, 2, 3]), &mut nav).unwrap();
        assert!(mask.is_empty());
    }

    #[test]
    fn test_speed_command() {
        let mut session = session();
        session.request_speed(9600, Parity::Odd, 1);
        let sent = session.take_commands();
        assert_eq!(
            sent[0].body(),
            vec![0xbc, 0xff, 0x07, 0x07, 0x03, 0x01, 0x00, 0x00, 0x02, 0x02, 0x00]
        );
        assert_eq!(baud_code(115_200), 11);
        assert_eq!(baud_code(4800), 6);
    }

    #[test]
    fn test_nmea_mode_commands() {
        let mut session = session();
        session.request_nmea_mode();
        let sent = session.take_commands();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].body()[0], 0x7a);
        assert_eq!(sent[1].body()[9], 0x04);
    }

    #[test]
    fn test_startup_queries_respect_mode() {
        let mut session = session();
        session.init_query();
        session.identified();
        let sent: Vec<Vec<u8>> = session.take_commands().iter().map(|c| c.body()).collect();
        assert_eq!(sent, vec![vec![0x1c, 0x03], vec![0x1f]]);

        let mut passive = Session::new(SessionConfig {
            passive: true,
            ..SessionConfig::default()
        });
        passive.init_query();
        passive.identified();
        assert!(passive.take_commands().is_empty());
    }
}
