// Field decoders for both protocol generations.
//
// Every decoder has the same shape: it reads a payload the dispatcher has
// already length-checked, writes fix fields into `update`, writes the
// non-fix session fields (DOP, clock, skyview, used list) straight into
// `nav`, and returns the mask of what changed. Decoders that can still
// reject a packet after the route guard (counts, indices) do so before
// touching anything.

pub mod legacy;
pub mod superpacket;
pub mod v1;

use crate::tsip::codec::Command;
use crate::tsip::epoch::{GpsClock, TimeOfWeek, TowTracker};
use crate::tsip::error::{DecodeError, PacketTag};
use crate::tsip::fix::{AltitudeRef, ChangeMask, Fix, NavState};
use crate::tsip::identity::DeviceIdentity;
use crate::tsip::query::QuerySchedule;
use crate::tsip::skyview::BurstTracker;
use log::{debug, warn};

pub const CLIGHT: f64 = 299_792_458.0;
// 180 / 2^31
pub const SEMI_2_DEG: f64 = 180.0 / 2_147_483_648.0;
pub const RAD_2_DEG: f64 = 57.295_779_513_082_32;

// One inbound payload as a decoder sees it.
#[derive(Debug, Clone, Copy)]
pub struct Packet<'a> {
    pub tag: PacketTag,
    // Legacy: payload after the id. Enveloped: payload from the sub id on.
    pub buf: &'a [u8],
    // Legacy: buf length. Enveloped: the declared length.
    pub length: usize,
}

pub type Decoder =
    fn(&mut DecodeContext, &Packet<'_>, &mut NavState, &mut Fix) -> Result<ChangeMask, DecodeError>;

// Session-wide state every decoder and the scheduler share.
#[derive(Debug, Clone)]
pub struct DecodeContext {
    pub clock: GpsClock,
    pub tow: TowTracker,
    pub identity: DeviceIdentity,
    pub schedule: QuerySchedule,
    pub burst: BurstTracker,
    pub altitude_ref: AltitudeRef,
    // TOW of the last xa2-00 and what it was when xa3-11 last arrived
    pub last_a200: u32,
    pub last_a311: u32,
    pub readonly: bool,
    pub passive: bool,
    outbox: Vec<Command>,
    diagnostics: Vec<String>,
}

impl DecodeContext {
    pub fn new(clock: GpsClock, readonly: bool, passive: bool) -> Self {
        Self {
            clock,
            tow: TowTracker::default(),
            identity: DeviceIdentity::default(),
            schedule: QuerySchedule::default(),
            burst: BurstTracker::default(),
            altitude_ref: AltitudeRef::Hae,
            last_a200: 0,
            last_a311: 0,
            readonly,
            passive,
            outbox: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    // Queue a command for the host to write. Dropped in read-only mode.
    pub fn send(&mut self, command: Command) {
        if self.readonly {
            debug!("read-only, not sending {}", command.tag());
            return;
        }
        self.outbox.push(command);
    }

    pub fn send_all(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.send(command);
        }
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }

    // Human readable decode record.
    pub fn note(&mut self, line: String) {
        debug!("{line}");
        self.diagnostics.push(line);
    }

    // Same, for anomalies worth a warning.
    pub fn warn(&mut self, line: String) {
        warn!("{line}");
        self.diagnostics.push(line);
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub fn clear_diagnostics(&mut self) {
        self.diagnostics.clear();
    }

    // CLEAR when `tow` starts a new epoch.
    pub fn epoch(&mut self, tow: TimeOfWeek) -> ChangeMask {
        if self.tow.observe(tow) {
            ChangeMask::CLEAR
        } else {
            ChangeMask::empty()
        }
    }
}

// Inner length gate for decoders whose size depends on a sub code or count.
pub fn require(packet: &Packet<'_>, need: usize) -> Result<(), DecodeError> {
    if packet.length < need {
        return Err(DecodeError::Runt {
            tag: packet.tag,
            got: packet.length,
            need,
        });
    }
    Ok(())
}

pub fn semicircles_to_deg(value: i64) -> f64 {
    value as f64 * SEMI_2_DEG
}

// Longitude is sent unsigned; fold it into (-180, 180].
pub fn longitude_from_semicircles(value: u32) -> f64 {
    let lon = semicircles_to_deg(i64::from(value));
    if lon > 180.0 { lon - 360.0 } else { lon }
}

// Clock terms sent in meters (or m/s) to nanoseconds (or ns/s).
pub fn meters_to_ns(meters: f64) -> f64 {
    1e9 * meters / CLIGHT
}

// Write the four DOPs that pass the sentinel band.
pub fn apply_dops(nav: &mut NavState, pdop: f64, hdop: f64, vdop: f64, tdop: f64) -> ChangeMask {
    use crate::tsip::fix::dop_in_range;
    let mut mask = ChangeMask::empty();
    for (value, slot) in [
        (pdop, &mut nav.dop.pdop),
        (hdop, &mut nav.dop.hdop),
        (vdop, &mut nav.dop.vdop),
        (tdop, &mut nav.dop.tdop),
    ] {
        if dop_in_range(value) {
            *slot = Some(value);
            mask |= ChangeMask::DOP;
        }
    }
    mask
}
