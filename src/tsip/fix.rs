use crate::tsip::skyview::Skyview;
use bitflags::bitflags;
use chrono::{DateTime, Utc};
use std::fmt;

bitflags! {
    /// Navigation fields touched by one decoded packet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ChangeMask: u32 {
        const TIME = 1 << 0;
        /// Time is suitable for clock discipline
        const NTP_TIME = 1 << 1;
        const LATLON = 1 << 2;
        const ALTITUDE = 1 << 3;
        const ECEF = 1 << 4;
        const VECEF = 1 << 5;
        const VNED = 1 << 6;
        const MODE = 1 << 7;
        const STATUS = 1 << 8;
        const DOP = 1 << 9;
        const HERR = 1 << 10;
        const VERR = 1 << 11;
        const DEVICE_ID = 1 << 12;
        const SATELLITE = 1 << 13;
        const USED = 1 << 14;
        /// Start of a new epoch; drop the fields accumulated so far
        const CLEAR = 1 << 15;
        /// End of an epoch; publish what has been accumulated
        const REPORT = 1 << 16;
    }
}

impl fmt::Display for ChangeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("{}");
        }
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        write!(f, "{{{}}}", names.join("|"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum FixMode {
    #[default]
    NotSeen,
    NoFix,
    TwoD,
    ThreeD,
}

impl fmt::Display for FixMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FixMode::NotSeen => "n/a",
            FixMode::NoFix => "no-fix",
            FixMode::TwoD => "2D",
            FixMode::ThreeD => "3D",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum FixStatus {
    #[default]
    Unknown,
    Gps,
    Dgps,
    DeadReckoning,
    Time,
}

impl fmt::Display for FixStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FixStatus::Unknown => "unknown",
            FixStatus::Gps => "GPS",
            FixStatus::Dgps => "DGPS",
            FixStatus::DeadReckoning => "DR",
            FixStatus::Time => "time",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntennaStatus {
    Ok,
    Open,
    Short,
}

// Which reference an altitude field is in. Decided once per session from the I/O options echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AltitudeRef {
    #[default]
    Hae,
    Msl,
}

// Fields one packet may contribute to the navigation solution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fix {
    pub time: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub alt_hae: Option<f64>,
    pub alt_msl: Option<f64>,
    pub ecef_x: Option<f64>,
    pub ecef_y: Option<f64>,
    pub ecef_z: Option<f64>,
    pub ecef_vx: Option<f64>,
    pub ecef_vy: Option<f64>,
    pub ecef_vz: Option<f64>,
    pub vel_n: Option<f64>,
    pub vel_e: Option<f64>,
    pub vel_d: Option<f64>,
    pub mode: FixMode,
    pub status: FixStatus,
    pub antenna: Option<AntennaStatus>,
    // 0 none, 128 spoofing/multipath, 255 jamming
    pub jam: Option<u8>,
    pub temperature: Option<f64>,
    pub eph: Option<f64>,
    pub epv: Option<f64>,
}

impl Fix {
    // Altitude with the session's reference applied.
    pub fn set_altitude(&mut self, reference: AltitudeRef, meters: f64) {
        match reference {
            AltitudeRef::Hae => self.alt_hae = Some(meters),
            AltitudeRef::Msl => self.alt_msl = Some(meters),
        }
    }

    pub fn set_enu_velocity(&mut self, east: f64, north: f64, up: f64) {
        self.vel_e = Some(east);
        self.vel_n = Some(north);
        self.vel_d = Some(-up);
    }

    pub fn unix_seconds(&self) -> Option<i64> {
        self.time.map(|t| t.timestamp())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dop {
    pub pdop: Option<f64>,
    pub hdop: Option<f64>,
    pub vdop: Option<f64>,
    pub tdop: Option<f64>,
}

// Host-owned navigation state. The session reads it for the fields the wire
// format leaves out and writes decoded packets into it.
#[derive(Debug, Clone, Default)]
pub struct NavState {
    // Fix being accumulated for the current epoch.
    pub fix: Fix,
    // Fix of the epoch before.
    pub previous: Fix,
    pub dop: Dop,
    // Receiver clock, nanoseconds and ns/s.
    pub clock_bias: Option<f64>,
    pub clock_drift: Option<f64>,
    // PPS quantization error, picoseconds.
    pub q_err: Option<i64>,
    pub skyview: Skyview,
    pub satellites_used: usize,
    pub sats_used: Vec<i16>,
}

impl NavState {
    pub fn new() -> Self {
        Self::default()
    }

    // Fold one packet's fields into the accumulated fix. A CLEAR rotates the
    // current fix into `previous` before the new fields land.
    pub fn merge(&mut self, update: &Fix, mask: ChangeMask) {
        if mask.contains(ChangeMask::CLEAR) {
            self.previous = std::mem::take(&mut self.fix);
        }
        let fix = &mut self.fix;
        if mask.contains(ChangeMask::TIME) && update.time.is_some() {
            fix.time = update.time;
        }
        if mask.contains(ChangeMask::LATLON) {
            fix.latitude = update.latitude.or(fix.latitude);
            fix.longitude = update.longitude.or(fix.longitude);
        }
        if mask.contains(ChangeMask::ALTITUDE) {
            fix.alt_hae = update.alt_hae.or(fix.alt_hae);
            fix.alt_msl = update.alt_msl.or(fix.alt_msl);
        }
        if mask.contains(ChangeMask::ECEF) {
            fix.ecef_x = update.ecef_x.or(fix.ecef_x);
            fix.ecef_y = update.ecef_y.or(fix.ecef_y);
            fix.ecef_z = update.ecef_z.or(fix.ecef_z);
        }
        if mask.contains(ChangeMask::VECEF) {
            fix.ecef_vx = update.ecef_vx.or(fix.ecef_vx);
            fix.ecef_vy = update.ecef_vy.or(fix.ecef_vy);
            fix.ecef_vz = update.ecef_vz.or(fix.ecef_vz);
        }
        if mask.contains(ChangeMask::VNED) {
            fix.vel_n = update.vel_n.or(fix.vel_n);
            fix.vel_e = update.vel_e.or(fix.vel_e);
            fix.vel_d = update.vel_d.or(fix.vel_d);
        }
        if mask.contains(ChangeMask::MODE) {
            fix.mode = update.mode;
        }
        if mask.contains(ChangeMask::STATUS) {
            fix.status = update.status;
        }
        if mask.contains(ChangeMask::HERR) {
            fix.eph = update.eph.or(fix.eph);
        }
        if mask.contains(ChangeMask::VERR) {
            fix.epv = update.epv.or(fix.epv);
        }
        // auxiliary readings ride along with whatever packet carried them
        if update.antenna.is_some() {
            fix.antenna = update.antenna;
        }
        if update.jam.is_some() {
            fix.jam = update.jam;
        }
        if update.temperature.is_some() {
            fix.temperature = update.temperature;
        }
    }

    // Time the scheduler runs on: current fix, else the one before, else zero.
    pub fn now(&self) -> i64 {
        self.fix
            .unix_seconds()
            .filter(|s| *s != 0)
            .or_else(|| self.previous.unix_seconds().filter(|s| *s != 0))
            .unwrap_or(0)
    }
}

// DOP and similar quality values outside this band are sentinels.
pub fn dop_in_range(value: f64) -> bool {
    (0.01..=89.99).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_merge_respects_mask() {
        let mut nav = NavState::new();
        let update = Fix {
            latitude: Some(10.0),
            longitude: Some(20.0),
            mode: FixMode::ThreeD,
            ..Fix::default()
        };
        nav.merge(&update, ChangeMask::LATLON);
        assert_eq!(nav.fix.latitude, Some(10.0));
        assert_eq!(nav.fix.mode, FixMode::NotSeen);
    }

    #[test]
    fn test_clear_rotates_before_applying() {
        let mut nav = NavState::new();
        nav.fix.latitude = Some(1.0);
        let update = Fix {
            alt_hae: Some(55.0),
            ..Fix::default()
        };
        nav.merge(&update, ChangeMask::CLEAR | ChangeMask::ALTITUDE);
        assert_eq!(nav.previous.latitude, Some(1.0));
        assert_eq!(nav.fix.latitude, None);
        assert_eq!(nav.fix.alt_hae, Some(55.0));
    }

    #[test]
    fn test_now_falls_back_to_previous() {
        let mut nav = NavState::new();
        assert_eq!(nav.now(), 0);
        nav.previous.time = Utc.timestamp_opt(1_000, 0).single();
        assert_eq!(nav.now(), 1_000);
        nav.fix.time = Utc.timestamp_opt(2_000, 0).single();
        assert_eq!(nav.now(), 2_000);
    }

    #[test]
    fn test_dop_band() {
        assert!(dop_in_range(1.2));
        assert!(!dop_in_range(99.9));
        assert!(!dop_in_range(0.0));
    }

    #[test]
    fn test_mask_display() {
        let mask = ChangeMask::TIME | ChangeMask::MODE;
        assert_eq!(mask.to_string(), "{TIME|MODE}");
        assert_eq!(ChangeMask::empty().to_string(), "{}");
    }
}
