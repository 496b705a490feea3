// Constellation and satellite numbering.
//
// The two receiver generations number satellites differently, so there are
// two separate mappings: `legacy_sat_id` for the single-byte-id family (one
// PRN band per constellation) and `v1_signal` for the enveloped family (a
// combined constellation/signal code plus a per-constellation PRN).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GnssId {
    Gps,
    Sbas,
    Galileo,
    BeiDou,
    Imes,
    Qzss,
    Glonass,
    Irnss,
}

impl GnssId {
    pub fn code(self) -> u8 {
        match self {
            GnssId::Gps => 0,
            GnssId::Sbas => 1,
            GnssId::Galileo => 2,
            GnssId::BeiDou => 3,
            GnssId::Imes => 4,
            GnssId::Qzss => 5,
            GnssId::Glonass => 6,
            GnssId::Irnss => 7,
        }
    }
}

impl fmt::Display for GnssId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GnssId::Gps => "GP",
            GnssId::Sbas => "SB",
            GnssId::Galileo => "GA",
            GnssId::BeiDou => "BD",
            GnssId::Imes => "IM",
            GnssId::Qzss => "QZ",
            GnssId::Glonass => "GL",
            GnssId::Irnss => "IR",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SatId {
    pub gnss: GnssId,
    pub svid: u8,
}

impl SatId {
    fn new(gnss: GnssId, svid: u8) -> Self {
        Self { gnss, svid }
    }
}

fn offset(prn: u8, delta: i16) -> Option<u8> {
    u8::try_from(i16::from(prn) + delta).ok().filter(|s| *s > 0)
}

// Legacy family: `svtype` is the constellation byte of x5d (0 for packets
// that carry only a PRN), `prn` the receiver's PRN.
pub fn legacy_sat_id(svtype: u8, prn: u8) -> Option<SatId> {
    match svtype {
        0 => match prn {
            1..=32 => Some(SatId::new(GnssId::Gps, prn)),
            // SMT 360 family puts SBAS in 33-54
            33..=54 => offset(prn, 87).map(|s| SatId::new(GnssId::Sbas, s)),
            65..=96 => offset(prn, -64).map(|s| SatId::new(GnssId::Glonass, s)),
            97..=133 => offset(prn, -96).map(|s| SatId::new(GnssId::Galileo, s)),
            // Copernicus puts SBAS in 120-138; 120-133 already matched Galileo above
            134..=138 => offset(prn, 87).map(|s| SatId::new(GnssId::Sbas, s)),
            183 => Some(SatId::new(GnssId::Qzss, 1)),
            192 | 193 => Some(SatId::new(GnssId::Qzss, prn - 190)),
            200 => Some(SatId::new(GnssId::Qzss, 4)),
            201..=237 => Some(SatId::new(GnssId::BeiDou, prn - 200)),
            _ => None,
        },
        1 => offset(prn, -64).map(|s| SatId::new(GnssId::Glonass, s)),
        2 => offset(prn, -200).map(|s| SatId::new(GnssId::BeiDou, s)),
        3 => offset(prn, -96).map(|s| SatId::new(GnssId::Galileo, s)),
        5 => {
            let svid = match prn {
                183 => 1,
                192 => 2,
                193 => 3,
                200 => 4,
                other => other,
            };
            Some(SatId::new(GnssId::Qzss, svid))
        }
        _ => None,
    }
}

// Enveloped family: combined constellation/signal code to (gnss, signal id).
pub fn v1_signal(code: u8) -> Option<(GnssId, u8)> {
    let pair = match code {
        1 => (GnssId::Gps, 0),
        2 => (GnssId::Gps, 3),
        3 => (GnssId::Gps, 6),
        5 => (GnssId::Glonass, 0),
        6 => (GnssId::Glonass, 2),
        9 => (GnssId::Sbas, 0),
        13 => (GnssId::BeiDou, 0),
        14 => (GnssId::BeiDou, 2),
        15 => (GnssId::BeiDou, 3),
        17 => (GnssId::Galileo, 0),
        18 => (GnssId::Galileo, 3),
        19 => (GnssId::Galileo, 5),
        20 => (GnssId::Galileo, 8),
        22 => (GnssId::Qzss, 0),
        23 => (GnssId::Qzss, 4),
        24 => (GnssId::Qzss, 8),
        26 => (GnssId::Irnss, 8),
        _ => return None,
    };
    Some(pair)
}

// NMEA 4.0 style PRN for a (gnss, svid) pair; 0 when there is none.
pub fn nmea_prn(gnss: GnssId, svid: u8) -> i16 {
    if svid == 0 || svid == 255 {
        return 0;
    }
    let svid = i16::from(svid);
    match gnss {
        GnssId::Gps if svid <= 32 => svid,
        GnssId::Sbas if (120..=151).contains(&svid) => svid - 87,
        GnssId::Sbas if (152..=158).contains(&svid) => svid,
        GnssId::Galileo if svid <= 36 => svid + 300,
        GnssId::Galileo if (211..=246).contains(&svid) => svid + 90,
        GnssId::BeiDou if svid <= 63 => svid + 400,
        GnssId::Imes if svid <= 10 => svid + 172,
        GnssId::Imes if (173..=182).contains(&svid) => svid,
        GnssId::Qzss if svid <= 10 => svid + 192,
        GnssId::Qzss if (193..=202).contains(&svid) => svid,
        GnssId::Glonass if svid <= 32 => svid + 64,
        GnssId::Glonass if (65..=96).contains(&svid) => svid,
        GnssId::Irnss if svid <= 14 => svid + 800,
        _ => 0,
    }
}
