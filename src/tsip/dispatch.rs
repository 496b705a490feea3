// Routing tables: (id, sub id) to decoder plus length guard.
//
// Entries without a decoder are packets the receivers are known to send
// that carry nothing the session uses. They are reported as unhandled,
// which is quieter than unknown.

use crate::tsip::decode::{Decoder, legacy, superpacket, v1};
use crate::tsip::error::{DecodeError, PacketTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LenRule {
    AtLeast(usize),
    OneOf(&'static [usize]),
    Any,
}

impl LenRule {
    pub fn check(self, tag: PacketTag, got: usize) -> Result<(), DecodeError> {
        match self {
            LenRule::AtLeast(need) if got < need => Err(DecodeError::Runt { tag, got, need }),
            LenRule::OneOf(expected) if !expected.contains(&got) => Err(DecodeError::WrongLength {
                tag,
                got,
                expected,
            }),
            _ => Ok(()),
        }
    }
}

pub struct Route {
    pub id: u8,
    pub sub_id: Option<u8>,
    pub name: &'static str,
    pub len: LenRule,
    pub decode: Option<Decoder>,
}

impl Route {
    pub fn tag(&self) -> PacketTag {
        PacketTag::new(self.id, self.sub_id)
    }
}

const fn route(id: u8, name: &'static str, len: LenRule, decode: Decoder) -> Route {
    Route {
        id,
        sub_id: None,
        name,
        len,
        decode: Some(decode),
    }
}

const fn sub(id: u8, sub_id: u8, name: &'static str, len: LenRule, decode: Decoder) -> Route {
    Route {
        id,
        sub_id: Some(sub_id),
        name,
        len,
        decode: Some(decode),
    }
}

const fn unhandled(id: u8, sub_id: Option<u8>, name: &'static str) -> Route {
    Route {
        id,
        sub_id,
        name,
        len: LenRule::Any,
        decode: None,
    }
}

use LenRule::{AtLeast, Any, OneOf};

const SUPERPACKET_ID: u8 = 0x8f;

pub static LEGACY: &[Route] = &[
    route(0x13, "Unparsable Packet", AtLeast(1), legacy::x13),
    route(0x1c, "Version Information", Any, legacy::x1c),
    route(0x41, "GPS Time", AtLeast(10), legacy::x41),
    route(0x42, "Single-Precision XYZ Position", AtLeast(16), legacy::x42),
    route(0x43, "Velocity Fix XYZ", AtLeast(20), legacy::x43),
    route(0x45, "Software Version", AtLeast(10), legacy::x45),
    route(0x46, "Health of Receiver", AtLeast(2), legacy::x46),
    route(0x47, "Signal Levels", AtLeast(1), legacy::x47),
    route(0x48, "GPS System Message", Any, legacy::x48),
    route(0x4a, "Single-Precision LLA Position", AtLeast(20), legacy::x4a),
    route(0x4b, "Machine/Code ID", AtLeast(3), legacy::x4b),
    route(0x4c, "Operating Parameters", AtLeast(17), legacy::x4c),
    route(0x54, "Bias and Bias Rate", AtLeast(12), legacy::x54),
    route(0x55, "I/O Options", AtLeast(4), legacy::x55),
    route(0x56, "Velocity Fix ENU", AtLeast(20), legacy::x56),
    route(0x57, "Last Computed Fix", AtLeast(8), legacy::x57),
    route(0x5a, "Raw Measurement Data", AtLeast(25), legacy::x5a),
    route(0x5c, "Satellite Tracking Status", AtLeast(24), legacy::x5c),
    route(0x5d, "Satellite Tracking Status, multi-GNSS", AtLeast(26), legacy::x5d),
    route(0x6c, "Satellite Selection List", AtLeast(18), legacy::x6c),
    route(0x6d, "All-in-View Satellite Selection", AtLeast(17), legacy::x6d),
    route(0x82, "Differential Position Fix Mode", AtLeast(1), legacy::x82),
    route(0x83, "Double-Precision XYZ Position", AtLeast(36), legacy::x83),
    route(0x84, "Double-Precision LLA Position", AtLeast(36), legacy::x84),
    route(0xbb, "Navigation Configuration", OneOf(&[40, 43]), legacy::xbb),
    unhandled(0x1a, None, "RTCM Wrapper"),
    unhandled(0x2e, None, "GPS Time Set Response"),
    unhandled(0x32, None, "Unit Position"),
    unhandled(0x38, None, "SV System Data"),
    unhandled(0x40, None, "Almanac Data for Single Satellite"),
    unhandled(0x44, None, "Non-Overdetermined Satellite Selection"),
    unhandled(0x49, None, "Almanac Health Page"),
    unhandled(0x4d, None, "Oscillator Offset"),
    unhandled(0x4e, None, "Response to Set GPS Time"),
    unhandled(0x4f, None, "UTC Parameters"),
    unhandled(0x53, None, "Analog-to-Digital Readings"),
    unhandled(0x58, None, "Satellite System Data"),
    unhandled(0x59, None, "Satellite Disable or Ignore Health"),
    unhandled(0x5b, None, "Satellite Ephemeris Status"),
    unhandled(0x5e, None, "Additional Fix Status"),
    unhandled(0x5f, None, "Severe Failure Notification"),
    unhandled(0x60, None, "DGPS Pseudorange Corrections"),
    unhandled(0x61, None, "DGPS Delta Pseudorange Corrections"),
    unhandled(0x6a, None, "Differential Corrections Used in Fix"),
    unhandled(0x6e, None, "Synchronized Measurements"),
    unhandled(0x6f, None, "Synchronized Measurements Report"),
    unhandled(0x70, None, "Filter Report"),
    unhandled(0x76, None, "Overdetermined Mode"),
    unhandled(0x78, None, "Maximum PRC Age"),
    unhandled(0x7a, None, "NMEA Settings"),
    unhandled(0x7b, None, "NMEA Interval and Message Mask"),
    unhandled(0x7d, None, "Position Fix Rate Configuration"),
    unhandled(0x85, None, "Differential Correction Status"),
    unhandled(0x87, None, "Reference Station Parameters"),
    unhandled(0x88, None, "Mobile Differential Parameters"),
    unhandled(0x89, None, "Receiver Acquisition Sensitivity Mode"),
    unhandled(0x8b, None, "QA/QC Reports"),
    unhandled(0x8d, None, "Average Position"),
    unhandled(0xb0, None, "PPS and Event Report"),
    unhandled(0xbc, None, "Receiver Port Configuration"),
    unhandled(0xc1, None, "Bit Mask for GPIOs in Standby Mode"),
    unhandled(0xc2, None, "SBAS SV Mask"),
];

// Sub-formats of x8f. Lengths count the sub id byte.
pub static SUPERPACKET: &[Route] = &[
    sub(0x8f, 0x15, "Current Datum Values", AtLeast(43), superpacket::x8f_15),
    sub(0x8f, 0x20, "Last Fix with Extra Information", OneOf(&[56, 64]), superpacket::x8f_20),
    sub(0x8f, 0x23, "Compact Superpacket", AtLeast(29), superpacket::x8f_23),
    sub(0x8f, 0x42, "Stored Production Parameters", AtLeast(19), superpacket::x8f_42),
    sub(0x8f, 0xa5, "Packet Broadcast Mask", AtLeast(5), superpacket::x8f_a5),
    sub(0x8f, 0xa6, "Self-Survey Command", AtLeast(3), superpacket::x8f_a6),
    sub(0x8f, 0xa7, "Individual Satellite Solutions", AtLeast(10), superpacket::x8f_a7),
    sub(0x8f, 0xa9, "Self-Survey Parameters", AtLeast(11), superpacket::x8f_a9),
    sub(0x8f, 0xab, "Primary Timing Packet", AtLeast(17), superpacket::x8f_ab),
    sub(0x8f, 0xac, "Supplemental Timing Packet", AtLeast(68), superpacket::x8f_ac),
    unhandled(0x8f, Some(0x02), "UTC Information"),
    unhandled(0x8f, Some(0x21), "Accuracy Information"),
    unhandled(0x8f, Some(0x2a), "Fix and Channel Tracking, Type 1"),
    unhandled(0x8f, Some(0x2b), "Fix and Channel Tracking, Type 2"),
    unhandled(0x8f, Some(0x41), "Stored Manufacturing Operating Parameters"),
    unhandled(0x8f, Some(0x4a), "PPS Characteristics"),
    unhandled(0x8f, Some(0x4e), "PPS Output Options"),
    unhandled(0x8f, Some(0x4f), "PPS Width"),
    unhandled(0x8f, Some(0x60), "DR Calibration and Status"),
    unhandled(0x8f, Some(0x62), "GPS/DR Position/Velocity"),
    unhandled(0x8f, Some(0x64), "Firmware Version and Configuration"),
    unhandled(0x8f, Some(0x6b), "Last Gyroscope Readings"),
    unhandled(0x8f, Some(0x6d), "Last Odometer Readings"),
    unhandled(0x8f, Some(0x6f), "Firmware Version Name"),
    unhandled(0x8f, Some(0x70), "Beacon Channel Status"),
    unhandled(0x8f, Some(0x71), "DGPS Station Database"),
    unhandled(0x8f, Some(0x73), "Beacon Channel Control Acknowledgment"),
    unhandled(0x8f, Some(0x74), "Clear Beacon Database Acknowledgment"),
    unhandled(0x8f, Some(0x75), "FFT Start Acknowledgment"),
    unhandled(0x8f, Some(0x76), "FFT Stop Acknowledgment"),
    unhandled(0x8f, Some(0x77), "FFT Reports"),
    unhandled(0x8f, Some(0x78), "RTCM Reports"),
    unhandled(0x8f, Some(0x79), "Beacon Station Attributes Acknowledgment"),
    unhandled(0x8f, Some(0x7a), "Beacon Station Attributes"),
    unhandled(0x8f, Some(0x7b), "DGPS Receiver RAM Configuration Block"),
    unhandled(0x8f, Some(0x7c), "DGPS Receiver Configuration Block Acknowledgment"),
    unhandled(0x8f, Some(0x7e), "Satellite Line-of-Sight Message"),
    unhandled(0x8f, Some(0x7f), "DGPS Receiver ROM Configuration Block"),
    unhandled(0x8f, Some(0x80), "DGPS Service Provider System Information"),
    unhandled(0x8f, Some(0x81), "Decoder Station Information"),
    unhandled(0x8f, Some(0x82), "Decoder Diagnostic Information"),
    unhandled(0x8f, Some(0x84), "Satellite FFT Control Acknowledgment"),
    unhandled(0x8f, Some(0x85), "DGPS Source Tracking Status"),
    unhandled(0x8f, Some(0x86), "Clear Satellite Database Acknowledgment"),
    unhandled(0x8f, Some(0x87), "Network Statistics"),
    unhandled(0x8f, Some(0x88), "Diagnostic Output Options"),
    unhandled(0x8f, Some(0x89), "DGPS Source Control"),
    unhandled(0x8f, Some(0x8a), "Service Provider Information"),
    unhandled(0x8f, Some(0x8b), "Service Provider Activation Information"),
    unhandled(0x8f, Some(0x8e), "Service Provider Data Load"),
    unhandled(0x8f, Some(0x8f), "Receiver Identity"),
    unhandled(0x8f, Some(0x90), "Guidance Status"),
    unhandled(0x8f, Some(0x91), "Guidance Configuration"),
    unhandled(0x8f, Some(0x92), "Lightbar Configuration"),
    unhandled(0x8f, Some(0x94), "Guidance Operation Acknowledgment"),
    unhandled(0x8f, Some(0x95), "Button Box Configuration Type"),
    unhandled(0x8f, Some(0x96), "Point Manipulation"),
    unhandled(0x8f, Some(0x97), "Utility Information"),
    unhandled(0x8f, Some(0x98), "Individual Button Configuration"),
    unhandled(0x8f, Some(0x9a), "Differential Correction Information"),
    unhandled(0x8f, Some(0xa0), "DAC Value"),
    unhandled(0x8f, Some(0xa2), "UTC/GPS Timing"),
    unhandled(0x8f, Some(0xa3), "Oscillator Disciplining Command"),
    unhandled(0x8f, Some(0xa8), "Oscillator Disciplining Parameters"),
];

// Enveloped generation. Lengths are the declared envelope length.
pub static V1: &[Route] = &[
    sub(0x90, 0x00, "Protocol Version", AtLeast(11), v1::x90_00),
    sub(0x90, 0x01, "Receiver Version", AtLeast(11), v1::x90_01),
    sub(0x91, 0x00, "Port Configuration", AtLeast(17), v1::x91_00),
    sub(0x91, 0x01, "GNSS Configuration", AtLeast(28), v1::x91_01),
    sub(0x91, 0x02, "NVS Configuration", AtLeast(8), v1::x91_02),
    sub(0x91, 0x03, "Timing Configuration", AtLeast(19), v1::x91_03),
    sub(0x91, 0x04, "Self-Survey Configuration", AtLeast(11), v1::x91_04),
    sub(0x91, 0x05, "Periodic Output Configuration", AtLeast(19), v1::x91_05),
    sub(0x92, 0x01, "Reset Cause", AtLeast(3), v1::x92_01),
    sub(0x93, 0x00, "Production Information", AtLeast(78), v1::x93_00),
    sub(0xa0, 0x00, "Firmware Upload", OneOf(&[3, 8]), v1::xa0_00),
    sub(0xa1, 0x00, "Timing Information", AtLeast(32), v1::xa1_00),
    sub(0xa1, 0x02, "Frequency Information", AtLeast(17), v1::xa1_02),
    sub(0xa1, 0x11, "Position Information", AtLeast(52), v1::xa1_11),
    sub(0xa2, 0x00, "Satellite Information", AtLeast(25), v1::xa2_00),
    sub(0xa3, 0x00, "System Alarms", AtLeast(18), v1::xa3_00),
    sub(0xa3, 0x11, "Receiver Status", AtLeast(29), v1::xa3_11),
    sub(0xa3, 0x21, "Error Report", AtLeast(5), v1::xa3_21),
    sub(0xd0, 0x00, "Debug Output Type", AtLeast(3), v1::xd0_00),
    sub(0xd0, 0x01, "Debug Output", AtLeast(4), v1::xd0_01),
    sub(0xd0, 0x40, "Raw GNSS Data", Any, v1::xd0_raw),
    sub(0xd0, 0x41, "Raw GNSS Data", Any, v1::xd0_raw),
];

fn find(table: &'static [Route], id: u8, sub_id: Option<u8>) -> Option<&'static Route> {
    table.iter().find(|r| r.id == id && r.sub_id == sub_id)
}

// Route a legacy payload, descending into x8f by its first byte. The
// length guard has been applied to whatever comes back.
pub fn legacy_route(id: u8, payload: &[u8]) -> Result<&'static Route, DecodeError> {
    if id == SUPERPACKET_ID {
        let Some(&sub_id) = payload.first() else {
            return Err(DecodeError::Runt {
                tag: PacketTag::new(id, None),
                got: 0,
                need: 1,
            });
        };
        let route = find(SUPERPACKET, id, Some(sub_id)).ok_or(DecodeError::Unknown {
            tag: PacketTag::new(id, Some(sub_id)),
        })?;
        route.len.check(route.tag(), payload.len())?;
        return Ok(route);
    }
    let route = find(LEGACY, id, None).ok_or(DecodeError::Unknown {
        tag: PacketTag::new(id, None),
    })?;
    route.len.check(route.tag(), payload.len())?;
    Ok(route)
}

// Route an opened envelope by its declared length.
pub fn v1_route(id: u8, sub_id: u8, length: usize) -> Result<&'static Route, DecodeError> {
    let route = find(V1, id, Some(sub_id)).ok_or(DecodeError::Unknown {
        tag: PacketTag::new(id, Some(sub_id)),
    })?;
    route.len.check(route.tag(), length)?;
    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tables_have_no_duplicates() {
        for table in [LEGACY, SUPERPACKET, V1] {
            let mut seen = HashSet::new();
            for route in table {
                assert!(seen.insert((route.id, route.sub_id)), "duplicate {}", route.tag());
            }
        }
    }

    #[test]
    fn test_legacy_runt() {
        let err = legacy_route(0x41, &[0; 9]).err().unwrap();
        assert_eq!(
            err,
            DecodeError::Runt {
                tag: PacketTag::new(0x41, None),
                got: 9,
                need: 10
            }
        );
        assert!(legacy_route(0x41, &[0; 10]).is_ok());
    }

    #[test]
    fn test_exact_lengths() {
        assert!(legacy_route(0xbb, &[0; 40]).is_ok());
        assert!(matches!(
            legacy_route(0xbb, &[0; 41]),
            Err(DecodeError::WrongLength { got: 41, .. })
        ));
        let mut lfwei = vec![0u8; 60];
        lfwei[0] = 0x20;
        assert!(matches!(
            legacy_route(0x8f, &lfwei),
            Err(DecodeError::WrongLength { .. })
        ));
        assert!(v1_route(0xa0, 0x00, 8).is_ok());
        assert!(v1_route(0xa0, 0x00, 5).is_err());
    }

    #[test]
    fn test_superpacket_descends() {
        let mut buf = vec![0u8; 17];
        buf[0] = 0xab;
        let route = legacy_route(0x8f, &buf).unwrap();
        assert_eq!(route.tag().to_string(), "x8f-ab");
        assert!(matches!(legacy_route(0x8f, &[]), Err(DecodeError::Runt { need: 1, .. })));
        let err = legacy_route(0x8f, &[0x55]).err().unwrap();
        assert!(err.is_unknown());
        assert_eq!(err.tag().to_string(), "x8f-55");
    }

    #[test]
    fn test_unhandled_is_not_unknown() {
        let route = legacy_route(0x5f, &[]).unwrap();
        assert!(route.decode.is_none());
        assert!(legacy_route(0xfe, &[0; 4]).err().unwrap().is_unknown());
        // send-only enveloped packets come back unknown
        assert!(v1_route(0x92, 0x00, 3).err().unwrap().is_unknown());
        assert!(v1_route(0xa4, 0x00, 3).err().unwrap().is_unknown());
    }

    #[test]
    fn test_v1_runt() {
        assert!(matches!(
            v1_route(0xa1, 0x11, 51),
            Err(DecodeError::Runt { need: 52, .. })
        ));
        assert!(v1_route(0xd0, 0x40, 0).is_ok());
    }
}
