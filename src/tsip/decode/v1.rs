// Enveloped-generation reports. Offsets count from the sub id, so the
// first data byte sits at 4. The envelope (length, checksum, mode) has
// been checked before any of these run.

use super::{DecodeContext, Packet, apply_dops};
use crate::tsip::bytes::{bed64, bef32, bes16, beu16, beu32, beu64, name_field, ub};
use crate::tsip::codec::Command;
use crate::tsip::epoch::TimeOfWeek;
use crate::tsip::error::DecodeError;
use crate::tsip::fix::{AltitudeRef, AntennaStatus, ChangeMask, Fix, FixMode, FixStatus, NavState, dop_in_range};
use crate::tsip::gnss::{nmea_prn, v1_signal};
use crate::tsip::skyview::MAX_CHANNELS;
use crate::tsip::tables::{
    DATA_BITS_V1, DECODE_STATUS_V1, ERROR_CODES_V1, FIX_TYPE_V1, MAJOR_ALARMS_V1,
    MINOR_ALARMS_V1, PARITY_V1, PORT_NAME_V1, PORT_TYPE_V1, POSITION_MASK_V1, PPS_MASK_V1,
    PROTOCOL_V1, RECEIVER_MODE_V1, RESET_TYPE_V1, SAT_FLAGS_V1, SAVE_STATUS_V1,
    SELF_SURVEY_MASK_V1, SPEED_V1, STOP_BITS_V1, SV_TYPE_V1, SV_TYPES_V1, TIME_BASE_V1,
    TIME_FLAGS_V1, flag_names, value_name,
};
use chrono::{NaiveDate, TimeDelta};

type Outcome = Result<ChangeMask, DecodeError>;

// No xa3-11 within this many seconds of the burst and the skyview goes out
// on its own.
const SKYVIEW_FLUSH_SECS: i64 = 10;

// Protocol version.
pub fn x90_00(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    ctx.note(format!(
        "{}: NMEA {}.{} TSIP {} Trimble NMEA {} res x{:x} x{:x}",
        p.tag,
        ub(b, 4),
        ub(b, 5),
        ub(b, 6),
        ub(b, 7),
        beu32(b, 8),
        ub(b, 12)
    ));
    Ok(ChangeMask::empty())
}

// Receiver version information.
pub fn x90_01(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    let hardware_code = beu16(b, 11);
    let name = name_field(b, 14, usize::from(ub(b, 13)));
    ctx.identity.hardware_code = hardware_code;
    ctx.identity.subtype = format!(
        "fw {}.{} {} {:02}/{:02}/{:04} {}",
        ub(b, 4),
        ub(b, 5),
        ub(b, 6),
        ub(b, 7),
        ub(b, 8),
        beu16(b, 9),
        name
    );
    ctx.note(format!(
        "{}: {} hardware id {hardware_code}",
        p.tag, ctx.identity.subtype
    ));
    Ok(ChangeMask::DEVICE_ID)
}

// Port configuration.
pub fn x91_00(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    let (port, kind, proto, speed) = (ub(b, 4), ub(b, 5), ub(b, 6), ub(b, 7));
    let (bits, parity, stop) = (ub(b, 8), ub(b, 9), ub(b, 10));
    ctx.note(format!(
        "{}: port {port} ({}) type {kind} ({}) protocol {proto} ({}) speed {speed} ({}) \
         data {bits} ({}) parity {parity} ({}) stop {stop} ({})",
        p.tag,
        value_name(u32::from(port), PORT_NAME_V1),
        value_name(u32::from(kind), PORT_TYPE_V1),
        value_name(u32::from(proto), PROTOCOL_V1),
        value_name(u32::from(speed), SPEED_V1),
        value_name(u32::from(bits), DATA_BITS_V1),
        value_name(u32::from(parity), PARITY_V1),
        value_name(u32::from(stop), STOP_BITS_V1),
    ));
    Ok(ChangeMask::empty())
}

// GNSS configuration.
pub fn x91_01(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    let cons = beu32(b, 4);
    ctx.note(format!(
        "{}: cons x{cons:x} ({}) el {} signal {} PDOP {} jam {} rate {} delay {} res x{:x}",
        p.tag,
        flag_names(cons, SV_TYPES_V1),
        bef32(b, 8),
        bef32(b, 12),
        bef32(b, 16),
        ub(b, 20),
        ub(b, 21),
        bef32(b, 22),
        beu32(b, 26)
    ));
    Ok(ChangeMask::empty())
}

// Result of a configuration save.
pub fn x91_02(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let status = ub(p.buf, 6);
    ctx.note(format!(
        "{}: status {status} ({}) res x{:x}",
        p.tag,
        flag_names(u32::from(status), SAVE_STATUS_V1),
        beu32(p.buf, 7)
    ));
    Ok(ChangeMask::empty())
}

// Timing configuration.
pub fn x91_03(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    let (tbase, pbase, pmask) = (ub(b, 4), ub(b, 5), ub(b, 6));
    ctx.note(format!(
        "{}: time base {tbase} ({}) PPS base {pbase} ({}) PPS mask {pmask} ({}) res x{:x} \
         width {} offset {}",
        p.tag,
        value_name(u32::from(tbase), TIME_BASE_V1),
        value_name(u32::from(pbase), TIME_BASE_V1),
        value_name(u32::from(pmask), PPS_MASK_V1),
        beu16(b, 7),
        beu16(b, 9),
        bed64(b, 11)
    ));
    Ok(ChangeMask::empty())
}

// Self-survey configuration.
pub fn x91_04(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    let mask = ub(b, 4);
    ctx.note(format!(
        "{}: mask x{mask:x} ({}) length {} eph {} epv {}",
        p.tag,
        flag_names(u32::from(mask), SELF_SURVEY_MASK_V1),
        beu32(b, 5),
        beu16(b, 9),
        beu16(b, 11)
    ));
    Ok(ChangeMask::empty())
}

// Periodic output configuration. Each output has a two-bit rate field.
pub fn x91_05(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    let otype = beu32(b, 5);
    let rates: Vec<String> = (0..6)
        .map(|i| ((otype >> (i * 2)) & 3).to_string())
        .collect();
    ctx.note(format!(
        "{}: port {} type x{otype:x} ({}) res x{:x} x{:x} x{:x}",
        p.tag,
        ub(b, 4),
        rates.join(" "),
        beu32(b, 9),
        beu32(b, 13),
        beu32(b, 17)
    ));
    Ok(ChangeMask::empty())
}

// Reset cause.
pub fn x92_01(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let cause = ub(p.buf, 6);
    ctx.warn(format!(
        "{}: reset cause {cause} ({})",
        p.tag,
        value_name(u32::from(cause), RESET_TYPE_V1)
    ));
    Ok(ChangeMask::empty())
}

// Production information.
pub fn x93_00(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    let serial = beu32(b, 5);
    let machine = beu16(b, 30);
    ctx.identity.serial = format!("{serial:x}");
    ctx.identity.subtype1 = format!(
        "hw {machine} {:02}/{:02}/{:04}",
        ub(b, 25),
        ub(b, 26),
        beu16(b, 27)
    );
    ctx.warn(format!(
        "{}: res {} serial {serial} x{:x} x{:x} build {:02}:00 {} options x{:x}",
        p.tag,
        ub(b, 4),
        beu64(b, 9),
        beu64(b, 17),
        ub(b, 29),
        ctx.identity.subtype1,
        beu32(b, 64)
    ));
    Ok(ChangeMask::DEVICE_ID)
}

// Command acknowledgement. The two shapes differ only by length.
pub fn xa0_00(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    match p.length {
        3 => ctx.note(format!("{}: command {}", p.tag, ub(b, 6))),
        8 => ctx.note(format!(
            "{}: command {} status {} frame {}",
            p.tag,
            ub(b, 6),
            ub(b, 7),
            beu16(b, 8)
        )),
        other => ctx.warn(format!("{}: bad length {other}", p.tag)),
    }
    Ok(ChangeMask::empty())
}

// Timing information. First packet of each epoch.
pub fn xa1_00(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    let tow = beu32(b, 4);
    let week = beu16(b, 8);
    let (hour, minute, second) = (ub(b, 10), ub(b, 11), ub(b, 12));
    let (month, day, year) = (ub(b, 13), ub(b, 14), beu16(b, 15));
    let (tbase, pbase, tflags) = (ub(b, 17), ub(b, 18), ub(b, 19));
    let utc_offset = bes16(b, 20);
    let q_err = bef32(b, 22);
    let bias = bef32(b, 26);
    let bias_rate = bef32(b, 30);

    ctx.clock.week = u32::from(week);
    // seconds to picoseconds
    nav.q_err = Some((q_err * 10e12) as i64);
    // the broken-down date excludes leap seconds
    u.time = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
        .and_then(|d| d.and_hms_opt(u32::from(hour), u32::from(minute), u32::from(second)))
        .map(|t| t.and_utc() - TimeDelta::seconds(i64::from(utc_offset)));
    ctx.clock.set_leap_seconds(i32::from(utc_offset));

    ctx.note(format!(
        "{}: tow {tow} week {week} {hour:02}:{minute:02}:{second:02} {year:04}/{month:02}/{day:02} \
         tbase {tbase} ({}) pbase {pbase} ({}) tflags x{tflags:x} ({}) UTC offset {utc_offset} \
         qErr {q_err} bias {bias}/{bias_rate}",
        p.tag,
        value_name(u32::from(tbase), TIME_BASE_V1),
        value_name(u32::from(pbase), TIME_BASE_V1),
        flag_names(u32::from(tflags), TIME_FLAGS_V1),
    ));

    let mut mask = ChangeMask::CLEAR;
    if tflags & 2 != 0 {
        mask |= ChangeMask::TIME;
        if tflags & 1 != 0 {
            mask |= ChangeMask::NTP_TIME;
        }
    }
    if ctx.identity.hardware_code == 0 {
        ctx.send(Command::query(0x90, 0x01));
    }
    Ok(mask)
}

// Frequency information.
pub fn xa1_02(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    let temperature = bef32(b, 17);
    u.temperature = Some(temperature);
    ctx.note(format!(
        "{}: DAC voltage {} value {} holdover {} time {} temp {temperature}",
        p.tag,
        bef32(b, 6),
        beu16(b, 10),
        ub(b, 12),
        beu32(b, 13)
    ));
    Ok(ChangeMask::empty())
}

// Position information.
pub fn xa1_11(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    let pmask = ub(b, 4);
    let ftype = ub(b, 5);
    let (d1, d2, d3) = (bed64(b, 6), bed64(b, 14), bed64(b, 22));
    let (v1, v2, v3) = (bef32(b, 30), bef32(b, 34), bef32(b, 38));
    let pdop = bef32(b, 42);

    let mut mask = ChangeMask::MODE | ChangeMask::DOP | ChangeMask::HERR | ChangeMask::VERR;
    if dop_in_range(pdop) {
        nav.dop.pdop = Some(pdop);
    }
    u.eph = Some(bef32(b, 46));
    u.epv = Some(bef32(b, 50));

    if pmask & 2 == 0 {
        u.latitude = Some(d1);
        u.longitude = Some(d2);
        let reference = if pmask & 4 == 0 {
            AltitudeRef::Hae
        } else {
            AltitudeRef::Msl
        };
        u.set_altitude(reference, d3);
        mask |= ChangeMask::LATLON | ChangeMask::ALTITUDE;
    } else {
        u.ecef_x = Some(d1);
        u.ecef_y = Some(d2);
        u.ecef_z = Some(d3);
        mask |= ChangeMask::ECEF;
    }
    // bit 0 set means the position is surveyed and the velocity meaningless
    if pmask & 1 == 0 {
        if pmask & 8 == 0 {
            u.set_enu_velocity(v1, v2, v3);
            mask |= ChangeMask::VNED;
        } else {
            u.ecef_vx = Some(v1);
            u.ecef_vy = Some(v2);
            u.ecef_vz = Some(v3);
            mask |= ChangeMask::VECEF;
        }
    }
    u.mode = match ftype {
        1 => FixMode::TwoD,
        2 => FixMode::ThreeD,
        _ => FixMode::NoFix,
    };
    ctx.note(format!(
        "{}: mode {} pmask x{pmask:x} ({}) ftype {ftype} ({}) pos {d1} {d2} {d3} \
         vel {v1} {v2} {v3} PDOP {pdop} eph {:?} epv {:?}",
        p.tag,
        u.mode,
        flag_names(u32::from(pmask), POSITION_MASK_V1),
        value_name(u32::from(ftype), FIX_TYPE_V1),
        u.eph,
        u.epv
    ));
    Ok(mask)
}

// Satellite information, one channel per packet, numbered from 1.
pub fn xa2_00(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    let number = usize::from(ub(b, 4));
    if number == 0 || number > MAX_CHANNELS {
        return Err(DecodeError::BadSatelliteIndex {
            tag: p.tag,
            index: number,
        });
    }
    let svtype = ub(b, 5);
    let svid = ub(b, 6);
    let az = bef32(b, 7);
    let el = bef32(b, 11);
    let snr = bef32(b, 15);
    let flags = beu32(b, 19);
    // measurement time, not the current time
    let tow = beu32(b, 23);

    if number == 1 {
        nav.skyview.clear();
        nav.skyview.satellites_visible = ctx.burst.last_chan_seen;
    }
    ctx.burst.last_chan_seen = number;
    ctx.last_a200 = tow;
    nav.skyview.skyview_time = ctx.clock.resolve_current(TimeOfWeek::from_secs(tow));

    let signal = v1_signal(svtype);
    let prn = signal.map_or(0, |(gnss, _)| nmea_prn(gnss, svid));
    if prn <= 0 {
        ctx.warn(format!(
            "{}({number}): bad PRN: svtype {svtype} prn {svid} PRN {prn}",
            p.tag
        ));
    }
    if let Some(channel) = nav.skyview.channel_mut(number - 1) {
        channel.gnss = signal.map(|(gnss, _)| gnss);
        channel.sigid = signal.map_or(0, |(_, sigid)| sigid);
        channel.svid = svid;
        channel.prn = prn;
        if flags & 1 != 0 {
            if el.abs() <= 90.0 {
                channel.elevation = Some(el);
            }
            if (0.0..360.0).contains(&az) {
                channel.azimuth = Some(az);
            }
        }
        channel.snr = Some(snr);
        if flags & 6 != 0 {
            channel.used = true;
        }
    }

    let mut mask = ChangeMask::empty();
    // assume the burst is as long as the last one
    if number >= nav.skyview.satellites_visible
        && (i64::from(ctx.last_a311) - i64::from(ctx.last_a200)).abs() > SKYVIEW_FLUSH_SECS
    {
        mask |= ChangeMask::SATELLITE;
        ctx.last_a200 = 0;
    }
    ctx.note(format!(
        "{}: num {number} type {svtype} ({}) PRN {svid} az {az} el {el} snr {snr} \
         flags x{flags:x} ({}) tow {tow}",
        p.tag,
        value_name(u32::from(svtype), SV_TYPE_V1),
        flag_names(flags, SAT_FLAGS_V1)
    ));
    Ok(mask)
}

// System alarms.
pub fn xa3_00(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    let minor = beu32(b, 4);
    let major = beu32(b, 12);

    u.antenna = Some(if minor & 1 != 0 {
        AntennaStatus::Open
    } else if minor & 2 != 0 {
        AntennaStatus::Short
    } else {
        AntennaStatus::Ok
    });
    // not tracking anything: assume a surveyed-in timing receiver
    u.status = if major & 1 != 0 {
        FixStatus::DeadReckoning
    } else {
        FixStatus::Gps
    };
    if major & 0x80 != 0 {
        u.jam = Some(255);
    } else if major & 0x40 != 0 {
        u.jam = Some(128);
    }
    ctx.note(format!(
        "{}: minor x{minor:04x} ({}) res x{:x} major x{major:04x} ({}) res x{:x} status {}",
        p.tag,
        flag_names(minor, MINOR_ALARMS_V1),
        beu32(b, 8),
        flag_names(major, MAJOR_ALARMS_V1),
        beu32(b, 16),
        u.status
    ));
    Ok(ChangeMask::STATUS)
}

// Receiver status. Last packet of each epoch.
pub fn xa3_11(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    let rec_mode = ub(b, 4);
    let rec_status = ub(b, 5);
    let survey = ub(b, 6);
    let (pdop, hdop, vdop, tdop) = (bef32(b, 7), bef32(b, 11), bef32(b, 15), bef32(b, 19));
    let temperature = bef32(b, 23);
    u.temperature = Some(temperature);

    let mut mask = apply_dops(nav, pdop, hdop, vdop, tdop) | ChangeMask::REPORT;

    // no time of week here; borrow the last xa2-00's
    ctx.last_a311 = ctx.last_a200;
    if ctx.last_a200 > 0 {
        ctx.last_a200 = 0;
        mask |= ChangeMask::SATELLITE;
    }

    match rec_status {
        0 => {
            u.mode = FixMode::TwoD;
            mask |= ChangeMask::MODE;
        }
        1 => {
            u.mode = FixMode::ThreeD;
            mask |= ChangeMask::MODE;
        }
        4 => {
            u.status = FixStatus::Time;
            mask |= ChangeMask::STATUS;
        }
        _ => {}
    }
    match rec_status {
        0 | 4 | 5 | 6 => {
            u.status = FixStatus::Gps;
            mask |= ChangeMask::STATUS;
        }
        1..=3 => {
            u.status = FixStatus::Unknown;
            mask |= ChangeMask::STATUS;
        }
        255 => {
            u.mode = FixMode::ThreeD;
            u.status = FixStatus::Time;
            mask |= ChangeMask::STATUS | ChangeMask::MODE;
        }
        _ => {}
    }
    if pdop > 10.0 {
        u.status = FixStatus::DeadReckoning;
        mask |= ChangeMask::STATUS;
    }

    ctx.note(format!(
        "{}: mode {} status {} rm {rec_mode} ({}) stat {rec_status} ({}) survey {survey} \
         PDOP {pdop} HDOP {hdop} VDOP {vdop} TDOP {tdop} temp {temperature}",
        p.tag,
        u.mode,
        u.status,
        value_name(u32::from(rec_mode), RECEIVER_MODE_V1),
        value_name(u32::from(rec_status), DECODE_STATUS_V1)
    ));
    Ok(mask)
}

// Error report for something we sent.
pub fn xa3_21(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    let code = ub(b, 6);
    ctx.warn(format!(
        "{}: packet x{:02x}-{:02x} error {code} ({})",
        p.tag,
        ub(b, 4),
        ub(b, 5),
        value_name(u32::from(code), ERROR_CODES_V1)
    ));
    Ok(ChangeMask::empty())
}

// Debug output type.
pub fn xd0_00(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    ctx.warn(format!("{}: debug output type {}", p.tag, ub(p.buf, 6)));
    Ok(ChangeMask::empty())
}

// Debug output.
pub fn xd0_01(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    ctx.warn(format!(
        "{}: debug type {} level {}",
        p.tag,
        ub(p.buf, 6),
        ub(p.buf, 7)
    ));
    Ok(ChangeMask::empty())
}

// Raw GNSS data, xd0-40 and xd0-41. Not decoded.
pub fn xd0_raw(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    ctx.warn(format!("{}: raw GNSS data, length {}", p.tag, p.length));
    Ok(ChangeMask::empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tsip::epoch::GpsClock;
    use crate::tsip::error::PacketTag;
    use crate::tsip::gnss::GnssId;

    fn ctx() -> DecodeContext {
        DecodeContext::new(GpsClock::new(18, 2), false, false)
    }

    // Payload from the sub id with room for `length` declared bytes.
    fn frame(sub: u8, length: usize) -> Vec<u8> {
        let mut buf = vec![0u8; length + 3];
        buf[0] = sub;
        buf[1..3].copy_from_slice(&(length as u16).to_be_bytes());
        buf[3] = 0x02;
        buf
    }

    fn packet(id: u8, buf: &[u8]) -> Packet<'_> {
        Packet {
            tag: PacketTag::new(id, Some(buf[0])),
            buf,
            length: buf.len() - 3,
        }
    }

    fn put_f32(buf: &mut [u8], off: usize, value: f32) {
        buf[off..off + 4].copy_from_slice(&value.to_be_bytes());
    }

    fn sat(number: u8, svtype: u8, prn: u8, flags: u32, tow: u32) -> Vec<u8> {
        let mut buf = frame(0x00, 25);
        buf[4] = number;
        buf[5] = svtype;
        buf[6] = prn;
        put_f32(&mut buf, 7, 120.0);
        put_f32(&mut buf, 11, 45.0);
        put_f32(&mut buf, 15, 38.5);
        buf[19..23].copy_from_slice(&flags.to_be_bytes());
        buf[23..27].copy_from_slice(&tow.to_be_bytes());
        buf
    }

    #[test]
    fn test_xa1_00_sets_time_and_clears() {
        let mut ctx = ctx();
        let mut nav = NavState::new();
        let mut u = Fix::default();
        let mut buf = frame(0x00, 32);
        buf[4..8].copy_from_slice(&100_u32.to_be_bytes());
        buf[8..10].copy_from_slice(&2300_u16.to_be_bytes());
        buf[10] = 12;
        buf[13] = 2;
        buf[14] = 3;
        buf[15..17].copy_from_slice(&2024_u16.to_be_bytes());
        buf[19] = 0x03;
        buf[20..22].copy_from_slice(&18_i16.to_be_bytes());
        let mask = xa1_00(&mut ctx, &packet(0xa1, &buf), &mut nav, &mut u).unwrap();
        assert_eq!(
            mask,
            ChangeMask::CLEAR | ChangeMask::TIME | ChangeMask::NTP_TIME
        );
        assert_eq!(ctx.clock.week, 2300);
        assert_eq!(ctx.clock.leap_seconds, 18);
        assert!(ctx.clock.leap_valid);
        let expected = NaiveDate::from_ymd_opt(2024, 2, 3)
            .and_then(|d| d.and_hms_opt(11, 59, 42))
            .map(|t| t.and_utc());
        assert_eq!(u.time, expected);
        // identity unknown, so it asks for the version
        let sent = ctx.take_commands();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].tag().to_string(), "x90-01");
    }

    #[test]
    fn test_xa1_00_without_time_valid() {
        let mut ctx = ctx();
        ctx.identity.hardware_code = 3100;
        let mut nav = NavState::new();
        let mut u = Fix::default();
        let buf = frame(0x00, 32);
        let mask = xa1_00(&mut ctx, &packet(0xa1, &buf), &mut nav, &mut u).unwrap();
        assert_eq!(mask, ChangeMask::CLEAR);
        assert!(ctx.take_commands().is_empty());
    }

    #[test]
    fn test_xa1_11_lla_msl_with_enu_velocity() {
        let mut ctx = ctx();
        let mut nav = NavState::new();
        let mut u = Fix::default();
        let mut buf = frame(0x11, 52);
        buf[4] = 0x04;
        buf[5] = 2;
        buf[6..14].copy_from_slice(&40.5_f64.to_be_bytes());
        buf[14..22].copy_from_slice(&(-74.25_f64).to_be_bytes());
        buf[22..30].copy_from_slice(&12.0_f64.to_be_bytes());
        put_f32(&mut buf, 30, 1.0);
        put_f32(&mut buf, 34, 2.0);
        put_f32(&mut buf, 38, 0.5);
        put_f32(&mut buf, 42, 1.5);
        let mask = xa1_11(&mut ctx, &packet(0xa1, &buf), &mut nav, &mut u).unwrap();
        assert!(mask.contains(ChangeMask::LATLON | ChangeMask::ALTITUDE | ChangeMask::VNED));
        assert!(!mask.contains(ChangeMask::ECEF));
        assert_eq!(u.mode, FixMode::ThreeD);
        assert_eq!(u.alt_msl, Some(12.0));
        assert_eq!(u.alt_hae, None);
        assert_eq!(u.vel_e, Some(1.0));
        assert_eq!(u.vel_n, Some(2.0));
        assert_eq!(u.vel_d, Some(-0.5));
        assert_eq!(nav.dop.pdop, Some(1.5));
    }

    #[test]
    fn test_xa1_11_surveyed_ecef_has_no_velocity() {
        let mut ctx = ctx();
        let mut nav = NavState::new();
        let mut u = Fix::default();
        let mut buf = frame(0x11, 52);
        buf[4] = 0x03;
        let mask = xa1_11(&mut ctx, &packet(0xa1, &buf), &mut nav, &mut u).unwrap();
        assert!(mask.contains(ChangeMask::ECEF));
        assert!(!mask.intersects(ChangeMask::VNED | ChangeMask::VECEF));
        assert_eq!(u.mode, FixMode::NoFix);
        assert_eq!(nav.dop.pdop, None);
    }

    #[test]
    fn test_xa2_00_rejects_bad_index_untouched() {
        let mut ctx = ctx();
        let mut nav = NavState::new();
        let mut u = Fix::default();
        for number in [0, 65] {
            let buf = sat(number, 1, 5, 1, 1000);
            let err = xa2_00(&mut ctx, &packet(0xa2, &buf), &mut nav, &mut u).unwrap_err();
            assert!(matches!(err, DecodeError::BadSatelliteIndex { .. }));
        }
        assert_eq!(ctx.last_a200, 0);
        assert_eq!(ctx.burst.last_chan_seen, 0);
    }

    #[test]
    fn test_xa2_00_first_burst_flushes_itself() {
        let mut ctx = ctx();
        let mut nav = NavState::new();
        let mut u = Fix::default();
        ctx.clock.week = 2300;
        let buf = sat(1, 17, 11, 0x03, 5000);
        let mask = xa2_00(&mut ctx, &packet(0xa2, &buf), &mut nav, &mut u).unwrap();
        // no count yet and no xa3-11 either
        assert_eq!(mask, ChangeMask::SATELLITE);
        assert_eq!(ctx.last_a200, 0);
        let chan = nav.skyview.channels[0];
        assert_eq!(chan.gnss, Some(GnssId::Galileo));
        assert_eq!(chan.prn, 311);
        assert_eq!(chan.elevation, Some(45.0));
        assert_eq!(chan.azimuth, Some(120.0));
        assert!(chan.used);
        assert!(nav.skyview.skyview_time.is_some());
    }

    #[test]
    fn test_xa2_00_burst_then_xa3_11_flush() {
        let mut ctx = ctx();
        let mut nav = NavState::new();
        let mut u = Fix::default();
        ctx.clock.week = 2300;
        // an xa3-11 followed the last burst
        ctx.last_a311 = 5000;

        let buf = sat(1, 1, 5, 0x03, 5001);
        let mask = xa2_00(&mut ctx, &packet(0xa2, &buf), &mut nav, &mut u).unwrap();
        assert!(mask.is_empty());
        let buf = sat(2, 1, 7, 0x00, 5001);
        let mask = xa2_00(&mut ctx, &packet(0xa2, &buf), &mut nav, &mut u).unwrap();
        assert!(mask.is_empty());
        let chan = nav.skyview.channels[1];
        assert_eq!(chan.prn, 7);
        assert_eq!(chan.elevation, None);
        assert!(!chan.used);

        let buf = frame(0x11, 29);
        let mut u = Fix::default();
        let mask = xa3_11(&mut ctx, &packet(0xa3, &buf), &mut nav, &mut u).unwrap();
        assert!(mask.contains(ChangeMask::REPORT | ChangeMask::SATELLITE));
        assert_eq!(ctx.last_a311, 5001);
        assert_eq!(ctx.last_a200, 0);

        // the next burst starts by publishing the count of this one
        let buf = sat(1, 1, 3, 0x01, 5002);
        xa2_00(&mut ctx, &packet(0xa2, &buf), &mut nav, &mut u).unwrap();
        assert_eq!(nav.skyview.satellites_visible, 2);
        assert_eq!(nav.skyview.channels[1].prn, 0);
    }

    #[test]
    fn test_xa3_00_alarms() {
        let mut ctx = ctx();
        let mut nav = NavState::new();
        let mut u = Fix::default();
        let mut buf = frame(0x00, 18);
        buf[4..8].copy_from_slice(&2_u32.to_be_bytes());
        buf[12..16].copy_from_slice(&0xc1_u32.to_be_bytes());
        let mask = xa3_00(&mut ctx, &packet(0xa3, &buf), &mut nav, &mut u).unwrap();
        assert_eq!(mask, ChangeMask::STATUS);
        assert_eq!(u.antenna, Some(AntennaStatus::Short));
        assert_eq!(u.status, FixStatus::DeadReckoning);
        assert_eq!(u.jam, Some(255));
    }

    #[test]
    fn test_xa3_11_status_switches() {
        let mut ctx = ctx();
        let mut nav = NavState::new();

        let mut u = Fix::default();
        let mut buf = frame(0x11, 29);
        buf[5] = 255;
        put_f32(&mut buf, 7, 2.0);
        let mask = xa3_11(&mut ctx, &packet(0xa3, &buf), &mut nav, &mut u).unwrap();
        assert_eq!(u.mode, FixMode::ThreeD);
        assert_eq!(u.status, FixStatus::Time);
        assert!(mask.contains(ChangeMask::MODE | ChangeMask::STATUS | ChangeMask::DOP));
        assert!(!mask.contains(ChangeMask::SATELLITE));

        // OD clock is overridden by the second switch
        let mut u = Fix::default();
        buf[5] = 4;
        xa3_11(&mut ctx, &packet(0xa3, &buf), &mut nav, &mut u).unwrap();
        assert_eq!(u.status, FixStatus::Gps);

        let mut u = Fix::default();
        buf[5] = 2;
        put_f32(&mut buf, 7, 12.0);
        xa3_11(&mut ctx, &packet(0xa3, &buf), &mut nav, &mut u).unwrap();
        assert_eq!(u.status, FixStatus::DeadReckoning);
        assert_eq!(u.mode, FixMode::NotSeen);
    }

    #[test]
    fn test_x90_01_identity() {
        let mut ctx = ctx();
        let mut nav = NavState::new();
        let mut u = Fix::default();
        let mut buf = frame(0x01, 20);
        buf[4] = 1;
        buf[5] = 12;
        buf[6] = 3;
        buf[7] = 6;
        buf[8] = 30;
        buf[9..11].copy_from_slice(&2021_u16.to_be_bytes());
        buf[11..13].copy_from_slice(&3100_u16.to_be_bytes());
        buf[13] = 7;
        buf[14..21].copy_from_slice(b"RES 720");
        let mask = x90_01(&mut ctx, &packet(0x90, &buf), &mut nav, &mut u).unwrap();
        assert_eq!(mask, ChangeMask::DEVICE_ID);
        assert_eq!(ctx.identity.hardware_code, 3100);
        assert_eq!(ctx.identity.subtype, "fw 1.12 3 06/30/2021 RES 720");
    }

    #[test]
    fn test_x93_00_serial_and_build() {
        let mut ctx = ctx();
        let mut nav = NavState::new();
        let mut u = Fix::default();
        let mut buf = frame(0x00, 78);
        buf[5..9].copy_from_slice(&0x00ab_cdef_u32.to_be_bytes());
        buf[25] = 9;
        buf[26] = 4;
        buf[27..29].copy_from_slice(&2020_u16.to_be_bytes());
        buf[30..32].copy_from_slice(&42_u16.to_be_bytes());
        let mask = x93_00(&mut ctx, &packet(0x93, &buf), &mut nav, &mut u).unwrap();
        assert_eq!(mask, ChangeMask::DEVICE_ID);
        assert_eq!(ctx.identity.serial, "abcdef");
        assert_eq!(ctx.identity.subtype1, "hw 42 09/04/2020");
    }

    #[test]
    fn test_xa0_00_odd_length_only_warns() {
        let mut ctx = ctx();
        let mut nav = NavState::new();
        let mut u = Fix::default();
        let buf = frame(0x00, 5);
        let mask = xa0_00(&mut ctx, &packet(0xa0, &buf), &mut nav, &mut u).unwrap();
        assert!(mask.is_empty());
        assert!(ctx.diagnostics()[0].contains("bad length 5"));
    }
}
