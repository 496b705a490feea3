// Single-byte-id reports. The dispatcher has already applied each route's
// length guard; counts carried inside a payload are checked here.

use super::{
    DecodeContext, Packet, RAD_2_DEG, apply_dops, meters_to_ns, require,
};
use crate::tsip::bytes::{bed64, bef32, bes16, beu16, beu32, name_field, sb, ub};
use crate::tsip::codec::Command;
use crate::tsip::epoch::TimeOfWeek;
use crate::tsip::error::DecodeError;
use crate::tsip::fix::{AltitudeRef, AntennaStatus, ChangeMask, Fix, FixMode, FixStatus, NavState};
use crate::tsip::gnss::legacy_sat_id;
use crate::tsip::identity::{IO1_8F20, IO1_DP, IO1_ECEF, IO1_MSL, IO4_DBHZ, machine_name};
use crate::tsip::skyview::{MAX_CHANNELS, SatHealth};
use crate::tsip::tables::{
    DECODE_STATUS, ERROR_CODES, FIX_DIMENSION, STATUS1, STATUS2, SV_BAD, SV_TYPE, SV_USED_FLAGS,
    X4C_DYNAMICS, X55_AUX, X55_POSITION, X55_TIMING, X55_VELOCITY, X57_FIX_MODE, X57_INFO,
    X5C_ACQUISITION, X5C_EPHEMERIS, X82_MODE, flag_names, value_name,
};
use log::trace;

type Outcome = Result<ChangeMask, DecodeError>;

// Packet Received: the receiver could not parse something we sent.
pub fn x13(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let id = ub(p.buf, 0);
    let data = if p.length >= 2 { ub(p.buf, 1) } else { 0 };
    ctx.warn(format!("{}: report packet x{id:02x} {data:02x} not parsable", p.tag));
    if id == 0x8e && data == 0x23 {
        // no compact superpacket here, ask for x8f-20 instead
        ctx.send(Command::legacy(&[0x8e, 0x20, 0x01]));
    }
    Ok(ChangeMask::empty())
}

// Version information, x1c-81 and x1c-83.
pub fn x1c(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let result = match ub(p.buf, 0) {
        0x81 => require(p, 10).map(|()| x1c_81(ctx, p)),
        0x83 => require(p, 13).map(|()| x1c_83(ctx, p)),
        sub => {
            ctx.warn(format!("{}: unhandled subpacket x{sub:02x}", p.tag));
            Ok(ChangeMask::empty())
        }
    };
    // stored production parameters, x8f-42
    ctx.send(Command::legacy(&[0x8e, 0x42]));
    result
}

fn x1c_81(ctx: &mut DecodeContext, p: &Packet<'_>) -> ChangeMask {
    let b = p.buf;
    let name = name_field(b, 10, usize::from(ub(b, 9)));
    ctx.identity.subtype = format!(
        "fw {}.{} {} {:02}/{:02}/{:04} {}",
        ub(b, 2),
        ub(b, 3),
        ub(b, 4),
        ub(b, 5),
        ub(b, 6),
        beu16(b, 7),
        name
    );
    ctx.note(format!("{}: firmware version: {}", p.tag, ctx.identity.subtype));
    if ctx.identity.subtype1.is_empty() {
        ctx.send(Command::legacy(&[0x1c, 0x03]));
    }
    ChangeMask::DEVICE_ID
}

fn x1c_83(ctx: &mut DecodeContext, p: &Packet<'_>) -> ChangeMask {
    let b = p.buf;
    let hardware_code = beu16(b, 10);
    let name = name_field(b, 13, usize::from(ub(b, 12)));
    ctx.identity.hardware_code = hardware_code;
    ctx.identity.serial = format!("{:x}", beu32(b, 1));
    ctx.identity.subtype1 = format!(
        "hw {:02}/{:02}/{:04} {:02} {:04} {}",
        ub(b, 6),
        ub(b, 5),
        beu16(b, 7),
        ub(b, 9),
        hardware_code,
        name
    );
    ctx.note(format!(
        "{}: hardware version {} serial {}",
        p.tag, ctx.identity.subtype1, ctx.identity.serial
    ));
    if let Some(family) = ctx.identity.select_configuration() {
        let commands = family.commands(ctx.passive);
        ctx.send_all(commands);
    }
    ChangeMask::DEVICE_ID
}

// GPS time. Current receiver time, not the time of a fix.
pub fn x41(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, u: &mut Fix) -> Outcome {
    let ftow = bef32(p.buf, 0);
    let week = bes16(p.buf, 4);
    let leap = bef32(p.buf, 6);
    let mut mask = ChangeMask::empty();
    if ftow >= 0.0 && leap > 10.0 {
        ctx.clock.set_leap_seconds(leap.round() as i32);
        let week = u32::try_from(week).unwrap_or(0);
        u.time = ctx.clock.resolve(week, TimeOfWeek::from_secs_f64(ftow));
        mask |= ChangeMask::TIME | ChangeMask::NTP_TIME | ChangeMask::CLEAR;
    }
    ctx.note(format!("{}: GPS time tow {ftow} week {week} leap {leap}", p.tag));
    Ok(mask)
}

// Single-precision ECEF position.
pub fn x42(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    u.ecef_x = Some(bef32(b, 0));
    u.ecef_y = Some(bef32(b, 4));
    u.ecef_z = Some(bef32(b, 8));
    let ftow = bef32(b, 12);
    let tow = TimeOfWeek::from_secs_f64(ftow);
    u.time = ctx.clock.resolve_current(tow);
    let mask = ChangeMask::ECEF | ChangeMask::TIME | ChangeMask::NTP_TIME | ctx.epoch(tow);
    ctx.note(format!(
        "{}: SP-XYZ {:?} {:?} {:?} tow {ftow}",
        p.tag, u.ecef_x, u.ecef_y, u.ecef_z
    ));
    Ok(mask)
}

// Single-precision ECEF velocity.
pub fn x43(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    u.ecef_vx = Some(bef32(b, 0));
    u.ecef_vy = Some(bef32(b, 4));
    u.ecef_vz = Some(bef32(b, 8));
    let bias_rate = bef32(b, 12);
    nav.clock_drift = Some(meters_to_ns(bias_rate));
    let ftow = bef32(b, 16);
    let tow = TimeOfWeek::from_secs_f64(ftow);
    u.time = ctx.clock.resolve_current(tow);
    let mask = ChangeMask::VECEF | ChangeMask::TIME | ChangeMask::NTP_TIME | ctx.epoch(tow);
    ctx.note(format!(
        "{}: Vel XYZ {:?} {:?} {:?} rate {bias_rate} tow {ftow}",
        p.tag, u.ecef_vx, u.ecef_vy, u.ecef_vz
    ));
    Ok(mask)
}

// Software version; starts the identity chain.
pub fn x45(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    ctx.identity.subtype = format!(
        "sw {}.{} {:02}/{:02}/{:04} hw {}.{} {:02}/{:02}/{:04}",
        ub(b, 0),
        ub(b, 1),
        ub(b, 2),
        ub(b, 3),
        u32::from(ub(b, 4)) + 1900,
        ub(b, 5),
        ub(b, 6),
        ub(b, 7),
        ub(b, 8),
        u32::from(ub(b, 9)) + 2000
    );
    ctx.note(format!("{}: software version: {}", p.tag, ctx.identity.subtype));
    // I/O options, then the firmware component version
    ctx.send(Command::legacy(&[0x35]));
    ctx.send(Command::legacy(&[0x1c, 0x01]));
    Ok(ChangeMask::DEVICE_ID)
}

// Health of receiver. The mode for "doing fixes" comes from the fix before.
pub fn x46(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, u: &mut Fix) -> Outcome {
    let status = ub(p.buf, 0);
    let ec = ub(p.buf, 1);
    u.mode = match status {
        0 if nav.previous.mode <= FixMode::TwoD => FixMode::TwoD,
        0 => FixMode::ThreeD,
        9..=11 => FixMode::TwoD,
        1..=3 | 8 | 12 | 16 => FixMode::NoFix,
        // 0xbb, GPS time fix in OD mode: always on after survey
        _ => FixMode::NotSeen,
    };
    let mut mask = ChangeMask::empty();
    if u.mode != FixMode::NotSeen {
        mask |= ChangeMask::MODE;
    }
    u.antenna = Some(match ec & 0x30 {
        0x10 => AntennaStatus::Open,
        0x30 => AntennaStatus::Short,
        _ => AntennaStatus::Ok,
    });
    ctx.note(format!(
        "{}: status x{status:02x} ({}) error x{ec:02x} mode {}",
        p.tag,
        value_name(u32::from(status), DECODE_STATUS),
        u.mode
    ));
    trace!("{}: {}", p.tag, flag_names(u32::from(ec), ERROR_CODES));
    Ok(mask)
}

// Signal levels for all tracked satellites.
pub fn x47(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    let count = usize::from(ub(b, 0));
    require(p, 5 * count + 1)?;
    let mut levels = String::new();
    for i in 0..count {
        let prn = ub(b, 5 * i + 1);
        let snr = bef32(b, 5 * i + 2).max(0.0);
        if let Some(channel) = nav.skyview.find_prn_mut(i16::from(prn)) {
            channel.snr = Some(snr);
        }
        levels.push_str(&format!(" {prn}={snr:.1}"));
    }
    ctx.note(format!("{}: signal levels ({count}):{levels}", p.tag));
    Ok(ChangeMask::SATELLITE)
}

// GPS system message, free text.
pub fn x48(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let text = String::from_utf8_lossy(p.buf);
    ctx.note(format!("{}: GPS system message: {}", p.tag, text.trim_end_matches('\0')));
    Ok(ChangeMask::empty())
}

// Single-precision LLA. Often first in the cycle.
pub fn x4a(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    u.latitude = Some(bef32(b, 0) * RAD_2_DEG);
    u.longitude = Some(bef32(b, 4) * RAD_2_DEG);
    let alt = bef32(b, 8);
    u.set_altitude(ctx.altitude_ref, alt);
    let bias = bef32(b, 12);
    nav.clock_bias = Some(meters_to_ns(bias));
    let mut mask = ChangeMask::LATLON | ChangeMask::ALTITUDE;
    if ctx.clock.time_valid {
        let tow = TimeOfWeek::from_secs_f64(bef32(b, 16));
        u.time = ctx.clock.resolve_current(tow);
        mask |= ChangeMask::TIME | ChangeMask::NTP_TIME | ctx.epoch(tow);
    }
    ctx.note(format!(
        "{}: SP-LLA lat {:?} lon {:?} alt {alt} bias {bias}",
        p.tag, u.latitude, u.longitude
    ));
    Ok(mask)
}

// Machine code and status; picks the superpacket level.
pub fn x4b(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let machine_id = ub(p.buf, 0);
    let status1 = ub(p.buf, 1);
    let superpacket = ub(p.buf, 2);
    ctx.identity.machine_id = machine_id;
    if ctx.identity.subtype.is_empty() {
        let (name, ask_version) = machine_name(machine_id);
        if ask_version {
            ctx.send(Command::legacy(&[0x1c, 0x01]));
        }
        ctx.identity.subtype = format!("Machine ID x{machine_id:x}{name}");
    }
    ctx.note(format!(
        "{}: machine id x{machine_id:02x} status1 x{status1:02x} status2 x{superpacket:02x}",
        p.tag
    ));
    trace!(
        "{}: {} {}",
        p.tag,
        flag_names(u32::from(status1), STATUS1),
        flag_names(u32::from(superpacket), STATUS2)
    );
    if superpacket != ctx.identity.superpacket {
        ctx.identity.superpacket = superpacket;
        match superpacket {
            // x8f-20 capable: position via superpacket, ECEF, double precision
            1 => ctx.send(Command::legacy(&[
                0x35,
                IO1_8F20 | IO1_DP | IO1_ECEF,
                0x00,
                0x00,
                IO4_DBHZ,
            ])),
            // no x8f-20 or x8f-23; ask for the broadcast mask
            2 => ctx.send(Command::legacy(&[0x8e, 0xa5])),
            _ => {}
        }
    }
    Ok(ChangeMask::empty())
}

// Operating parameters.
pub fn x4c(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    let dynamics = ub(b, 0);
    ctx.note(format!(
        "{}: OP dyn x{dynamics:02x} ({}) el {:.2} sig {} pdop {} switch {}",
        p.tag,
        value_name(u32::from(dynamics), X4C_DYNAMICS),
        bef32(b, 1) * RAD_2_DEG,
        bef32(b, 5),
        bef32(b, 9),
        bef32(b, 13)
    ));
    Ok(ChangeMask::empty())
}

// Bias and bias rate.
pub fn x54(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    let bias = bef32(b, 0);
    let rate = bef32(b, 4);
    let ftow = bef32(b, 8);
    let tow = TimeOfWeek::from_secs_f64(ftow);
    u.time = ctx.clock.resolve_current(tow);
    let mask = ChangeMask::TIME | ChangeMask::NTP_TIME | ctx.epoch(tow);
    nav.clock_bias = Some(meters_to_ns(bias));
    nav.clock_drift = Some(meters_to_ns(rate));
    ctx.note(format!("{}: one sat bias {bias} rate {rate} tow {ftow}", p.tag));
    Ok(mask)
}

// I/O options echo. Decides the altitude reference for the session.
pub fn x55(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    let (pos, vel, timing, aux) = (ub(b, 0), ub(b, 1), ub(b, 2), ub(b, 3));
    ctx.altitude_ref = if pos & IO1_MSL != 0 {
        AltitudeRef::Msl
    } else {
        AltitudeRef::Hae
    };
    ctx.note(format!(
        "{}: I/O options x{pos:02x} x{vel:02x} x{timing:02x} x{aux:02x} altitude {:?}",
        p.tag, ctx.altitude_ref
    ));
    trace!(
        "{}: {} {} {} {}",
        p.tag,
        flag_names(u32::from(pos), X55_POSITION),
        flag_names(u32::from(vel), X55_VELOCITY),
        flag_names(u32::from(timing), X55_TIMING),
        flag_names(u32::from(aux), X55_AUX)
    );
    if pos & IO1_8F20 != 0 {
        // x8f-20 off, compact x8f-23 on
        ctx.send(Command::legacy(&[0x8e, 0x20, 0x00]));
        ctx.send(Command::legacy(&[0x8e, 0x23, 0x01]));
        ctx.schedule.req_compact = nav.now();
    }
    Ok(ChangeMask::empty())
}

// Velocity fix, East-North-Up.
pub fn x56(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    let (east, north, up) = (bef32(b, 0), bef32(b, 4), bef32(b, 8));
    let rate = bef32(b, 12);
    let ftow = bef32(b, 16);
    let tow = TimeOfWeek::from_secs_f64(ftow);
    u.time = ctx.clock.resolve_current(tow);
    u.set_enu_velocity(east, north, up);
    nav.clock_drift = Some(meters_to_ns(rate));
    let mask = ChangeMask::VNED | ChangeMask::TIME | ChangeMask::NTP_TIME | ctx.epoch(tow);
    ctx.note(format!("{}: Vel ENU {east} {north} {up} rate {rate} tow {ftow}", p.tag));
    Ok(mask)
}

// Information about the last computed fix.
pub fn x57(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    let source = ub(b, 0);
    let diag = ub(b, 1);
    let ftow = bef32(b, 2);
    let week = beu16(b, 6);
    let mut mask = ChangeMask::empty();
    if source == 0x01 {
        // good current fix; only the week is learned here
        let tow = TimeOfWeek::from_secs_f64(ftow);
        let _ = ctx.clock.resolve(u32::from(week), tow);
        mask |= ChangeMask::TIME | ChangeMask::NTP_TIME | ctx.epoch(tow);
    }
    ctx.note(format!(
        "{}: last fix source x{source:02x} ({}) diag x{diag:02x} week {week} tow {ftow}",
        p.tag,
        value_name(u32::from(source), X57_FIX_MODE)
    ));
    trace!("{}: {}", p.tag, flag_names(u32::from(source), X57_INFO));
    Ok(mask)
}

// Raw measurement data. Useless without the pseudorange.
pub fn x5a(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    ctx.note(format!(
        "{}: raw measurement PRN {} len {} snr {} chip {} doppler {} tom {}",
        p.tag,
        ub(b, 0),
        bef32(b, 1),
        bef32(b, 5),
        bef32(b, 9),
        bef32(b, 13),
        bed64(b, 17)
    ));
    Ok(ChangeMask::empty())
}

// Satellite tracking status, one channel per packet.
pub fn x5c(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    let prn = ub(b, 0);
    let index = usize::from(ub(b, 1) >> 3);
    let acq = ub(b, 2);
    let eflag = ub(b, 3);
    let snr = bef32(b, 4);
    // skyview time, not fix time
    let ftow = bef32(b, 8);
    let el = bef32(b, 12) * RAD_2_DEG;
    let az = bef32(b, 16) * RAD_2_DEG;
    let omf = ub(b, 20);

    ctx.burst.begin(&mut nav.skyview, index);
    if index >= MAX_CHANNELS {
        ctx.warn(format!("{}: too many channels ({index})", p.tag));
        return Ok(ChangeMask::empty());
    }
    let mut mask = ChangeMask::empty();
    let used = eflag & 0x10 != 0;
    if used && eflag == 51 {
        u.status = FixStatus::Dgps;
        mask |= ChangeMask::STATUS;
    }
    if ftow > 0.0 {
        nav.skyview.skyview_time = ctx.clock.resolve_current(TimeOfWeek::from_secs_f64(ftow));
    }
    if let Some(channel) = nav.skyview.channel_mut(index) {
        let sat = legacy_sat_id(0, prn);
        channel.prn = i16::from(prn);
        channel.gnss = sat.map(|s| s.gnss);
        channel.svid = sat.map_or(0, |s| s.svid);
        channel.sigid = 0;
        channel.snr = Some(snr);
        channel.elevation = Some(el);
        channel.azimuth = Some(az);
        if eflag & 2 != 0 {
            channel.health = SatHealth::Ok;
        } else if eflag == 1 {
            channel.health = SatHealth::Bad;
        }
        channel.used = used;
    }
    if ctx.burst.complete(&mut nav.skyview, index) {
        mask |= ChangeMask::SATELLITE;
    }
    ctx.note(format!(
        "{}: chan {index} PRN {prn} acq {acq} ({}) eflag x{eflag:02x} ({}) snr {snr:.1} \
         tow {ftow} el {el:.1} az {az:.1} omf {omf}",
        p.tag,
        value_name(u32::from(acq), X5C_ACQUISITION),
        value_name(u32::from(eflag), X5C_EPHEMERIS)
    ));
    Ok(mask)
}

// Satellite tracking status, multi-constellation receivers.
pub fn x5d(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    let prn = ub(b, 0);
    let index = usize::from(ub(b, 1));
    let acq = ub(b, 2);
    let used = ub(b, 3);
    let snr = bef32(b, 4);
    // can be a second behind the fix
    let ftow = bef32(b, 8);
    let el = bef32(b, 12) * RAD_2_DEG;
    let az = bef32(b, 16) * RAD_2_DEG;
    let bad = ub(b, 22);
    let uflags = ub(b, 24);
    let svtype = ub(b, 25);

    ctx.burst.begin(&mut nav.skyview, index);
    if index >= MAX_CHANNELS {
        ctx.warn(format!("{}: too many channels ({index})", p.tag));
        return Ok(ChangeMask::empty());
    }
    if let Some(channel) = nav.skyview.channel_mut(index) {
        let sat = legacy_sat_id(svtype, prn);
        channel.prn = i16::from(prn);
        channel.gnss = sat.map(|s| s.gnss);
        channel.svid = sat.map_or(0, |s| s.svid);
        channel.sigid = 0;
        channel.snr = Some(snr);
        channel.elevation = Some(el);
        channel.azimuth = Some(az);
        channel.used = used != 0;
        channel.health = if bad == 0 { SatHealth::Ok } else { SatHealth::Bad };
    }
    if ftow > 0.0 {
        nav.skyview.skyview_time = ctx.clock.resolve_current(TimeOfWeek::from_secs_f64(ftow));
    }
    let mut mask = ChangeMask::empty();
    if ctx.burst.complete(&mut nav.skyview, index) {
        mask |= ChangeMask::SATELLITE;
    }
    ctx.note(format!(
        "{}: chan {index} type {svtype} ({}) PRN {prn} acq {acq} used {used} snr {snr:.1} \
         tow {ftow} el {el:.1} az {az:.1} bad {}",
        p.tag,
        value_name(u32::from(svtype), SV_TYPE),
        value_name(u32::from(bad), SV_BAD)
    ));
    trace!("{}: {}", p.tag, flag_names(u32::from(uflags), SV_USED_FLAGS));
    Ok(mask)
}

// Mode and status from the 3-bit dimension code shared by x6c and x6d.
fn fix_dimension(code: u8, u: &mut Fix) {
    match code & 7 {
        // clock fix (surveyed in), overdetermined clock fix
        1 | 5 => {
            u.status = FixStatus::Time;
            u.mode = FixMode::ThreeD;
        }
        3 => u.mode = FixMode::TwoD,
        4 => u.mode = FixMode::ThreeD,
        6 => {
            u.status = FixStatus::Dgps;
            u.mode = FixMode::ThreeD;
        }
        // 0 is sometimes no fix and sometimes auto
        _ => u.mode = FixMode::NoFix,
    }
}

fn fix_mask(u: &Fix) -> ChangeMask {
    let mut mask = ChangeMask::MODE | ChangeMask::USED;
    if u.status > FixStatus::Unknown {
        mask |= ChangeMask::STATUS;
    }
    mask
}

// All-in-view satellite selection, with an explicit count byte.
pub fn x6c(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    let fixdm = ub(b, 0);
    let count = usize::from(ub(b, 17));
    require(p, 18 + count)?;

    let (pdop, hdop, vdop, tdop) = (bef32(b, 1), bef32(b, 5), bef32(b, 9), bef32(b, 13));
    let mut mask = apply_dops(nav, pdop, hdop, vdop, tdop);
    fix_dimension(fixdm, u);
    if fixdm & 8 != 0 {
        // manual, surveyed in; no satellites means dead reckoning
        u.status = if count > 0 {
            FixStatus::Time
        } else {
            FixStatus::DeadReckoning
        };
    }
    mask |= fix_mask(u);
    nav.satellites_used = count;
    nav.sats_used = (0..count).map(|i| i16::from(sb(b, 18 + i))).collect();
    ctx.note(format!(
        "{}: AIVSS mode {} status {} used {count} {:?} DOP {pdop:.1} {hdop:.1} {vdop:.1} {tdop:.1}",
        p.tag, u.mode, u.status, nav.sats_used
    ));
    trace!("{}: {}", p.tag, flag_names(u32::from(fixdm), FIX_DIMENSION));
    Ok(mask)
}

// All-in-view satellite selection, count packed in the first byte.
pub fn x6d(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    let fixdm = ub(b, 0);
    let count = usize::from((fixdm >> 4) & 0x0f);
    require(p, 17 + count)?;

    let (pdop, hdop, vdop, tdop) = (bef32(b, 1), bef32(b, 5), bef32(b, 9), bef32(b, 13));
    nav.satellites_used = count;
    let mut mask = apply_dops(nav, pdop, hdop, vdop, tdop);
    fix_dimension(fixdm, u);
    if count == 0 && nav.previous.longitude.is_some() {
        // reports a fix with no satellites
        u.status = FixStatus::DeadReckoning;
    }
    mask |= fix_mask(u);
    nav.sats_used = (0..count).map(|i| i16::from(sb(b, 17 + i))).collect();
    ctx.note(format!(
        "{}: AIVSS mode {} status {} used {count} {:?} DOP {pdop:.1} {hdop:.1} {vdop:.1} {tdop:.1}",
        p.tag, u.mode, u.status, nav.sats_used
    ));
    trace!("{}: {}", p.tag, flag_names(u32::from(fixdm), FIX_DIMENSION));
    Ok(mask)
}

// Differential position fix mode.
pub fn x82(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, u: &mut Fix) -> Outcome {
    let mode = ub(p.buf, 0);
    let mut mask = ChangeMask::empty();
    if mode & 1 == 1 {
        u.status = FixStatus::Dgps;
        mask |= ChangeMask::STATUS;
    }
    ctx.note(format!(
        "{}: DPFM mode {mode} ({})",
        p.tag,
        value_name(u32::from(mode), X82_MODE)
    ));
    Ok(mask)
}

// Double-precision ECEF. Carries no mode, so mode and status are taken
// from the fix in progress and the fix before.
pub fn x83(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    u.ecef_x = Some(bed64(b, 0));
    u.ecef_y = Some(bed64(b, 8));
    u.ecef_z = Some(bed64(b, 16));
    let bias = bed64(b, 24);
    nav.clock_bias = Some(meters_to_ns(bias));
    let ftow = bef32(b, 32);
    let tow = TimeOfWeek::from_secs_f64(ftow);
    u.time = ctx.clock.resolve_current(tow);
    u.status = nav.fix.status;
    u.mode = if nav.previous.mode < FixMode::TwoD {
        FixMode::TwoD
    } else {
        nav.fix.mode
    };
    let mask = ChangeMask::STATUS
        | ChangeMask::MODE
        | ChangeMask::ECEF
        | ChangeMask::TIME
        | ChangeMask::NTP_TIME
        | ctx.epoch(tow);
    ctx.note(format!(
        "{}: DP-XYZ {:?} {:?} {:?} bias {bias} tow {ftow} mode {}",
        p.tag, u.ecef_x, u.ecef_y, u.ecef_z, u.mode
    ));
    Ok(mask)
}

// Double-precision LLA. Mode and status come from the fix before.
pub fn x84(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    u.latitude = Some(bed64(b, 0) * RAD_2_DEG);
    u.longitude = Some(bed64(b, 8) * RAD_2_DEG);
    let alt = bed64(b, 16);
    u.set_altitude(ctx.altitude_ref, alt);
    // the bias is read from the altitude field, as every receiver so far sends it
    let bias = bed64(b, 16);
    nav.clock_bias = Some(meters_to_ns(bias));
    let mut mask = ChangeMask::LATLON | ChangeMask::ALTITUDE;
    if ctx.clock.time_valid {
        let tow = TimeOfWeek::from_secs_f64(bef32(b, 32));
        u.time = ctx.clock.resolve_current(tow);
        mask |= ChangeMask::TIME | ChangeMask::NTP_TIME | ctx.epoch(tow);
    }
    u.status = nav.previous.status;
    u.mode = nav.previous.mode;
    mask |= ChangeMask::STATUS | ChangeMask::MODE;
    ctx.note(format!(
        "{}: DP-LLA lat {:?} lon {:?} alt {alt} {:?} mode {} status {}",
        p.tag, u.latitude, u.longitude, ctx.altitude_ref, u.mode, u.status
    ));
    Ok(mask)
}

// Navigation configuration.
pub fn xbb(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    ctx.note(format!(
        "{}: navigation configuration {} {} {} {} {} {} {} {} {} x{:x}",
        p.tag,
        ub(b, 0),
        ub(b, 1),
        ub(b, 2),
        ub(b, 3),
        bef32(b, 5),
        bef32(b, 9),
        bef32(b, 13),
        bef32(b, 17),
        ub(b, 21),
        ub(b, 27)
    ));
    Ok(ChangeMask::empty())
}
