// Legacy superpackets, x8f-XX. Offsets count the sub code as byte 0.

use super::{
    DecodeContext, Packet, RAD_2_DEG, longitude_from_semicircles, semicircles_to_deg,
};
use crate::tsip::bytes::{bed64, bef32, bes16, bes32, beu16, beu32, ub};
use crate::tsip::epoch::{TimeOfWeek, fix_leap_rollover};
use crate::tsip::error::DecodeError;
use crate::tsip::fix::{AntennaStatus, ChangeMask, Fix, FixMode, FixStatus, NavState};
use crate::tsip::query::Report;
use crate::tsip::skyview::MAX_CHANNELS;
use crate::tsip::tables::{
    BROADCAST_MASK0, CRITICAL_ALARMS, DECODE_STATUS, DISCIPLINE_ACTIVITY, MINOR_ALARMS,
    PPS_INDICATION, PPS_REFERENCE, RECEIVER_MODE, SELF_SURVEY_ENABLE, SELF_SURVEY_SAVE,
    TIMING_FLAGS, X8F20_FIX_FLAGS, flag_names, value_name,
};
use log::trace;

type Outcome = Result<ChangeMask, DecodeError>;

// Fix flags shared by x8f-20 and x8f-23: bit 0 set means no fix.
fn fix_flags(flags: u8, u: &mut Fix) {
    if flags & 0x01 == 0 {
        u.status = if flags & 0x02 != 0 {
            FixStatus::Dgps
        } else {
            FixStatus::Gps
        };
        u.mode = if flags & 0x04 != 0 {
            FixMode::TwoD
        } else {
            FixMode::ThreeD
        };
    } else {
        u.status = FixStatus::Unknown;
        u.mode = FixMode::NoFix;
    }
}

const POSITION_MASK: ChangeMask = ChangeMask::TIME
    .union(ChangeMask::NTP_TIME)
    .union(ChangeMask::LATLON)
    .union(ChangeMask::ALTITUDE)
    .union(ChangeMask::STATUS)
    .union(ChangeMask::MODE)
    .union(ChangeMask::VNED);

// Current datum values.
pub fn x8f_15(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    ctx.note(format!(
        "{}: current datum {} dx {} dy {} dz {} a-axis {} ecc2 {}",
        p.tag,
        bes16(b, 1),
        bed64(b, 3),
        bed64(b, 11),
        bed64(b, 19),
        bed64(b, 27),
        bed64(b, 35)
    ));
    Ok(ChangeMask::empty())
}

// Last fix with extra information (LFwEI).
pub fn x8f_20(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    let num_sv = usize::from(ub(b, 28));
    if num_sv > MAX_CHANNELS {
        return Err(DecodeError::TooManySatellites {
            tag: p.tag,
            count: num_sv,
        });
    }
    let (east, north, up) = (bes16(b, 2), bes16(b, 4), bes16(b, 6));
    let ms = beu32(b, 8);
    let lat = bes32(b, 12);
    let lon = beu32(b, 16);
    let alt = bes32(b, 20);
    let scaling = ub(b, 24);
    let datum = ub(b, 26);
    let fflags = ub(b, 27);
    let leap = ub(b, 29);
    let mut week = u32::from(beu16(b, 30));

    let scale = if scaling & 0x01 != 0 { 0.02 } else { 0.005 };
    // 0x8000 is over range
    if north != i16::MIN {
        u.vel_n = Some(f64::from(north) * scale);
    }
    if east != i16::MIN {
        u.vel_e = Some(f64::from(east) * scale);
    }
    if up != i16::MIN {
        u.vel_d = Some(-f64::from(up) * scale);
    }
    u.latitude = Some(semicircles_to_deg(i64::from(lat)));
    u.longitude = Some(longitude_from_semicircles(lon));
    // always HAE, in mm
    u.alt_hae = Some(f64::from(alt) * 1e-3);
    fix_flags(fflags, u);

    if leap > 10 {
        ctx.clock.set_leap_seconds(i32::from(leap));
        week = fix_leap_rollover(week, u32::from(leap));
    }
    let tow = TimeOfWeek::from_millis(ms);
    u.time = ctx.clock.resolve(week, tow);
    let mask = POSITION_MASK | ctx.epoch(tow);

    nav.satellites_used = num_sv;
    nav.sats_used = (0..num_sv)
        .take_while(|i| p.length >= 33 + i * 2)
        .map(|i| i16::from(ub(b, 32 + i * 2) & 0x1f))
        .collect();
    ctx.note(format!(
        "{}: LFwEI vel {east} {north} {up} tow {ms} lat {:?} lon {:?} alt {:?} \
         datum {datum} fflags x{fflags:02x} numSV {num_sv} ls {leap} week {week} \
         mode {} status {} used {:?}",
        p.tag, u.latitude, u.longitude, u.alt_hae, u.mode, u.status, nav.sats_used
    ));
    trace!("{}: {}", p.tag, flag_names(u32::from(fflags), X8F20_FIX_FLAGS));
    Ok(mask)
}

// Compact superpacket.
pub fn x8f_23(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    let ms = beu32(b, 1);
    let week = u32::from(beu16(b, 5));
    let leap = ub(b, 7);
    let flags = ub(b, 8);
    let lat = bes32(b, 9);
    let lon = beu32(b, 13);
    let alt = bes32(b, 17);
    let (east, north, up) = (bes16(b, 21), bes16(b, 23), bes16(b, 25));

    if leap > 10 {
        ctx.clock.set_leap_seconds(i32::from(leap));
    }
    let tow = TimeOfWeek::from_millis(ms);
    u.time = ctx.clock.resolve(week, tow);
    fix_flags(flags, u);
    u.latitude = Some(semicircles_to_deg(i64::from(lat)));
    u.longitude = Some(longitude_from_semicircles(lon));
    u.alt_hae = Some(f64::from(alt) * 1e-3);
    let scale = if flags & 0x20 != 0 { 0.02 } else { 0.005 };
    u.set_enu_velocity(
        f64::from(east) * scale,
        f64::from(north) * scale,
        f64::from(up) * scale,
    );
    let mask = POSITION_MASK | ctx.epoch(tow);
    // the compact packet arrived, stop waiting for it
    ctx.schedule.req_compact = 0;
    ctx.note(format!(
        "{}: CSP tow {ms} week {week} ls {leap} flags x{flags:02x} lat {:?} lon {:?} \
         alt {:?} mode {} status {}",
        p.tag, u.latitude, u.longitude, u.alt_hae, u.mode, u.status
    ));
    Ok(mask)
}

// Stored production parameters.
pub fn x8f_42(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    ctx.note(format!(
        "{}: production x{:x}-{:x} case serial {:x}-{:x} production {:x} machine id {:x}",
        p.tag,
        ub(b, 1),
        ub(b, 2),
        beu16(b, 3),
        beu32(b, 5),
        beu32(b, 9),
        beu16(b, 15)
    ));
    Ok(ChangeMask::empty())
}

// Packet broadcast mask.
pub fn x8f_a5(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let mask0 = beu16(p.buf, 1);
    let mask1 = beu16(p.buf, 3);
    ctx.note(format!("{}: broadcast mask0 x{mask0:04x} mask1 x{mask1:04x}", p.tag));
    trace!("{}: {}", p.tag, flag_names(u32::from(mask0), BROADCAST_MASK0));
    Ok(ChangeMask::empty())
}

// Self-survey command ack.
pub fn x8f_a6(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    ctx.note(format!(
        "{}: self-survey command x{:x} status x{:x}",
        p.tag,
        ub(p.buf, 1),
        ub(p.buf, 2)
    ));
    Ok(ChangeMask::empty())
}

// Individual satellite solutions. Only the combined clock terms are used.
pub fn x8f_a7(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    let format = ub(b, 1);
    let tow = beu32(b, 2);
    match format {
        0 => {
            let bias = bef32(b, 6);
            let rate = bef32(b, 10);
            nav.clock_bias = Some(bias / 1e9);
            nav.clock_drift = Some(rate / 1e9);
            ctx.note(format!("{}: tow {tow} float bias {bias:e} rate {rate:e}", p.tag));
        }
        1 => {
            // 0.1 ns and ps/s, truncated to whole units
            let bias = i32::from(bes16(b, 6)) / 10;
            let rate = i32::from(bes16(b, 8)) / 1000;
            nav.clock_bias = Some(f64::from(bias));
            nav.clock_drift = Some(f64::from(rate));
            ctx.note(format!("{}: tow {tow} int bias {bias} rate {rate}", p.tag));
        }
        other => ctx.warn(format!("{}: tow {tow} unknown format {other}", p.tag)),
    }
    Ok(ChangeMask::empty())
}

// Self-survey parameters.
pub fn x8f_a9(ctx: &mut DecodeContext, p: &Packet<'_>, _nav: &mut NavState, _u: &mut Fix) -> Outcome {
    let b = p.buf;
    let (enable, save) = (ub(b, 1), ub(b, 2));
    ctx.warn(format!(
        "{}: self-survey {} {} length {} reserved x{:x}",
        p.tag,
        value_name(u32::from(enable), SELF_SURVEY_ENABLE),
        value_name(u32::from(save), SELF_SURVEY_SAVE),
        beu32(b, 3),
        beu32(b, 7)
    ));
    Ok(ChangeMask::empty())
}

// Primary timing packet.
pub fn x8f_ab(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    let secs = beu32(b, 1);
    let week = u32::from(beu16(b, 5));
    let leap = bes16(b, 7);
    let flags = ub(b, 9);

    // the receiver sends time on its own, hold off polling for it
    ctx.schedule.mark(Report::GpsTime, nav.now());

    ctx.clock.leap_seconds = i32::from(leap);
    // UTC time, or GPS time with the offset known
    if flags & 0x01 != 0 || flags & 0x08 == 0 {
        ctx.clock.leap_valid = true;
    }
    let tow = TimeOfWeek::from_secs(secs);
    let mut mask = ChangeMask::empty();
    if flags & 0x14 == 0 {
        // good time, not test mode
        u.time = ctx.clock.resolve(week, tow);
        mask |= ChangeMask::TIME | ChangeMask::NTP_TIME;
    }
    mask |= ctx.epoch(tow);
    ctx.note(format!(
        "{}: timing tow {secs} week {week} ls {leap} flags x{flags:02x} time {:?} {mask}",
        p.tag, u.time
    ));
    trace!("{}: {}", p.tag, flag_names(u32::from(flags), TIMING_FLAGS));
    Ok(mask)
}

// Supplemental timing packet.
pub fn x8f_ac(ctx: &mut DecodeContext, p: &Packet<'_>, nav: &mut NavState, u: &mut Fix) -> Outcome {
    let b = p.buf;
    let rec_mode = ub(b, 1);
    let disc_mode = ub(b, 2);
    let survey = ub(b, 3);
    let critical = beu16(b, 8);
    let minor = beu16(b, 10);
    let decode_status = ub(b, 12);
    let disc_activity = ub(b, 13);
    let pps_ind = ub(b, 14);
    let pps_ref = ub(b, 15);
    // PPS offset, positive is slow
    let fq_err = bef32(b, 16);
    let clock_offset = bef32(b, 20);
    let dac = bef32(b, 28);

    u.temperature = Some(bef32(b, 32));
    u.latitude = Some(bed64(b, 36) * RAD_2_DEG);
    u.longitude = Some(bed64(b, 44) * RAD_2_DEG);
    u.alt_hae = Some(bed64(b, 52));
    u.antenna = Some(match minor & 6 {
        2 => AntennaStatus::Open,
        4 => AntennaStatus::Short,
        _ => AntennaStatus::Ok,
    });
    nav.q_err = Some((fq_err * 1000.0) as i64);
    nav.clock_bias = Some(clock_offset);

    u.mode = match rec_mode & 7 {
        // auto
        0 => match decode_status {
            0x00 => FixMode::ThreeD,
            0x0b => FixMode::TwoD,
            _ => FixMode::NoFix,
        },
        // clock hold 2D, forced 2D
        3 | 6 => FixMode::TwoD,
        // single satellite time, overdetermined clock
        1 | 7 => {
            u.status = FixStatus::Time;
            match decode_status {
                0x00 => FixMode::ThreeD,
                0x09..=0x0b => FixMode::TwoD,
                _ => FixMode::NoFix,
            }
        }
        4 => FixMode::ThreeD,
        _ => FixMode::NoFix,
    };
    if minor & 0x208 != 0 && rec_mode & 7 == 7 {
        // overdetermined with no satellites or a questionable position
        u.mode = FixMode::ThreeD;
        u.status = FixStatus::DeadReckoning;
    }
    let mut mask = ChangeMask::LATLON | ChangeMask::ALTITUDE | ChangeMask::MODE;
    if u.status != FixStatus::Unknown {
        mask |= ChangeMask::STATUS;
    }
    ctx.note(format!(
        "{}: supplemental timing lat {:?} lon {:?} alt {:?} mode {} status {} temp {:?} \
         disc {disc_activity} ({}) pps {} ref {} fqErr {fq_err:.4} clko {clock_offset} \
         dac {dac} rm x{rec_mode:x} ({}) dm {disc_mode} sp {survey} gds x{decode_status:x} ({})",
        p.tag,
        u.latitude,
        u.longitude,
        u.alt_hae,
        u.mode,
        u.status,
        u.temperature,
        value_name(u32::from(disc_activity), DISCIPLINE_ACTIVITY),
        value_name(u32::from(pps_ind), PPS_INDICATION),
        value_name(u32::from(pps_ref), PPS_REFERENCE),
        value_name(u32::from(rec_mode), RECEIVER_MODE),
        value_name(u32::from(decode_status), DECODE_STATUS)
    ));
    trace!(
        "{}: critical {} minor {}",
        p.tag,
        flag_names(u32::from(critical), CRITICAL_ALARMS),
        flag_names(u32::from(minor), MINOR_ALARMS)
    );
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tsip::epoch::GpsClock;
    use crate::tsip::error::PacketTag;

    fn ctx() -> DecodeContext {
        DecodeContext::new(GpsClock::new(18, 2), false, false)
    }

    fn packet(sub: u8, buf: &[u8]) -> Packet<'_> {
        Packet {
            tag: PacketTag::new(0x8f, Some(sub)),
            buf,
            length: buf.len(),
        }
    }

    fn lfwei(fflags: u8, num_sv: u8) -> Vec<u8> {
        let mut buf = vec![0u8; 56];
        buf[0] = 0x20;
        buf[8..12].copy_from_slice(&345_600_000_u32.to_be_bytes());
        buf[27] = fflags;
        buf[28] = num_sv;
        buf[29] = 18;
        buf[30..32].copy_from_slice(&2300_u16.to_be_bytes());
        for i in 0..usize::from(num_sv.min(12)) {
            buf[32 + i * 2] = 0xe0 | (i as u8 + 1);
        }
        buf
    }

    #[test]
    fn test_x8f_20_zero_fix() {
        let mut ctx = ctx();
        let mut nav = NavState::new();
        let mut u = Fix::default();
        let buf = lfwei(0x00, 3);
        let mask = x8f_20(&mut ctx, &packet(0x20, &buf), &mut nav, &mut u).unwrap();
        assert_eq!(u.mode, FixMode::ThreeD);
        assert_eq!(u.status, FixStatus::Gps);
        assert_eq!(u.vel_n, Some(0.0));
        assert_eq!(u.vel_e, Some(0.0));
        assert_eq!(u.vel_d, Some(0.0));
        assert_eq!(u.latitude, Some(0.0));
        assert!(mask.contains(
            ChangeMask::TIME
                | ChangeMask::LATLON
                | ChangeMask::STATUS
                | ChangeMask::MODE
                | ChangeMask::VNED
                | ChangeMask::CLEAR
        ));
        assert_eq!(nav.sats_used, vec![1, 2, 3]);
        assert_eq!(ctx.clock.week, 2300);
        assert!(ctx.clock.leap_valid);
    }

    #[test]
    fn test_x8f_20_no_fix_flag() {
        let mut ctx = ctx();
        let mut u = Fix::default();
        let buf = lfwei(0x01, 0);
        x8f_20(&mut ctx, &packet(0x20, &buf), &mut NavState::new(), &mut u).unwrap();
        assert_eq!(u.mode, FixMode::NoFix);
        assert_eq!(u.status, FixStatus::Unknown);
    }

    #[test]
    fn test_x8f_20_rejects_too_many_sats() {
        let mut ctx = ctx();
        let mut nav = NavState::new();
        let buf = lfwei(0x00, 65);
        let err = x8f_20(&mut ctx, &packet(0x20, &buf), &mut nav, &mut Fix::default()).unwrap_err();
        assert!(matches!(err, DecodeError::TooManySatellites { count: 65, .. }));
        assert!(!ctx.clock.time_valid);
        assert!(nav.sats_used.is_empty());
    }

    #[test]
    fn test_x8f_20_over_range_velocity_skipped() {
        let mut ctx = ctx();
        let mut buf = lfwei(0x04, 0);
        buf[4..6].copy_from_slice(&0x8000_u16.to_be_bytes());
        buf[2..4].copy_from_slice(&100_i16.to_be_bytes());
        buf[24] = 1;
        let mut u = Fix::default();
        x8f_20(&mut ctx, &packet(0x20, &buf), &mut NavState::new(), &mut u).unwrap();
        assert_eq!(u.vel_n, None);
        assert_eq!(u.vel_e, Some(2.0));
        assert_eq!(u.mode, FixMode::TwoD);
    }

    #[test]
    fn test_x8f_23_clears_compact_wait() {
        let mut ctx = ctx();
        ctx.schedule.req_compact = 1_000;
        let mut buf = vec![0u8; 29];
        buf[0] = 0x23;
        buf[1..5].copy_from_slice(&1_000_u32.to_be_bytes());
        buf[5..7].copy_from_slice(&2300_u16.to_be_bytes());
        buf[9..13].copy_from_slice(&0x4000_0000_i32.to_be_bytes());
        buf[25..27].copy_from_slice(&200_i16.to_be_bytes());
        let mut u = Fix::default();
        x8f_23(&mut ctx, &packet(0x23, &buf), &mut NavState::new(), &mut u).unwrap();
        assert_eq!(ctx.schedule.req_compact, 0);
        assert!((u.latitude.unwrap() - 90.0).abs() < 1e-6);
        assert_eq!(u.vel_d, Some(-1.0));
    }

    #[test]
    fn test_x8f_a7_integer_format_truncates() {
        let mut ctx = ctx();
        let mut nav = NavState::new();
        let mut buf = vec![0xa7, 1, 0, 0, 0, 0];
        buf.extend_from_slice(&125_i16.to_be_bytes());
        buf.extend_from_slice(&2500_i16.to_be_bytes());
        x8f_a7(&mut ctx, &packet(0xa7, &buf), &mut nav, &mut Fix::default()).unwrap();
        assert_eq!(nav.clock_bias, Some(12.0));
        assert_eq!(nav.clock_drift, Some(2.0));
    }

    #[test]
    fn test_x8f_ab_bad_time_still_clears() {
        let mut ctx = ctx();
        let mut buf = vec![0u8; 17];
        buf[0] = 0xab;
        buf[1..5].copy_from_slice(&3600_u32.to_be_bytes());
        buf[5..7].copy_from_slice(&2300_u16.to_be_bytes());
        buf[7..9].copy_from_slice(&18_i16.to_be_bytes());
        buf[9] = 0x04;
        let mask = x8f_ab(&mut ctx, &packet(0xab, &buf), &mut NavState::new(), &mut Fix::default())
            .unwrap();
        assert_eq!(mask, ChangeMask::CLEAR);
        assert!(ctx.clock.leap_valid);
    }

    #[test]
    fn test_x8f_ac_overdetermined_dead_reckoning() {
        let mut ctx = ctx();
        let mut nav = NavState::new();
        let mut buf = vec![0u8; 68];
        buf[0] = 0xac;
        buf[1] = 7;
        buf[10..12].copy_from_slice(&0x0008_u16.to_be_bytes());
        let mut u = Fix::default();
        let mask = x8f_ac(&mut ctx, &packet(0xac, &buf), &mut nav, &mut u).unwrap();
        assert_eq!(u.mode, FixMode::ThreeD);
        assert_eq!(u.status, FixStatus::DeadReckoning);
        assert!(mask.contains(ChangeMask::STATUS | ChangeMask::MODE));
        assert_eq!(u.antenna, Some(AntennaStatus::Ok));
        assert_eq!(nav.q_err, Some(0));
    }
}
