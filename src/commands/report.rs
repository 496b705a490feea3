use std::fmt::Write as _;
use tsip_monitor::tsip::fix::Fix;
use tsip_monitor::tsip::{ChangeMask, NavState};

// Turns change masks into one summary line per epoch and per skyview.
// Receivers that never send an end-of-epoch packet still get a line when
// the next epoch starts.
#[derive(Debug, Default)]
pub struct EpochReporter {
    reported: bool,
}

impl EpochReporter {
    pub fn observe(&mut self, mask: ChangeMask, nav: &NavState) -> Vec<String> {
        let mut lines = Vec::new();
        if mask.contains(ChangeMask::CLEAR) {
            if !self.reported && nav.previous.time.is_some() {
                lines.push(format_fix(&nav.previous, nav));
            }
            self.reported = false;
        }
        if mask.contains(ChangeMask::REPORT) {
            lines.push(format_fix(&nav.fix, nav));
            self.reported = true;
        }
        if mask.contains(ChangeMask::SATELLITE) {
            lines.push(format_sky(nav));
        }
        lines
    }
}

pub fn format_fix(fix: &Fix, nav: &NavState) -> String {
    let mut line = String::from("[FIX]");
    match fix.time {
        Some(time) => {
            let _ = write!(line, " {}", time.format("%Y-%m-%dT%H:%M:%S%.3fZ"));
        }
        None => line.push_str(" no-time"),
    }
    let _ = write!(line, " {} {}", fix.mode, fix.status);
    if let (Some(lat), Some(lon)) = (fix.latitude, fix.longitude) {
        let _ = write!(line, " lat={lat:.7} lon={lon:.7}");
    }
    if let Some(alt) = fix.alt_hae {
        let _ = write!(line, " hae={alt:.2}");
    }
    if let Some(alt) = fix.alt_msl {
        let _ = write!(line, " msl={alt:.2}");
    }
    if let (Some(x), Some(y), Some(z)) = (fix.ecef_x, fix.ecef_y, fix.ecef_z) {
        let _ = write!(line, " ecef=({x:.2},{y:.2},{z:.2})");
    }
    if let (Some(n), Some(e), Some(d)) = (fix.vel_n, fix.vel_e, fix.vel_d) {
        let _ = write!(line, " vned=({n:.3},{e:.3},{d:.3})");
    }
    if let Some(pdop) = nav.dop.pdop {
        let _ = write!(line, " pdop={pdop:.2}");
    }
    if nav.satellites_used > 0 {
        let _ = write!(line, " used={}", nav.satellites_used);
    }
    line
}

pub fn format_sky(nav: &NavState) -> String {
    let sky = &nav.skyview;
    let mut line = format!("[SKY] visible={}", sky.satellites_visible);
    for channel in sky.occupied() {
        let _ = write!(line, " {}", channel.prn);
        if let Some(snr) = channel.snr {
            let _ = write!(line, ":{snr:.0}");
        }
        if channel.used {
            line.push('*');
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tsip_monitor::tsip::fix::{FixMode, FixStatus};

    fn timed_nav() -> NavState {
        let mut nav = NavState::new();
        nav.fix.time = Utc.with_ymd_and_hms(2024, 2, 3, 11, 59, 42).single();
        nav.fix.mode = FixMode::ThreeD;
        nav.fix.status = FixStatus::Gps;
        nav.fix.latitude = Some(37.5);
        nav.fix.longitude = Some(-122.25);
        nav
    }

    #[test]
    fn test_report_prints_current_epoch_once() {
        let nav = timed_nav();
        let mut reporter = EpochReporter::default();
        let lines = reporter.observe(ChangeMask::REPORT, &nav);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[FIX] 2024-02-03T11:59:42.000Z 3D GPS"));
        assert!(lines[0].contains("lat=37.5000000 lon=-122.2500000"));

        // the clear that follows a reported epoch adds nothing
        let mut next = nav.clone();
        next.previous = std::mem::take(&mut next.fix);
        assert!(reporter.observe(ChangeMask::CLEAR, &next).is_empty());
    }

    #[test]
    fn test_clear_flushes_unreported_epoch() {
        let mut nav = timed_nav();
        nav.previous = std::mem::take(&mut nav.fix);
        let mut reporter = EpochReporter::default();
        let lines = reporter.observe(ChangeMask::CLEAR | ChangeMask::TIME, &nav);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("3D GPS"));
    }

    #[test]
    fn test_sky_line() {
        let mut nav = NavState::new();
        nav.skyview.satellites_visible = 2;
        nav.skyview.channels[0].prn = 5;
        nav.skyview.channels[0].snr = Some(41.0);
        nav.skyview.channels[0].used = true;
        nav.skyview.channels[1].prn = 12;
        assert_eq!(format_sky(&nav), "[SKY] visible=2 5:41* 12");
    }
}
