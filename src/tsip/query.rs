use crate::tsip::bytes::put_be32;
use crate::tsip::codec::{Command, Mode};
use log::{debug, warn};

// Reports the receiver will not push on its own, and how often to ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    // x21, answered by x41
    GpsTime,
    // x24, answered by x6c / x6d
    FixMode,
    // x28, answered by x48
    SystemMessage,
    // x3c 00, answered by x5c / x5d
    Tracking,
    // x26, answered by x46 and x4b
    Health,
}

impl Report {
    pub const ALL: [Report; 5] = [
        Report::GpsTime,
        Report::FixMode,
        Report::SystemMessage,
        Report::Tracking,
        Report::Health,
    ];

    pub fn interval(self) -> i64 {
        match self {
            Report::SystemMessage => 60,
            _ => 5,
        }
    }

    pub fn request(self) -> Command {
        match self {
            Report::GpsTime => Command::legacy(&[0x21]),
            Report::FixMode => Command::legacy(&[0x24]),
            Report::SystemMessage => Command::legacy(&[0x28]),
            Report::Tracking => Command::legacy(&[0x3c, 0x00]),
            Report::Health => Command::legacy(&[0x26]),
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

// Compact superpacket negotiation gives the receiver this long to answer.
const COMPACT_TIMEOUT: i64 = 5;

// Round robin wraps here; probes only go out on its first few turns.
const ROUND_ROBIN_MODULUS: u32 = 0x1_0000;

// Last-request times, in fix time seconds. Time can step backwards on
// replay, so elapsed time is compared by magnitude.
#[derive(Debug, Clone, Default)]
pub struct QuerySchedule {
    last: [i64; 5],
    // when x8f-23 was requested, 0 when not waiting
    pub req_compact: i64,
    round_robin: u32,
}

impl QuerySchedule {
    pub fn mark(&mut self, report: Report, now: i64) {
        self.last[report.slot()] = now;
    }

    pub fn last(&self, report: Report) -> i64 {
        self.last[report.slot()]
    }

    // Legacy-generation polling, run after every legacy packet.
    pub fn poll(&mut self, now: i64, superpacket: u8) -> Vec<Command> {
        let mut out = Vec::new();
        for report in Report::ALL {
            if report == Report::SystemMessage && superpacket >= 1 {
                continue;
            }
            if (now - self.last[report.slot()]).abs() > report.interval() {
                out.push(report.request());
                self.last[report.slot()] = now;
            }
        }
        if self.req_compact > 0 && (now - self.req_compact).abs() > COMPACT_TIMEOUT {
            self.req_compact = 0;
            warn!("x8f-23: no compact superpacket, trying x8f-20");
            out.push(Command::legacy(&[0x8e, 0x20, 0x01]));
        }
        out
    }

    // Enveloped-generation probe: one configuration query every fourth packet.
    pub fn advance_round_robin(&mut self, passive: bool) -> Option<Command> {
        self.round_robin = (self.round_robin + 1) % ROUND_ROBIN_MODULUS;
        if self.round_robin % 4 != 0 {
            return None;
        }
        let command = match self.round_robin / 4 {
            // protocol version
            1 => Command::query(0x90, 0x00),
            // firmware version
            2 => Command::query(0x90, 0x01),
            // current port configuration
            3 => Command::enveloped(0x91, 0x00, Mode::Query, vec![0x00]),
            4 => Command::query(0x91, 0x01),
            5 => Command::query(0x91, 0x03),
            6 => Command::query(0x91, 0x04),
            7 if passive => Command::enveloped(0x91, 0x05, Mode::Query, vec![0xff]),
            7 => {
                // ask for everything periodic; the set is answered like a query
                let mut data = vec![0xff];
                put_be32(&mut data, 0x000a_aaaa);
                put_be32(&mut data, 0);
                put_be32(&mut data, 0);
                put_be32(&mut data, 0);
                Command::enveloped(0x91, 0x05, Mode::Set, data)
            }
            // production information
            8 => Command::query(0x93, 0x00),
            _ => return None,
        };
        debug!("round robin {}: {}", self.round_robin, command.tag());
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bodies(cmds: &[Command]) -> Vec<Vec<u8>> {
        cmds.iter().map(|c| c.body()).collect()
    }

    #[test]
    fn test_first_poll_requests_everything() {
        let mut sched = QuerySchedule::default();
        let out = sched.poll(1_000, 0);
        assert_eq!(
            bodies(&out),
            vec![vec![0x21], vec![0x24], vec![0x28], vec![0x3c, 0x00], vec![0x26]]
        );
        // nothing is due a second later
        assert!(sched.poll(1_001, 0).is_empty());
    }

    #[test]
    fn test_intervals() {
        let mut sched = QuerySchedule::default();
        sched.poll(1_000, 0);
        let out = sched.poll(1_006, 0);
        assert_eq!(out.len(), 4);
        let out = sched.poll(1_061, 0);
        assert!(bodies(&out).contains(&vec![0x28]));
    }

    #[test]
    fn test_superpacket_receivers_skip_system_message() {
        let mut sched = QuerySchedule::default();
        let out = sched.poll(1_000, 2);
        assert!(!bodies(&out).contains(&vec![0x28]));
    }

    #[test]
    fn test_backwards_time_still_polls() {
        let mut sched = QuerySchedule::default();
        sched.poll(1_000, 0);
        let out = sched.poll(900, 0);
        assert!(bodies(&out).contains(&vec![0x21]));
    }

    #[test]
    fn test_compact_watchdog_falls_back_once() {
        let mut sched = QuerySchedule::default();
        sched.poll(1_000, 1);
        sched.req_compact = 1_000;
        assert!(!bodies(&sched.poll(1_003, 1)).contains(&vec![0x8e, 0x20, 0x01]));
        assert!(bodies(&sched.poll(1_006, 1)).contains(&vec![0x8e, 0x20, 0x01]));
        assert_eq!(sched.req_compact, 0);
        assert!(!bodies(&sched.poll(1_020, 1)).contains(&vec![0x8e, 0x20, 0x01]));
    }

    #[test]
    fn test_round_robin_every_fourth_packet() {
        let mut sched = QuerySchedule::default();
        let sent: Vec<Command> = (0..40)
            .filter_map(|_| sched.advance_round_robin(false))
            .collect();
        assert_eq!(sent.len(), 8);
        assert_eq!(sent[0].body(), vec![0x90, 0x00, 0x00, 0x02, 0x00, 0x92]);
        assert_eq!(sent[2].body()[..6], [0x91, 0x00, 0x00, 0x03, 0x00, 0x00]);
        assert_eq!(sent[6].body().len(), 23);
        assert_eq!(sent[7].tag().to_string(), "x93-00");
    }

    #[test]
    fn test_round_robin_passive_queries_periodic_messages() {
        let mut sched = QuerySchedule::default();
        let sent: Vec<Command> = (0..32)
            .filter_map(|_| sched.advance_round_robin(true))
            .collect();
        assert_eq!(sent[6].body()[..6], [0x91, 0x05, 0x00, 0x03, 0x00, 0xff]);
    }
}
