use crate::tsip::gnss::GnssId;
use chrono::{DateTime, Utc};

// Channel table size; large enough for every receiver family seen so far.
pub const MAX_CHANNELS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SatHealth {
    #[default]
    Unknown,
    Ok,
    Bad,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SkyviewChannel {
    // NMEA style PRN, 0 when the channel is empty.
    pub prn: i16,
    pub gnss: Option<GnssId>,
    pub svid: u8,
    pub sigid: u8,
    pub snr: Option<f64>,
    pub elevation: Option<f64>,
    pub azimuth: Option<f64>,
    pub health: SatHealth,
    pub used: bool,
}

// Per-channel tracking table, refilled channel by channel each burst.
#[derive(Debug, Clone, PartialEq)]
pub struct Skyview {
    pub channels: Vec<SkyviewChannel>,
    // Count published to the host at the end of the last complete burst.
    pub satellites_visible: usize,
    pub skyview_time: Option<DateTime<Utc>>,
}

impl Default for Skyview {
    fn default() -> Self {
        Self {
            channels: vec![SkyviewChannel::default(); MAX_CHANNELS],
            satellites_visible: 0,
            skyview_time: None,
        }
    }
}

impl Skyview {
    pub fn clear(&mut self) {
        self.channels
            .iter_mut()
            .for_each(|c| *c = SkyviewChannel::default());
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut SkyviewChannel> {
        self.channels.get_mut(index)
    }

    pub fn find_prn_mut(&mut self, prn: i16) -> Option<&mut SkyviewChannel> {
        self.channels.iter_mut().find(|c| c.prn != 0 && c.prn == prn)
    }

    pub fn occupied(&self) -> impl Iterator<Item = &SkyviewChannel> {
        self.channels.iter().take(self.satellites_visible).filter(|c| c.prn != 0)
    }
}

// Burst progress kept by the session: the channel index seen last.
#[derive(Debug, Clone, Copy, Default)]
pub struct BurstTracker {
    pub last_chan_seen: usize,
}

impl BurstTracker {
    // Channel `index` of a burst arrived. Index 0 starts a new burst and
    // publishes the previous burst's count.
    pub fn begin(&mut self, skyview: &mut Skyview, index: usize) {
        if index == 0 {
            skyview.satellites_visible = self.last_chan_seen;
        }
        self.last_chan_seen = index;
    }

    // True when channel `index` completes a burst at least as large as the
    // last one. A shrinking burst stays silent until something else flushes it.
    pub fn complete(&mut self, skyview: &mut Skyview, index: usize) -> bool {
        if index + 1 >= skyview.satellites_visible {
            skyview.satellites_visible = index + 1;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(burst: &mut BurstTracker, sky: &mut Skyview, index: usize) -> bool {
        burst.begin(sky, index);
        burst.complete(sky, index)
    }

    #[test]
    fn test_growing_burst_signals_each_new_high() {
        let mut sky = Skyview::default();
        let mut burst = BurstTracker::default();
        assert!(feed(&mut burst, &mut sky, 0));
        assert!(feed(&mut burst, &mut sky, 1));
        assert!(feed(&mut burst, &mut sky, 2));
        assert_eq!(sky.satellites_visible, 3);
    }

    #[test]
    fn test_shrinking_burst_waits() {
        let mut sky = Skyview::default();
        let mut burst = BurstTracker::default();
        for i in 0..5 {
            feed(&mut burst, &mut sky, i);
        }
        assert_eq!(sky.satellites_visible, 5);
        // next burst only has three satellites
        burst.begin(&mut sky, 0);
        assert_eq!(sky.satellites_visible, 4);
        burst.complete(&mut sky, 0);
        assert!(!feed(&mut burst, &mut sky, 1));
        assert!(!feed(&mut burst, &mut sky, 2));
        assert_eq!(burst.last_chan_seen, 2);
    }

    #[test]
    fn test_find_prn_skips_empty() {
        let mut sky = Skyview::default();
        sky.channels[3].prn = 12;
        assert!(sky.find_prn_mut(0).is_none());
        assert!(sky.find_prn_mut(12).is_some());
    }
}
