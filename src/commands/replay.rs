use crate::args::ReplayArgs;
use crate::commands::report::EpochReporter;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use tsip_monitor::shared::lexer::FrameCollector;
use tsip_monitor::tsip::{NavState, Session, SessionConfig};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub bytes: u64,
    pub frames: u64,
    pub decoded: u64,
    pub rejected: u64,
    pub unknown: u64,
    pub discarded: u64,
}

// Decode a capture file offline. The session is read-only and every time it
// sees comes from the stream itself, so two replays of one file match.
pub fn run_replay(args: ReplayArgs) -> Result<()> {
    let file = File::open(&args.input)
        .with_context(|| format!("opening capture failed: {}", args.input.display()))?;
    let config = SessionConfig {
        readonly: true,
        passive: false,
        rollovers: args.session.rollovers,
        leap_seconds: args.session.leap_seconds,
    };
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let summary = replay_stream(file, config, args.read_buffer_bytes, args.verbose, &mut out)
        .with_context(|| format!("replaying {} failed", args.input.display()))?;
    out.flush().context("flushing replay output failed")?;
    eprintln!(
        "Replayed {} bytes: {} frames, {} decoded, {} rejected, {} unknown, {} discarded",
        summary.bytes,
        summary.frames,
        summary.decoded,
        summary.rejected,
        summary.unknown,
        summary.discarded
    );
    Ok(())
}

pub fn replay_stream<R: Read, W: Write>(
    mut reader: R,
    config: SessionConfig,
    buffer_bytes: usize,
    verbose: bool,
    out: &mut W,
) -> Result<ReplaySummary> {
    let mut session = Session::new(config);
    let mut nav = NavState::new();
    let mut collector = FrameCollector::new();
    let mut reporter = EpochReporter::default();
    let mut packets = Vec::new();
    let mut buffer = vec![0_u8; buffer_bytes.max(1_024)];
    let mut summary = ReplaySummary::default();

    loop {
        let size = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(size) => size,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err).context("reading capture failed"),
        };
        summary.bytes += size as u64;
        collector.push_bytes(&buffer[..size], &mut packets);

        for packet in packets.drain(..) {
            summary.frames += 1;
            let result = session.parse(&packet, &mut nav);
            if verbose {
                for line in session.diagnostics() {
                    writeln!(out, "{line}")?;
                }
            }
            match result {
                Ok(mask) => {
                    summary.decoded += 1;
                    for line in reporter.observe(mask, &nav) {
                        writeln!(out, "{line}")?;
                    }
                }
                Err(err) if err.is_unknown() => summary.unknown += 1,
                Err(err) => {
                    summary.rejected += 1;
                    if verbose {
                        writeln!(out, "[ERR] {err}")?;
                    }
                }
            }
        }
    }

    summary.discarded = collector.discarded();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsip_monitor::tsip::Command;

    fn gps_time_frame(tow: [u8; 4]) -> Vec<u8> {
        let mut body = vec![0x41];
        body.extend_from_slice(&tow);
        // week 2200, 18 leap seconds
        body.extend_from_slice(&[0x08, 0x98, 0x41, 0x90, 0x00, 0x00]);
        Command::Legacy(body).frame().unwrap()
    }

    #[test]
    fn test_replay_prints_finished_epoch() {
        let mut capture = gps_time_frame([0x42, 0xc8, 0x00, 0x00]);
        capture.extend(gps_time_frame([0x42, 0xca, 0x00, 0x00]));
        // unknown id, then a runt x41
        capture.extend([0x10, 0x01, 0x10, 0x03, 0x10, 0x41, 0x00, 0x10, 0x03]);

        let mut out = Vec::new();
        let summary =
            replay_stream(capture.as_slice(), SessionConfig::default(), 16, false, &mut out)
                .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(summary.frames, 4);
        assert_eq!(summary.decoded, 2);
        assert_eq!(summary.unknown, 1);
        assert_eq!(summary.rejected, 1);
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("[FIX] "));
    }

    #[test]
    fn test_replay_is_deterministic() {
        let mut capture = Vec::new();
        for tow in [[0x42, 0xc8, 0x00, 0x00], [0x42, 0xca, 0x00, 0x00], [0x42, 0xcc, 0x00, 0x00]] {
            capture.extend(gps_time_frame(tow));
        }
        let mut first = Vec::new();
        let mut second = Vec::new();
        replay_stream(capture.as_slice(), SessionConfig::default(), 1_024, true, &mut first).unwrap();
        replay_stream(capture.as_slice(), SessionConfig::default(), 7, true, &mut second).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
