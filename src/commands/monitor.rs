use crate::args::MonitorArgs;
use crate::commands::report::EpochReporter;
use crate::commands::script::{parse_script, send_commands};
use anyhow::{Context, Result, bail};
use serialport::{DataBits, SerialPort, StopBits};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};
use tsip_monitor::shared::lexer::FrameCollector;
use tsip_monitor::shared::lock::LockGuard;
use tsip_monitor::shared::signal::install_ctrlc_handler;
use tsip_monitor::tsip::{ChangeMask, NavState, Session, SessionConfig, write_command};

// Counters behind the periodic [STAT] line.
#[derive(Debug, Default)]
struct Stats {
    bytes: u64,
    frames: u64,
    rejected: u64,
    sent: u64,
    write_failures: u64,
}

// Talk to a live receiver: decode everything it sends and answer with the
// queries the session schedules.
pub fn run_monitor(args: MonitorArgs) -> Result<()> {
    let running = install_ctrlc_handler()?;
    let _lock = LockGuard::acquire(&args.lock_file)?;

    let script = match &args.script {
        Some(path) => parse_script(path)?,
        None => Vec::new(),
    };
    if args.readonly && (!script.is_empty() || args.nmea || args.set_speed.is_some()) {
        bail!("--readonly cannot be combined with --script, --nmea or --set-speed");
    }

    let mut port = open_port(&args)?;
    let gap = Duration::from_millis(args.command_gap_ms);

    if !script.is_empty() {
        send_commands(&mut *port, &script, gap)?;
        eprintln!("Sent {} startup commands", script.len());
    }

    let mut session = Session::new(SessionConfig {
        readonly: args.readonly,
        passive: args.passive,
        rollovers: args.session.rollovers,
        leap_seconds: args.session.leap_seconds,
    });

    if args.nmea {
        session.request_nmea_mode();
        send_commands(&mut *port, &session.take_commands(), gap)?;
        eprintln!("Requested NMEA output on {}", args.serial_port);
        return Ok(());
    }

    let mut capture = match &args.capture {
        Some(path) => Some(open_capture(path)?),
        None => None,
    };

    session.init_query();

    let mut nav = NavState::new();
    let mut collector = FrameCollector::new();
    let mut reporter = EpochReporter::default();
    let mut packets = Vec::new();
    let mut buffer = vec![0_u8; args.read_buffer_bytes.max(1_024)];
    let mut stats = Stats::default();
    let mut identified = false;
    let stat_interval = Duration::from_secs(args.stat_interval_secs.max(1));
    let mut last_stat = Instant::now();
    let mut last_stat_bytes = 0_u64;

    eprintln!(
        "Monitoring {} @ {} ({:?}, {} stop)",
        args.serial_port, args.baud_rate, args.parity, args.stop_bits
    );

    while running.load(Ordering::SeqCst) {
        match port.read(&mut buffer) {
            Ok(0) => {}
            Ok(size) => {
                stats.bytes += size as u64;
                if let Some(file) = capture.as_mut() {
                    file.write_all(&buffer[..size])
                        .context("writing capture file failed")?;
                }
                collector.push_bytes(&buffer[..size], &mut packets);
            }
            Err(err) if err.kind() == io::ErrorKind::TimedOut => {}
            Err(err) => {
                return Err(err).context("reading TSIP stream from serial port failed");
            }
        }

        for packet in packets.drain(..) {
            stats.frames += 1;
            match session.parse(&packet, &mut nav) {
                Ok(mask) => {
                    if !identified {
                        // first packet we understood: this is a TSIP receiver
                        identified = true;
                        session.identified();
                        if let Some(speed) = args.set_speed {
                            session.request_speed(speed, args.parity.to_tsip(), args.stop_bits);
                        }
                    }
                    if mask.contains(ChangeMask::DEVICE_ID) {
                        let id = session.identity();
                        println!(
                            "[DEV] hw={} {} {} serial={}",
                            id.hardware_code, id.subtype, id.subtype1, id.serial
                        );
                    }
                    for line in reporter.observe(mask, &nav) {
                        println!("{line}");
                    }
                }
                Err(err) if err.is_unknown() => {}
                Err(_) => stats.rejected += 1,
            }

            for command in session.take_commands() {
                match write_command(&mut *port, &command) {
                    Ok(_) => stats.sent += 1,
                    Err(err) => {
                        stats.write_failures += 1;
                        eprintln!("Writing {} failed: {err}", command.tag());
                    }
                }
            }
        }

        if let (Some(speed), true) = (args.set_speed, identified) {
            if port.baud_rate().ok() != Some(speed) {
                // give the receiver time to act on the port command first
                thread::sleep(gap);
                port.set_baud_rate(speed)
                    .with_context(|| format!("switching serial port to {speed} baud failed"))?;
                eprintln!("Switched {} to {speed} baud", args.serial_port);
            }
        }

        if last_stat.elapsed() >= stat_interval {
            let secs = last_stat.elapsed().as_secs_f64();
            eprintln!(
                "[STAT] {:.0} B/s, {} bytes, {} frames, {} rejected, {} discarded, {} sent, {} write failures",
                (stats.bytes - last_stat_bytes) as f64 / secs,
                stats.bytes,
                stats.frames,
                stats.rejected,
                collector.discarded(),
                stats.sent,
                stats.write_failures
            );
            last_stat = Instant::now();
            last_stat_bytes = stats.bytes;
        }
    }

    if let Some(file) = capture.as_mut() {
        file.flush().context("final capture flush failed")?;
    }
    eprintln!(
        "Monitor stopped, read {} bytes in {} frames",
        stats.bytes, stats.frames
    );
    Ok(())
}

fn open_port(args: &MonitorArgs) -> Result<Box<dyn SerialPort>> {
    let stop_bits = if args.stop_bits == 2 {
        StopBits::Two
    } else {
        StopBits::One
    };
    serialport::new(&args.serial_port, args.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(args.parity.to_serial())
        .stop_bits(stop_bits)
        .timeout(Duration::from_millis(args.read_timeout_ms))
        .open()
        .with_context(|| {
            format!(
                "opening serial port failed: {} @ {}",
                args.serial_port, args.baud_rate
            )
        })
}

fn open_capture(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening capture file failed: {}", path.display()))
}
