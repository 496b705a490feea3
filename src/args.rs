use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tsip_monitor::tsip::Parity;

// CLI root definition.
#[derive(Parser, Debug)]
#[command(name = "tsip-monitor", version)]
#[command(about = "Trimble TSIP receiver monitor and packet decoder")]
pub struct Cli {
    #[command(subcommand)]
    pub command: AppCommand,
}

// One module per subcommand under src/commands/.
#[derive(Subcommand, Debug)]
pub enum AppCommand {
    /// Decode a live receiver and answer its query schedule
    Monitor(MonitorArgs),
    /// Decode a raw TSIP capture file without talking to a receiver
    Replay(ReplayArgs),
    /// Print the framed bytes of one script command
    Encode(EncodeArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParityArg {
    None,
    Odd,
    Even,
}

impl ParityArg {
    pub fn to_serial(self) -> serialport::Parity {
        match self {
            ParityArg::None => serialport::Parity::None,
            ParityArg::Odd => serialport::Parity::Odd,
            ParityArg::Even => serialport::Parity::Even,
        }
    }

    pub fn to_tsip(self) -> Parity {
        match self {
            ParityArg::None => Parity::None,
            ParityArg::Odd => Parity::Odd,
            ParityArg::Even => Parity::Even,
        }
    }
}

// Options every decoding session takes.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// 1024-week rollovers assumed until the receiver reports a full week
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(0..=16))]
    pub rollovers: u32,
    /// Leap seconds assumed until the receiver reports them
    #[arg(long, default_value_t = 18)]
    pub leap_seconds: i32,
}

#[derive(Args, Debug, Clone)]
pub struct MonitorArgs {
    #[arg(long, env = "TSIP_PORT", default_value = "/dev/ttyUSB0")]
    pub serial_port: String,
    #[arg(long, default_value_t = 9_600)]
    pub baud_rate: u32,
    #[arg(long, value_enum, default_value_t = ParityArg::Odd)]
    pub parity: ParityArg,
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub stop_bits: u8,
    #[arg(long, default_value_t = 250)]
    pub read_timeout_ms: u64,
    #[arg(long, default_value_t = 4_096)]
    pub read_buffer_bytes: usize,
    #[arg(long, default_value = "tsip_monitor.lock")]
    pub lock_file: PathBuf,
    /// Startup command script (`!TSIP` / `!TSIPV1` lines)
    #[arg(long)]
    pub script: Option<PathBuf>,
    #[arg(long, default_value_t = 50)]
    pub command_gap_ms: u64,
    /// Append every byte read to this file
    #[arg(long)]
    pub capture: Option<PathBuf>,
    #[arg(long, default_value_t = 10)]
    pub stat_interval_secs: u64,
    /// Never write to the receiver
    #[arg(long, default_value_t = false)]
    pub readonly: bool,
    /// Query the receiver configuration instead of setting it
    #[arg(long, default_value_t = false)]
    pub passive: bool,
    /// Ask the receiver to switch to this speed once it is identified
    #[arg(long)]
    pub set_speed: Option<u32>,
    /// Ask the receiver to switch the port to NMEA output and exit
    #[arg(long, default_value_t = false)]
    pub nmea: bool,
    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    pub input: PathBuf,
    #[arg(long, default_value_t = 65_536)]
    pub read_buffer_bytes: usize,
    /// Print every decode line, not just epoch summaries
    #[arg(long, default_value_t = false)]
    pub verbose: bool,
    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct EncodeArgs {
    /// A script line, e.g. `!TSIPV1 0xa1 0x00 0 0x01`
    #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
    pub tokens: Vec<String>,
}
