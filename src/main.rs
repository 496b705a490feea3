mod args;
mod commands;

use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Target};

use args::{AppCommand, Cli};
use commands::{run_encode, run_monitor, run_replay};

// Parse CLI args, set up logging and dispatch to a command module.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = Builder::new();
    builder
        .target(Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    match cli.command {
        AppCommand::Monitor(args) => run_monitor(args),
        AppCommand::Replay(args) => run_replay(args),
        AppCommand::Encode(args) => run_encode(args),
    }
}
