// Command implementations split by subcommand.
pub mod encode;
pub mod monitor;
pub mod replay;
pub mod report;
pub mod script;

pub use encode::run_encode;
pub use monitor::run_monitor;
pub use replay::run_replay;
