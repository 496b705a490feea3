// Host-side helpers shared by the subcommands.
pub mod lexer;
pub mod lock;
pub mod signal;
