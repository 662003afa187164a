mod args;
mod commands;
mod repl;
pub mod theme;

pub use args::{CliArgs, CliCommand};
pub use repl::{ChatSession, run_repl};
