use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::relay::Mode;

#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(name = "pathway_ai")]
#[command(
    about = "PathwayAI: mode-driven chat assistant and relay server",
    long_about = "PathwayAI: mode-driven chat assistant and relay server\n\nModes: real-estate, homework, business, image, creative, artist\n\nConfig file loading:\n  - --config <path> (explicit file, overrides default path discovery)\n  - Default probe path when --config is not provided:\n    1. $XDG_CONFIG_HOME/pathway/config.toml\n    2. ~/.config/pathway/config.toml"
)]
pub struct CliArgs {
    /// Load config from this file path instead of the default discovery path.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Print redacted HTTP request/response lines to stderr.
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Mode to start the conversation in (overrides `default_mode`).
    #[arg(long, value_name = "TAG", value_parser = parse_mode)]
    pub mode: Option<Mode>,

    /// Model id for the conversation (overrides `openai_model`).
    #[arg(long, value_name = "ID")]
    pub model: Option<String>,

    /// Send turns to a running relay server instead of calling the backend directly.
    #[arg(long, value_name = "URL")]
    pub relay_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Subcommand, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Run the HTTP relay server.
    Serve {
        /// Address to bind (overrides `server_addr`).
        #[arg(long, value_name = "ADDR")]
        addr: Option<String>,
    },
}

fn parse_mode(value: &str) -> Result<Mode, String> {
    value.parse()
}
