use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "readygate", version, about = "Store setup and readiness-gated server launch")]
pub struct Cli {
    /// TOML config file (default: readygate.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the instance directory and schema, seed accounts, publish the readiness marker.
    Init,
    /// Wait for the readiness marker, then exec the server.
    Launch,
}
