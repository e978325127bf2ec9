// src/cli/mod.rs — CLI definition (clap derive)

pub mod export;
pub mod serve;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "toolgate",
    about = "Multi-tenant tool catalog and dispatch backend for workflow agents",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, default_value = "toolgate.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    Serve,
    /// Write the tool catalog consumed by the agent engine
    Export {
        /// Catalog slice: all, system or user
        #[arg(long, default_value = "all")]
        scope: String,
        /// Output format: xml or json
        #[arg(long, default_value = "xml")]
        format: String,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}
