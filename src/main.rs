// src/main.rs — toolgate entry point

use clap::Parser;

use toolgate::cli::{Cli, Commands};
use toolgate::infra::config::Config;
use toolgate::infra::logger;

#[tokio::main]
async fn main() {
    // Respects RUST_LOG when set
    logger::init_logging("info");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(std::path::Path::new(&cli.config))?;

    match cli.command {
        Commands::Serve => toolgate::cli::serve::run_serve(&config).await,
        Commands::Export {
            scope,
            format,
            output,
        } => toolgate::cli::export::run_export(&scope, &format, output.as_deref()),
    }
}
