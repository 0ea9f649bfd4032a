mod config;
mod driver;
mod telemetry;

use std::io;

use clap::Parser;
use config::{Cli, Command, GenerateConfig};
use telemetry::init_telemetry;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_telemetry()?;

    match cli.command {
        Command::Generate(args) => {
            let config = GenerateConfig::try_from(args)?;
            driver::generate(&config, io::stdout().lock())?;
        }
        Command::Inspect { ids } => driver::inspect(&ids, io::stdout().lock())?,
    }
    Ok(())
}
