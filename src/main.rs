mod audit;
mod build;
mod cli;
mod commands;
mod config;
mod icons;
mod logging;
mod render;
mod utils;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    logging::init_logging(cli.verbose);
    commands::run(cli)
}
