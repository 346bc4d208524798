//! Conformance CLI - operator client for interactive conformance sandboxes

use clap::Parser;
use conformance::commands::Commands;
use conformance::common::{config::Config, logging};
use conformance::{cli, Error};

#[derive(Parser)]
#[command(name = "conformance", about = "Drive interactive conformance-testing sandboxes")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    logging::init_cli();

    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = cli::dispatch(cli.command, &config).await {
        match e {
            Error::Aborted => std::process::exit(130),
            e => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    }
}
