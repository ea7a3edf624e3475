//! apcctl binary entry point.

use std::process::ExitCode;

use clap::Parser;

use apcctl::cli::Cli;
use apcctl::commands;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
