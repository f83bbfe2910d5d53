use std::process::ExitCode;

use clap::Parser;
use clipdeck_lib::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    match clipdeck_lib::run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("clipdeck: {}", e);
            ExitCode::FAILURE
        }
    }
}
