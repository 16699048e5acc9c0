// src/main.rs
use clap::Parser;

use kubectl_credentials_helper::cli::{self, Args};
use kubectl_credentials_helper::utils::logging::CONSOLE_PREFIX;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    if let Err(err) = cli::run(args) {
        eprintln!("{}error: {:#}", CONSOLE_PREFIX, err);
        std::process::exit(1);
    }
}
