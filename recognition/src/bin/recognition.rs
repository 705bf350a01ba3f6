//! recognition binary - command-line access to the recognition engine.

use clap::Parser;
use recognition::cli::{run, Cli};

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
