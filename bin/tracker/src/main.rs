//! The katana tracker binary.

use clap::Parser;

mod cli;
mod flags;

fn main() {
    katana_cli::backtrace::enable();

    if let Err(err) = cli::Cli::parse().run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
