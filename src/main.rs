use clap::Parser;
use marketscore::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
