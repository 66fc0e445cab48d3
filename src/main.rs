use clap::Parser;
use fxbracket::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
