use cliproc::*;
use orbitsym::cli::Run;
use std::env;

fn main() -> ExitCode {
    Cli::default().parse(env::args()).go::<Run>()
}
