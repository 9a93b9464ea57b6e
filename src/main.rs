use clap::Parser;
use rotator::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    rotator::logging::init_logging(cli.verbose);
    run(cli)
}
