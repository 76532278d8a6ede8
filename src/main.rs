use clap::Parser;
use tracing_subscriber::EnvFilter;
use tradesim::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    init_logging();
    run(Cli::parse())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
