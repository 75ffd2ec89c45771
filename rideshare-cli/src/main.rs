//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

#[expect(
    clippy::print_stderr,
    reason = "the CLI reports fatal errors on stderr before exiting"
)]
fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = rideshare_cli::run() {
        eprintln!("rideshare: {err}");
        std::process::exit(1);
    }
}
