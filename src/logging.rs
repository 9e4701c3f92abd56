//! Console logging via `tracing`.
//!
//! Level precedence: `-q` / `-v` flags, then `RUST_LOG`, then the
//! configured `log_level`.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: u8, quiet: bool, configured: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose, quiet, configured))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn filter(verbose: u8, quiet: bool, configured: &str) -> EnvFilter {
    if let Some(directive) = flag_directive(verbose, quiet) {
        return EnvFilter::new(directive);
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured))
}

fn flag_directive(verbose: u8, quiet: bool) -> Option<&'static str> {
    match (quiet, verbose) {
        (true, _) => Some("error"),
        (false, 0) => None,
        (false, 1) => Some("debug"),
        (false, _) => Some("trace"),
    }
}
