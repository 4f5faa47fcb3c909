//! Tracing subscriber setup
//!
//! Logs go to stderr; stdout carries command output only.

use std::io;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter directive for the given verbosity
///
/// `-q` wins, then `-v` counts; with neither the configured level is used.
pub fn filter_directive(verbose: u8, quiet: bool, configured: &str) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbose {
        0 => configured.to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber
///
/// `RUST_LOG`, when set, overrides `directive`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(directive: &str) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| io::Error::other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(0, false, "warn"), "warn");
        assert_eq!(filter_directive(1, false, "warn"), "info");
        assert_eq!(filter_directive(2, false, "warn"), "debug");
        assert_eq!(filter_directive(5, false, "warn"), "trace");
        assert_eq!(filter_directive(0, true, "debug"), "error");
    }
}
