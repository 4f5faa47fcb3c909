//! # indieauth-cli
//!
//! Operator tooling for IndieAuth token endpoints, built on
//! `indieauth-pkce` and `indieauth-token`.
//!
//! ```text
//! indieauth pkce pair
//! indieauth jwks generate --kid key-2025 > jwks.json
//! indieauth jwks public --jwks jwks.json > public.json
//! indieauth access-token --jwks jwks.json --issuer https://issuer.example/ \
//!     --me https://alice.example/ --scope "create update"
//! indieauth verify <JWT> --issuer https://issuer.example/ --jwks-url https://issuer.example/jwks
//! ```
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── cli.rs        # clap argument types
//! ├── config.rs     # layered settings (file, INDIEAUTH_* env)
//! ├── commands/     # command implementations
//! ├── logging.rs    # tracing subscriber
//! └── error.rs      # CLI errors and exit codes
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

use std::io::Write;

use anyhow::Context;
use clap::Parser;

use crate::cli::Cli;
use crate::config::Settings;

/// Parse the process arguments and run the command against stdout
///
/// # Errors
///
/// Settings, logging and command failures.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    logging::init(&logging::filter_directive(
        cli.verbose,
        cli.quiet,
        &settings.log_level,
    ))
    .context("initializing logging")?;

    let mut stdout = std::io::stdout().lock();
    execute(cli, &settings, &mut stdout).await
}

/// Run an already parsed command line, writing output to `out`
///
/// # Errors
///
/// Whatever the command fails with.
pub async fn execute(cli: Cli, settings: &Settings, out: &mut dyn Write) -> anyhow::Result<()> {
    cli.command.execute(settings, out).await?;
    out.flush()?;
    Ok(())
}
