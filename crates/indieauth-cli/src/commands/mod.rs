//! Command implementations
//!
//! Commands write their result to the given writer (stdout in the binary)
//! and log to stderr through `tracing`.

pub mod jwks;
pub mod jwt;
pub mod pkce;
pub mod tokens;

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use indieauth_token::Jwks;
use serde::Serialize;

use crate::cli::Commands;
use crate::config::Settings;

impl Commands {
    /// Run the command with the resolved settings
    ///
    /// # Errors
    ///
    /// Whatever the command fails with; library errors are kept in the
    /// chain so [`crate::error::exit_code`] can classify them.
    pub async fn execute(self, settings: &Settings, out: &mut dyn Write) -> anyhow::Result<()> {
        match self {
            Commands::Pkce(cmd) => pkce::execute(cmd, out),
            Commands::Jwks(cmd) => jwks::execute(cmd, settings, out),
            Commands::Sign(args) => jwt::sign(args, settings, out),
            Commands::Decode(args) => jwt::decode(&args, out),
            Commands::Verify(args) => jwt::verify(args, settings, out).await,
            Commands::AccessToken(args) => tokens::access_token(args, settings, out),
            Commands::RefreshToken(args) => tokens::refresh_token(args, settings, out),
        }
    }
}

/// Pretty-printed JSON followed by a newline
pub(crate) fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("serializing output")?;
    writeln!(out)?;
    Ok(())
}

/// Read a JWKS file
pub(crate) fn load_jwks(path: &Path) -> anyhow::Result<Jwks> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading JWKS from {}", path.display()))?;
    let jwks = Jwks::from_json(&text).with_context(|| format!("parsing JWKS in {}", path.display()))?;
    tracing::debug!(path = %path.display(), kids = ?jwks.kids(), "loaded JWKS");
    Ok(jwks)
}
