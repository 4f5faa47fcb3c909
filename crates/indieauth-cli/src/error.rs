//! CLI error types and exit codes

use std::path::PathBuf;

use indieauth_token::ErrorKind;
use thiserror::Error;

/// Errors raised by the CLI itself
///
/// Library errors travel unchanged inside [`anyhow::Error`]; [`exit_code`]
/// looks through the chain to classify them.
#[derive(Error, Debug)]
pub enum CliError {
    /// Explicit settings file does not exist
    #[error("configuration file not found: {}", .0.display())]
    ConfigFileNotFound(PathBuf),

    /// Settings file extension is not toml, yaml, yml or json
    #[error("unsupported configuration file format: {} (use .toml, .yaml, .yml or .json)", .0.display())]
    UnsupportedConfigFormat(PathBuf),

    /// Settings could not be parsed
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    /// A value needed by the command is neither configured nor passed
    #[error("no {name} configured: pass {flag} or set it in the settings file")]
    MissingSetting {
        /// Settings key
        name: &'static str,
        /// Command-line flag supplying it
        flag: &'static str,
    },

    /// Invalid command arguments
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Exit code for a failed run
///
/// - `2`: the token was rejected (verification or authorization failure)
/// - `3`: the JWKS endpoint could not be reached
/// - `64`: bad arguments or settings
/// - `1`: anything else
pub fn exit_code(error: &anyhow::Error) -> u8 {
    for cause in error.chain() {
        if let Some(err) = cause.downcast_ref::<indieauth_token::Error>() {
            return match err.kind() {
                ErrorKind::Verification | ErrorKind::Authorization => 2,
                ErrorKind::Transport => 3,
                ErrorKind::Configuration => 64,
                ErrorKind::Cryptographic => 1,
            };
        }
        if cause.downcast_ref::<CliError>().is_some()
            || cause.downcast_ref::<indieauth_pkce::PkceError>().is_some()
        {
            return 64;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_codes() {
        let rejected = anyhow::Error::new(indieauth_token::Error::MissingClaim("me"));
        assert_eq!(exit_code(&rejected), 2);

        let unreachable: Result<(), indieauth_token::Error> =
            Err(indieauth_token::Error::JwksFetch("timeout".into()));
        let unreachable = unreachable.context("verifying token").unwrap_err();
        assert_eq!(exit_code(&unreachable), 3);

        let missing = anyhow::Error::new(CliError::MissingSetting {
            name: "issuer",
            flag: "--issuer",
        });
        assert_eq!(exit_code(&missing), 64);

        let io = anyhow::Error::new(std::io::Error::other("disk full"));
        assert_eq!(exit_code(&io), 1);
    }

    #[test]
    fn test_missing_setting_message() {
        let err = CliError::MissingSetting {
            name: "issuer",
            flag: "--issuer",
        };
        assert_eq!(
            err.to_string(),
            "no issuer configured: pass --issuer or set it in the settings file"
        );
    }
}
