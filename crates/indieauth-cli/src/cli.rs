//! Command-line argument types

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// indieauth - tokens and keys for IndieAuth endpoints
#[derive(Parser, Debug)]
#[command(
    name = "indieauth",
    version,
    about = "Tokens and keys for IndieAuth authorization and token endpoints",
    long_about = "Generate PKCE pairs and JWKS key sets, mint access and refresh tokens,\n\
                  and sign, decode or verify JWTs.\n\n\
                  Settings are read from indieauth.toml (or --config), then INDIEAUTH_*\n\
                  environment variables, then command-line flags.\n\n\
                  SECURITY WARNINGS:\n\
                  - `jwks generate` prints private keys; redirect it to a file with\n\
                    restrictive permissions\n\
                  - Publish only the output of `jwks public`"
)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (TOML, YAML or JSON)
    #[arg(long, short = 'c', global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v, -vv, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all logging except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// PKCE code verifiers and challenges
    #[command(subcommand)]
    Pkce(PkceCommands),

    /// JWKS key sets
    #[command(subcommand)]
    Jwks(JwksCommands),

    /// Sign a JWT with a key from the private JWKS
    Sign(SignArgs),

    /// Decode a JWT without verifying it
    Decode(DecodeArgs),

    /// Verify a JWT against the issuer's JWKS
    Verify(VerifyArgs),

    /// Mint an access token
    #[command(name = "access-token")]
    AccessToken(AccessTokenArgs),

    /// Mint a refresh token
    #[command(name = "refresh-token")]
    RefreshToken(RefreshTokenArgs),
}

/// PKCE subcommands
#[derive(Subcommand, Debug)]
pub enum PkceCommands {
    /// Generate a code verifier
    Verifier {
        /// Verifier length (43 to 128)
        #[arg(long, short = 'l', default_value_t = 64)]
        length: usize,

        /// Seed for a reproducible verifier (testing only)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Derive the code challenge of a verifier
    Challenge {
        /// Code verifier
        verifier: String,

        /// Challenge method
        #[arg(long, short = 'm', value_enum, default_value = "s256")]
        method: Method,
    },

    /// Generate a verifier and its challenge
    Pair {
        /// Verifier length (43 to 128)
        #[arg(long, short = 'l', default_value_t = 64)]
        length: usize,

        /// Challenge method
        #[arg(long, short = 'm', value_enum, default_value = "s256")]
        method: Method,
    },
}

/// `code_challenge_method` choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    /// Challenge equals the verifier
    Plain,
    /// SHA-256 of the verifier, base64url encoded
    #[value(name = "S256", alias = "s256")]
    S256,
}

/// JWKS subcommands
#[derive(Subcommand, Debug)]
pub enum JwksCommands {
    /// Generate a private key set
    Generate {
        /// Key IDs, one key per kid
        #[arg(long = "kid", required = true, value_name = "KID")]
        kids: Vec<String>,

        /// Signing algorithm of the generated keys
        #[arg(long, value_enum, default_value = "ES256")]
        alg: KeyAlgorithm,

        /// RSA modulus size in bits
        #[arg(long, default_value_t = 2048)]
        bits: usize,
    },

    /// Print the public half of a private key set
    Public {
        #[command(flatten)]
        keys: KeysArgs,
    },
}

/// Algorithms `jwks generate` can produce keys for
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyAlgorithm {
    #[value(name = "ES256")]
    Es256,
    #[value(name = "RS256")]
    Rs256,
    #[value(name = "RS384")]
    Rs384,
    #[value(name = "RS512")]
    Rs512,
    #[value(name = "PS256")]
    Ps256,
    #[value(name = "PS384")]
    Ps384,
    #[value(name = "PS512")]
    Ps512,
}

/// Where the private JWKS comes from
#[derive(Args, Debug, Clone, Default)]
pub struct KeysArgs {
    /// Private JWKS file (overrides the `jwks` setting)
    #[arg(long, value_name = "FILE")]
    pub jwks: Option<PathBuf>,
}

/// Arguments of `sign`
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Claims to sign, as a JSON object
    #[arg(long, short = 'p', default_value = "{}")]
    pub payload: String,

    /// Signing key (random key from the set when omitted)
    #[arg(long)]
    pub kid: Option<String>,

    /// Token lifetime, e.g. "15 minutes"
    #[arg(long, short = 'e')]
    pub expiration: Option<String>,

    /// Value of the `iss` claim
    #[arg(long)]
    pub issuer: Option<String>,

    #[command(flatten)]
    pub keys: KeysArgs,
}

/// Arguments of `decode`
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Compact JWT
    pub jwt: String,

    /// Print the header instead of the claims
    #[arg(long)]
    pub header: bool,
}

/// Arguments of `verify`
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Compact JWT
    pub jwt: String,

    /// Expected `iss`
    #[arg(long)]
    pub issuer: Option<String>,

    /// Issuer JWKS endpoint
    #[arg(long, conflicts_with = "jwks")]
    pub jwks_url: Option<String>,

    /// Verify with a local JWKS file instead of fetching one
    #[arg(long, value_name = "FILE")]
    pub jwks: Option<PathBuf>,

    /// Reject tokens issued longer ago than this, e.g. "1 hour"
    #[arg(long)]
    pub max_token_age: Option<String>,
}

/// Arguments of `access-token`
#[derive(Args, Debug)]
pub struct AccessTokenArgs {
    /// Profile URL of the user
    #[arg(long)]
    pub me: String,

    /// Space-separated scopes
    #[arg(long, short = 's')]
    pub scope: String,

    /// Token lifetime, e.g. "15 minutes"
    #[arg(long, short = 'e')]
    pub expiration: Option<String>,

    /// Value of the `iss` claim
    #[arg(long)]
    pub issuer: Option<String>,

    #[command(flatten)]
    pub keys: KeysArgs,
}

/// Arguments of `refresh-token`
#[derive(Args, Debug)]
pub struct RefreshTokenArgs {
    /// Token lifetime, e.g. "60 days"
    #[arg(long, short = 'e')]
    pub expiration: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        let cli = Cli::try_parse_from(["indieauth", "-vvv", "refresh-token"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let cli = Cli::try_parse_from(["indieauth", "-v", "--quiet", "refresh-token"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_jwks_generate_requires_kid() {
        assert!(Cli::try_parse_from(["indieauth", "jwks", "generate"]).is_err());

        let cli = Cli::try_parse_from([
            "indieauth", "jwks", "generate", "--kid", "a", "--kid", "b", "--alg", "RS256",
        ])
        .unwrap();
        match cli.command {
            Commands::Jwks(JwksCommands::Generate { kids, alg, bits }) => {
                assert_eq!(kids, vec!["a", "b"]);
                assert_eq!(alg, KeyAlgorithm::Rs256);
                assert_eq!(bits, 2048);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_verify_sources_conflict() {
        let cli = Cli::try_parse_from([
            "indieauth",
            "verify",
            "a.b.c",
            "--jwks-url",
            "https://issuer.example/jwks",
            "--jwks",
            "keys.json",
        ]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_pkce_method_names() {
        for name in ["S256", "s256"] {
            let cli =
                Cli::try_parse_from(["indieauth", "pkce", "challenge", "abc", "-m", name]).unwrap();
            assert!(matches!(
                cli.command,
                Commands::Pkce(PkceCommands::Challenge {
                    method: Method::S256,
                    ..
                })
            ));
        }
    }
}
