//! Error types for token issuance and verification
//!
//! Every public operation returns [`Result`]. Callers that need to react to
//! a class of failure rather than a specific one use [`Error::kind`].

use std::fmt;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while issuing, decoding or verifying tokens
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Factory input or output does not match its schema
    ///
    /// Holds every violation found, not only the first one.
    #[error("{subject} failed schema validation: {}", .errors.join("; "))]
    SchemaValidation {
        /// What was validated (e.g. "access token config")
        subject: &'static str,
        /// One message per violated constraint
        errors: Vec<String>,
    },

    /// Human-readable duration could not be parsed
    #[error("invalid expiration '{value}': {reason}")]
    InvalidExpiration {
        /// The offending string
        value: String,
        /// Parser message
        reason: String,
    },

    /// Key set has no keys to choose from
    #[error("key set is empty")]
    EmptyKeySet,

    /// Selected JWK has no `kid`
    #[error("JWK at index {index} has no kid")]
    MissingKid {
        /// Position of the key in the set
        index: usize,
    },

    /// No JWK with this `kid` in the key set
    #[error("no JWK with kid '{0}' in key set")]
    UnknownKid(String),

    /// JWK has no `alg`
    #[error("JWK '{kid}' has no alg")]
    MissingAlg {
        /// Key ID of the incomplete key
        kid: String,
    },

    /// `alg` is not one we sign or verify with
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// JWK material could not be turned into a usable key
    #[error("cannot import JWK '{kid}': {reason}")]
    KeyImport {
        /// Key ID of the malformed key
        kid: String,
        /// What was wrong with it
        reason: String,
    },

    /// Claims could not be serialized or signed
    #[error("signing failed: {0}")]
    Signing(String),

    /// Token is not a structurally valid JWT
    #[error("cannot decode token: {0}")]
    Decode(String),

    /// Signature, issuer, expiry or algorithm check failed
    #[error("token verification failed: {0}")]
    Verification(String),

    /// A claim the verifier requires is absent
    #[error("token is missing required claim '{0}'")]
    MissingClaim(&'static str),

    /// `iat` is older than the allowed maximum token age
    #[error("token issued {age_secs}s ago exceeds max age of {max_age_secs}s")]
    TokenTooOld {
        /// Seconds since `iat`
        age_secs: i64,
        /// Allowed age in seconds
        max_age_secs: i64,
    },

    /// `exp` is in the past
    #[error("token expired at {exp}")]
    Expired {
        /// Expiration timestamp (UNIX seconds)
        exp: i64,
    },

    /// Token was revoked by its issuer
    #[error("token '{jti}' has been revoked")]
    Revoked {
        /// JWT ID of the revoked token
        jti: String,
    },

    /// Remote JWKS could not be fetched or parsed
    #[error("JWKS fetch failed: {0}")]
    JwksFetch(String),

    /// Caller-supplied store (revocation, refresh tokens) failed
    #[error("token store error: {0}")]
    Store(String),
}

/// Broad classes of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid configuration or a programming bug upstream; never retried
    Configuration,
    /// Key material or signing problem; fatal for the single operation
    Cryptographic,
    /// Expected, client-facing: the presented token is not acceptable
    Verification,
    /// Network or store failure
    Transport,
    /// Token is valid but no longer honored
    Authorization,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Configuration => "configuration",
            Self::Cryptographic => "cryptographic",
            Self::Verification => "verification",
            Self::Transport => "transport",
            Self::Authorization => "authorization",
        };
        f.write_str(s)
    }
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SchemaValidation { .. } | Self::InvalidExpiration { .. } => {
                ErrorKind::Configuration
            }
            Self::EmptyKeySet
            | Self::MissingKid { .. }
            | Self::UnknownKid(_)
            | Self::MissingAlg { .. }
            | Self::UnsupportedAlgorithm(_)
            | Self::KeyImport { .. }
            | Self::Signing(_) => ErrorKind::Cryptographic,
            Self::Decode(_)
            | Self::Verification(_)
            | Self::MissingClaim(_)
            | Self::TokenTooOld { .. }
            | Self::Expired { .. } => ErrorKind::Verification,
            Self::JwksFetch(_) | Self::Store(_) => ErrorKind::Transport,
            Self::Revoked { .. } => ErrorKind::Authorization,
        }
    }

    pub(crate) fn key_import(kid: &str, reason: impl fmt::Display) -> Self {
        Self::KeyImport {
            kid: kid.to_string(),
            reason: reason.to_string(),
        }
    }
}
