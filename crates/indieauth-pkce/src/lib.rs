//! # IndieAuth PKCE
//!
//! Proof Key for Code Exchange (RFC 7636) for IndieAuth clients and
//! authorization endpoints.
//!
//! A client creates a random `code_verifier` for every authorization attempt,
//! sends the derived `code_challenge` with the authorization request and
//! presents the verifier when it redeems the authorization code. The
//! authorization endpoint recomputes the challenge and compares.
//!
//! ## Quick Start
//!
//! ```rust
//! use indieauth_pkce::{code_challenge, code_verifier, verify_code_challenge, ChallengeMethod};
//!
//! let verifier = code_verifier(64, None)?;
//! let challenge = code_challenge(&verifier, ChallengeMethod::S256);
//!
//! assert!(verify_code_challenge(&verifier, &challenge, ChallengeMethod::S256));
//! # Ok::<(), indieauth_pkce::PkceError>(())
//! ```
//!
//! Single use of a verifier is enforced by whoever stores authorization
//! codes, not by this crate.

mod challenge;
mod verifier;

pub use challenge::{ChallengeMethod, code_challenge, verify_code_challenge};
pub use verifier::{
    ALPHABET, MAX_VERIFIER_LEN, MIN_VERIFIER_LEN, code_verifier, is_valid_code_verifier,
};

/// Result alias for PKCE operations
pub type Result<T> = std::result::Result<T, PkceError>;

/// Errors produced by PKCE helpers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PkceError {
    /// Requested verifier length is outside 43..=128
    #[error("code_verifier length must be between {min} and {max}, got {len}")]
    InvalidLength {
        /// Requested length
        len: usize,
        /// Smallest allowed length
        min: usize,
        /// Largest allowed length
        max: usize,
    },

    /// `code_challenge_method` other than `plain` or `S256`
    #[error("unsupported code_challenge_method: {0}")]
    UnsupportedMethod(String),
}

/// A verifier together with the challenge derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkcePair {
    /// Secret kept by the client until the code exchange
    pub code_verifier: String,
    /// Value sent in the authorization request
    pub code_challenge: String,
    /// Transformation used to derive the challenge
    pub method: ChallengeMethod,
}

impl PkcePair {
    /// Generate a fresh random pair with a verifier of `len` characters
    ///
    /// # Errors
    ///
    /// Returns [`PkceError::InvalidLength`] if `len` is outside 43..=128.
    pub fn generate(len: usize, method: ChallengeMethod) -> Result<Self> {
        let code_verifier = code_verifier(len, None)?;
        let code_challenge = code_challenge(&code_verifier, method);
        Ok(Self {
            code_verifier,
            code_challenge,
            method,
        })
    }
}
