//! Code verifier generation

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::{PkceError, Result};

/// Unreserved characters allowed in a code verifier (RFC 7636 Section 4.1)
pub const ALPHABET: &[u8; 66] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Shortest verifier RFC 7636 allows
pub const MIN_VERIFIER_LEN: usize = 43;

/// Longest verifier RFC 7636 allows
pub const MAX_VERIFIER_LEN: usize = 128;

/// Generate a code verifier of exactly `len` characters
///
/// Characters are drawn uniformly from [`ALPHABET`]. With `Some(seed)` the
/// output is a pure function of `(len, seed)`, which keeps tests
/// reproducible. With `None` every call uses the thread-local CSPRNG.
///
/// # Errors
///
/// Returns [`PkceError::InvalidLength`] unless `43 <= len <= 128`.
///
/// # Example
///
/// ```rust
/// use indieauth_pkce::code_verifier;
///
/// let a = code_verifier(50, Some(42))?;
/// let b = code_verifier(50, Some(42))?;
/// assert_eq!(a, b);
/// # Ok::<(), indieauth_pkce::PkceError>(())
/// ```
pub fn code_verifier(len: usize, seed: Option<u64>) -> Result<String> {
    if !(MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN).contains(&len) {
        return Err(PkceError::InvalidLength {
            len,
            min: MIN_VERIFIER_LEN,
            max: MAX_VERIFIER_LEN,
        });
    }

    let verifier = match seed {
        Some(seed) => sample(&mut StdRng::seed_from_u64(seed), len),
        None => sample(&mut rand::thread_rng(), len),
    };

    trace!(len, seeded = seed.is_some(), "generated code_verifier");
    Ok(verifier)
}

fn sample<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}

/// Check that `verifier` has a legal length and only unreserved characters
pub fn is_valid_code_verifier(verifier: &str) -> bool {
    (MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN).contains(&verifier.len())
        && verifier.bytes().all(|b| ALPHABET.contains(&b))
}
