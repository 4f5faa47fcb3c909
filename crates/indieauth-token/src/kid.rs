//! Signing key selection
//!
//! Each token is signed with a key picked at random from the private set.
//! Adding a key to the set spreads new signatures across it; a retired key
//! stays verifiable for as long as it remains in the published JWKS.

use rand::Rng;
use tracing::debug;

use crate::error::{Error, Result};
use crate::jwk::Jwk;

/// Pick the `kid` of a random key from `keys`
///
/// # Errors
///
/// - [`Error::EmptyKeySet`] if `keys` is empty
/// - [`Error::MissingKid`] if the chosen key has no `kid`
pub fn random_kid(keys: &[Jwk]) -> Result<String> {
    random_kid_with(keys, &mut rand::thread_rng())
}

/// [`random_kid`] with a caller-provided random source
///
/// # Errors
///
/// Same as [`random_kid`].
pub fn random_kid_with<R: Rng + ?Sized>(keys: &[Jwk], rng: &mut R) -> Result<String> {
    if keys.is_empty() {
        return Err(Error::EmptyKeySet);
    }
    let index = rng.gen_range(0..keys.len());
    let kid = keys[index]
        .kid
        .clone()
        .ok_or(Error::MissingKid { index })?;
    debug!(kid = %kid, index, key_count = keys.len(), "selected signing key");
    Ok(kid)
}
