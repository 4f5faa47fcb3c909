//! Expiry check on decoded claims

use async_trait::async_trait;
use http::request::Parts;
use tracing::debug;

use super::{Stage, claims_of};
use crate::expiry::{is_expired, unix_now};
use crate::oauth_error::OAuthError;

/// Rejects tokens whose `exp` has passed with 401 `invalid_token`
///
/// Needed when the decode stage only decodes; a verifying decode stage
/// already refuses expired tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateNotExpired;

#[async_trait]
impl Stage for ValidateNotExpired {
    fn name(&self) -> &'static str {
        "validate-not-expired"
    }

    async fn run(&self, parts: &mut Parts) -> Result<(), OAuthError> {
        let claims = claims_of(parts)?;
        let now = unix_now();
        if is_expired(claims.exp, now) {
            debug!(jti = %claims.jti, exp = claims.exp, now, "access token expired");
            return Err(OAuthError::invalid_token(format!(
                "access token expired at {}",
                claims.exp
            )));
        }
        Ok(())
    }
}
