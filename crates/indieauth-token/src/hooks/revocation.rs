//! Revocation check on decoded claims

use async_trait::async_trait;
use http::request::Parts;
use tracing::{error, info};

use super::{Stage, claims_of};
use crate::oauth_error::OAuthError;
use crate::revocation::RevocationCheck;

/// Asks a [`RevocationCheck`] whether the token's `jti` was revoked
///
/// | Condition | Response |
/// |---|---|
/// | no claims in the request | 401 `unauthorized` |
/// | revoked | 401 `invalid_token` |
/// | store error | 500 `server_error` |
#[derive(Debug, Clone)]
pub struct ValidateNotRevoked<R> {
    check: R,
}

impl<R: RevocationCheck> ValidateNotRevoked<R> {
    /// Check revocation through `check`
    pub fn new(check: R) -> Self {
        Self { check }
    }
}

#[async_trait]
impl<R: RevocationCheck> Stage for ValidateNotRevoked<R> {
    fn name(&self) -> &'static str {
        "validate-not-revoked"
    }

    async fn run(&self, parts: &mut Parts) -> Result<(), OAuthError> {
        let claims = claims_of(parts)?;
        match self.check.is_access_token_revoked(&claims.jti).await {
            Ok(false) => Ok(()),
            Ok(true) => {
                info!(jti = %claims.jti, me = %claims.me, "revoked access token presented");
                Err(OAuthError::invalid_token(format!(
                    "access token {} has been revoked",
                    claims.jti
                )))
            }
            Err(e) => {
                error!(jti = %claims.jti, error = %e, "revocation lookup failed");
                Err(OAuthError::server_error(format!(
                    "could not check revocation status: {e}"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::hooks::test_support::{claims, parts, parts_with_claims};
    use crate::oauth_error::OAuthErrorCode;
    use crate::revocation::RevocationFn;

    fn stage() -> ValidateNotRevoked<RevocationFn> {
        ValidateNotRevoked::new(RevocationFn::new(|jti: String| async move {
            match jti.as_str() {
                "revoked" => Ok(true),
                "broken" => Err(Error::Store("connection refused".into())),
                _ => Ok(false),
            }
        }))
    }

    fn with_jti(jti: &str) -> Parts {
        let mut c = claims("create");
        c.jti = jti.into();
        parts_with_claims(c)
    }

    #[tokio::test]
    async fn test_outcomes() {
        assert!(stage().run(&mut with_jti("fine")).await.is_ok());
        assert_eq!(
            stage().run(&mut with_jti("revoked")).await.unwrap_err().code,
            OAuthErrorCode::InvalidToken
        );
        assert_eq!(
            stage().run(&mut with_jti("broken")).await.unwrap_err().code,
            OAuthErrorCode::ServerError
        );
        assert_eq!(
            stage().run(&mut parts()).await.unwrap_err().code,
            OAuthErrorCode::Unauthorized
        );
    }
}
