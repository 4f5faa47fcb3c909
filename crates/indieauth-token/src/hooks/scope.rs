//! Scope check on decoded claims

use async_trait::async_trait;
use http::request::Parts;
use tracing::debug;

use super::{Stage, claims_of};
use crate::oauth_error::OAuthError;

/// Requires a scope in the token
///
/// Without a configured scope every token passes. Otherwise a token with no
/// scopes, or without the configured one, gets 403 `insufficient_scope`.
#[derive(Debug, Clone, Default)]
pub struct ValidateScope {
    scope: Option<String>,
}

impl ValidateScope {
    /// Require `scope`, or nothing when `None`
    pub fn new(scope: Option<impl Into<String>>) -> Self {
        Self {
            scope: scope.map(Into::into),
        }
    }

    /// Require `scope`
    pub fn require(scope: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
        }
    }
}

#[async_trait]
impl Stage for ValidateScope {
    fn name(&self) -> &'static str {
        "validate-scope"
    }

    async fn run(&self, parts: &mut Parts) -> Result<(), OAuthError> {
        let Some(required) = self.scope.as_deref() else {
            return Ok(());
        };
        let claims = claims_of(parts)?;

        if claims.scopes().next().is_none() {
            debug!(jti = %claims.jti, required, "access token has no scopes");
            return Err(OAuthError::insufficient_scope(
                "access token grants no scopes",
                required,
            ));
        }
        if !claims.has_scope(required) {
            debug!(jti = %claims.jti, required, granted = %claims.scope, "scope missing");
            return Err(OAuthError::insufficient_scope(
                format!("access token does not grant scope '{required}'"),
                required,
            ));
        }
        Ok(())
    }
}
