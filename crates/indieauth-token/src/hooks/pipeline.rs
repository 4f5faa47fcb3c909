//! Ordered execution of hook stages

use std::sync::Arc;

use http::request::Parts;
use tracing::{debug, warn};

use super::{
    BearerToken, DecodeAccessToken, DecodeOptions, LogClaims, Stage, ValidateNotExpired,
    ValidateNotRevoked, ValidateScope,
};
use crate::claims::AccessTokenClaims;
use crate::oauth_error::OAuthError;
use crate::revocation::RevocationCheck;

/// Runs stages in order; the first failure stops the chain
///
/// On failure anything earlier stages put into the request extensions is
/// removed again, so a rejected request never carries claims.
///
/// # Example
///
/// ```rust
/// use indieauth_token::hooks::{AccessTokenPipeline, DecodeOptions};
/// use indieauth_token::revocation::NeverRevoked;
///
/// let pipeline = AccessTokenPipeline::standard(DecodeOptions::default(), NeverRevoked, Some("create"));
/// assert_eq!(
///     pipeline.stage_names(),
///     vec!["decode-access-token", "log-claims", "validate-not-expired", "validate-not-revoked", "validate-scope"]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct AccessTokenPipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl AccessTokenPipeline {
    /// Empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode, log, expiry, revocation and scope stages in that order
    pub fn standard<R: RevocationCheck + 'static>(
        decode: DecodeOptions,
        revocation: R,
        scope: Option<&str>,
    ) -> Self {
        Self::new()
            .stage(DecodeAccessToken::new(decode))
            .stage(LogClaims::default())
            .stage(ValidateNotExpired)
            .stage(ValidateNotRevoked::new(revocation))
            .stage(ValidateScope::new(scope))
    }

    /// Append a stage
    #[must_use]
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Names of the stages, in order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage against `parts`
    ///
    /// Returns the claims left by the decode stage, if any.
    ///
    /// # Errors
    ///
    /// The [`OAuthError`] of the first stage that rejects the request.
    pub async fn run(&self, parts: &mut Parts) -> Result<Option<AccessTokenClaims>, OAuthError> {
        for stage in &self.stages {
            if let Err(err) = stage.run(parts).await {
                warn!(
                    stage = stage.name(),
                    error = %err.code,
                    path = %parts.uri.path(),
                    "request rejected"
                );
                parts.extensions.remove::<AccessTokenClaims>();
                parts.extensions.remove::<BearerToken>();
                return Err(err);
            }
            debug!(stage = stage.name(), "stage passed");
        }
        Ok(parts.extensions.get::<AccessTokenClaims>().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expiry::unix_now;
    use crate::hooks::test_support::{parts, unsigned_jwt};
    use crate::oauth_error::OAuthErrorCode;
    use crate::revocation::{NeverRevoked, RevocationFn};
    use http::HeaderValue;
    use http::header::AUTHORIZATION;
    use serde_json::json;

    fn request(scope: &str, jti: &str) -> Parts {
        let jwt = unsigned_jwt(&json!({
            "iss": "https://issuer.example/",
            "iat": unix_now(),
            "exp": unix_now() + 60,
            "jti": jti,
            "me": "https://me.example/",
            "scope": scope
        }));
        let mut parts = parts();
        parts.headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {jwt}")).unwrap(),
        );
        parts
    }

    #[tokio::test]
    async fn test_all_stages_pass() {
        let pipeline =
            AccessTokenPipeline::standard(DecodeOptions::default(), NeverRevoked, Some("create"));
        let claims = pipeline
            .run(&mut request("create update", "j1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claims.jti, "j1");
    }

    #[tokio::test]
    async fn test_failure_discards_claims() {
        let pipeline =
            AccessTokenPipeline::standard(DecodeOptions::default(), NeverRevoked, Some("media"));
        let mut parts = request("create", "j1");
        let err = pipeline.run(&mut parts).await.unwrap_err();
        assert_eq!(err.code, OAuthErrorCode::InsufficientScope);
        assert!(parts.extensions.get::<AccessTokenClaims>().is_none());
        assert!(parts.extensions.get::<BearerToken>().is_none());
    }

    #[tokio::test]
    async fn test_revocation_runs_before_scope() {
        let revoked = RevocationFn::new(|_| async { Ok(true) });
        let pipeline =
            AccessTokenPipeline::standard(DecodeOptions::default(), revoked, Some("media"));
        let err = pipeline.run(&mut request("create", "j1")).await.unwrap_err();
        assert_eq!(err.code, OAuthErrorCode::InvalidToken);
    }

    #[tokio::test]
    async fn test_empty_pipeline_passes_without_claims() {
        assert_eq!(AccessTokenPipeline::new().run(&mut parts()).await, Ok(None));
    }
}
