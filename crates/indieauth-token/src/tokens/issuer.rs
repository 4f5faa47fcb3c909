//! Token endpoint building blocks
//!
//! [`TokenIssuer`] combines the two factories into the bundle a token
//! endpoint returns, hands it to an [`IssuedTokensHook`] for persistence,
//! and exchanges refresh tokens looked up through a [`RefreshTokenStore`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::access::{AccessTokenConfig, access_token};
use super::refresh::{RefreshTokenConfig, refresh_token};
use crate::error::{Error, Result};
use crate::expiry::{is_expired, unix_now};
use crate::jwk::Jwks;
use crate::records::RefreshTokenRecord;

/// Token endpoint response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedTokens {
    /// Signed JWT
    pub access_token: String,
    /// Always `"Bearer"`
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Granted scope
    pub scope: String,
    /// Profile URL of the user
    pub me: String,
    /// Key the access token was signed with
    #[serde(skip)]
    pub kid: String,
    /// Opaque refresh token, when refresh tokens are enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Refresh token expiration (UNIX seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token_expires_at: Option<i64>,
    /// Client the tokens were issued to
    #[serde(skip)]
    pub client_id: Option<String>,
}

/// Called with every bundle the issuer mints, e.g. to persist it
#[async_trait]
pub trait IssuedTokensHook: Send + Sync + fmt::Debug {
    /// Persist or otherwise react to freshly issued tokens
    async fn on_issued_tokens(&self, tokens: &IssuedTokens) -> Result<()>;
}

#[async_trait]
impl<T: IssuedTokensHook + ?Sized> IssuedTokensHook for Arc<T> {
    async fn on_issued_tokens(&self, tokens: &IssuedTokens) -> Result<()> {
        (**self).on_issued_tokens(tokens).await
    }
}

/// Hook that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIssuedTokensHook;

#[async_trait]
impl IssuedTokensHook for NoopIssuedTokensHook {
    async fn on_issued_tokens(&self, _tokens: &IssuedTokens) -> Result<()> {
        Ok(())
    }
}

/// Lookup of persisted refresh tokens by value
#[async_trait]
pub trait RefreshTokenStore: Send + Sync + fmt::Debug {
    /// The record for `refresh_token`, if the store knows it
    async fn retrieve_refresh_token(&self, refresh_token: &str)
    -> Result<Option<RefreshTokenRecord>>;
}

#[async_trait]
impl<T: RefreshTokenStore + ?Sized> RefreshTokenStore for Arc<T> {
    async fn retrieve_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<RefreshTokenRecord>> {
        (**self).retrieve_refresh_token(refresh_token).await
    }
}

/// Issues access tokens (and optionally refresh tokens) for one issuer
#[derive(Debug, Clone)]
pub struct TokenIssuer<H = NoopIssuedTokensHook> {
    issuer: String,
    jwks: Jwks,
    access_token_expiration: String,
    refresh_token_expiration: Option<String>,
    hook: H,
}

impl TokenIssuer<NoopIssuedTokensHook> {
    /// Issuer that mints access tokens only
    pub fn new(
        issuer: impl Into<String>,
        jwks: Jwks,
        access_token_expiration: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            jwks,
            access_token_expiration: access_token_expiration.into(),
            refresh_token_expiration: None,
            hook: NoopIssuedTokensHook,
        }
    }
}

impl<H: IssuedTokensHook> TokenIssuer<H> {
    /// Also mint a refresh token with every access token
    pub fn with_refresh_tokens(mut self, expiration: impl Into<String>) -> Self {
        self.refresh_token_expiration = Some(expiration.into());
        self
    }

    /// Call `hook` with every issued bundle
    pub fn with_hook<H2: IssuedTokensHook>(self, hook: H2) -> TokenIssuer<H2> {
        TokenIssuer {
            issuer: self.issuer,
            jwks: self.jwks,
            access_token_expiration: self.access_token_expiration,
            refresh_token_expiration: self.refresh_token_expiration,
            hook,
        }
    }

    /// Issuer URL
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Mint tokens for `me` with `scope`
    ///
    /// # Errors
    ///
    /// Factory errors from [`access_token`] and [`refresh_token`], and
    /// whatever the hook returns.
    pub async fn issue(
        &self,
        me: &str,
        scope: &str,
        client_id: Option<&str>,
    ) -> Result<IssuedTokens> {
        let access = access_token(&AccessTokenConfig {
            expiration: self.access_token_expiration.clone(),
            issuer: self.issuer.clone(),
            jwks: self.jwks.clone(),
            me: me.to_string(),
            scope: scope.to_string(),
        })?;

        let refresh = match &self.refresh_token_expiration {
            Some(expiration) => Some(refresh_token(&RefreshTokenConfig {
                expiration: expiration.clone(),
            })?),
            None => None,
        };

        let tokens = IssuedTokens {
            access_token: access.access_token,
            token_type: "Bearer".to_string(),
            expires_in: access.expires_in,
            scope: scope.to_string(),
            me: me.to_string(),
            kid: access.kid,
            refresh_token_expires_at: refresh.as_ref().map(|r| r.exp),
            refresh_token: refresh.map(|r| r.refresh_token),
            client_id: client_id.map(str::to_string),
        };

        self.hook.on_issued_tokens(&tokens).await?;
        debug!(me, scope, with_refresh = tokens.refresh_token.is_some(), "issued tokens");
        Ok(tokens)
    }

    /// Exchange a refresh token for a new bundle
    ///
    /// The new tokens carry the scope of the original grant.
    ///
    /// # Errors
    ///
    /// - [`Error::Verification`] if the store does not know the token
    /// - [`Error::Revoked`] if the stored record is soft-deleted
    /// - [`Error::Expired`] if the refresh token has expired
    /// - [`Error::Store`] from the store, and everything [`TokenIssuer::issue`] returns
    pub async fn refresh<S: RefreshTokenStore + ?Sized>(
        &self,
        store: &S,
        refresh_token: &str,
    ) -> Result<IssuedTokens> {
        let record = store
            .retrieve_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| {
                warn!("unknown refresh token presented");
                Error::Verification("unknown refresh token".into())
            })?;

        if record.is_deleted() {
            warn!(record_id = %record.id, "revoked refresh token presented");
            return Err(Error::Revoked {
                jti: record.id.clone(),
            });
        }
        if is_expired(record.props.exp, unix_now()) {
            warn!(record_id = %record.id, exp = record.props.exp, "expired refresh token presented");
            return Err(Error::Expired {
                exp: record.props.exp,
            });
        }

        info!(me = %record.props.me, record_id = %record.id, "exchanging refresh token");
        self.issue(
            &record.props.me,
            &record.props.scope,
            record.props.client_id.as_deref(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwk::Jwk;
    use crate::records::{MutableRecord, RefreshTokenProps};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Recorder(Mutex<Vec<IssuedTokens>>);

    #[async_trait]
    impl IssuedTokensHook for Recorder {
        async fn on_issued_tokens(&self, tokens: &IssuedTokens) -> Result<()> {
            self.0.lock().unwrap().push(tokens.clone());
            Ok(())
        }
    }

    #[derive(Debug)]
    struct OneToken(RefreshTokenRecord);

    #[async_trait]
    impl RefreshTokenStore for OneToken {
        async fn retrieve_refresh_token(
            &self,
            refresh_token: &str,
        ) -> Result<Option<RefreshTokenRecord>> {
            Ok((self.0.props.refresh_token == refresh_token).then(|| self.0.clone()))
        }
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            "https://issuer.example/",
            Jwks::new(vec![Jwk::generate_es256("k1")]),
            "15 minutes",
        )
    }

    fn record(exp: i64, deleted_at: Option<i64>) -> RefreshTokenRecord {
        MutableRecord {
            id: "rt-1".into(),
            created_at: unix_now(),
            updated_at: None,
            deleted_at,
            undeleted_at: None,
            props: RefreshTokenProps {
                refresh_token: "V1StGXR8_Z5jdHi6B-myT".into(),
                exp,
                me: "https://me.example/".into(),
                scope: "create media".into(),
                client_id: Some("https://app.example/".into()),
            },
        }
    }

    #[tokio::test]
    async fn test_issue_calls_hook() {
        let recorder = Arc::new(Recorder::default());
        let issuer = issuer()
            .with_refresh_tokens("30 days")
            .with_hook(Arc::clone(&recorder));

        let tokens = issuer
            .issue("https://me.example/", "create", None)
            .await
            .unwrap();
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, 900);
        assert!(tokens.refresh_token.is_some());
        assert_eq!(recorder.0.lock().unwrap().as_slice(), &[tokens]);
    }

    #[tokio::test]
    async fn test_no_refresh_token_by_default() {
        let tokens = issuer()
            .issue("https://me.example/", "create", None)
            .await
            .unwrap();
        assert!(tokens.refresh_token.is_none());
        let body = serde_json::to_value(&tokens).unwrap();
        assert!(body.get("refresh_token").is_none());
        assert!(body.get("kid").is_none());
    }

    #[tokio::test]
    async fn test_refresh_keeps_original_scope() {
        let store = OneToken(record(unix_now() + 3600, None));
        let tokens = issuer()
            .refresh(&store, "V1StGXR8_Z5jdHi6B-myT")
            .await
            .unwrap();
        assert_eq!(tokens.scope, "create media");
        assert_eq!(tokens.client_id.as_deref(), Some("https://app.example/"));
    }

    #[tokio::test]
    async fn test_refresh_rejections() {
        let issuer = issuer();

        let store = OneToken(record(unix_now() + 3600, None));
        assert!(matches!(
            issuer.refresh(&store, "unknown").await,
            Err(Error::Verification(_))
        ));

        let store = OneToken(record(unix_now() + 3600, Some(unix_now())));
        assert!(matches!(
            issuer.refresh(&store, "V1StGXR8_Z5jdHi6B-myT").await,
            Err(Error::Revoked { .. })
        ));

        let store = OneToken(record(unix_now() - 10, None));
        assert!(matches!(
            issuer.refresh(&store, "V1StGXR8_Z5jdHi6B-myT").await,
            Err(Error::Expired { .. })
        ));
    }
}
