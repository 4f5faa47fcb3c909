//! Bearer token extraction and decoding

use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderName;
use http::header::AUTHORIZATION;
use http::request::Parts;
use tracing::debug;

use super::{BearerToken, Stage};
use crate::claims::AccessTokenClaims;
use crate::jwt::{TokenVerifier, safe_decode_as};
use crate::oauth_error::OAuthError;

/// Options for [`DecodeAccessToken`]
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Header carrying the token (default `Authorization`)
    pub header: HeaderName,
    /// Auth scheme in front of the token, matched case-insensitively
    /// (default `Bearer`)
    pub scheme: String,
    /// Verify signature and issuer instead of only decoding
    pub verifier: Option<Arc<TokenVerifier>>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            header: AUTHORIZATION,
            scheme: "Bearer".to_string(),
            verifier: None,
        }
    }
}

impl DecodeOptions {
    /// Verify tokens with `verifier`
    #[must_use]
    pub fn verify_with(mut self, verifier: Arc<TokenVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Read the token from `header`
    #[must_use]
    pub fn header(mut self, header: HeaderName) -> Self {
        self.header = header;
        self
    }

    /// Expect `scheme` in front of the token
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }
}

/// Reads the bearer token and stores its claims in the request extensions
///
/// | Condition | Response |
/// |---|---|
/// | header missing | 401 `unauthorized` |
/// | header sent more than once | 400 `invalid_request` |
/// | scheme missing or different | 401 `unauthorized` |
/// | empty token | 401 `unauthorized` |
/// | token does not decode (or verify) | 401 `invalid_token` |
#[derive(Debug, Clone, Default)]
pub struct DecodeAccessToken {
    options: DecodeOptions,
}

impl DecodeAccessToken {
    /// Decode stage with `options`
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    fn extract<'a>(&self, parts: &'a Parts) -> Result<&'a str, OAuthError> {
        let mut values = parts.headers.get_all(&self.options.header).iter();
        let header = self.options.header.as_str();
        let value = match (values.next(), values.next()) {
            (None, _) => return Err(OAuthError::unauthorized(format!("missing {header} header"))),
            (Some(_), Some(_)) => {
                return Err(OAuthError::invalid_request(format!(
                    "{header} header must be sent once"
                )));
            }
            (Some(value), None) => value,
        };
        let value = value.to_str().map_err(|_| {
            OAuthError::invalid_request(format!("{header} header is not visible ASCII"))
        })?;

        let scheme = self.options.scheme.as_str();
        let (prefix, rest) = value.split_once(' ').unwrap_or((value, ""));
        if !prefix.eq_ignore_ascii_case(scheme) {
            return Err(OAuthError::unauthorized(format!(
                "{header} header does not use the {scheme} scheme"
            )));
        }
        let token = rest.trim();
        if token.is_empty() {
            return Err(OAuthError::unauthorized(format!(
                "no token after {scheme} in {header} header"
            )));
        }
        Ok(token)
    }
}

#[async_trait]
impl Stage for DecodeAccessToken {
    fn name(&self) -> &'static str {
        "decode-access-token"
    }

    async fn run(&self, parts: &mut Parts) -> Result<(), OAuthError> {
        let token = self.extract(parts)?.to_string();

        let claims: AccessTokenClaims = match &self.options.verifier {
            Some(verifier) => verifier.verify(&token).await,
            None => safe_decode_as(&token),
        }
        .map_err(|e| {
            debug!(error = %e, "access token rejected");
            OAuthError::invalid_token(e.to_string())
        })?;

        debug!(jti = %claims.jti, me = %claims.me, "access token decoded");
        parts.extensions.insert(claims);
        parts.extensions.insert(BearerToken(token));
        Ok(())
    }
}
