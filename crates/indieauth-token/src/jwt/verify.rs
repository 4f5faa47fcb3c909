//! JWT verification against a JWKS
//!
//! Checks, in order:
//!
//! 1. the header names an allowed asymmetric `alg` and a `kid`
//! 2. the `kid` resolves to a key whose type fits the `alg`
//! 3. the signature, `iss` equality and `exp`
//! 4. the presence of `exp`, `iat`, `iss`, `jti`, `me` and `scope`
//! 5. optionally, that `iat` is no older than a maximum token age
//!
//! When the `kid` is not in a remote key set the set is refetched once,
//! which covers an issuer that rotated keys since the cache was filled.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::jwks::JwksClient;
use crate::claims::{AccessTokenClaims, REQUIRED_CLAIMS};
use crate::error::{Error, Result};
use crate::expiry::{parse_expiration, unix_now};
use crate::jwk::{Jwk, Jwks, is_asymmetric};

/// Inputs for [`verify`]
#[derive(Debug, Clone, Copy)]
pub struct VerifyConfig<'a> {
    /// Expected `iss`
    pub issuer: &'a str,
    /// Where the issuer publishes its public keys
    pub jwks_url: &'a str,
    /// Compact JWT
    pub jwt: &'a str,
    /// Reject tokens issued longer ago than this, e.g. `"1 hour"`
    pub max_token_age: Option<&'a str>,
}

/// Verify a JWT against a remote JWKS and return its claims
///
/// Builds a one-off [`TokenVerifier`]; keep a verifier around instead when
/// checking many tokens so the key set cache is reused.
///
/// # Errors
///
/// - [`Error::InvalidExpiration`] if `max_token_age` cannot be parsed
/// - [`Error::JwksFetch`] if the key set cannot be retrieved
/// - [`Error::Decode`], [`Error::Verification`], [`Error::MissingClaim`]
///   or [`Error::TokenTooOld`] if the token is not acceptable
pub async fn verify(config: &VerifyConfig<'_>) -> Result<AccessTokenClaims> {
    let mut verifier = TokenVerifier::remote(config.issuer, config.jwks_url);
    if let Some(age) = config.max_token_age {
        verifier = verifier.with_max_token_age(parse_expiration(age)?);
    }
    verifier.verify(config.jwt).await
}

#[derive(Debug, Clone)]
enum KeySource {
    Remote(Arc<JwksClient>),
    Local(Jwks),
}

/// Reusable verifier bound to one issuer and one key source
///
/// # Example
///
/// ```rust,no_run
/// # use indieauth_token::jwt::TokenVerifier;
/// # use std::time::Duration;
/// # tokio_test::block_on(async {
/// let verifier = TokenVerifier::remote("https://issuer.example/", "https://issuer.example/jwks")
///     .with_max_token_age(Duration::from_secs(3600));
///
/// let claims = verifier.verify("eyJhbGciOi...").await?;
/// println!("token for {} with scope {}", claims.me, claims.scope);
/// # Ok::<(), indieauth_token::Error>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    issuer: String,
    keys: KeySource,
    max_token_age: Option<Duration>,
    leeway: u64,
    allowed_algorithms: Vec<Algorithm>,
}

impl TokenVerifier {
    /// Verify with keys fetched from `jwks_url`
    pub fn remote(issuer: impl Into<String>, jwks_url: impl Into<String>) -> Self {
        Self::with_jwks_client(issuer, Arc::new(JwksClient::new(jwks_url)))
    }

    /// Verify with a shared [`JwksClient`]
    pub fn with_jwks_client(issuer: impl Into<String>, client: Arc<JwksClient>) -> Self {
        Self::new(issuer, KeySource::Remote(client))
    }

    /// Verify with an in-memory key set
    ///
    /// Private keys are accepted; only their public half is used.
    pub fn local(issuer: impl Into<String>, jwks: Jwks) -> Self {
        Self::new(issuer, KeySource::Local(jwks))
    }

    fn new(issuer: impl Into<String>, keys: KeySource) -> Self {
        Self {
            issuer: issuer.into(),
            keys,
            max_token_age: None,
            leeway: 0,
            allowed_algorithms: vec![
                Algorithm::ES256,
                Algorithm::EdDSA,
                Algorithm::RS256,
                Algorithm::RS384,
                Algorithm::RS512,
                Algorithm::PS256,
                Algorithm::PS384,
                Algorithm::PS512,
            ],
        }
    }

    /// Reject tokens whose `iat` is older than `max_age`
    pub fn with_max_token_age(mut self, max_age: Duration) -> Self {
        self.max_token_age = Some(max_age);
        self
    }

    /// Clock skew tolerated on `exp`, in seconds (default 0)
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway = seconds;
        self
    }

    /// Restrict the accepted algorithms
    ///
    /// Symmetric algorithms are dropped from the list.
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.allowed_algorithms = algorithms.into_iter().filter(|a| is_asymmetric(*a)).collect();
        self
    }

    /// Expected issuer
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Verify and return the access token claims
    ///
    /// # Errors
    ///
    /// See [`verify`].
    pub async fn verify(&self, jwt: &str) -> Result<AccessTokenClaims> {
        self.verify_as(jwt).await
    }

    /// Verify and deserialize the claims into `C`
    ///
    /// The required-claims check still applies.
    ///
    /// # Errors
    ///
    /// See [`verify`]; additionally [`Error::Decode`] if the claims do not
    /// fit `C`.
    pub async fn verify_as<C: DeserializeOwned>(&self, jwt: &str) -> Result<C> {
        let claims = self.verify_claims(jwt).await?;
        serde_json::from_value(Value::Object(claims)).map_err(|e| Error::Decode(e.to_string()))
    }

    async fn verify_claims(&self, jwt: &str) -> Result<Map<String, Value>> {
        let header = decode_header(jwt).map_err(|e| {
            debug!(error = %e, "failed to decode JWT header");
            Error::Decode(e.to_string())
        })?;

        if !self.allowed_algorithms.contains(&header.alg) {
            warn!(algorithm = ?header.alg, "JWT algorithm not allowed");
            return Err(Error::Verification(format!(
                "algorithm {:?} not allowed",
                header.alg
            )));
        }

        let kid = header
            .kid
            .as_deref()
            .ok_or_else(|| Error::Verification("JWT header has no kid".into()))?;

        let jwk = self.resolve_key(kid).await?;
        jwk.check_algorithm_fits(header.alg)
            .map_err(|e| Error::Verification(e.to_string()))?;
        if let Some(declared) = jwk.alg.as_deref()
            && declared != format!("{:?}", header.alg)
        {
            return Err(Error::Verification(format!(
                "JWT alg {:?} does not match key alg {declared}",
                header.alg
            )));
        }
        let key = jwk.decoding_key()?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_aud = false;
        validation.leeway = self.leeway;
        validation.set_required_spec_claims(&["exp", "iss"]);

        let data = decode::<Map<String, Value>>(jwt, &key, &validation).map_err(|e| {
            warn!(kid, issuer = %self.issuer, error = %e, "JWT verification failed");
            Error::Verification(e.to_string())
        })?;
        let claims = data.claims;

        if let Some(missing) = REQUIRED_CLAIMS.iter().find(|c| !claims.contains_key(**c)) {
            warn!(kid, claim = *missing, "JWT is missing a required claim");
            return Err(Error::MissingClaim(*missing));
        }

        if let Some(max_age) = self.max_token_age {
            let iat = claims
                .get("iat")
                .and_then(Value::as_i64)
                .ok_or_else(|| Error::Verification("iat is not a number".into()))?;
            let age_secs = unix_now() - iat;
            let max_age_secs = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
            if age_secs > max_age_secs {
                warn!(kid, age_secs, max_age_secs, "JWT exceeds max token age");
                return Err(Error::TokenTooOld {
                    age_secs,
                    max_age_secs,
                });
            }
        }

        debug!(
            kid,
            iss = %self.issuer,
            jti = ?claims.get("jti"),
            "JWT verified"
        );
        Ok(claims)
    }

    async fn resolve_key(&self, kid: &str) -> Result<Jwk> {
        match &self.keys {
            KeySource::Local(jwks) => jwks
                .find(kid)
                .cloned()
                .ok_or_else(|| Error::Verification(format!("unknown kid '{kid}'"))),
            KeySource::Remote(client) => {
                if let Some(jwk) = client.get_jwks().await?.find(kid) {
                    return Ok(jwk.clone());
                }
                debug!(kid, jwks_uri = client.jwks_uri(), "kid not in cached JWKS, refreshing");
                client
                    .refresh()
                    .await?
                    .find(kid)
                    .cloned()
                    .ok_or_else(|| Error::Verification(format!("unknown kid '{kid}'")))
            }
        }
    }
}
