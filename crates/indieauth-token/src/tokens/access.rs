//! Access token factory

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{Error, Result};
use crate::expiry::expiration_secs;
use crate::jwk::Jwks;
use crate::jwt::{SignConfig, sign};
use crate::kid::random_kid;
use crate::schema::{self, ACCESS_TOKEN, ACCESS_TOKEN_CONFIG};

const CONFIG_SUBJECT: &str = "access token config";
const RESULT_SUBJECT: &str = "access token";

/// Inputs for [`access_token`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenConfig {
    /// Lifetime, e.g. `"15 minutes"`
    pub expiration: String,
    /// Issuer URL, becomes `iss`
    pub issuer: String,
    /// Private key set; one key is picked at random per token
    pub jwks: Jwks,
    /// Profile URL of the user
    pub me: String,
    /// Space-separated scopes to grant
    pub scope: String,
}

impl TryFrom<Value> for AccessTokenConfig {
    type Error = Error;

    /// Validate untyped input against the config schema, then convert
    fn try_from(value: Value) -> Result<Self> {
        schema::validate(CONFIG_SUBJECT, &ACCESS_TOKEN_CONFIG, &value)?;
        serde_json::from_value(value).map_err(|e| Error::SchemaValidation {
            subject: CONFIG_SUBJECT,
            errors: vec![e.to_string()],
        })
    }
}

/// A freshly minted access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    /// Signed JWT
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    /// Key the token was signed with
    pub kid: String,
}

/// Mint an access token
///
/// Validates `config`, picks a signing key with
/// [`random_kid`](crate::kid::random_kid), signs `{me, scope}` and validates
/// the result before returning it.
///
/// # Errors
///
/// - [`Error::SchemaValidation`] if the config or the result is malformed
/// - [`Error::InvalidExpiration`] if `expiration` cannot be parsed
/// - Key selection and signing errors from [`random_kid`] and [`sign`]
pub fn access_token(config: &AccessTokenConfig) -> Result<AccessToken> {
    let input = serde_json::to_value(config).map_err(|e| Error::SchemaValidation {
        subject: CONFIG_SUBJECT,
        errors: vec![e.to_string()],
    })?;
    schema::validate(CONFIG_SUBJECT, &ACCESS_TOKEN_CONFIG, &input)?;

    let expires_in = expiration_secs(&config.expiration)?;
    let kid = random_kid(&config.jwks.keys)?;

    let mut payload = Map::new();
    payload.insert("me".into(), Value::from(config.me.as_str()));
    payload.insert("scope".into(), Value::from(config.scope.as_str()));

    let jwt = sign(&SignConfig {
        expiration: &config.expiration,
        issuer: &config.issuer,
        jwks: &config.jwks,
        kid: &kid,
        payload: &payload,
    })?;

    let token = AccessToken {
        access_token: jwt,
        expires_in,
        kid,
    };
    let output = serde_json::to_value(&token).map_err(|e| Error::SchemaValidation {
        subject: RESULT_SUBJECT,
        errors: vec![e.to_string()],
    })?;
    schema::validate(RESULT_SUBJECT, &ACCESS_TOKEN, &output)?;

    info!(
        kid = %token.kid,
        me = %config.me,
        scope = %config.scope,
        expires_in,
        "issued access token"
    );
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwk::Jwk;
    use crate::jwt::safe_decode;
    use serde_json::json;

    fn config(scope: &str) -> AccessTokenConfig {
        AccessTokenConfig {
            expiration: "15 minutes".into(),
            issuer: "https://issuer.example/".into(),
            jwks: Jwks::new(vec![Jwk::generate_es256("k1"), Jwk::generate_es256("k2")]),
            me: "https://me.example/".into(),
            scope: scope.into(),
        }
    }

    #[test]
    fn test_expires_in_matches_expiration() {
        let token = access_token(&config("create update")).unwrap();
        assert_eq!(token.expires_in, 900);
        assert!(["k1", "k2"].contains(&token.kid.as_str()));

        let claims = safe_decode(&token.access_token).unwrap();
        assert_eq!(claims["me"], "https://me.example/");
        assert_eq!(claims["scope"], "create update");
        assert_eq!(
            claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
            900
        );
    }

    #[test]
    fn test_empty_scope_is_rejected() {
        let err = access_token(&config("")).unwrap_err();
        assert!(matches!(err, Error::SchemaValidation { subject: "access token config", .. }));
    }

    #[test]
    fn test_omitted_scope_is_rejected() {
        let mut value = serde_json::to_value(config("create")).unwrap();
        value.as_object_mut().unwrap().remove("scope");
        let err = AccessTokenConfig::try_from(value).unwrap_err();
        let Error::SchemaValidation { errors, .. } = err else {
            panic!("expected schema error, got {err:?}");
        };
        assert!(errors.iter().any(|e| e.contains("scope")), "{errors:?}");
    }

    #[test]
    fn test_try_from_valid_json() {
        let value = json!({
            "expiration": "1 hour",
            "issuer": "https://issuer.example/",
            "jwks": { "keys": [Jwk::generate_es256("k1")] },
            "me": "https://me.example/",
            "scope": "create"
        });
        let config = AccessTokenConfig::try_from(value).unwrap();
        assert_eq!(access_token(&config).unwrap().expires_in, 3600);
    }

    #[test]
    fn test_empty_key_set_fails_validation() {
        let mut cfg = config("create");
        cfg.jwks = Jwks::default();
        assert!(matches!(
            access_token(&cfg),
            Err(Error::SchemaValidation { .. })
        ));
    }

    #[test]
    fn test_non_url_me_fails_validation() {
        let mut cfg = config("create");
        cfg.me = "alice".into();
        assert!(matches!(
            access_token(&cfg),
            Err(Error::SchemaValidation { .. })
        ));
    }

    #[test]
    fn test_overflowing_expiration_is_rejected() {
        let mut cfg = config("create");
        cfg.expiration = "9223372036854775000s".into();
        let err = access_token(&cfg).unwrap_err();
        assert!(
            matches!(&err, Error::InvalidExpiration { reason, .. } if reason == "duration too large"),
            "{err:?}"
        );
    }

    #[test]
    fn test_issuer_with_query_or_fragment_fails_validation() {
        for issuer in [
            "https://issuer.example/?tenant=1#frag",
            "https://issuer.example/?a=1",
            "https://issuer.example/#f",
        ] {
            let mut cfg = config("create");
            cfg.issuer = issuer.into();
            let err = access_token(&cfg).unwrap_err();
            let Error::SchemaValidation { errors, .. } = err else {
                panic!("expected schema error for {issuer}, got {err:?}");
            };
            assert!(errors.iter().any(|e| e.contains("/issuer")), "{errors:?}");
        }
    }
}
