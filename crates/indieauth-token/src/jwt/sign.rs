//! JWT signing with a key from a private JWKS

use jsonwebtoken::{Header, encode};
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::expiry::{expiration_secs, expires_at, unix_now};
use crate::jwk::Jwks;
use crate::random::random_id;

/// Inputs for [`sign`]
#[derive(Debug, Clone, Copy)]
pub struct SignConfig<'a> {
    /// Token lifetime, e.g. `"15 minutes"`
    pub expiration: &'a str,
    /// Value of the `iss` claim
    pub issuer: &'a str,
    /// Private key set holding the signing key
    pub jwks: &'a Jwks,
    /// Which key in `jwks` to sign with
    pub kid: &'a str,
    /// Caller claims (`me`, `scope`, ...)
    pub payload: &'a Map<String, Value>,
}

/// Sign a JWT
///
/// The header is `{alg, kid}`. Claims are the payload plus `exp`, `iat`,
/// `iss` and a fresh random `jti`; the registered claims win over payload
/// entries with the same name.
///
/// # Errors
///
/// - [`Error::UnknownKid`] if `kid` is not in the key set
/// - [`Error::MissingAlg`] if the key has no `alg`
/// - [`Error::KeyImport`] if the key material is unusable
/// - [`Error::InvalidExpiration`] if `expiration` cannot be parsed
/// - [`Error::Signing`] if encoding fails
///
/// # Example
///
/// ```rust
/// use indieauth_token::jwk::{Jwk, Jwks};
/// use indieauth_token::jwt::{safe_decode, sign, SignConfig};
/// use serde_json::{json, Map};
///
/// let jwks = Jwks::new(vec![Jwk::generate_es256("key-1")]);
/// let mut payload = Map::new();
/// payload.insert("foo".into(), json!("bar"));
///
/// let jwt = sign(&SignConfig {
///     expiration: "1 hour",
///     issuer: "https://issuer.example/",
///     jwks: &jwks,
///     kid: "key-1",
///     payload: &payload,
/// })?;
///
/// let claims = safe_decode(&jwt)?;
/// assert_eq!(claims["foo"], "bar");
/// # Ok::<(), indieauth_token::Error>(())
/// ```
pub fn sign(config: &SignConfig<'_>) -> Result<String> {
    let jwk = config
        .jwks
        .find(config.kid)
        .ok_or_else(|| Error::UnknownKid(config.kid.to_string()))?;
    let algorithm = jwk.algorithm()?;
    let key = jwk.encoding_key()?;

    let lifetime = expiration_secs(config.expiration)?;
    let now = unix_now();
    let exp = expires_at(config.expiration, now, lifetime)?;
    let jti = random_id();

    let mut claims = config.payload.clone();
    claims.insert("exp".into(), Value::from(exp));
    claims.insert("iat".into(), Value::from(now));
    claims.insert("iss".into(), Value::from(config.issuer));
    claims.insert("jti".into(), Value::from(jti.as_str()));

    let mut header = Header::new(algorithm);
    header.typ = None;
    header.kid = Some(config.kid.to_string());

    let jwt = encode(&header, &claims, &key).map_err(|e| {
        error!(kid = config.kid, error = %e, "JWT signing failed");
        Error::Signing(e.to_string())
    })?;

    debug!(
        kid = config.kid,
        jti = %jti,
        iss = config.issuer,
        exp,
        "signed JWT"
    );
    Ok(jwt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwk::Jwk;
    use crate::jwt::{safe_decode, safe_decode_header};
    use serde_json::json;

    fn payload() -> Map<String, Value> {
        let mut p = Map::new();
        p.insert("me".into(), json!("https://me.example/"));
        p.insert("scope".into(), json!("create"));
        p
    }

    #[test]
    fn test_sign_sets_registered_claims() {
        let jwks = Jwks::new(vec![Jwk::generate_es256("k1")]);
        let payload = payload();
        let before = unix_now();
        let jwt = sign(&SignConfig {
            expiration: "15 minutes",
            issuer: "https://issuer.example/",
            jwks: &jwks,
            kid: "k1",
            payload: &payload,
        })
        .unwrap();

        let claims = safe_decode(&jwt).unwrap();
        let iat = claims["iat"].as_i64().unwrap();
        assert!(iat >= before);
        assert_eq!(claims["exp"].as_i64().unwrap(), iat + 900);
        assert_eq!(claims["iss"], "https://issuer.example/");
        assert_eq!(claims["me"], "https://me.example/");
        assert_eq!(claims["jti"].as_str().unwrap().len(), 21);

        let header = safe_decode_header(&jwt).unwrap();
        assert_eq!(header.kid.as_deref(), Some("k1"));
        assert_eq!(header.alg, jsonwebtoken::Algorithm::ES256);
    }

    #[test]
    fn test_registered_claims_override_payload() {
        let jwks = Jwks::new(vec![Jwk::generate_es256("k1")]);
        let mut payload = payload();
        payload.insert("iss".into(), json!("https://evil.example/"));
        let jwt = sign(&SignConfig {
            expiration: "1 hour",
            issuer: "https://issuer.example/",
            jwks: &jwks,
            kid: "k1",
            payload: &payload,
        })
        .unwrap();
        assert_eq!(safe_decode(&jwt).unwrap()["iss"], "https://issuer.example/");
    }

    #[test]
    fn test_unknown_kid() {
        let jwks = Jwks::new(vec![Jwk::generate_es256("k1")]);
        let payload = payload();
        let err = sign(&SignConfig {
            expiration: "1 hour",
            issuer: "https://issuer.example/",
            jwks: &jwks,
            kid: "nope",
            payload: &payload,
        })
        .unwrap_err();
        assert_eq!(err, Error::UnknownKid("nope".into()));
    }

    #[test]
    fn test_missing_alg() {
        let mut key = Jwk::generate_es256("k1");
        key.alg = None;
        let jwks = Jwks::new(vec![key]);
        let payload = payload();
        let err = sign(&SignConfig {
            expiration: "1 hour",
            issuer: "https://issuer.example/",
            jwks: &jwks,
            kid: "k1",
            payload: &payload,
        })
        .unwrap_err();
        assert_eq!(err, Error::MissingAlg { kid: "k1".into() });
    }

    #[test]
    fn test_malformed_key() {
        let mut key = Jwk::generate_es256("k1");
        key.d = Some("not-a-scalar".into());
        key.x = None;
        key.y = None;
        let jwks = Jwks::new(vec![key]);
        let payload = payload();
        let err = sign(&SignConfig {
            expiration: "1 hour",
            issuer: "https://issuer.example/",
            jwks: &jwks,
            kid: "k1",
            payload: &payload,
        })
        .unwrap_err();
        assert!(matches!(err, Error::KeyImport { .. }));
    }

    #[test]
    fn test_bad_expiration() {
        let jwks = Jwks::new(vec![Jwk::generate_es256("k1")]);
        let payload = payload();
        let err = sign(&SignConfig {
            expiration: "whenever",
            issuer: "https://issuer.example/",
            jwks: &jwks,
            kid: "k1",
            payload: &payload,
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidExpiration { .. }));
    }
}
