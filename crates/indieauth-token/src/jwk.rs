//! JSON Web Keys (RFC 7517) and key sets
//!
//! A private [`Jwks`] signs tokens, its [`Jwks::to_public`] projection is
//! published at the issuer's `jwks_uri` and used to verify them. Keys are
//! plain data; conversion to signing/verification keys happens on demand in
//! [`Jwk::encoding_key`] and [`Jwk::decoding_key`].
//!
//! Supported material:
//!
//! | `kty` | Sign | Verify | `alg` |
//! |-------|------|--------|-------|
//! | `RSA` | yes  | yes    | RS256/384/512, PS256/384/512 |
//! | `EC` (`P-256`) | yes | yes | ES256 |
//! | `OKP` (`Ed25519`) | yes | yes | EdDSA |

use std::str::FromStr;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::EncodePrivateKey;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Key type (`kty`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// RSA key
    #[serde(rename = "RSA")]
    Rsa,
    /// Elliptic curve key
    #[serde(rename = "EC")]
    Ec,
    /// Octet key pair (Ed25519)
    #[serde(rename = "OKP")]
    Okp,
}

/// A single JSON Web Key
///
/// Public and private keys share this shape; private keys additionally
/// carry `d` (and the RSA CRT parameters).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type
    pub kty: KeyType,
    /// Key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Intended signing algorithm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Public key use (`sig`)
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,

    /// RSA modulus
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// RSA private exponent, or EC/OKP private scalar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    /// RSA first prime factor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    /// RSA second prime factor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    /// RSA first factor CRT exponent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    /// RSA second factor CRT exponent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    /// RSA first CRT coefficient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,

    /// Curve name (`P-256`, `Ed25519`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// EC x coordinate / OKP public key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// EC y coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

/// A JSON Web Key Set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    /// Keys in the set
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// Create a key set
    pub fn new(keys: Vec<Jwk>) -> Self {
        Self { keys }
    }

    /// Find the key with the given `kid`
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }

    /// Key IDs present in the set, in order
    pub fn kids(&self) -> Vec<&str> {
        self.keys.iter().filter_map(|k| k.kid.as_deref()).collect()
    }

    /// Strip secret material from every key
    pub fn to_public(&self) -> Self {
        Self {
            keys: self.keys.iter().map(Jwk::to_public).collect(),
        }
    }

    /// Parse a key set from JSON text
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaValidation`] when the text is not a JWKS.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::SchemaValidation {
            subject: "JWKS",
            errors: vec![e.to_string()],
        })
    }
}

impl Jwk {
    /// Whether this key carries secret material
    pub fn is_private(&self) -> bool {
        self.d.is_some()
    }

    /// Copy of this key without secret material
    pub fn to_public(&self) -> Self {
        Self {
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
            ..self.clone()
        }
    }

    fn kid_or_placeholder(&self) -> &str {
        self.kid.as_deref().unwrap_or("<no kid>")
    }

    /// Signing algorithm declared by `alg`
    ///
    /// # Errors
    ///
    /// - [`Error::MissingAlg`] if `alg` is absent
    /// - [`Error::UnsupportedAlgorithm`] for unknown or symmetric algorithms
    pub fn algorithm(&self) -> Result<Algorithm> {
        let alg = self.alg.as_deref().ok_or_else(|| Error::MissingAlg {
            kid: self.kid_or_placeholder().to_string(),
        })?;
        let algorithm =
            Algorithm::from_str(alg).map_err(|_| Error::UnsupportedAlgorithm(alg.to_string()))?;
        if !is_asymmetric(algorithm) {
            return Err(Error::UnsupportedAlgorithm(alg.to_string()));
        }
        Ok(algorithm)
    }

    /// Build a signing key from the private material
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyImport`] when the key is public-only, the
    /// material is malformed, or `alg` does not fit `kty`.
    pub fn encoding_key(&self) -> Result<EncodingKey> {
        let kid = self.kid_or_placeholder();
        let algorithm = self.algorithm()?;
        self.check_algorithm_fits(algorithm)?;

        match self.kty {
            KeyType::Rsa => {
                let n = self.biguint("n")?;
                let e = self.biguint("e")?;
                let d = self.biguint("d")?;
                let p = self.biguint("p")?;
                let q = self.biguint("q")?;
                let key = RsaPrivateKey::from_components(n, e, d, vec![p, q])
                    .map_err(|err| Error::key_import(kid, err))?;
                key.validate().map_err(|err| Error::key_import(kid, err))?;
                let der = key
                    .to_pkcs1_der()
                    .map_err(|err| Error::key_import(kid, err))?;
                Ok(EncodingKey::from_rsa_der(der.as_bytes()))
            }
            KeyType::Ec => {
                self.check_curve("P-256")?;
                let d = self.bytes("d")?;
                let secret =
                    p256::SecretKey::from_slice(&d).map_err(|err| Error::key_import(kid, err))?;

                // Reject keys whose public half disagrees with the scalar
                if let (Some(x), Some(y)) = (&self.x, &self.y) {
                    let point = secret.public_key().to_encoded_point(false);
                    let matches = point.x().map(|v| URL_SAFE_NO_PAD.encode(v)).as_ref() == Some(x)
                        && point.y().map(|v| URL_SAFE_NO_PAD.encode(v)).as_ref() == Some(y);
                    if !matches {
                        return Err(Error::key_import(kid, "x/y do not match d"));
                    }
                }

                let der = secret
                    .to_pkcs8_der()
                    .map_err(|err| Error::key_import(kid, err))?;
                Ok(EncodingKey::from_ec_der(der.as_bytes()))
            }
            KeyType::Okp => {
                self.check_curve("Ed25519")?;
                let seed = self.bytes("d")?;
                if seed.len() != ED25519_SEED_LEN {
                    return Err(Error::key_import(
                        kid,
                        format!("Ed25519 'd' must be {ED25519_SEED_LEN} bytes, got {}", seed.len()),
                    ));
                }
                let mut der = ED25519_PKCS8_PREFIX.to_vec();
                der.extend_from_slice(&seed);
                Ok(EncodingKey::from_ed_der(&der))
            }
        }
    }

    /// Build a verification key from the public material
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyImport`] when required public parameters are
    /// missing or malformed.
    pub fn decoding_key(&self) -> Result<DecodingKey> {
        let kid = self.kid_or_placeholder();
        match self.kty {
            KeyType::Rsa => DecodingKey::from_rsa_components(self.param("n")?, self.param("e")?)
                .map_err(|err| Error::key_import(kid, err)),
            KeyType::Ec => {
                self.check_curve("P-256")?;
                DecodingKey::from_ec_components(self.param("x")?, self.param("y")?)
                    .map_err(|err| Error::key_import(kid, err))
            }
            KeyType::Okp => {
                self.check_curve("Ed25519")?;
                DecodingKey::from_ed_components(self.param("x")?)
                    .map_err(|err| Error::key_import(kid, err))
            }
        }
    }

    /// Fail unless `algorithm` can be used with this key type
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyImport`] on a mismatch such as `ES256` on an RSA key.
    pub fn check_algorithm_fits(&self, algorithm: Algorithm) -> Result<()> {
        let fits = match self.kty {
            KeyType::Rsa => matches!(
                algorithm,
                Algorithm::RS256
                    | Algorithm::RS384
                    | Algorithm::RS512
                    | Algorithm::PS256
                    | Algorithm::PS384
                    | Algorithm::PS512
            ),
            KeyType::Ec => algorithm == Algorithm::ES256,
            KeyType::Okp => algorithm == Algorithm::EdDSA,
        };
        if fits {
            Ok(())
        } else {
            Err(Error::key_import(
                self.kid_or_placeholder(),
                format!("algorithm {algorithm:?} cannot be used with {:?} key", self.kty),
            ))
        }
    }

    fn check_curve(&self, expected: &str) -> Result<()> {
        match self.crv.as_deref() {
            Some(crv) if crv == expected => Ok(()),
            other => Err(Error::key_import(
                self.kid_or_placeholder(),
                format!("unsupported curve {other:?}, expected {expected}"),
            )),
        }
    }

    fn param(&self, name: &'static str) -> Result<&str> {
        let value = match name {
            "n" => self.n.as_deref(),
            "e" => self.e.as_deref(),
            "d" => self.d.as_deref(),
            "p" => self.p.as_deref(),
            "q" => self.q.as_deref(),
            "x" => self.x.as_deref(),
            "y" => self.y.as_deref(),
            _ => None,
        };
        value.ok_or_else(|| Error::key_import(self.kid_or_placeholder(), format!("missing '{name}'")))
    }

    fn bytes(&self, name: &'static str) -> Result<Vec<u8>> {
        URL_SAFE_NO_PAD
            .decode(self.param(name)?)
            .map_err(|err| Error::key_import(self.kid_or_placeholder(), format!("'{name}': {err}")))
    }

    fn biguint(&self, name: &'static str) -> Result<BigUint> {
        Ok(BigUint::from_bytes_be(&self.bytes(name)?))
    }

    /// Generate a private ES256 (P-256) key
    pub fn generate_es256(kid: impl Into<String>) -> Self {
        let secret = p256::SecretKey::random(&mut rand::rngs::OsRng);
        let point = secret.public_key().to_encoded_point(false);
        Self {
            kty: KeyType::Ec,
            kid: Some(kid.into()),
            alg: Some("ES256".to_string()),
            key_use: Some("sig".to_string()),
            crv: Some("P-256".to_string()),
            x: point.x().map(|v| URL_SAFE_NO_PAD.encode(v)),
            y: point.y().map(|v| URL_SAFE_NO_PAD.encode(v)),
            d: Some(URL_SAFE_NO_PAD.encode(secret.to_bytes())),
            ..Self::empty(KeyType::Ec)
        }
    }

    /// Generate a private RSA key for `alg` (RS* or PS*)
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAlgorithm`] for non-RSA algorithms and
    /// [`Error::KeyImport`] if key generation fails.
    pub fn generate_rsa(kid: impl Into<String>, alg: Algorithm, bits: usize) -> Result<Self> {
        let kid = kid.into();
        let mut jwk = Self {
            kid: Some(kid.clone()),
            alg: Some(format!("{alg:?}")),
            key_use: Some("sig".to_string()),
            ..Self::empty(KeyType::Rsa)
        };
        if jwk.check_algorithm_fits(alg).is_err() {
            return Err(Error::UnsupportedAlgorithm(format!("{alg:?}")));
        }

        let key = RsaPrivateKey::new(&mut rand::rngs::OsRng, bits)
            .map_err(|err| Error::key_import(&kid, err))?;
        let [p, q] = match key.primes() {
            [p, q] => [p.clone(), q.clone()],
            _ => return Err(Error::key_import(&kid, "expected two primes")),
        };
        let (Some(dp), Some(dq), Some(qi)) = (key.dp(), key.dq(), key.crt_coefficient()) else {
            return Err(Error::key_import(&kid, "missing CRT parameters"));
        };

        let b64 = |v: &BigUint| Some(URL_SAFE_NO_PAD.encode(v.to_bytes_be()));
        jwk.n = b64(key.n());
        jwk.e = b64(key.e());
        jwk.d = b64(key.d());
        jwk.p = b64(&p);
        jwk.q = b64(&q);
        jwk.dp = b64(dp);
        jwk.dq = b64(dq);
        jwk.qi = b64(&qi);
        Ok(jwk)
    }

    fn empty(kty: KeyType) -> Self {
        Self {
            kty,
            kid: None,
            alg: None,
            key_use: None,
            n: None,
            e: None,
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
            crv: None,
            x: None,
            y: None,
        }
    }
}

const ED25519_SEED_LEN: usize = 32;

/// PKCS#8 v1 `PrivateKeyInfo` header for an Ed25519 seed (RFC 8410)
const ED25519_PKCS8_PREFIX: [u8; 16] = [
    0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20,
];

/// Only asymmetric algorithms are accepted; a shared secret cannot be
/// published in a JWKS.
pub(crate) fn is_asymmetric(algorithm: Algorithm) -> bool {
    !matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}
