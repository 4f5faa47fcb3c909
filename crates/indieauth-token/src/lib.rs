//! # indieauth-token
//!
//! Access and refresh tokens for IndieAuth authorization and token
//! endpoints, and bearer-token checks for the resources they protect
//! (Micropub, media endpoints).
//!
//! ## Architecture
//!
//! - [`jwk`] - JWK / JWKS model, import into signing and verification keys
//! - [`kid`] - random selection of the signing key
//! - [`jwt`] - signing, verification (remote or local JWKS), unverified decode
//! - [`tokens`] - `access_token` / `refresh_token` factories and the
//!   [`TokenIssuer`](tokens::TokenIssuer) combining them
//! - [`expiry`] - human-readable durations and the expiry predicate
//! - [`revocation`] - caller-supplied revocation lookup
//! - [`records`] - shapes of persisted token records
//! - [`oauth_error`] - RFC 6750 error codes and responses
//! - [`hooks`] - request pipeline and Tower middleware (feature `middleware`)
//!
//! ## Quick Start
//!
//! ```rust
//! use indieauth_token::jwk::{Jwk, Jwks};
//! use indieauth_token::jwt::safe_decode;
//! use indieauth_token::tokens::{access_token, AccessTokenConfig};
//!
//! let jwks = Jwks::new(vec![Jwk::generate_es256("key-2025")]);
//!
//! let token = access_token(&AccessTokenConfig {
//!     expiration: "15 minutes".into(),
//!     issuer: "https://issuer.example/".into(),
//!     jwks: jwks.clone(),
//!     me: "https://alice.example/".into(),
//!     scope: "create update".into(),
//! })?;
//! assert_eq!(token.expires_in, 900);
//!
//! // Publish this at the issuer's jwks_uri
//! let public = jwks.to_public();
//! assert!(public.keys.iter().all(|k| !k.is_private()));
//!
//! let claims = safe_decode(&token.access_token)?;
//! assert_eq!(claims["me"], "https://alice.example/");
//! # Ok::<(), indieauth_token::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `middleware` (default) - [`hooks`]: bearer-token stages, pipeline and
//!   Tower layer
//!
//! ## Standards
//!
//! - **RFC 7517** - JSON Web Key
//! - **RFC 7519** - JSON Web Token
//! - **RFC 6750** - Bearer Token Usage
//! - **RFC 8037** - EdDSA in JOSE

pub mod claims;
pub mod error;
pub mod expiry;
pub mod jwk;
pub mod jwt;
pub mod kid;
pub mod oauth_error;
mod random;
pub mod records;
pub mod revocation;
mod schema;
pub mod tokens;

#[cfg(feature = "middleware")]
pub mod hooks;

pub use claims::AccessTokenClaims;
pub use error::{Error, ErrorKind, Result};
pub use expiry::{is_expired, unix_now};
pub use jwk::{Jwk, Jwks, KeyType};
pub use jwt::{JwksClient, SignConfig, TokenVerifier, VerifyConfig, safe_decode, sign, verify};
pub use kid::random_kid;
pub use oauth_error::{OAuthError, OAuthErrorCode};
pub use random::random_id;
pub use revocation::{RevocationCheck, RevocationFn};
pub use tokens::{
    AccessToken, AccessTokenConfig, RefreshToken, RefreshTokenConfig, access_token, refresh_token,
};
