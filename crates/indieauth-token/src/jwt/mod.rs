//! JWT signing, verification and unverified decoding
//!
//! - [`sign`] signs claims with a key from a private [`Jwks`](crate::jwk::Jwks)
//! - [`verify`] / [`TokenVerifier`] check a token against the issuer's
//!   public key set, fetched through [`JwksClient`]
//! - [`safe_decode`] reads claims without any verification

mod decode;
pub mod jwks;
mod sign;
mod verify;

pub use decode::{safe_decode, safe_decode_as, safe_decode_header};
pub use jwks::JwksClient;
pub use sign::{SignConfig, sign};
pub use verify::{TokenVerifier, VerifyConfig, verify};
