//! Decoding without verification
//!
//! Useful for logging and for routing a token to the right verifier. The
//! output is untrusted: nothing here checks a signature, issuer or expiry.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Header, decode_header};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

fn payload_segment(jwt: &str) -> Result<&str> {
    let mut parts = jwt.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(p), Some(_), None) if !h.is_empty() && !p.is_empty() => Ok(p),
        _ => Err(Error::Decode("expected three dot-separated segments".into())),
    }
}

/// Decode the claims of a JWT without verifying it
///
/// # Errors
///
/// Returns [`Error::Decode`] if the token does not have three segments,
/// the payload is not base64url, or the payload is not a JSON object.
pub fn safe_decode(jwt: &str) -> Result<Map<String, Value>> {
    safe_decode_as(jwt)
}

/// [`safe_decode`] into a caller-chosen claims type
///
/// # Errors
///
/// Same as [`safe_decode`], plus [`Error::Decode`] when the claims do not
/// fit `T`.
pub fn safe_decode_as<T: DeserializeOwned>(jwt: &str) -> Result<T> {
    let segment = payload_segment(jwt)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| Error::Decode(format!("payload is not base64url: {e}")))?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| Error::Decode(format!("payload is not JSON: {e}")))?;
    if !value.is_object() {
        return Err(Error::Decode("payload is not a JSON object".into()));
    }
    serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))
}

/// Decode the protected header of a JWT without verifying it
///
/// # Errors
///
/// Returns [`Error::Decode`] for a malformed header.
pub fn safe_decode_header(jwt: &str) -> Result<Header> {
    payload_segment(jwt)?;
    decode_header(jwt).map_err(|e| Error::Decode(e.to_string()))
}
