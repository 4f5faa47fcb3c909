//! Refresh token factory

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{Error, Result};
use crate::expiry::{expiration_millis, expires_at, unix_now_ms};
use crate::random::random_id;
use crate::schema::{self, REFRESH_TOKEN, REFRESH_TOKEN_CONFIG};

const CONFIG_SUBJECT: &str = "refresh token config";
const RESULT_SUBJECT: &str = "refresh token";

/// Inputs for [`refresh_token`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenConfig {
    /// Lifetime, e.g. `"30 days"`
    pub expiration: String,
}

impl TryFrom<Value> for RefreshTokenConfig {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        schema::validate(CONFIG_SUBJECT, &REFRESH_TOKEN_CONFIG, &value)?;
        serde_json::from_value(value).map_err(|e| Error::SchemaValidation {
            subject: CONFIG_SUBJECT,
            errors: vec![e.to_string()],
        })
    }
}

/// A freshly minted refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    /// Opaque 21-character URL-safe value
    pub refresh_token: String,
    /// Expiration (UNIX seconds)
    pub exp: i64,
}

/// Mint a refresh token
///
/// `exp` is `floor((now_ms + expiration_ms) / 1000)`.
///
/// # Errors
///
/// - [`Error::SchemaValidation`] if the config or the result is malformed
/// - [`Error::InvalidExpiration`] if `expiration` cannot be parsed
pub fn refresh_token(config: &RefreshTokenConfig) -> Result<RefreshToken> {
    let input = serde_json::to_value(config).map_err(|e| Error::SchemaValidation {
        subject: CONFIG_SUBJECT,
        errors: vec![e.to_string()],
    })?;
    schema::validate(CONFIG_SUBJECT, &REFRESH_TOKEN_CONFIG, &input)?;

    let lifetime_ms = expiration_millis(&config.expiration)?;
    let exp_ms = expires_at(&config.expiration, unix_now_ms(), lifetime_ms)?;
    let token = RefreshToken {
        refresh_token: random_id(),
        exp: exp_ms.div_euclid(1000),
    };

    let output = serde_json::to_value(&token).map_err(|e| Error::SchemaValidation {
        subject: RESULT_SUBJECT,
        errors: vec![e.to_string()],
    })?;
    schema::validate(RESULT_SUBJECT, &REFRESH_TOKEN, &output)?;

    info!(exp = token.exp, "issued refresh token");
    Ok(token)
}
