//! JSON Schemas for factory inputs and outputs
//!
//! Token factories validate their config before doing any work and their
//! result before returning it. Input and output schemas are independent, so
//! a bug that produces a malformed token is caught even when the config was
//! fine.

use std::sync::LazyLock;

use jsonschema::Validator;
use serde_json::{Value, json};
use tracing::{debug, error};

use crate::error::{Error, Result};

type Compiled = LazyLock<std::result::Result<Validator, String>>;

fn compile(schema: &Value) -> std::result::Result<Validator, String> {
    jsonschema::validator_for(schema).map_err(|e| e.to_string())
}

const URL_PATTERN: &str = "^https?://[^\\s]+$";
/// Issuer identifiers carry no query or fragment
const ISSUER_PATTERN: &str = "^https?://[^\\s?#]+$";
const JWT_PATTERN: &str = "^[A-Za-z0-9_-]+\\.[A-Za-z0-9_-]+\\.[A-Za-z0-9_-]+$";

pub(crate) static ACCESS_TOKEN_CONFIG: Compiled = LazyLock::new(|| {
    compile(&json!({
        "type": "object",
        "required": ["expiration", "issuer", "jwks", "me", "scope"],
        "properties": {
            "expiration": { "type": "string", "minLength": 1 },
            "issuer": { "type": "string", "pattern": ISSUER_PATTERN },
            "jwks": {
                "type": "object",
                "required": ["keys"],
                "properties": {
                    "keys": {
                        "type": "array",
                        "minItems": 1,
                        "items": {
                            "type": "object",
                            "required": ["kty"],
                            "properties": { "kty": { "enum": ["RSA", "EC", "OKP"] } }
                        }
                    }
                }
            },
            "me": { "type": "string", "pattern": URL_PATTERN },
            "scope": { "type": "string", "minLength": 1 }
        }
    }))
});

pub(crate) static ACCESS_TOKEN: Compiled = LazyLock::new(|| {
    compile(&json!({
        "type": "object",
        "required": ["access_token", "expires_in", "kid"],
        "properties": {
            "access_token": { "type": "string", "pattern": JWT_PATTERN },
            "expires_in": { "type": "integer", "minimum": 1 },
            "kid": { "type": "string", "minLength": 1 }
        }
    }))
});

pub(crate) static REFRESH_TOKEN_CONFIG: Compiled = LazyLock::new(|| {
    compile(&json!({
        "type": "object",
        "required": ["expiration"],
        "properties": {
            "expiration": { "type": "string", "minLength": 1 }
        }
    }))
});

pub(crate) static REFRESH_TOKEN: Compiled = LazyLock::new(|| {
    compile(&json!({
        "type": "object",
        "required": ["refresh_token", "exp"],
        "properties": {
            "refresh_token": {
                "type": "string",
                "minLength": 21,
                "maxLength": 21,
                "pattern": "^[A-Za-z0-9_-]+$"
            },
            "exp": { "type": "integer", "minimum": 1 }
        }
    }))
});

/// Validate `value`, collecting every violation
///
/// # Errors
///
/// Returns [`Error::SchemaValidation`] listing all violations, or a single
/// entry if the schema itself failed to compile.
pub(crate) fn validate(subject: &'static str, schema: &Compiled, value: &Value) -> Result<()> {
    let validator = schema.as_ref().map_err(|e| {
        error!(subject, error = %e, "schema failed to compile");
        Error::SchemaValidation {
            subject,
            errors: vec![format!("invalid schema: {e}")],
        }
    })?;

    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|e| format!("{}: {}", e.instance_path, e))
        .collect();
    if errors.is_empty() {
        debug!(subject, "schema validation passed");
        Ok(())
    } else {
        debug!(subject, error_count = errors.len(), "schema validation failed");
        Err(Error::SchemaValidation { subject, errors })
    }
}
