//! `indieauth sign`, `decode` and `verify`

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use indieauth_token::expiry::parse_expiration;
use indieauth_token::jwt::{JwksClient, SignConfig, TokenVerifier, safe_decode_header};
use indieauth_token::{random_kid, safe_decode};
use serde_json::{Map, Value};
use tracing::info;

use super::{load_jwks, write_json};
use crate::cli::{DecodeArgs, SignArgs, VerifyArgs};
use crate::config::Settings;
use crate::error::CliError;

pub(crate) fn sign(args: SignArgs, settings: &Settings, out: &mut dyn Write) -> anyhow::Result<()> {
    let payload: Map<String, Value> = match serde_json::from_str(&args.payload) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(CliError::InvalidArguments("--payload must be a JSON object".into()).into());
        }
        Err(e) => {
            return Err(CliError::InvalidArguments(format!("--payload is not valid JSON: {e}")).into());
        }
    };

    let issuer = settings.issuer_or(args.issuer)?;
    let jwks = load_jwks(&settings.jwks_or(args.keys.jwks)?)?;
    let kid = match args.kid {
        Some(kid) => kid,
        None => random_kid(&jwks.keys)?,
    };
    let expiration = args
        .expiration
        .unwrap_or_else(|| settings.access_token_expiration.clone());

    let jwt = indieauth_token::sign(&SignConfig {
        expiration: &expiration,
        issuer: &issuer,
        jwks: &jwks,
        kid: &kid,
        payload: &payload,
    })?;
    info!(kid = %kid, issuer = %issuer, "signed JWT");
    writeln!(out, "{jwt}")?;
    Ok(())
}

pub(crate) fn decode(args: &DecodeArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    if args.header {
        write_json(out, &safe_decode_header(&args.jwt)?)
    } else {
        write_json(out, &safe_decode(&args.jwt)?)
    }
}

pub(crate) async fn verify(
    args: VerifyArgs,
    settings: &Settings,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let issuer = settings.issuer_or(args.issuer)?;

    // A flag beats any setting; a configured URL beats a configured file
    let mut verifier = if let Some(path) = args.jwks {
        TokenVerifier::local(&issuer, load_jwks(&path)?)
    } else if let Some(url) = args.jwks_url.or_else(|| settings.jwks_url.clone()) {
        TokenVerifier::with_jwks_client(&issuer, Arc::new(JwksClient::new(url)))
    } else if let Some(path) = &settings.jwks {
        TokenVerifier::local(&issuer, load_jwks(path)?)
    } else {
        return Err(CliError::MissingSetting {
            name: "jwks_url",
            flag: "--jwks-url",
        }
        .into());
    };

    if let Some(max_age) = args.max_token_age.or_else(|| settings.max_token_age.clone()) {
        verifier = verifier.with_max_token_age(parse_expiration(&max_age)?);
    }

    let claims = verifier
        .verify(&args.jwt)
        .await
        .with_context(|| format!("token rejected for issuer {issuer}"))?;
    info!(jti = %claims.jti, me = %claims.me, "token verified");
    write_json(out, &claims)
}
