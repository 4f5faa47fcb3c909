//! `indieauth access-token` and `refresh-token`

use std::io::Write;

use indieauth_token::{AccessTokenConfig, RefreshTokenConfig};

use super::{load_jwks, write_json};
use crate::cli::{AccessTokenArgs, RefreshTokenArgs};
use crate::config::Settings;

pub(crate) fn access_token(
    args: AccessTokenArgs,
    settings: &Settings,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let config = AccessTokenConfig {
        expiration: args
            .expiration
            .unwrap_or_else(|| settings.access_token_expiration.clone()),
        issuer: settings.issuer_or(args.issuer)?,
        jwks: load_jwks(&settings.jwks_or(args.keys.jwks)?)?,
        me: args.me,
        scope: args.scope,
    };
    write_json(out, &indieauth_token::access_token(&config)?)
}

pub(crate) fn refresh_token(
    args: RefreshTokenArgs,
    settings: &Settings,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let config = RefreshTokenConfig {
        expiration: args
            .expiration
            .unwrap_or_else(|| settings.refresh_token_expiration.clone()),
    };
    write_json(out, &indieauth_token::refresh_token(&config)?)
}
