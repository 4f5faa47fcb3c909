//! Access and refresh token factories
//!
//! Both factories validate their input against a schema before doing any
//! work and validate their output before returning it.

mod access;
mod issuer;
mod refresh;

pub use access::{AccessToken, AccessTokenConfig, access_token};
pub use issuer::{
    IssuedTokens, IssuedTokensHook, NoopIssuedTokensHook, RefreshTokenStore, TokenIssuer,
};
pub use refresh::{RefreshToken, RefreshTokenConfig, refresh_token};
