//! Bearer-token request hooks
//!
//! A protected route runs a fixed sequence of stages before its handler:
//!
//! ```text
//! Unauthenticated ─► Decoded ─► (Logged) ─► NotExpired ─► RevocationChecked ─► ScopeChecked ─► handler
//!        │              │                        │                 │                  │
//!        └──────────────┴────────── first failure answers the request ────────────────┘
//! ```
//!
//! Each stage is a [`Stage`] working on the request [`Parts`]. The decode
//! stage stores [`AccessTokenClaims`] in the request extensions; later
//! stages and the handler read them from there:
//!
//! ```rust,ignore
//! if let Some(claims) = req.extensions().get::<AccessTokenClaims>() {
//!     println!("request from {}", claims.me);
//! }
//! ```
//!
//! [`AccessTokenPipeline`] runs the stages in order and
//! [`AccessTokenLayer`] plugs the pipeline into a Tower stack.

mod decode;
mod expiry;
mod layer;
mod log;
mod pipeline;
mod revocation;
mod scope;
mod service;

use std::fmt;

use async_trait::async_trait;
use http::request::Parts;

pub use decode::{DecodeAccessToken, DecodeOptions};
pub use expiry::ValidateNotExpired;
pub use layer::AccessTokenLayer;
pub use log::LogClaims;
pub use pipeline::AccessTokenPipeline;
pub use revocation::ValidateNotRevoked;
pub use scope::ValidateScope;
pub use service::{AccessTokenService, AccessTokenServiceFuture};

use crate::claims::AccessTokenClaims;
use crate::oauth_error::OAuthError;

/// One step of the hook chain
#[async_trait]
pub trait Stage: Send + Sync + fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Inspect (and possibly annotate) the request, or reject it
    async fn run(&self, parts: &mut Parts) -> Result<(), OAuthError>;
}

/// Raw bearer token, stored next to the decoded claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

/// How [`AccessTokenLayer`] renders rejections
#[derive(Debug, Clone, Default)]
pub struct HookConfig {
    /// Send `error_description` to clients
    ///
    /// Off by default: descriptions can reveal verification internals.
    pub include_error_description: bool,
    /// `realm` advertised in `WWW-Authenticate`
    pub realm: Option<String>,
}

impl HookConfig {
    /// Include `error_description` in responses
    #[must_use]
    pub fn include_error_description(mut self, include: bool) -> Self {
        self.include_error_description = include;
        self
    }

    /// Set the `WWW-Authenticate` realm
    #[must_use]
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }
}

pub(crate) fn claims_of(parts: &Parts) -> Result<&AccessTokenClaims, OAuthError> {
    parts
        .extensions
        .get::<AccessTokenClaims>()
        .ok_or_else(|| OAuthError::unauthorized("access token claims not found in request context"))
}
