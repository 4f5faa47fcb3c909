//! Access token revocation lookups
//!
//! Revocation is checked out-of-band from signature verification: a token
//! with a valid signature is still refused once its `jti` is revoked. The
//! revocation list lives in the caller's store.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Lookup of revoked access tokens
///
/// Implementations report store failures as [`Error::Store`](crate::Error::Store).
#[async_trait]
pub trait RevocationCheck: Send + Sync + fmt::Debug {
    /// Whether the token with this `jti` has been revoked
    async fn is_access_token_revoked(&self, jti: &str) -> Result<bool>;
}

#[async_trait]
impl<T: RevocationCheck + ?Sized> RevocationCheck for Arc<T> {
    async fn is_access_token_revoked(&self, jti: &str) -> Result<bool> {
        (**self).is_access_token_revoked(jti).await
    }
}

type BoxFuture = Pin<Box<dyn Future<Output = Result<bool>> + Send>>;

/// [`RevocationCheck`] backed by an async closure
///
/// ```rust
/// use indieauth_token::revocation::{RevocationCheck, RevocationFn};
///
/// let check = RevocationFn::new(|jti: String| async move { Ok(jti == "revoked-jti") });
/// # tokio_test::block_on(async {
/// assert!(check.is_access_token_revoked("revoked-jti").await?);
/// assert!(!check.is_access_token_revoked("other").await?);
/// # Ok::<(), indieauth_token::Error>(())
/// # });
/// ```
#[derive(Clone)]
pub struct RevocationFn {
    f: Arc<dyn Fn(String) -> BoxFuture + Send + Sync>,
}

impl RevocationFn {
    /// Wrap a closure receiving the `jti`
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool>> + Send + 'static,
    {
        Self {
            f: Arc::new(move |jti| Box::pin(f(jti))),
        }
    }
}

impl fmt::Debug for RevocationFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevocationFn").finish_non_exhaustive()
    }
}

#[async_trait]
impl RevocationCheck for RevocationFn {
    async fn is_access_token_revoked(&self, jti: &str) -> Result<bool> {
        (self.f)(jti.to_string()).await
    }
}

/// Nothing is ever revoked
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRevoked;

#[async_trait]
impl RevocationCheck for NeverRevoked {
    async fn is_access_token_revoked(&self, _jti: &str) -> Result<bool> {
        Ok(false)
    }
}
