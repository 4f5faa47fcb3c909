//! Tower service running the access token pipeline

use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use tower_service::Service;

use super::{AccessTokenPipeline, HookConfig};

/// Boxed future returned by [`AccessTokenService`]
pub type AccessTokenServiceFuture<T, E> = BoxFuture<'static, Result<T, E>>;

/// Service created by [`AccessTokenLayer`](super::AccessTokenLayer)
///
/// A request that passes the pipeline reaches the inner service with the
/// claims in its extensions. A rejected request is answered here with the
/// OAuth error status, a JSON body and, for 401/403, a `WWW-Authenticate`
/// challenge; the inner service never sees it.
#[derive(Debug, Clone)]
pub struct AccessTokenService<S> {
    inner: S,
    pipeline: Arc<AccessTokenPipeline>,
    config: HookConfig,
}

impl<S> AccessTokenService<S> {
    /// Wrap `inner`
    pub fn new(inner: S, pipeline: Arc<AccessTokenPipeline>, config: HookConfig) -> Self {
        Self {
            inner,
            pipeline,
            config,
        }
    }

    /// The pipeline run before every request
    pub fn pipeline(&self) -> &Arc<AccessTokenPipeline> {
        &self.pipeline
    }

    /// Get a reference to the inner service
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Get a mutable reference to the inner service
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }
}

impl<S, B, ResBody> Service<http::Request<B>> for AccessTokenService<S>
where
    S: Service<http::Request<B>, Response = http::Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Send + 'static,
    B: Send + 'static,
    ResBody: From<String> + Send + 'static,
{
    type Response = http::Response<ResBody>;
    type Error = S::Error;
    type Future = AccessTokenServiceFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        // The clone may not be ready; keep the one poll_ready was called on
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let pipeline = Arc::clone(&self.pipeline);
        let config = self.config.clone();

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();
            match pipeline.run(&mut parts).await {
                Ok(_) => inner.call(http::Request::from_parts(parts, body)).await,
                Err(err) => Ok(err.into_response(
                    config.realm.as_deref(),
                    config.include_error_description,
                )),
            }
        })
    }
}
