//! Tower layer for the access token pipeline

use std::sync::Arc;

use tower::Layer;

use super::service::AccessTokenService;
use super::{AccessTokenPipeline, HookConfig};

/// Runs an [`AccessTokenPipeline`] in front of the wrapped service
///
/// # Example
///
/// ```rust
/// use indieauth_token::hooks::{AccessTokenLayer, AccessTokenPipeline, DecodeOptions};
/// use indieauth_token::revocation::NeverRevoked;
/// use tower::ServiceBuilder;
///
/// let pipeline = AccessTokenPipeline::standard(DecodeOptions::default(), NeverRevoked, Some("create"));
///
/// let service = ServiceBuilder::new()
///     .layer(AccessTokenLayer::new(pipeline))
///     .service_fn(|_req: http::Request<String>| async {
///         Ok::<_, std::convert::Infallible>(http::Response::new(String::from("created")))
///     });
/// # let _ = service;
/// ```
#[derive(Debug, Clone)]
pub struct AccessTokenLayer {
    pipeline: Arc<AccessTokenPipeline>,
    config: HookConfig,
}

impl AccessTokenLayer {
    /// Layer with default response options
    pub fn new(pipeline: AccessTokenPipeline) -> Self {
        Self::with_config(pipeline, HookConfig::default())
    }

    /// Layer with custom response options
    pub fn with_config(pipeline: AccessTokenPipeline, config: HookConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            config,
        }
    }

    /// Share an existing pipeline
    pub fn from_arc(pipeline: Arc<AccessTokenPipeline>, config: HookConfig) -> Self {
        Self { pipeline, config }
    }

    /// Send `error_description` to clients
    #[must_use]
    pub fn include_error_description(mut self, include: bool) -> Self {
        self.config.include_error_description = include;
        self
    }
}

impl<S> Layer<S> for AccessTokenLayer {
    type Service = AccessTokenService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessTokenService::new(inner, Arc::clone(&self.pipeline), self.config.clone())
    }
}
