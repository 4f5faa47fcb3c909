//! Remote JWKS fetching and caching
//!
//! Verifiers resolve signing keys from the issuer's published key set. The
//! set is cached for a TTL (10 minutes by default) and forced refreshes are
//! rate limited so that a flood of tokens with unknown `kid`s cannot turn
//! into a flood of requests against the issuer.
//!
//! Endpoints must use HTTPS; plain HTTP is only accepted for loopback hosts.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use url::{Host, Url};

use crate::error::{Error, Result};
use crate::jwk::Jwks;

const DEFAULT_TTL: Duration = Duration::from_secs(600);
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(5);
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct CachedJwks {
    jwks: Jwks,
    cached_at: SystemTime,
    ttl: Duration,
}

impl CachedJwks {
    fn is_valid(&self) -> bool {
        match SystemTime::now().duration_since(self.cached_at) {
            Ok(age) => age < self.ttl,
            // Clock went backwards
            Err(_) => false,
        }
    }
}

/// Client for an issuer's `jwks_uri`
///
/// Cheap to clone; clones share the cache.
///
/// # Example
///
/// ```rust,no_run
/// # use indieauth_token::jwt::JwksClient;
/// # tokio_test::block_on(async {
/// let client = JwksClient::new("https://issuer.example/jwks");
/// let jwks = client.get_jwks().await?;
/// if let Some(key) = jwks.find("key-1") {
///     // verify with key
/// }
/// # Ok::<(), indieauth_token::Error>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct JwksClient {
    jwks_uri: String,
    cache: Arc<RwLock<Option<CachedJwks>>>,
    http_client: reqwest::Client,
    cache_ttl: Duration,
    min_refresh_interval: Duration,
    last_refresh: Arc<RwLock<Option<SystemTime>>>,
}

impl JwksClient {
    /// Create a client with a 10 minute cache TTL
    pub fn new(jwks_uri: impl Into<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build HTTP client with timeout, using defaults");
                reqwest::Client::new()
            });
        Self {
            jwks_uri: jwks_uri.into(),
            cache: Arc::new(RwLock::new(None)),
            http_client,
            cache_ttl: DEFAULT_TTL,
            min_refresh_interval: MIN_REFRESH_INTERVAL,
            last_refresh: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a client with a custom cache TTL
    pub fn with_ttl(jwks_uri: impl Into<String>, cache_ttl: Duration) -> Self {
        let mut client = Self::new(jwks_uri);
        client.cache_ttl = cache_ttl;
        client
    }

    /// Use a caller-configured HTTP client (proxies, custom roots)
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Override the minimum interval between forced refreshes
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Key set from cache, fetched when missing or stale
    ///
    /// # Errors
    ///
    /// Returns [`Error::JwksFetch`] if the endpoint is not HTTPS, is
    /// unreachable, answers with a non-2xx status, or serves invalid JSON.
    pub async fn get_jwks(&self) -> Result<Jwks> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref()
                && cached.is_valid()
            {
                debug!(jwks_uri = %self.jwks_uri, "using cached JWKS");
                return Ok(cached.jwks.clone());
            }
        }
        self.fetch_and_cache().await
    }

    /// Refetch the key set, ignoring the cache
    ///
    /// Called when a token names a `kid` the cached set does not contain.
    /// Within the minimum refresh interval this falls back to
    /// [`JwksClient::get_jwks`].
    ///
    /// # Errors
    ///
    /// Same as [`JwksClient::get_jwks`].
    pub async fn refresh(&self) -> Result<Jwks> {
        {
            let last_refresh = self.last_refresh.read().await;
            if let Some(last) = *last_refresh
                && let Ok(since_last) = SystemTime::now().duration_since(last)
                && since_last < self.min_refresh_interval
            {
                warn!(
                    jwks_uri = %self.jwks_uri,
                    since_last_ms = since_last.as_millis(),
                    "JWKS refresh rate limited, using cache"
                );
                return self.get_jwks().await;
            }
        }
        self.fetch_and_cache().await
    }

    async fn fetch_and_cache(&self) -> Result<Jwks> {
        info!(jwks_uri = %self.jwks_uri, "fetching JWKS");

        if !is_secure_endpoint(&self.jwks_uri) {
            return Err(Error::JwksFetch(format!(
                "JWKS endpoint must use HTTPS (HTTP only allowed for loopback): {}",
                self.jwks_uri
            )));
        }

        let response = self
            .http_client
            .get(&self.jwks_uri)
            .send()
            .await
            .map_err(|e| {
                error!(jwks_uri = %self.jwks_uri, error = %e, "failed to fetch JWKS");
                Error::JwksFetch(e.to_string())
            })?;

        if !response.status().is_success() {
            error!(
                jwks_uri = %self.jwks_uri,
                status = %response.status(),
                "JWKS endpoint returned error status"
            );
            return Err(Error::JwksFetch(format!(
                "endpoint returned status {}",
                response.status()
            )));
        }

        let jwks: Jwks = response.json().await.map_err(|e| {
            error!(jwks_uri = %self.jwks_uri, error = %e, "failed to parse JWKS JSON");
            Error::JwksFetch(format!("invalid JWKS format: {e}"))
        })?;

        info!(
            jwks_uri = %self.jwks_uri,
            key_count = jwks.keys.len(),
            "fetched JWKS"
        );

        let now = SystemTime::now();
        *self.cache.write().await = Some(CachedJwks {
            jwks: jwks.clone(),
            cached_at: now,
            ttl: self.cache_ttl,
        });
        *self.last_refresh.write().await = Some(now);

        Ok(jwks)
    }

    /// The endpoint this client fetches from
    pub fn jwks_uri(&self) -> &str {
        &self.jwks_uri
    }

    /// Drop the cached key set
    pub async fn clear_cache(&self) {
        *self.cache.write().await = None;
        debug!(jwks_uri = %self.jwks_uri, "JWKS cache cleared");
    }
}

fn is_secure_endpoint(uri: &str) -> bool {
    let Ok(url) = Url::parse(uri) else {
        return false;
    };
    match url.scheme() {
        "https" => true,
        "http" => match url.host() {
            Some(Host::Domain(domain)) => domain == "localhost",
            Some(Host::Ipv4(ip)) => ip.is_loopback(),
            Some(Host::Ipv6(ip)) => ip.is_loopback(),
            None => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let client = JwksClient::new("https://issuer.example/jwks");
        assert_eq!(client.jwks_uri(), "https://issuer.example/jwks");
        assert_eq!(client.cache_ttl, Duration::from_secs(600));
        assert_eq!(client.min_refresh_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_custom_ttl() {
        let client = JwksClient::with_ttl("https://issuer.example/jwks", Duration::from_secs(300));
        assert_eq!(client.cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_cache_entry_expiry() {
        let fresh = CachedJwks {
            jwks: Jwks::default(),
            cached_at: SystemTime::now(),
            ttl: DEFAULT_TTL,
        };
        assert!(fresh.is_valid());

        let stale = CachedJwks {
            cached_at: SystemTime::now() - Duration::from_secs(700),
            ..fresh
        };
        assert!(!stale.is_valid());
    }

    #[test]
    fn test_secure_endpoints() {
        assert!(is_secure_endpoint("https://issuer.example/jwks"));
        assert!(is_secure_endpoint("http://localhost:8080/jwks"));
        assert!(is_secure_endpoint("http://127.0.0.1:4000/jwks"));
        assert!(is_secure_endpoint("http://[::1]:4000/jwks"));
        assert!(!is_secure_endpoint("http://issuer.example/jwks"));
        assert!(!is_secure_endpoint("http://localhost.evil.example/jwks"));
        assert!(!is_secure_endpoint("ftp://issuer.example/jwks"));
        assert!(!is_secure_endpoint("not a url"));
    }

    #[test]
    fn test_scheme_and_host_are_case_insensitive() {
        assert!(is_secure_endpoint("HTTPS://127.0.0.1:1/jwks"));
        assert!(is_secure_endpoint("HTTP://LOCALHOST:8080/jwks"));
        assert!(is_secure_endpoint("http://127.0.0.2/jwks"));
        assert!(!is_secure_endpoint("HTTP://issuer.example/jwks"));
        assert!(!is_secure_endpoint("http://user@issuer.example/jwks"));
        assert!(!is_secure_endpoint("http://[::2]/jwks"));
    }

    #[tokio::test]
    async fn test_plain_http_is_rejected_before_any_request() {
        let client = JwksClient::new("http://issuer.example/jwks");
        let err = client.get_jwks().await.unwrap_err();
        assert!(matches!(err, Error::JwksFetch(msg) if msg.contains("HTTPS")));
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let client = JwksClient::new("https://issuer.example/jwks");
        client.clear_cache().await;
        assert!(client.cache.read().await.is_none());
    }
}
