//! Claims logging

use async_trait::async_trait;
use http::request::Parts;
use tracing::{Level, debug, error, info, trace, warn};

use super::Stage;
use crate::claims::AccessTokenClaims;
use crate::oauth_error::OAuthError;

/// Logs the decoded claims; never rejects
///
/// Only the claims are logged, never the token itself.
#[derive(Debug, Clone, Copy)]
pub struct LogClaims {
    level: Level,
}

impl Default for LogClaims {
    fn default() -> Self {
        Self { level: Level::DEBUG }
    }
}

impl LogClaims {
    /// Log at `level`
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

#[async_trait]
impl Stage for LogClaims {
    fn name(&self) -> &'static str {
        "log-claims"
    }

    async fn run(&self, parts: &mut Parts) -> Result<(), OAuthError> {
        let Some(c) = parts.extensions.get::<AccessTokenClaims>() else {
            debug!("no access token claims to log");
            return Ok(());
        };
        macro_rules! emit {
            ($mac:ident) => {
                $mac!(
                    iss = %c.iss,
                    me = %c.me,
                    scope = %c.scope,
                    jti = %c.jti,
                    iat = c.iat,
                    exp = c.exp,
                    "access token claims"
                )
            };
        }
        match self.level {
            Level::ERROR => emit!(error),
            Level::WARN => emit!(warn),
            Level::INFO => emit!(info),
            Level::DEBUG => emit!(debug),
            _ => emit!(trace),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::test_support::{claims, parts, parts_with_claims};

    #[tokio::test]
    async fn test_never_rejects() {
        let stage = LogClaims::new(Level::INFO);
        assert!(stage.run(&mut parts()).await.is_ok());
        assert!(stage.run(&mut parts_with_claims(claims("create"))).await.is_ok());
    }
}
