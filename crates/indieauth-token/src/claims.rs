//! Access token claims

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claims every verified access token must carry
pub const REQUIRED_CLAIMS: [&str; 6] = ["exp", "iat", "iss", "jti", "me", "scope"];

/// Claims of an IndieAuth access token
///
/// Created at signing time and never modified. A token stops being honored
/// once `exp` has passed or its `jti` shows up in a revocation store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Issuer URL
    pub iss: String,
    /// Issued at (UNIX seconds)
    pub iat: i64,
    /// Expiration (UNIX seconds)
    pub exp: i64,
    /// Unique token ID, the key for revocation lookups
    pub jti: String,
    /// Canonical profile URL of the user the token was issued to
    pub me: String,
    /// Space-separated scopes
    pub scope: String,
    /// Any other claims in the payload
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccessTokenClaims {
    /// Individual scopes, empty entries removed
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.split(' ').filter(|s| !s.is_empty())
    }

    /// Whether `scope` is among the granted scopes
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes().any(|s| s == scope)
    }
}
