//! Shapes of the records callers persist for issued tokens
//!
//! Storage is always external. These types pin down what a store hands
//! back so the issuer can reason about it (e.g. a soft-deleted refresh
//! token is treated as revoked).

use serde::{Deserialize, Serialize};

/// A record that is written once and never changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImmutableRecord<P> {
    /// Store-assigned identifier
    pub id: String,
    /// Creation time (UNIX seconds)
    pub created_at: i64,
    /// Record payload
    #[serde(flatten)]
    pub props: P,
}

/// A record that can be updated and soft-deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutableRecord<P> {
    /// Store-assigned identifier
    pub id: String,
    /// Creation time (UNIX seconds)
    pub created_at: i64,
    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    /// Soft-deletion time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
    /// Time the record was last restored after a soft deletion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undeleted_at: Option<i64>,
    /// Record payload
    #[serde(flatten)]
    pub props: P,
}

impl<P> MutableRecord<P> {
    /// Whether the record is currently soft-deleted
    ///
    /// A record restored after its deletion is live again.
    pub fn is_deleted(&self) -> bool {
        match (self.deleted_at, self.undeleted_at) {
            (Some(deleted), Some(undeleted)) => deleted > undeleted,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// Persisted refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenProps {
    /// The opaque token value
    pub refresh_token: String,
    /// Expiration (UNIX seconds)
    pub exp: i64,
    /// Profile URL the token was issued to
    pub me: String,
    /// Scope granted with the original authorization
    pub scope: String,
    /// Client the token was issued to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// A refresh token as returned by a [`RefreshTokenStore`](crate::tokens::RefreshTokenStore)
pub type RefreshTokenRecord = MutableRecord<RefreshTokenProps>;

/// Persisted access token metadata, keyed by `jti`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenProps {
    /// JWT ID
    pub jti: String,
    /// Expiration (UNIX seconds)
    pub exp: i64,
    /// Profile URL the token was issued to
    pub me: String,
    /// Granted scope
    pub scope: String,
    /// Client the token was issued to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// An issued access token as a store would keep it
pub type AccessTokenRecord = ImmutableRecord<AccessTokenProps>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(deleted_at: Option<i64>, undeleted_at: Option<i64>) -> RefreshTokenRecord {
        MutableRecord {
            id: "1".into(),
            created_at: 100,
            updated_at: None,
            deleted_at,
            undeleted_at,
            props: RefreshTokenProps {
                refresh_token: "V1StGXR8_Z5jdHi6B-myT".into(),
                exp: 200,
                me: "https://me.example/".into(),
                scope: "create".into(),
                client_id: None,
            },
        }
    }

    #[test]
    fn test_soft_delete_state() {
        assert!(!record(None, None).is_deleted());
        assert!(record(Some(150), None).is_deleted());
        assert!(!record(Some(150), Some(160)).is_deleted());
        assert!(record(Some(170), Some(160)).is_deleted());
    }

    #[test]
    fn test_props_are_flattened() {
        let value = serde_json::to_value(record(None, None)).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "1",
                "created_at": 100,
                "refresh_token": "V1StGXR8_Z5jdHi6B-myT",
                "exp": 200,
                "me": "https://me.example/",
                "scope": "create"
            })
        );
    }
}
