//! Common test utilities for indieauth-token integration tests
//!
//! Provides a wiremock-backed issuer that publishes a JWKS, and helpers for
//! minting tokens against private key sets.

#![allow(dead_code)]

use indieauth_token::jwk::{Jwk, Jwks};
use indieauth_token::jwt::{SignConfig, sign};
use serde_json::{Map, Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub const ISSUER: &str = "https://issuer.example/";
pub const ME: &str = "https://alice.example/";

/// Mock issuer publishing its public keys at `/jwks`
pub struct MockIssuer {
    pub server: MockServer,
    pub jwks_endpoint: String,
}

impl MockIssuer {
    /// Start a new mock issuer
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let jwks_endpoint = format!("{}/jwks", server.uri());
        Self {
            server,
            jwks_endpoint,
        }
    }

    /// Serve the public half of `jwks` for every request
    pub async fn mock_jwks(&self, jwks: &Jwks) {
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks.to_public()))
            .mount(&self.server)
            .await;
    }

    /// Serve the public half of `jwks` for the first request only
    ///
    /// Mount the follow-up key set afterwards to simulate a rotation.
    pub async fn mock_jwks_once(&self, jwks: &Jwks) {
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks.to_public()))
            .up_to_n_times(1)
            .mount(&self.server)
            .await;
    }

    /// Answer `/jwks` with `status`
    pub async fn mock_jwks_error(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": "temporarily_unavailable"
            })))
            .mount(&self.server)
            .await;
    }

    /// Number of JWKS requests received so far
    pub async fn jwks_requests(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| {
                requests
                    .iter()
                    .filter(|r| r.url.path() == "/jwks")
                    .count()
            })
            .unwrap_or(0)
    }
}

/// Private key set with one ES256 key per kid
pub fn private_jwks(kids: &[&str]) -> Jwks {
    Jwks::new(kids.iter().map(|kid| Jwk::generate_es256(*kid)).collect())
}

/// Payload carrying the `me` and `scope` claims of an access token
pub fn access_payload(scope: &str) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("me".into(), json!(ME));
    payload.insert("scope".into(), json!(scope));
    payload
}

/// Sign `payload` with `kid` from `jwks`, valid for 15 minutes
pub fn signed_token(jwks: &Jwks, kid: &str, payload: &Map<String, Value>) -> String {
    sign(&SignConfig {
        expiration: "15 minutes",
        issuer: ISSUER,
        jwks,
        kid,
        payload,
    })
    .expect("signing failed")
}
