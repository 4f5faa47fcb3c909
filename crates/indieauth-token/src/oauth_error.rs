//! OAuth 2.0 bearer-token error responses (RFC 6750 section 3)
//!
//! The request hooks reject requests with an [`OAuthError`]. Clients can tell
//! "re-authenticate" (`invalid_token`) apart from "re-authorize with more
//! scope" (`insufficient_scope`) by the `error` code alone.

use std::fmt;

use http::header::{CONTENT_TYPE, WWW_AUTHENTICATE};
use http::{HeaderValue, Response, StatusCode};
use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind};

/// `error` codes used by the request hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthErrorCode {
    /// Malformed request, e.g. a repeated `Authorization` header
    InvalidRequest,
    /// No credentials presented
    Unauthorized,
    /// Token is malformed, expired, revoked or fails verification
    InvalidToken,
    /// Token lacks the scope the resource requires
    InsufficientScope,
    /// A collaborator (e.g. the revocation store) failed
    ServerError,
}

impl OAuthErrorCode {
    /// Wire value of the code
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Unauthorized => "unauthorized",
            Self::InvalidToken => "invalid_token",
            Self::InsufficientScope => "insufficient_scope",
            Self::ServerError => "server_error",
        }
    }

    /// HTTP status sent with this code
    pub fn status(self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::InsufficientScope => StatusCode::FORBIDDEN,
            Self::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for OAuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request rejection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {}", .description.as_deref().unwrap_or("no description"))]
pub struct OAuthError {
    /// Error code
    pub code: OAuthErrorCode,
    /// Human-readable detail; only sent when the hooks are configured to
    pub description: Option<String>,
    /// Scope the resource requires, advertised on `insufficient_scope`
    pub scope: Option<String>,
}

impl OAuthError {
    /// Error with a description
    pub fn new(code: OAuthErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: Some(description.into()),
            scope: None,
        }
    }

    /// `400 invalid_request`
    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::new(OAuthErrorCode::InvalidRequest, description)
    }

    /// `401 unauthorized`
    pub fn unauthorized(description: impl Into<String>) -> Self {
        Self::new(OAuthErrorCode::Unauthorized, description)
    }

    /// `401 invalid_token`
    pub fn invalid_token(description: impl Into<String>) -> Self {
        Self::new(OAuthErrorCode::InvalidToken, description)
    }

    /// `403 insufficient_scope` for a resource requiring `scope`
    pub fn insufficient_scope(description: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
            ..Self::new(OAuthErrorCode::InsufficientScope, description)
        }
    }

    /// `500 server_error`
    pub fn server_error(description: impl Into<String>) -> Self {
        Self::new(OAuthErrorCode::ServerError, description)
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    /// JSON body `{error, error_description?}`
    pub fn to_json(&self, include_description: bool) -> Value {
        let mut body = Map::new();
        body.insert("error".into(), Value::from(self.code.as_str()));
        if include_description && let Some(description) = &self.description {
            body.insert("error_description".into(), Value::from(description.as_str()));
        }
        Value::Object(body)
    }

    /// `WWW-Authenticate` challenge, for 401 and 403 responses only
    pub fn www_authenticate(&self, realm: Option<&str>, include_description: bool) -> Option<String> {
        if !matches!(self.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return None;
        }
        let mut params = Vec::new();
        if let Some(realm) = realm {
            params.push(format!("realm=\"{}\"", quote(realm)));
        }
        // RFC 6750: no error code when the request carried no credentials
        if self.code != OAuthErrorCode::Unauthorized {
            params.push(format!("error=\"{}\"", self.code));
        }
        if include_description && let Some(description) = &self.description {
            params.push(format!("error_description=\"{}\"", quote(description)));
        }
        if let Some(scope) = &self.scope {
            params.push(format!("scope=\"{}\"", quote(scope)));
        }
        Some(if params.is_empty() {
            "Bearer".to_string()
        } else {
            format!("Bearer {}", params.join(", "))
        })
    }

    /// Render as an HTTP response
    pub fn into_response<B: From<String>>(
        &self,
        realm: Option<&str>,
        include_description: bool,
    ) -> Response<B> {
        let mut response = Response::new(B::from(self.to_json(include_description).to_string()));
        *response.status_mut() = self.status();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(challenge) = self.www_authenticate(realm, include_description)
            && let Ok(value) = HeaderValue::from_str(&challenge)
        {
            response.headers_mut().insert(WWW_AUTHENTICATE, value);
        }
        response
    }
}

fn quote(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '\'' } else { c })
        .collect()
}

impl From<Error> for OAuthError {
    fn from(err: Error) -> Self {
        let description = err.to_string();
        match err.kind() {
            // JWKS fetch failures surface as invalid_token
            ErrorKind::Verification | ErrorKind::Authorization | ErrorKind::Transport
                if !matches!(err, Error::Store(_)) =>
            {
                Self::invalid_token(description)
            }
            _ => Self::server_error(description),
        }
    }
}
