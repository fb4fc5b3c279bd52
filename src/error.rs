/*
 * Responsibility
 * - 認証/認可エラーの分類 (AuthErrorKind) と、プロトコル上の status / error code の対応
 * - WWW-Authenticate (RFC 6750 §3 / RFC 9728 §5.1) の組み立て
 * - AppError の IntoResponse (JSON body)。challenge header の付与は middleware::challenge 側
 */
use std::borrow::Cow;
use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// The three caller-recoverable failure kinds of the auth pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// Missing, invalid or expired credential (401).
    AuthenticationRequired,
    /// Authenticated, but the granted scopes do not cover the operation (403).
    InsufficientScope,
    /// The Authorization header is absent or not a bearer credential (400).
    MalformedAuthorizationRequest,
}

impl AuthErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::InsufficientScope => StatusCode::FORBIDDEN,
            Self::MalformedAuthorizationRequest => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "invalid_token",
            Self::InsufficientScope => "insufficient_scope",
            Self::MalformedAuthorizationRequest => "invalid_request",
        }
    }

    pub fn default_description(self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "Authentication required",
            Self::InsufficientScope => "Insufficient scope",
            Self::MalformedAuthorizationRequest => "Malformed authorization request",
        }
    }
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error_code())
    }
}

/// Typed auth failure. Immutable once built; status and code are fixed by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {description}")]
pub struct AuthError {
    kind: AuthErrorKind,
    description: Cow<'static, str>,
}

impl AuthError {
    /// Build an error carrying the kind's default description.
    pub fn new(kind: AuthErrorKind) -> Self {
        Self {
            kind,
            description: Cow::Borrowed(kind.default_description()),
        }
    }

    pub fn with_description(kind: AuthErrorKind, description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    pub fn authentication_required(description: impl Into<Cow<'static, str>>) -> Self {
        Self::with_description(AuthErrorKind::AuthenticationRequired, description)
    }

    pub fn insufficient_scope(description: impl Into<Cow<'static, str>>) -> Self {
        Self::with_description(AuthErrorKind::InsufficientScope, description)
    }

    pub fn malformed(description: impl Into<Cow<'static, str>>) -> Self {
        Self::with_description(AuthErrorKind::MalformedAuthorizationRequest, description)
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Builds the `WWW-Authenticate` challenge.
    ///
    /// `resource_metadata` is only appended for `AuthenticationRequired`, and only
    /// when this instance knows its external base URL.
    pub fn www_authenticate(&self, resource_metadata_url: Option<&str>) -> String {
        let mut params = vec![
            format!("error={}", quoted(self.error_code())),
            format!("error_description={}", quoted(&self.description)),
        ];

        if self.kind == AuthErrorKind::AuthenticationRequired {
            if let Some(url) = resource_metadata_url {
                params.push(format!("resource_metadata={}", quoted(url)));
            }
        }

        format!("Bearer {}", params.join(", "))
    }
}

// RFC 7230 quoted-string
fn quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse<'a> {
    pub error: &'static str,
    pub error_description: &'a str,
}

/// Pipeline-wide failure: a typed auth error, or anything else (rendered as 500).
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Auth(err) => {
                tracing::debug!(kind = %err.kind(), description = %err.description(), "auth error");
                let body = ErrorResponse {
                    error: err.error_code(),
                    error_description: err.description(),
                };
                let mut response = (err.status_code(), Json(body)).into_response();
                // middleware::challenge が WWW-Authenticate を組み立てる
                response.extensions_mut().insert(err);
                response
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "unexpected error while handling request");
                internal_error_response()
            }
        }
    }
}

/// Generic 500 response. Never carries internal detail.
pub fn internal_error_response() -> Response {
    let body = ErrorResponse {
        error: "internal_server_error",
        error_description: "An unexpected error occurred",
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_kind_mapping() {
        let cases = [
            (AuthErrorKind::MalformedAuthorizationRequest, 400, "invalid_request"),
            (AuthErrorKind::AuthenticationRequired, 401, "invalid_token"),
            (AuthErrorKind::InsufficientScope, 403, "insufficient_scope"),
        ];
        for (kind, status, code) in cases {
            assert_eq!(kind.status_code().as_u16(), status);
            assert_eq!(kind.error_code(), code);
        }
    }

    #[test]
    fn test_default_description() {
        let err = AuthError::new(AuthErrorKind::AuthenticationRequired);
        assert_eq!(err.description(), "Authentication required");

        let err = AuthError::new(AuthErrorKind::InsufficientScope);
        assert_eq!(err.description(), "Insufficient scope");
    }

    #[test]
    fn test_www_authenticate_with_metadata() {
        let err = AuthError::authentication_required("Invalid token");
        let header = err.www_authenticate(Some(
            "https://mcp.example.com/.well-known/oauth-protected-resource",
        ));
        assert_eq!(
            header,
            "Bearer error=\"invalid_token\", error_description=\"Invalid token\", \
             resource_metadata=\"https://mcp.example.com/.well-known/oauth-protected-resource\""
        );
    }

    #[test]
    fn test_www_authenticate_without_base_url() {
        let err = AuthError::authentication_required("Invalid token");
        assert_eq!(
            err.www_authenticate(None),
            "Bearer error=\"invalid_token\", error_description=\"Invalid token\""
        );
    }

    #[test]
    fn test_resource_metadata_only_on_401() {
        let url = Some("https://mcp.example.com/.well-known/oauth-protected-resource");

        let header = AuthError::malformed("Missing Authorization header").www_authenticate(url);
        assert!(header.contains("error=\"invalid_request\""));
        assert!(!header.contains("resource_metadata"));

        let header = AuthError::insufficient_scope("nope").www_authenticate(url);
        assert!(header.contains("error=\"insufficient_scope\""));
        assert!(!header.contains("resource_metadata"));
    }

    #[test]
    fn test_description_is_quoted() {
        let err = AuthError::insufficient_scope(r#"say "hi" \o/"#);
        let header = err.www_authenticate(None);
        assert!(header.ends_with(r#"error_description="say \"hi\" \\o/""#));
    }

    #[tokio::test]
    async fn test_auth_error_response_body() {
        let response = AppError::from(AuthError::insufficient_scope(
            "Missing required scopes: ['tool:admin']",
        ))
        .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.extensions().get::<AuthError>().is_some());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "error": "insufficient_scope",
                "error_description": "Missing required scopes: ['tool:admin']"
            })
        );
    }

    #[tokio::test]
    async fn test_internal_error_is_generic() {
        let response =
            AppError::from(anyhow!("connection refused (os error 111)")).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<AuthError>().is_none());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("connection refused"));
        assert!(text.contains("internal_server_error"));
        assert!(text.contains("An unexpected error occurred"));
    }
}
