//! Test support: a scripted verifier and a fully assembled router.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{Method, header};
use axum::response::Response;
use serde_json::Value;
use tokio::sync::Notify;

use crate::app;
use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::TokenVerifier;
use crate::services::auth::verifier::{VerifiedClaims, VerifyError};
use crate::services::tools::{Tool, ToolCall, builtin, require_scopes};
use crate::state::AppState;

/// Verifier that knows a fixed set of tokens. Clones share the call counter.
#[derive(Debug, Clone, Default)]
pub struct StaticVerifier {
    tokens: HashMap<String, Value>,
    calls: Arc<AtomicUsize>,
}

impl StaticVerifier {
    /// Token that makes the verifier fail with a backend error.
    pub const BACKEND_DOWN: &'static str = "backend-down";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, claims: Value) -> Self {
        self.tokens.insert(token.to_string(), claims);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(
        &self,
        token: &str,
        required_claims: &[&str],
    ) -> Result<VerifiedClaims, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if token == Self::BACKEND_DOWN {
            return Err(anyhow::anyhow!("identity provider unreachable").into());
        }

        let claims = self
            .tokens
            .get(token)
            .and_then(Value::as_object)
            .cloned()
            .map(VerifiedClaims::new)
            .ok_or_else(|| VerifyError::Invalid("unknown token".to_string()))?;

        match claims.first_missing(required_claims) {
            Some(name) => Err(VerifyError::MissingClaim(name.to_string())),
            None => Ok(claims),
        }
    }
}

/// Wraps a [`StaticVerifier`] and holds verification of one token until `release`.
#[derive(Debug, Clone)]
pub struct GatedVerifier {
    inner: StaticVerifier,
    token: String,
    entered: Arc<Notify>,
    gate: Arc<Notify>,
}

impl GatedVerifier {
    pub fn new(inner: StaticVerifier, token: &str) -> Self {
        Self {
            inner,
            token: token.to_string(),
            entered: Arc::new(Notify::new()),
            gate: Arc::new(Notify::new()),
        }
    }

    /// Resolves once verification of the gated token has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl TokenVerifier for GatedVerifier {
    async fn verify(
        &self,
        token: &str,
        required_claims: &[&str],
    ) -> Result<VerifiedClaims, VerifyError> {
        if token == self.token {
            self.entered.notify_one();
            self.gate.notified().await;
        }
        self.inner.verify(token, required_claims).await
    }
}

pub fn test_config(base_url: Option<&str>) -> Config {
    let base_url = base_url.map(str::to_string);
    Config::from_vars(move |key| match key {
        "AUTH0_DOMAIN" => Some("tenant.us.auth0.com".to_string()),
        "AUTH0_AUDIENCE" => Some("https://api.example.com".to_string()),
        "AUTH0_JWT_PUBLIC_KEY_PEM" => Some("unused".to_string()),
        "MCP_SERVER_URL" => base_url.clone(),
        _ => None,
    })
    .unwrap()
}

/// Built-in tools plus `admin_only`, which requires `tool:admin`.
pub fn test_state(verifier: impl TokenVerifier, base_url: Option<&str>) -> AppState {
    let config = test_config(base_url);
    app::build_state(&config, Arc::new(verifier), |tools, scopes| {
        builtin::register(tools, scopes);
        tools.register(Tool::new(
            "admin_only",
            require_scopes(scopes, ["tool:admin"], |_call: ToolCall| async {
                Ok::<_, AppError>("admin".to_string())
            }),
        ));
    })
}

pub fn test_app(verifier: impl TokenVerifier, base_url: Option<&str>) -> Router {
    app::routes(test_state(verifier, base_url))
}

pub fn rpc_request(authorization: Option<&str>, body: Value) -> Request {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_json(res: Response) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
