//! Per-tool scope enforcement.
//!
//! [`ScopeGuard`] wraps a tool handler with a pre-invocation scope check. Building
//! one registers its required scopes in the [`ScopeRegistry`], which is how the
//! discovery document learns about them.

use async_trait::async_trait;

use crate::api::extractors::AuthCtx;
use crate::error::{AppError, AuthError, AuthErrorKind};
use crate::services::scopes::ScopeRegistry;

use super::{ToolCall, ToolHandler};

pub struct ScopeGuard<H> {
    // declaration order, no duplicates
    required: Vec<String>,
    inner: H,
}

impl<H> ScopeGuard<H> {
    pub fn new<I, S>(registry: &mut ScopeRegistry, required: I, inner: H) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut scopes: Vec<String> = Vec::new();
        for scope in required {
            let scope = scope.into();
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }

        registry.register(&scopes);

        Self {
            required: scopes,
            inner,
        }
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// `Ok` iff every required scope was granted.
    pub fn check(&self, auth: Option<&AuthCtx>) -> Result<(), AuthError> {
        let Some(auth) = auth else {
            return Err(AuthError::new(AuthErrorKind::AuthenticationRequired));
        };

        let missing: Vec<&str> = self
            .required()
            .iter()
            .map(String::as_str)
            .filter(|scope| !auth.has_scope(scope))
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            client_id = %auth.client_id(),
            missing = ?missing,
            "insufficient scope"
        );
        Err(AuthError::insufficient_scope(format!(
            "Missing required scopes: {}",
            scope_list(&missing)
        )))
    }
}

// ['a', 'b']
fn scope_list(scopes: &[&str]) -> String {
    let quoted: Vec<String> = scopes.iter().map(|s| format!("'{s}'")).collect();
    format!("[{}]", quoted.join(", "))
}

#[async_trait]
impl<H: ToolHandler> ToolHandler for ScopeGuard<H> {
    async fn call(&self, call: ToolCall) -> Result<String, AppError> {
        self.check(call.auth.as_ref())?;
        self.inner.call(call).await
    }
}

/// Wrap `handler` so it only runs for callers holding every scope in `scopes`.
pub fn require_scopes<H, I, S>(
    registry: &mut ScopeRegistry,
    scopes: I,
    handler: H,
) -> ScopeGuard<H>
where
    H: ToolHandler,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ScopeGuard::new(registry, scopes, handler)
}
