//! Boundary to the external credential verifier.
//!
//! The gateway never checks signatures or issuer/audience itself; it hands the raw
//! token to a [`TokenVerifier`] and only reads the claim set it returns.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a verifier did not return claims.
///
/// `Invalid` and `MissingClaim` are verification failures (the caller's credential is
/// bad). `Backend` is an infrastructure failure and must not be reported as one.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("token verification failed: {0}")]
    Invalid(String),

    #[error("token is missing required claim '{0}'")]
    MissingClaim(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Decoded and verified claim set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerifiedClaims(Map<String, Value>);

impl VerifiedClaims {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Non-empty string claim.
    pub fn str_claim(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Space-delimited `scope` claim, if present as a string.
    pub fn scope(&self) -> Option<&str> {
        self.get("scope").and_then(Value::as_str)
    }

    /// `exp` in epoch seconds. Fractional values are truncated.
    pub fn exp(&self) -> Option<i64> {
        let exp = self.get("exp")?;
        exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))
    }

    /// Returns the first name in `required` that is absent.
    pub fn first_missing<'a>(&self, required: &[&'a str]) -> Option<&'a str> {
        required.iter().copied().find(|name| !self.contains(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for VerifiedClaims {
    fn from(claims: Map<String, Value>) -> Self {
        Self::new(claims)
    }
}

/// External token verifier.
///
/// Implementations must be safe to call concurrently; a call may suspend on I/O.
#[async_trait]
pub trait TokenVerifier: Send + Sync + 'static {
    /// Verify `token` and return its claims. Every name in `required_claims` must be
    /// present in the result, otherwise `VerifyError::MissingClaim`.
    async fn verify(
        &self,
        token: &str,
        required_claims: &[&str],
    ) -> Result<VerifiedClaims, VerifyError>;
}
