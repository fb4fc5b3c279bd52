use std::sync::Arc;

use crate::api::extractors::{AuthCtx, ExtraClaims};
use crate::error::{AppError, AuthError};

use super::verifier::{TokenVerifier, VerifiedClaims, VerifyError};

/// Claims every verified token must carry.
pub const REQUIRED_CLAIMS: &[&str] = &["sub"];

const INVALID_TOKEN: &str = "Invalid token";

/// Turns a raw bearer token into an [`AuthCtx`].
///
/// Verification failures become `AuthenticationRequired("Invalid token")`; the
/// verifier's diagnostic is logged but never returned. Backend failures pass
/// through as internal errors.
#[derive(Clone)]
pub struct CredentialVerifier {
    verifier: Arc<dyn TokenVerifier>,
}

impl CredentialVerifier {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }

    pub async fn verify(&self, token: &str) -> Result<AuthCtx, AppError> {
        let claims = match self.verifier.verify(token, REQUIRED_CLAIMS).await {
            Ok(claims) => claims,
            Err(VerifyError::Backend(err)) => {
                return Err(AppError::Internal(err.context("token verifier backend failure")));
            }
            Err(err) => {
                tracing::warn!(error = %err, "access token verification failed");
                return Err(AuthError::authentication_required(INVALID_TOKEN).into());
            }
        };

        build_auth_ctx(&claims).ok_or_else(|| {
            tracing::warn!("verified token has neither 'client_id' nor 'azp' claim");
            AuthError::authentication_required(INVALID_TOKEN).into()
        })
    }
}

/// Claim set → AuthCtx. `None` when neither `client_id` nor `azp` is usable.
pub fn build_auth_ctx(claims: &VerifiedClaims) -> Option<AuthCtx> {
    let client_id = claims
        .str_claim("client_id")
        .or_else(|| claims.str_claim("azp"))?;

    let scopes = claims
        .scope()
        .map(|s| s.split_whitespace().collect::<Vec<_>>())
        .unwrap_or_default();

    let ctx = AuthCtx::new(client_id)?
        .with_scopes(scopes)
        .with_expires_at(claims.exp())
        .with_extra(ExtraClaims::retain_allowed(claims.iter()));

    Some(ctx)
}
