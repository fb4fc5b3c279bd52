use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};

use super::verifier::{TokenVerifier, VerifiedClaims, VerifyError};

/// JWT access-token verifier for an OAuth tenant.
///
/// - issuer: `https://<domain>/`
/// - audience: the resource server's API identifier
/// - `exp` is required; `nbf` is honoured when present
/// - key material is not printable via Debug
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("JwtVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtVerifier {
    fn validation(algorithm: Algorithm, domain: &str, audience: &str, leeway: u64) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[issuer_for(domain)]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.validate_nbf = true;
        validation.leeway = leeway;
        validation
    }

    /// RS256 verifier from a PEM-encoded RSA public key.
    pub fn from_rsa_pem(
        pem: &str,
        domain: &str,
        audience: &str,
        leeway_seconds: u64,
    ) -> Result<Self, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())?;
        Ok(Self {
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(Self::validation(
                Algorithm::RS256,
                domain,
                audience,
                leeway_seconds,
            )),
        })
    }

    /// HS256 verifier from a shared secret.
    #[cfg(test)]
    pub fn from_secret(secret: &[u8], domain: &str, audience: &str) -> Self {
        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
            validation: Arc::new(Self::validation(Algorithm::HS256, domain, audience, 0)),
        }
    }
}

pub fn issuer_for(domain: &str) -> String {
    format!("https://{}/", domain.trim_end_matches('/'))
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(
        &self,
        token: &str,
        required_claims: &[&str],
    ) -> Result<VerifiedClaims, VerifyError> {
        let data = jsonwebtoken::decode::<Map<String, Value>>(
            token,
            &self.decoding_key,
            &self.validation,
        )
        .map_err(|e| VerifyError::Invalid(e.to_string()))?;

        let claims = VerifiedClaims::new(data.claims);
        if let Some(missing) = claims.first_missing(required_claims) {
            return Err(VerifyError::MissingClaim(missing.to_string()));
        }

        Ok(claims)
    }
}
