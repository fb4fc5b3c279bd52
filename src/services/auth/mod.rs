pub mod access_jwt;
pub mod credential;
pub mod verifier;

pub use access_jwt::JwtVerifier;
pub use credential::CredentialVerifier;
pub use verifier::TokenVerifier;
