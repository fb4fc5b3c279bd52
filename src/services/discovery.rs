//! Protected Resource Metadata (RFC 9728 Section 3).
//!
//! The document served at `/.well-known/oauth-protected-resource` so clients can
//! find the authorization server and the scopes this server understands.

use serde::{Deserialize, Serialize};

use super::scopes::SupportedScopes;

/// Well-known path of the metadata document.
pub const WELL_KNOWN_PATH: &str = "/.well-known/oauth-protected-resource";

/// Absolute URL of the metadata document for a server reachable at `base_url`.
pub fn resource_metadata_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), WELL_KNOWN_PATH)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectedResourceMetadata {
    /// Resource identifier (the token audience).
    pub resource: String,

    pub authorization_servers: Vec<String>,

    pub scopes_supported: Vec<String>,

    /// Defaults to `["header"]` per RFC 6750.
    #[serde(default = "default_bearer_methods")]
    pub bearer_methods_supported: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
}

fn default_bearer_methods() -> Vec<String> {
    vec!["header".to_string()]
}

impl ProtectedResourceMetadata {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            authorization_servers: Vec::new(),
            scopes_supported: Vec::new(),
            bearer_methods_supported: default_bearer_methods(),
            resource_name: None,
        }
    }

    /// Add the tenant at `domain` (`https://<domain>`) as an authorization server.
    pub fn authorization_domain(mut self, domain: &str) -> Self {
        self.authorization_servers
            .push(format!("https://{}", domain.trim_end_matches('/')));
        self
    }

    pub fn scopes(mut self, scopes: &SupportedScopes) -> Self {
        self.scopes_supported = scopes.to_vec();
        self
    }

    pub fn resource_name(mut self, name: impl Into<String>) -> Self {
        self.resource_name = Some(name.into());
        self
    }
}
