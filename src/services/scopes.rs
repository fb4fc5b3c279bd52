//! Registry of the OAuth scopes this server advertises.
//!
//! Two phases: tools register their required scopes into a mutable
//! [`ScopeRegistry`] at startup, then [`ScopeRegistry::seal`] turns it into an
//! immutable [`SupportedScopes`] that the discovery document reads. Sealing
//! consumes the registry, so nothing can be added once the server is serving.

use std::collections::BTreeSet;
use std::sync::Arc;

/// Scopes every deployment advertises.
pub const BASE_SCOPES: [&str; 3] = ["openid", "profile", "email"];

/// Startup-phase, additive-only scope set.
#[derive(Debug, Clone)]
pub struct ScopeRegistry {
    scopes: BTreeSet<String>,
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self {
            scopes: BASE_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union `scopes` into the registry. Idempotent.
    pub fn register<I, S>(&mut self, scopes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for scope in scopes {
            let scope = scope.as_ref();
            if !self.contains(scope) {
                tracing::debug!(scope, "registered supported scope");
                self.scopes.insert(scope.to_string());
            }
        }
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// End of the registration phase.
    pub fn seal(self) -> SupportedScopes {
        SupportedScopes(Arc::new(self.scopes))
    }
}

/// Frozen scope set. Cheap to clone, read without synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedScopes(Arc<BTreeSet<String>>);

impl SupportedScopes {
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}
