/*
 * Responsibility
 * - Handler / tool から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - 検証済み claim → AuthCtx への変換は services::auth::credential の責務
 * - extra には allow-list の claim だけを残す（それ以外は捨てる）
 */
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

/// Claim names copied into [`ExtraClaims`]. Everything else is discarded.
pub const EXTRA_CLAIM_NAMES: [&str; 5] = ["sub", "azp", "name", "email", "client_id"];

/// Allow-listed claims of the verified token, copied verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExtraClaims(BTreeMap<String, Value>);

impl ExtraClaims {
    /// Keep only allow-listed claims from `claims`.
    pub fn retain_allowed<'a>(claims: impl IntoIterator<Item = (&'a String, &'a Value)>) -> Self {
        Self(
            claims
                .into_iter()
                .filter(|(name, _)| EXTRA_CLAIM_NAMES.contains(&name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn sub(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }
}

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `client_id` は常に空でない（`new` が保証する）
/// - `scopes` は token の `scope` claim (空白区切り) の集合
/// - `expires_at` は `exp` (epoch seconds)
/// - リクエストをまたいで共有・キャッシュしない
#[derive(Debug, Clone, PartialEq)]
pub struct AuthCtx {
    client_id: String,
    scopes: BTreeSet<String>,
    expires_at: Option<i64>,
    extra: ExtraClaims,
}

impl AuthCtx {
    /// Returns `None` when `client_id` is empty.
    pub fn new(client_id: impl Into<String>) -> Option<Self> {
        let client_id = client_id.into();
        if client_id.is_empty() {
            return None;
        }

        Some(Self {
            client_id,
            scopes: BTreeSet::new(),
            expires_at: None,
            extra: ExtraClaims::default(),
        })
    }

    pub fn with_scopes(mut self, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_expires_at(mut self, expires_at: Option<i64>) -> Self {
        self.expires_at = expires_at;
        self
    }

    pub fn with_extra(mut self, extra: ExtraClaims) -> Self {
        self.extra = extra;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    pub fn extra(&self) -> &ExtraClaims {
        &self.extra
    }
}
