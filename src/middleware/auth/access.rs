//! access token (Bearer) 検証 → AuthCtx を extensions に入れる
//!
//! 1. Authorization header を読む (無い / Bearer でない → 400)
//! 2. "Bearer " (大文字小文字は区別しない) を外して token を取り出す
//! 3. CredentialVerifier で検証 (失敗 → 401, backend 障害 → 500)
//! 4. AuthCtx を request extensions に格納して次へ
//!
//! 検証結果はキャッシュしない。毎リクエスト検証する。

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::{AppError, AuthError};
use crate::state::AppState;

const BEARER_PREFIX: &str = "bearer ";

/// 保護対象の routes に認証を掛ける。
///
/// ```ignore
/// let mcp = middleware::auth::access::apply(api::mcp::routes(), state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    // route_layer: マッチしなかったパスには認証を掛けない
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())?.to_owned();

    // 検証中に request が drop された場合、AuthCtx は入らないまま終わる
    let auth_ctx = state.credentials.verify(&token).await?;

    tracing::debug!(
        client_id = %auth_ctx.client_id(),
        expires_at = ?auth_ctx.expires_at(),
        "authenticated"
    );

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}

/// `Authorization: Bearer <token>` から token を取り出す。
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AuthError::malformed("Missing Authorization header"))?;

    let invalid_format = || AuthError::malformed("Invalid Authorization header format");

    let value = value.to_str().map_err(|_| invalid_format())?;
    match value.get(..BEARER_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(BEARER_PREFIX) => {
            Ok(value[BEARER_PREFIX.len()..].trim())
        }
        _ => Err(invalid_format()),
    }
}
