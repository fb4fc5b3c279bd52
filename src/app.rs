/*
 * Responsibility
 * - Config読み込み → 依存生成 → 登録フェーズ (tool / scope) → Router 組み立て
 * - Middleware の適用 (Bearer 検証 / WWW-Authenticate / CORS / HTTP 共通)
 * - axum::serve() で起動
 */
use std::{panic, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::services::auth::{CredentialVerifier, JwtVerifier, TokenVerifier};
use crate::services::discovery::ProtectedResourceMetadata;
use crate::services::scopes::ScopeRegistry;
use crate::services::tools::{ToolRegistry, builtin};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,mcp_auth_gateway=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook() {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched.
        tracing::error!(?info, "panic");

        // never abort here: handler panics are turned into 500 by CatchPanicLayer
        default_hook(info);
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook();

    tracing::info!(
        "starting MCP server in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let verifier = JwtVerifier::from_rsa_pem(
        &config.jwt_public_key_pem,
        &config.auth0_domain,
        &config.auth0_audience,
        config.access_token_leeway_seconds,
    )
    .context("AUTH0_JWT_PUBLIC_KEY_PEM is not a valid RSA public key")?;

    let state = build_state(&config, Arc::new(verifier), builtin::register);
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// 登録フェーズ: tool を登録 (guard 付き tool は必要 scope も登録) → seal → 公開用 state を作る
pub(crate) fn build_state(
    config: &Config,
    verifier: Arc<dyn TokenVerifier>,
    register_tools: impl FnOnce(&mut ToolRegistry, &mut ScopeRegistry),
) -> AppState {
    let mut tools = ToolRegistry::new();
    let mut scopes = ScopeRegistry::new();
    register_tools(&mut tools, &mut scopes);

    // ここから先 scope は追加できない
    let scopes = scopes.seal();
    if tools.is_empty() {
        tracing::warn!("no tools registered");
    }
    tracing::info!(
        tools = tools.len(),
        scopes = ?scopes.to_vec(),
        "registration complete"
    );

    let discovery = ProtectedResourceMetadata::new(config.auth0_audience.as_str())
        .authorization_domain(&config.auth0_domain)
        .scopes(&scopes)
        .resource_name(config.server_name.as_str());

    AppState::new(
        CredentialVerifier::new(verifier),
        tools,
        discovery,
        config.resource_metadata_url(),
        &config.server_name,
    )
}

/// 認証が必要な /mcp と不要な well-known をまとめ、WWW-Authenticate を付ける
pub(crate) fn routes(state: AppState) -> Router {
    let mcp = middleware::auth::access::apply(api::mcp::routes(), state.clone());

    let router = Router::new()
        .merge(api::well_known::routes())
        .merge(mcp)
        .with_state(state.clone());

    middleware::challenge::apply(router, state)
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = routes(state);
    let router = middleware::http::apply(router);
    middleware::cors::apply(router, config)
}
